/*
 * @Author       : 老董
 * @Date         : 2026-02-11
 * @Description  : 池化算子（注册表中的avg_pool_3x3 / max_pool_3x3即为3x3、padding=1的实例）
 */

use crate::errors::OpError;
use crate::ops::{TraitOp, functional};
use crate::tensor::Tensor;

/// 2D平均池化算子。padding不计入分母（`count_include_pad=False`）。
#[derive(Debug, Clone, Copy)]
pub struct AvgPool2d {
    kernel_size: (usize, usize),
    stride: (usize, usize),
    padding: (usize, usize),
}

impl AvgPool2d {
    pub fn new(kernel_size: (usize, usize), stride: (usize, usize), padding: (usize, usize)) -> Self {
        Self {
            kernel_size,
            stride,
            padding,
        }
    }
}

impl TraitOp for AvgPool2d {
    fn forward(&mut self, input: &Tensor) -> Result<Tensor, OpError> {
        functional::avg_pool2d(input, self.kernel_size, self.stride, self.padding)
    }
}

/// 2D最大池化算子。padding区域不参与取最大。
#[derive(Debug, Clone, Copy)]
pub struct MaxPool2d {
    kernel_size: (usize, usize),
    stride: (usize, usize),
    padding: (usize, usize),
}

impl MaxPool2d {
    pub fn new(kernel_size: (usize, usize), stride: (usize, usize), padding: (usize, usize)) -> Self {
        Self {
            kernel_size,
            stride,
            padding,
        }
    }
}

impl TraitOp for MaxPool2d {
    fn forward(&mut self, input: &Tensor) -> Result<Tensor, OpError> {
        functional::max_pool2d(input, self.kernel_size, self.stride, self.padding)
    }
}
