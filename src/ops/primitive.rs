/*
 * @Author       : 老董
 * @Date         : 2026-02-11
 * @Description  : 无参数的原语算子：恒等（Identity）与结构化“无连接”（Zero）
 */

use crate::errors::OpError;
use crate::ops::TraitOp;
use crate::tensor::Tensor;

/// 恒等算子：原样返回输入。
/// 隐含要求stride==1（无任何缩放逻辑），步长兼容性由调用方保证，此处不做检查。
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl Identity {
    pub fn new() -> Self {
        Self
    }
}

impl TraitOp for Identity {
    fn forward(&mut self, input: &Tensor) -> Result<Tensor, OpError> {
        Ok(input.clone())
    }
}

/// 结构化“无连接”算子：输出全零但保持形状契约，
/// 使下游对候选边的聚合（如求和）依然类型正确。
/// `stride==1`时输出与输入同形状；`stride>1`时先按步长做空间子采样再置零。
#[derive(Debug, Clone, Copy)]
pub struct Zero {
    stride: usize,
}

impl Zero {
    pub fn new(stride: usize) -> Self {
        Self { stride }
    }
}

impl TraitOp for Zero {
    fn forward(&mut self, input: &Tensor) -> Result<Tensor, OpError> {
        if self.stride == 1 {
            return Ok(input * 0.0);
        }
        if input.dimension() != 4 {
            return Err(OpError::ShapeMismatch {
                expected: vec![0, 0, 0, 0],
                got: input.shape().to_vec(),
                message: "stride>1的Zero算子要求4D输入".to_string(),
            });
        }
        Ok(input.subsample(self.stride, self.stride).zeros_like())
    }
}
