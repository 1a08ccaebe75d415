/*
 * @Author       : 老董
 * @Date         : 2026-02-11
 * @Description  : 2D批归一化（PyTorch训练模式语义）
 *
 * 约定（与PyTorch一致）：
 * - 归一化用本batch的有偏方差；运行统计量的更新用无偏方差
 * - running = (1 - momentum) * running + momentum * batch_stat
 * - 运行统计量只在此处更新，参数更新（gamma/beta的梯度）由外部框架负责
 */

use crate::errors::OpError;
use crate::ops::Init;
use crate::tensor::Tensor;

/// 2D批归一化层
#[derive(Debug, Clone)]
pub struct BatchNorm2d {
    num_features: usize,
    eps: f32,
    momentum: f32,
    affine: bool,
    /// 可学习缩放 [C]（仅affine时存在）
    gamma: Option<Tensor>,
    /// 可学习平移 [C]（仅affine时存在）
    beta: Option<Tensor>,
    /// 运行均值 [C]
    running_mean: Tensor,
    /// 运行方差 [C]
    running_var: Tensor,
}

impl BatchNorm2d {
    /// 创建批归一化层
    ///
    /// # 参数
    /// - `num_features`: 通道数C
    /// - `eps`: 数值稳定常数（加在方差上）
    /// - `momentum`: 运行统计量的更新系数，取值[0, 1)
    /// - `affine`: 是否带可学习的缩放/平移
    pub fn new(num_features: usize, eps: f32, momentum: f32, affine: bool) -> Self {
        Self {
            num_features,
            eps,
            momentum,
            affine,
            gamma: affine.then(|| Init::Ones.generate(&[num_features])),
            beta: affine.then(|| Init::Zeros.generate(&[num_features])),
            running_mean: Tensor::zeros(&[num_features]),
            running_var: Tensor::ones(&[num_features]),
        }
    }

    /// 前向：[batch, C, H, W] -> 同形状输出
    pub fn forward(&mut self, input: &Tensor) -> Result<Tensor, OpError> {
        // 1. 校验输入形状与通道数
        let shape = input.shape();
        if shape.len() != 4 || shape[1] != self.num_features {
            return Err(OpError::ShapeMismatch {
                expected: vec![0, self.num_features, 0, 0],
                got: shape.to_vec(),
                message: format!(
                    "BatchNorm2d期望4D输入且通道数为{}",
                    self.num_features
                ),
            });
        }
        let (batch_size, channels, in_h, in_w) = (shape[0], shape[1], shape[2], shape[3]);
        let n = (batch_size * in_h * in_w) as f32;

        let mut output = input.zeros_like();
        for c in 0..channels {
            // 2. 本batch的逐通道均值与有偏方差
            let mut sum = 0.0f32;
            for b in 0..batch_size {
                for h in 0..in_h {
                    for w in 0..in_w {
                        sum += input[[b, c, h, w]];
                    }
                }
            }
            let mean = sum / n;

            let mut var_sum = 0.0f32;
            for b in 0..batch_size {
                for h in 0..in_h {
                    for w in 0..in_w {
                        let diff = input[[b, c, h, w]] - mean;
                        var_sum += diff * diff;
                    }
                }
            }
            let var_biased = var_sum / n;

            // 3. 更新运行统计量（方差用无偏估计）
            let var_unbiased = if n > 1.0 { var_sum / (n - 1.0) } else { var_biased };
            let idx = [c];
            self.running_mean[&idx[..]] =
                (1.0 - self.momentum) * self.running_mean[&idx[..]] + self.momentum * mean;
            self.running_var[&idx[..]] =
                (1.0 - self.momentum) * self.running_var[&idx[..]] + self.momentum * var_unbiased;

            // 4. 归一化（+可选的仿射变换）
            let inv_std = 1.0 / (var_biased + self.eps).sqrt();
            let (scale, shift) = match (&self.gamma, &self.beta) {
                (Some(gamma), Some(beta)) => (gamma[&idx[..]], beta[&idx[..]]),
                _ => (1.0, 0.0),
            };
            for b in 0..batch_size {
                for h in 0..in_h {
                    for w in 0..in_w {
                        output[[b, c, h, w]] =
                            (input[[b, c, h, w]] - mean) * inv_std * scale + shift;
                    }
                }
            }
        }
        Ok(output)
    }

    /// 可学习参数总量（affine时为gamma与beta各C个）
    pub fn param_count(&self) -> usize {
        if self.affine { 2 * self.num_features } else { 0 }
    }

    /// 运行均值 [C]
    pub fn running_mean(&self) -> &Tensor {
        &self.running_mean
    }

    /// 运行方差 [C]
    pub fn running_var(&self) -> &Tensor {
        &self.running_var
    }
}
