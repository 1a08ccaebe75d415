/*
 * @Author       : 老董
 * @Date         : 2026-02-11
 * @Description  : 参数初始化策略（算子构建期一次性使用）
 */

use crate::tensor::Tensor;
use rand::rngs::StdRng;

/// 参数初始化策略
#[derive(Debug, Clone)]
pub enum Init {
    /// 全零
    Zeros,
    /// 全一
    Ones,
    /// 正态分布
    Normal { mean: f32, std: f32 },
    /// Kaiming/He 初始化（适用于`ReLU`）
    Kaiming,
}

impl Init {
    /// 生成初始化后的Tensor（使用全局RNG）
    pub fn generate(&self, shape: &[usize]) -> Tensor {
        match self {
            Self::Zeros => Tensor::zeros(shape),
            Self::Ones => Tensor::ones(shape),
            Self::Normal { mean, std } => Tensor::new_normal(*mean, *std, shape),
            Self::Kaiming => {
                let std = Self::kaiming_std(shape);
                Tensor::new_normal(0.0, std, shape)
            }
        }
    }

    /// 生成初始化后的Tensor（使用指定的RNG，确保可重复性）
    pub fn generate_with_rng(&self, shape: &[usize], rng: &mut StdRng) -> Tensor {
        match self {
            Self::Zeros => Tensor::zeros(shape),
            Self::Ones => Tensor::ones(shape),
            Self::Normal { mean, std } => Tensor::new_normal_with_rng(*mean, *std, shape, rng),
            Self::Kaiming => {
                let std = Self::kaiming_std(shape);
                Tensor::new_normal_with_rng(0.0, std, shape, rng)
            }
        }
    }

    /// 卷积核形状为[C_out, C_in/groups, kH, kW]时，fan_in取后三维的乘积
    fn kaiming_std(shape: &[usize]) -> f32 {
        let fan_in = if shape.len() > 1 {
            shape[1..].iter().product::<usize>()
        } else {
            shape[0]
        };
        (2.0 / fan_in as f32).sqrt()
    }
}
