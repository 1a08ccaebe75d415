/*
 * @Author       : 老董
 * @Date         : 2026-02-11
 * @Description  : 负责搜索空间算子（operator）的构建与分发。
 *                 注册表是进程级不可变的固定名称集合（见`OP_NAMES`），
 *                 分发采用enum（标签联合）而非反射或函数指针表。
 */

mod aspp;
mod batch_norm;
mod conv_blocks;
pub mod functional;
mod init;
mod pool;
mod primitive;

pub use aspp::{ASPP, ASPP_DEFAULT_MOMENTUM};
pub use batch_norm::BatchNorm2d;
pub use conv_blocks::{DilConv, FactorizedReduce, ReLUConvBN, SepConv};
pub use init::Init;
pub use pool::{AvgPool2d, MaxPool2d};
pub use primitive::{Identity, Zero};

#[cfg(test)]
mod tests;

use crate::errors::OpError;
use crate::tensor::Tensor;
use enum_dispatch::enum_dispatch;
use rand::rngs::StdRng;

/// 注册表中固定的算子名集合（顺序与DARTS的OPS表一致）
pub const OP_NAMES: [&str; 8] = [
    "none",
    "avg_pool_3x3",
    "max_pool_3x3",
    "skip_connect",
    "sep_conv_3x3",
    "sep_conv_5x5",
    "dil_conv_3x3",
    "dil_conv_5x5",
];

/// 注册表算子惯用的归一化默认超参
pub const DEFAULT_BN_EPS: f32 = 1e-3;
pub const DEFAULT_BN_MOMENTUM: f32 = 3e-4;

/// 统一的算子前向接口：给定4D输入张量，产出4D输出张量。
/// 算子构建后结构不再变化（参数张量的生命周期与其所属算子一致）。
#[enum_dispatch(Op)]
pub trait TraitOp {
    /// 前向：[batch, C_in, H, W] -> [batch, C_out, H', W']
    fn forward(&mut self, input: &Tensor) -> Result<Tensor, OpError>;

    /// 可学习参数总量（用于搜索代价统计）；无参数算子为0
    fn param_count(&self) -> usize {
        0
    }
}

/// 注册表可构建的算子（标签联合分发）
#[enum_dispatch]
#[derive(Debug, Clone)]
pub enum Op {
    Zero(Zero),
    Identity(Identity),
    AvgPool2d(AvgPool2d),
    MaxPool2d(MaxPool2d),
    ReLUConvBN(ReLUConvBN),
    DilConv(DilConv),
    SepConv(SepConv),
    FactorizedReduce(FactorizedReduce),
}

impl Op {
    /// 按名称构建算子（注册表查询）。
    ///
    /// # 参数
    /// - `name`: 算子名，必须在`OP_NAMES`内，否则返回`UnknownOperator`且不构建任何东西
    /// - `c`: 通道数（注册表算子均为通道保持，C_in == C_out == c）
    /// - `stride`: 空间降采样步长
    /// - `eps` / `momentum` / `affine`: 归一化超参
    ///
    /// 除算子名外不做任何校验：越界的`stride`或`c`将在所构建算子的前向中
    /// 以`ShapeMismatch`等形式暴露。
    pub fn build(
        name: &str,
        c: usize,
        stride: usize,
        eps: f32,
        momentum: f32,
        affine: bool,
    ) -> Result<Op, OpError> {
        let op = match name {
            "none" => Zero::new(stride).into(),
            "avg_pool_3x3" => AvgPool2d::new((3, 3), (stride, stride), (1, 1)).into(),
            "max_pool_3x3" => MaxPool2d::new((3, 3), (stride, stride), (1, 1)).into(),
            // stride=1时为恒等直通；stride>1时为通道保持的空间降采样
            "skip_connect" => {
                if stride == 1 {
                    Identity::new().into()
                } else {
                    FactorizedReduce::new(c, c, eps, momentum, affine)?.into()
                }
            }
            "sep_conv_3x3" => SepConv::new(c, c, 3, stride, 1, eps, momentum, affine).into(),
            "sep_conv_5x5" => SepConv::new(c, c, 5, stride, 2, eps, momentum, affine).into(),
            "dil_conv_3x3" => DilConv::new(c, c, 3, stride, 2, 2, eps, momentum, affine).into(),
            "dil_conv_5x5" => DilConv::new(c, c, 5, stride, 4, 2, eps, momentum, affine).into(),
            _ => return Err(OpError::UnknownOperator(name.to_string())),
        };
        Ok(op)
    }

    /// 按名称构建算子（带RNG，确保可重复性）
    pub fn build_with_rng(
        name: &str,
        c: usize,
        stride: usize,
        eps: f32,
        momentum: f32,
        affine: bool,
        rng: &mut StdRng,
    ) -> Result<Op, OpError> {
        let op = match name {
            "none" => Zero::new(stride).into(),
            "avg_pool_3x3" => AvgPool2d::new((3, 3), (stride, stride), (1, 1)).into(),
            "max_pool_3x3" => MaxPool2d::new((3, 3), (stride, stride), (1, 1)).into(),
            "skip_connect" => {
                if stride == 1 {
                    Identity::new().into()
                } else {
                    FactorizedReduce::new_with_rng(c, c, eps, momentum, affine, rng)?.into()
                }
            }
            "sep_conv_3x3" => {
                SepConv::new_with_rng(c, c, 3, stride, 1, eps, momentum, affine, rng).into()
            }
            "sep_conv_5x5" => {
                SepConv::new_with_rng(c, c, 5, stride, 2, eps, momentum, affine, rng).into()
            }
            "dil_conv_3x3" => {
                DilConv::new_with_rng(c, c, 3, stride, 2, 2, eps, momentum, affine, rng).into()
            }
            "dil_conv_5x5" => {
                DilConv::new_with_rng(c, c, 5, stride, 4, 2, eps, momentum, affine, rng).into()
            }
            _ => return Err(OpError::UnknownOperator(name.to_string())),
        };
        Ok(op)
    }

    /// 算子种类名（用于日志/展示）
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Zero(_) => "zero",
            Self::Identity(_) => "identity",
            Self::AvgPool2d(_) => "avg_pool",
            Self::MaxPool2d(_) => "max_pool",
            Self::ReLUConvBN(_) => "relu_conv_bn",
            Self::DilConv(_) => "dil_conv",
            Self::SepConv(_) => "sep_conv",
            Self::FactorizedReduce(_) => "factorized_reduce",
        }
    }
}
