/*
 * @Author       : 老董
 * @Date         : 2026-02-11
 * @Description  : ASPP（Atrous Spatial Pyramid Pooling）多尺度池化头
 *
 * 三条并行分支作用于同一输入：
 * - 1x1卷积 + bn + relu
 * - 3x3空洞/填充卷积 + bn + relu
 * - 全局平均池化 -> 1x1卷积 + bn + relu -> 双线性上采样（角点对齐）回原空间尺寸
 * 三路输出沿通道拼接（3*C_in），经1x1融合卷积 + bn + relu，
 * 最后用1x1投影卷积映射到C_out。各分支之间不共享任何可学习参数。
 *
 * 注：与注册表算子不同，本模块遵循“卷积 -> 归一化 -> 激活”的顺序，
 * 且归一化momentum独立可配（默认`ASPP_DEFAULT_MOMENTUM`）。
 */

use crate::errors::OpError;
use crate::ops::{BatchNorm2d, Init, TraitOp, functional};
use crate::tensor::Tensor;
use rand::rngs::StdRng;

/// ASPP归一化momentum的独立默认值
pub const ASPP_DEFAULT_MOMENTUM: f32 = 3e-4;

/// ASPP内部批归一化的数值稳定常数
const ASPP_BN_EPS: f32 = 1e-5;

/// ASPP多尺度池化头
///
/// # 形状
/// - 输入：[batch, C_in, H, W]
/// - 输出：[batch, C_out, H, W]（空间尺寸恒等于输入，上采样分支会精确还原）
#[derive(Debug, Clone)]
pub struct ASPP {
    /// 1x1分支卷积核 [C_in, C_in, 1, 1]
    conv_1x1: Tensor,
    bn_1x1: BatchNorm2d,
    /// 3x3空洞分支卷积核 [C_in, C_in, 3, 3]
    conv_3x3: Tensor,
    bn_3x3: BatchNorm2d,
    padding: usize,
    dilation: usize,
    /// 全局池化分支卷积核 [C_in, C_in, 1, 1]
    conv_pool: Tensor,
    bn_pool: BatchNorm2d,
    /// 融合卷积核 [C_in, 3*C_in, 1, 1]
    conv_fuse: Tensor,
    bn_fuse: BatchNorm2d,
    /// 最终投影卷积核 [C_out, C_in, 1, 1]
    conv_final: Tensor,
}

impl ASPP {
    pub fn new(
        in_channels: usize,
        out_channels: usize,
        padding: usize,
        dilation: usize,
        momentum: f32,
    ) -> Self {
        Self::with_generator(in_channels, out_channels, padding, dilation, momentum, |shape| {
            Init::Kaiming.generate(shape)
        })
    }

    /// 带RNG的构建（确保可重复性）
    pub fn new_with_rng(
        in_channels: usize,
        out_channels: usize,
        padding: usize,
        dilation: usize,
        momentum: f32,
        rng: &mut StdRng,
    ) -> Self {
        Self::with_generator(in_channels, out_channels, padding, dilation, momentum, |shape| {
            Init::Kaiming.generate_with_rng(shape, rng)
        })
    }

    fn with_generator(
        in_channels: usize,
        out_channels: usize,
        padding: usize,
        dilation: usize,
        momentum: f32,
        mut generate: impl FnMut(&[usize]) -> Tensor,
    ) -> Self {
        let bn = |c: usize| BatchNorm2d::new(c, ASPP_BN_EPS, momentum, true);
        Self {
            conv_1x1: generate(&[in_channels, in_channels, 1, 1]),
            bn_1x1: bn(in_channels),
            conv_3x3: generate(&[in_channels, in_channels, 3, 3]),
            bn_3x3: bn(in_channels),
            padding,
            dilation,
            conv_pool: generate(&[in_channels, in_channels, 1, 1]),
            bn_pool: bn(in_channels),
            conv_fuse: generate(&[in_channels, 3 * in_channels, 1, 1]),
            bn_fuse: bn(in_channels),
            conv_final: generate(&[out_channels, in_channels, 1, 1]),
        }
    }
}

impl TraitOp for ASPP {
    fn forward(&mut self, input: &Tensor) -> Result<Tensor, OpError> {
        let shape = input.shape();
        if shape.len() != 4 {
            return Err(OpError::ShapeMismatch {
                expected: vec![0, 0, 0, 0],
                got: shape.to_vec(),
                message: "ASPP输入必须是4D [batch, C, H, W]".to_string(),
            });
        }
        let (in_h, in_w) = (shape[2], shape[3]);

        // 分支一：1x1卷积
        let branch_1x1 = self
            .bn_1x1
            .forward(&functional::conv2d(input, &self.conv_1x1, (1, 1), (0, 0), (1, 1), 1)?)?
            .relu();

        // 分支二：3x3空洞卷积
        let branch_3x3 = self
            .bn_3x3
            .forward(&functional::conv2d(
                input,
                &self.conv_3x3,
                (1, 1),
                (self.padding, self.padding),
                (self.dilation, self.dilation),
                1,
            )?)?
            .relu();

        // 分支三：全局池化 -> 1x1卷积 -> 上采样回原尺寸
        let pooled = functional::global_avg_pool(input)?;
        let pooled = self
            .bn_pool
            .forward(&functional::conv2d(&pooled, &self.conv_pool, (1, 1), (0, 0), (1, 1), 1)?)?
            .relu();
        let branch_pool = functional::upsample_bilinear(&pooled, in_h, in_w)?;

        // 拼接 -> 融合 -> 最终投影
        let concatenated = Tensor::concat_channels(&[&branch_1x1, &branch_3x3, &branch_pool])?;
        let fused = self
            .bn_fuse
            .forward(&functional::conv2d(&concatenated, &self.conv_fuse, (1, 1), (0, 0), (1, 1), 1)?)?
            .relu();
        functional::conv2d(&fused, &self.conv_final, (1, 1), (0, 0), (1, 1), 1)
    }

    fn param_count(&self) -> usize {
        self.conv_1x1.size()
            + self.bn_1x1.param_count()
            + self.conv_3x3.size()
            + self.bn_3x3.param_count()
            + self.conv_pool.size()
            + self.bn_pool.param_count()
            + self.conv_fuse.size()
            + self.bn_fuse.param_count()
            + self.conv_final.size()
    }
}
