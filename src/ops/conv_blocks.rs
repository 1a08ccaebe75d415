/*
 * @Author       : 老董
 * @Date         : 2026-02-11
 * @Description  : 卷积类复合算子，统一遵循“激活 -> 卷积 -> 归一化”的固定流水线：
 *                 - ReLUConvBN：经典conv块（relu -> conv -> bn）
 *                 - DilConv：空洞深度可分离卷积（relu -> 深度空洞卷积 -> 1x1混合 -> bn）
 *                 - SepConv：两段堆叠的深度可分离卷积（第二段恒为stride=1）
 *                 - FactorizedReduce：stride=2的通道保持降采样（两路半通道1x1卷积拼接）
 *
 * 所有卷积核均为Kaiming初始化、无偏置；形状契约见各结构体文档。
 */

use crate::errors::OpError;
use crate::ops::{BatchNorm2d, Init, TraitOp, functional};
use crate::tensor::Tensor;
use rand::rngs::StdRng;

/// 经典conv块：relu -> conv(kernel, stride, padding, 无偏置) -> bn
///
/// # 形状
/// - 输入：[batch, C_in, H, W]
/// - 输出：[batch, C_out, (H + 2p - k)/s + 1, (W + 2p - k)/s + 1]
#[derive(Debug, Clone)]
pub struct ReLUConvBN {
    /// 卷积核 [C_out, C_in, k, k]
    kernel: Tensor,
    stride: usize,
    padding: usize,
    bn: BatchNorm2d,
}

impl ReLUConvBN {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        c_in: usize,
        c_out: usize,
        kernel_size: usize,
        stride: usize,
        padding: usize,
        eps: f32,
        momentum: f32,
        affine: bool,
    ) -> Self {
        Self::with_generator(c_in, c_out, kernel_size, stride, padding, eps, momentum, affine, |shape| {
            Init::Kaiming.generate(shape)
        })
    }

    /// 带RNG的构建（确保可重复性）
    #[allow(clippy::too_many_arguments)]
    pub fn new_with_rng(
        c_in: usize,
        c_out: usize,
        kernel_size: usize,
        stride: usize,
        padding: usize,
        eps: f32,
        momentum: f32,
        affine: bool,
        rng: &mut StdRng,
    ) -> Self {
        Self::with_generator(c_in, c_out, kernel_size, stride, padding, eps, momentum, affine, |shape| {
            Init::Kaiming.generate_with_rng(shape, rng)
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn with_generator(
        c_in: usize,
        c_out: usize,
        kernel_size: usize,
        stride: usize,
        padding: usize,
        eps: f32,
        momentum: f32,
        affine: bool,
        mut generate: impl FnMut(&[usize]) -> Tensor,
    ) -> Self {
        Self {
            kernel: generate(&[c_out, c_in, kernel_size, kernel_size]),
            stride,
            padding,
            bn: BatchNorm2d::new(c_out, eps, momentum, affine),
        }
    }
}

impl TraitOp for ReLUConvBN {
    fn forward(&mut self, input: &Tensor) -> Result<Tensor, OpError> {
        let activated = input.relu();
        let convolved = functional::conv2d(
            &activated,
            &self.kernel,
            (self.stride, self.stride),
            (self.padding, self.padding),
            (1, 1),
            1,
        )?;
        self.bn.forward(&convolved)
    }

    fn param_count(&self) -> usize {
        self.kernel.size() + self.bn.param_count()
    }
}

/// 空洞深度可分离卷积：relu -> 深度空洞卷积（groups=C_in，不混合通道）
/// -> 1x1通道混合卷积 -> bn。
/// dilation在不按比例增加参数的前提下扩大感受野。
#[derive(Debug, Clone)]
pub struct DilConv {
    /// 深度卷积核 [C_in, 1, k, k]
    depthwise: Tensor,
    /// 1x1混合卷积核 [C_out, C_in, 1, 1]
    pointwise: Tensor,
    stride: usize,
    padding: usize,
    dilation: usize,
    /// 分组数，恒等于C_in
    groups: usize,
    bn: BatchNorm2d,
}

impl DilConv {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        c_in: usize,
        c_out: usize,
        kernel_size: usize,
        stride: usize,
        padding: usize,
        dilation: usize,
        eps: f32,
        momentum: f32,
        affine: bool,
    ) -> Self {
        Self::with_generator(
            c_in, c_out, kernel_size, stride, padding, dilation, eps, momentum, affine,
            |shape| Init::Kaiming.generate(shape),
        )
    }

    /// 带RNG的构建（确保可重复性）
    #[allow(clippy::too_many_arguments)]
    pub fn new_with_rng(
        c_in: usize,
        c_out: usize,
        kernel_size: usize,
        stride: usize,
        padding: usize,
        dilation: usize,
        eps: f32,
        momentum: f32,
        affine: bool,
        rng: &mut StdRng,
    ) -> Self {
        Self::with_generator(
            c_in, c_out, kernel_size, stride, padding, dilation, eps, momentum, affine,
            |shape| Init::Kaiming.generate_with_rng(shape, rng),
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn with_generator(
        c_in: usize,
        c_out: usize,
        kernel_size: usize,
        stride: usize,
        padding: usize,
        dilation: usize,
        eps: f32,
        momentum: f32,
        affine: bool,
        mut generate: impl FnMut(&[usize]) -> Tensor,
    ) -> Self {
        Self {
            depthwise: generate(&[c_in, 1, kernel_size, kernel_size]),
            pointwise: generate(&[c_out, c_in, 1, 1]),
            stride,
            padding,
            dilation,
            groups: c_in,
            bn: BatchNorm2d::new(c_out, eps, momentum, affine),
        }
    }
}

impl TraitOp for DilConv {
    fn forward(&mut self, input: &Tensor) -> Result<Tensor, OpError> {
        let activated = input.relu();
        let spatial = functional::conv2d(
            &activated,
            &self.depthwise,
            (self.stride, self.stride),
            (self.padding, self.padding),
            (self.dilation, self.dilation),
            self.groups,
        )?;
        let mixed = functional::conv2d(&spatial, &self.pointwise, (1, 1), (0, 0), (1, 1), 1)?;
        self.bn.forward(&mixed)
    }

    fn param_count(&self) -> usize {
        self.depthwise.size() + self.pointwise.size() + self.bn.param_count()
    }
}

/// 两段堆叠的深度可分离卷积：
/// [relu -> 深度卷积(k, stride, p) -> 1x1混合 -> bn] 之后再接一段恒为stride=1的同构块。
/// 以远少于完整卷积的参数量近似之，两段堆叠是增大有效感受野/容量的标准设计。
#[derive(Debug, Clone)]
pub struct SepConv {
    /// 第一段深度卷积核 [C_in, 1, k, k]（stride可降分辨率）
    depthwise_1: Tensor,
    /// 第一段1x1混合核 [C_in, C_in, 1, 1]
    pointwise_1: Tensor,
    bn_1: BatchNorm2d,
    /// 第二段深度卷积核 [C_in, 1, k, k]（恒为stride=1）
    depthwise_2: Tensor,
    /// 第二段1x1混合核 [C_out, C_in, 1, 1]
    pointwise_2: Tensor,
    bn_2: BatchNorm2d,
    stride: usize,
    padding: usize,
    /// 分组数，恒等于C_in
    groups: usize,
}

impl SepConv {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        c_in: usize,
        c_out: usize,
        kernel_size: usize,
        stride: usize,
        padding: usize,
        eps: f32,
        momentum: f32,
        affine: bool,
    ) -> Self {
        Self::with_generator(c_in, c_out, kernel_size, stride, padding, eps, momentum, affine, |shape| {
            Init::Kaiming.generate(shape)
        })
    }

    /// 带RNG的构建（确保可重复性）
    #[allow(clippy::too_many_arguments)]
    pub fn new_with_rng(
        c_in: usize,
        c_out: usize,
        kernel_size: usize,
        stride: usize,
        padding: usize,
        eps: f32,
        momentum: f32,
        affine: bool,
        rng: &mut StdRng,
    ) -> Self {
        Self::with_generator(c_in, c_out, kernel_size, stride, padding, eps, momentum, affine, |shape| {
            Init::Kaiming.generate_with_rng(shape, rng)
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn with_generator(
        c_in: usize,
        c_out: usize,
        kernel_size: usize,
        stride: usize,
        padding: usize,
        eps: f32,
        momentum: f32,
        affine: bool,
        mut generate: impl FnMut(&[usize]) -> Tensor,
    ) -> Self {
        Self {
            depthwise_1: generate(&[c_in, 1, kernel_size, kernel_size]),
            pointwise_1: generate(&[c_in, c_in, 1, 1]),
            bn_1: BatchNorm2d::new(c_in, eps, momentum, affine),
            depthwise_2: generate(&[c_in, 1, kernel_size, kernel_size]),
            pointwise_2: generate(&[c_out, c_in, 1, 1]),
            bn_2: BatchNorm2d::new(c_out, eps, momentum, affine),
            stride,
            padding,
            groups: c_in,
        }
    }
}

impl TraitOp for SepConv {
    fn forward(&mut self, input: &Tensor) -> Result<Tensor, OpError> {
        // 第一段（stride可能降分辨率）
        let activated = input.relu();
        let spatial = functional::conv2d(
            &activated,
            &self.depthwise_1,
            (self.stride, self.stride),
            (self.padding, self.padding),
            (1, 1),
            self.groups,
        )?;
        let mixed = functional::conv2d(&spatial, &self.pointwise_1, (1, 1), (0, 0), (1, 1), 1)?;
        let normalized = self.bn_1.forward(&mixed)?;

        // 第二段（恒为stride=1）
        let activated = normalized.relu();
        let spatial = functional::conv2d(
            &activated,
            &self.depthwise_2,
            (1, 1),
            (self.padding, self.padding),
            (1, 1),
            self.groups,
        )?;
        let mixed = functional::conv2d(&spatial, &self.pointwise_2, (1, 1), (0, 0), (1, 1), 1)?;
        self.bn_2.forward(&mixed)
    }

    fn param_count(&self) -> usize {
        self.depthwise_1.size()
            + self.pointwise_1.size()
            + self.bn_1.param_count()
            + self.depthwise_2.size()
            + self.pointwise_2.size()
            + self.bn_2.param_count()
    }
}

/// stride=2的通道保持降采样：relu后走两路半通道的1x1、stride=2卷积——
/// 一路直接作用于输入，另一路作用于裁掉首行首列的偏移输入——
/// 两路输出沿通道拼接回C_out，再归一化。
/// 要求C_out为偶数，否则构建即失败（`InvalidConfiguration`）。
// TODO: 为何拆成两路偏移裁剪的卷积而非单个stride=2卷积？现保留原始行为：
//       两路分别采样两个不同像素相位的子网格，比单路保留更多空间信息。
#[derive(Debug, Clone)]
pub struct FactorizedReduce {
    /// 第一路卷积核 [C_out/2, C_in, 1, 1]
    conv_1: Tensor,
    /// 第二路（偏移）卷积核 [C_out/2, C_in, 1, 1]
    conv_2: Tensor,
    bn: BatchNorm2d,
}

impl FactorizedReduce {
    pub fn new(
        c_in: usize,
        c_out: usize,
        eps: f32,
        momentum: f32,
        affine: bool,
    ) -> Result<Self, OpError> {
        Self::with_generator(c_in, c_out, eps, momentum, affine, |shape| {
            Init::Kaiming.generate(shape)
        })
    }

    /// 带RNG的构建（确保可重复性）
    pub fn new_with_rng(
        c_in: usize,
        c_out: usize,
        eps: f32,
        momentum: f32,
        affine: bool,
        rng: &mut StdRng,
    ) -> Result<Self, OpError> {
        Self::with_generator(c_in, c_out, eps, momentum, affine, |shape| {
            Init::Kaiming.generate_with_rng(shape, rng)
        })
    }

    fn with_generator(
        c_in: usize,
        c_out: usize,
        eps: f32,
        momentum: f32,
        affine: bool,
        mut generate: impl FnMut(&[usize]) -> Tensor,
    ) -> Result<Self, OpError> {
        // 奇数C_out无法两路均分，在任何张量计算发生前即报错
        if c_out % 2 != 0 {
            return Err(OpError::InvalidConfiguration(format!(
                "FactorizedReduce要求输出通道数为偶数，实际为{c_out}"
            )));
        }
        Ok(Self {
            conv_1: generate(&[c_out / 2, c_in, 1, 1]),
            conv_2: generate(&[c_out / 2, c_in, 1, 1]),
            bn: BatchNorm2d::new(c_out, eps, momentum, affine),
        })
    }
}

impl TraitOp for FactorizedReduce {
    fn forward(&mut self, input: &Tensor) -> Result<Tensor, OpError> {
        let activated = input.relu();
        let half_1 = functional::conv2d(&activated, &self.conv_1, (2, 2), (0, 0), (1, 1), 1)?;
        let half_2 = functional::conv2d(
            &activated.crop_offset(1, 1),
            &self.conv_2,
            (2, 2),
            (0, 0),
            (1, 1),
            1,
        )?;
        let concatenated = Tensor::concat_channels(&[&half_1, &half_2])?;
        self.bn.forward(&concatenated)
    }

    fn param_count(&self) -> usize {
        self.conv_1.size() + self.conv_2.size() + self.bn.param_count()
    }
}
