/*
 * @Author       : 老董
 * @Date         : 2026-02-11
 * @Description  : 纯前向的函数式核（kernel）：卷积、池化、全局平均池化与双线性上采样。
 *
 * 设计决策：
 * - Batch-First 格式：输入必须是 4D [batch, C, H, W]
 * - 卷积统一支持 stride / padding / dilation / groups（groups == C_in 即深度卷积），无偏置
 * - 平均池化不把padding计入分母（对应PyTorch的`count_include_pad=False`）
 * - 最大池化的padding区域不参与取最大（等价于用-inf填充）
 * - 使用 Rayon 在 batch 维度并行加速
 */

use crate::errors::OpError;
use crate::tensor::Tensor;
use rayon::prelude::*;

/// 校验输入为4D并拆出(batch, C, H, W)
fn check_4d(input: &Tensor, op_name: &str) -> Result<(usize, usize, usize, usize), OpError> {
    let shape = input.shape();
    if shape.len() != 4 {
        return Err(OpError::ShapeMismatch {
            expected: vec![0, 0, 0, 0],
            got: shape.to_vec(),
            message: format!("{op_name}输入必须是4D [batch, C, H, W]。单样本请使用[1, C, H, W]"),
        });
    }
    Ok((shape[0], shape[1], shape[2], shape[3]))
}

/// 对输入进行零填充（Rayon并行版本）
fn pad_input(input: &Tensor, padding: (usize, usize)) -> Tensor {
    let (pad_h, pad_w) = padding;
    if pad_h == 0 && pad_w == 0 {
        return input.clone();
    }

    let shape = input.shape();
    let (batch_size, c, h, w) = (shape[0], shape[1], shape[2], shape[3]);
    let new_h = h + 2 * pad_h;
    let new_w = w + 2 * pad_w;
    let single_sample_size = c * new_h * new_w;

    let batch_results: Vec<Vec<f32>> = (0..batch_size)
        .into_par_iter()
        .map(|bi| {
            let mut sample_data = vec![0.0f32; single_sample_size];
            for ci in 0..c {
                for hi in 0..h {
                    for wi in 0..w {
                        let idx = ci * new_h * new_w + (hi + pad_h) * new_w + (wi + pad_w);
                        sample_data[idx] = input[[bi, ci, hi, wi]];
                    }
                }
            }
            sample_data
        })
        .collect();

    let all_data: Vec<f32> = batch_results.into_iter().flatten().collect();
    Tensor::new(&all_data, &[batch_size, c, new_h, new_w])
}

/// 2D卷积（无偏置），支持stride/padding/dilation/groups。
///
/// # 形状约定
/// - 输入：[batch, C_in, H, W]
/// - 卷积核：[C_out, C_in/groups, kH, kW]
/// - 输出：[batch, C_out, H', W']，其中
///   H' = (H + 2*pH - dH*(kH-1) - 1) / sH + 1
pub fn conv2d(
    input: &Tensor,
    kernel: &Tensor,
    stride: (usize, usize),
    padding: (usize, usize),
    dilation: (usize, usize),
    groups: usize,
) -> Result<Tensor, OpError> {
    // 1. 校验输入与卷积核均为4D
    let (batch_size, in_c, in_h, in_w) = check_4d(input, "conv2d")?;
    let kernel_shape = kernel.shape();
    if kernel_shape.len() != 4 {
        return Err(OpError::ShapeMismatch {
            expected: vec![0, 0, 0, 0],
            got: kernel_shape.to_vec(),
            message: "卷积核必须是4D [C_out, C_in/groups, kH, kW]".to_string(),
        });
    }
    let (out_c, kernel_in_c, kernel_h, kernel_w) = (
        kernel_shape[0],
        kernel_shape[1],
        kernel_shape[2],
        kernel_shape[3],
    );

    // 2. 校验分组配置
    if groups == 0 || in_c % groups != 0 || out_c % groups != 0 {
        return Err(OpError::InvalidConfiguration(format!(
            "分组数{groups}必须能整除输入通道数{in_c}与输出通道数{out_c}"
        )));
    }
    let in_per_group = in_c / groups;
    if kernel_in_c != in_per_group {
        return Err(OpError::ShapeMismatch {
            expected: vec![out_c, in_per_group, kernel_h, kernel_w],
            got: kernel_shape.to_vec(),
            message: format!("卷积核通道数{kernel_in_c}与输入通道数/分组数{in_per_group}不匹配"),
        });
    }

    // 3. 计算输出尺寸（考虑dilation的有效核尺寸）
    let (stride_h, stride_w) = stride;
    let (pad_h, pad_w) = padding;
    let (dil_h, dil_w) = dilation;
    let eff_kernel_h = dil_h * (kernel_h - 1) + 1;
    let eff_kernel_w = dil_w * (kernel_w - 1) + 1;
    if in_h + 2 * pad_h < eff_kernel_h || in_w + 2 * pad_w < eff_kernel_w {
        return Err(OpError::ShapeMismatch {
            expected: vec![eff_kernel_h, eff_kernel_w],
            got: vec![in_h + 2 * pad_h, in_w + 2 * pad_w],
            message: format!(
                "卷积核（含dilation）{eff_kernel_h}x{eff_kernel_w}超出填充后的输入尺寸"
            ),
        });
    }
    let out_h = (in_h + 2 * pad_h - eff_kernel_h) / stride_h + 1;
    let out_w = (in_w + 2 * pad_w - eff_kernel_w) / stride_w + 1;

    // 4. 填充后逐batch并行卷积
    let padded = pad_input(input, padding);
    let out_per_group = out_c / groups;
    let single_sample_size = out_c * out_h * out_w;

    let batch_results: Vec<Vec<f32>> = (0..batch_size)
        .into_par_iter()
        .map(|b| {
            let mut sample_data = vec![0.0f32; single_sample_size];
            for oc in 0..out_c {
                let group = oc / out_per_group;
                let ic_base = group * in_per_group;
                for oh in 0..out_h {
                    for ow in 0..out_w {
                        let mut sum = 0.0f32;
                        let h_start = oh * stride_h;
                        let w_start = ow * stride_w;

                        for ic_offset in 0..in_per_group {
                            for kh in 0..kernel_h {
                                for kw in 0..kernel_w {
                                    let input_val = padded[[
                                        b,
                                        ic_base + ic_offset,
                                        h_start + kh * dil_h,
                                        w_start + kw * dil_w,
                                    ]];
                                    sum += input_val * kernel[[oc, ic_offset, kh, kw]];
                                }
                            }
                        }
                        sample_data[oc * out_h * out_w + oh * out_w + ow] = sum;
                    }
                }
            }
            sample_data
        })
        .collect();

    let all_data: Vec<f32> = batch_results.into_iter().flatten().collect();
    Ok(Tensor::new(
        &all_data,
        &[batch_size, out_c, out_h, out_w],
    ))
}

/// 2D平均池化。padding区域不计入分母（`count_include_pad=False`）。
pub fn avg_pool2d(
    input: &Tensor,
    kernel_size: (usize, usize),
    stride: (usize, usize),
    padding: (usize, usize),
) -> Result<Tensor, OpError> {
    pool2d(input, kernel_size, stride, padding, PoolKind::Avg)
}

/// 2D最大池化。padding区域不参与取最大。
pub fn max_pool2d(
    input: &Tensor,
    kernel_size: (usize, usize),
    stride: (usize, usize),
    padding: (usize, usize),
) -> Result<Tensor, OpError> {
    pool2d(input, kernel_size, stride, padding, PoolKind::Max)
}

#[derive(Clone, Copy)]
enum PoolKind {
    Avg,
    Max,
}

fn pool2d(
    input: &Tensor,
    kernel_size: (usize, usize),
    stride: (usize, usize),
    padding: (usize, usize),
    kind: PoolKind,
) -> Result<Tensor, OpError> {
    // 1. 校验输入形状
    let (batch_size, channels, in_h, in_w) = check_4d(input, "pool2d")?;
    let (kernel_h, kernel_w) = kernel_size;
    let (stride_h, stride_w) = stride;
    let (pad_h, pad_w) = padding;

    // 2. 校验池化窗口不超过填充后的输入尺寸
    if kernel_h > in_h + 2 * pad_h || kernel_w > in_w + 2 * pad_w {
        return Err(OpError::ShapeMismatch {
            expected: vec![kernel_h, kernel_w],
            got: vec![in_h + 2 * pad_h, in_w + 2 * pad_w],
            message: format!("池化窗口{kernel_h}x{kernel_w}超出填充后的输入尺寸"),
        });
    }
    let out_h = (in_h + 2 * pad_h - kernel_h) / stride_h + 1;
    let out_w = (in_w + 2 * pad_w - kernel_w) / stride_w + 1;

    // 3. 逐batch并行池化（窗口在“虚拟填充”坐标系上滑动，只访问界内元素）
    let single_sample_size = channels * out_h * out_w;
    let batch_results: Vec<Vec<f32>> = (0..batch_size)
        .into_par_iter()
        .map(|b| {
            let mut sample_data = vec![0.0f32; single_sample_size];
            for c in 0..channels {
                for oh in 0..out_h {
                    for ow in 0..out_w {
                        let h_start = oh * stride_h;
                        let w_start = ow * stride_w;

                        let mut sum = 0.0f32;
                        let mut max = f32::NEG_INFINITY;
                        let mut count = 0usize;
                        for kh in 0..kernel_h {
                            for kw in 0..kernel_w {
                                // 虚拟填充坐标 -> 原始坐标（越界即处于padding区）
                                let h = (h_start + kh).checked_sub(pad_h);
                                let w = (w_start + kw).checked_sub(pad_w);
                                if let (Some(h), Some(w)) = (h, w) {
                                    if h < in_h && w < in_w {
                                        let val = input[[b, c, h, w]];
                                        sum += val;
                                        max = max.max(val);
                                        count += 1;
                                    }
                                }
                            }
                        }

                        let result = match kind {
                            PoolKind::Avg => {
                                if count == 0 {
                                    0.0
                                } else {
                                    sum / count as f32
                                }
                            }
                            PoolKind::Max => max,
                        };
                        sample_data[c * out_h * out_w + oh * out_w + ow] = result;
                    }
                }
            }
            sample_data
        })
        .collect();

    let all_data: Vec<f32> = batch_results.into_iter().flatten().collect();
    Ok(Tensor::new(
        &all_data,
        &[batch_size, channels, out_h, out_w],
    ))
}

/// 全局平均池化：[batch, C, H, W] -> [batch, C, 1, 1]
pub fn global_avg_pool(input: &Tensor) -> Result<Tensor, OpError> {
    let (batch_size, channels, in_h, in_w) = check_4d(input, "global_avg_pool")?;
    let spatial_size = (in_h * in_w) as f32;

    let mut data = Vec::with_capacity(batch_size * channels);
    for b in 0..batch_size {
        for c in 0..channels {
            let mut sum = 0.0f32;
            for h in 0..in_h {
                for w in 0..in_w {
                    sum += input[[b, c, h, w]];
                }
            }
            data.push(sum / spatial_size);
        }
    }
    Ok(Tensor::new(&data, &[batch_size, channels, 1, 1]))
}

/// 双线性上采样（角点对齐，对应PyTorch的`align_corners=True`）：
/// [batch, C, H, W] -> [batch, C, out_h, out_w]
pub fn upsample_bilinear(input: &Tensor, out_h: usize, out_w: usize) -> Result<Tensor, OpError> {
    let (batch_size, channels, in_h, in_w) = check_4d(input, "upsample_bilinear")?;
    if out_h == 0 || out_w == 0 {
        return Err(OpError::InvalidConfiguration(
            "上采样的目标尺寸必须为正".to_string(),
        ));
    }

    // 角点对齐：首尾像素精确落在原图首尾像素上
    let scale_h = if out_h > 1 {
        (in_h - 1) as f32 / (out_h - 1) as f32
    } else {
        0.0
    };
    let scale_w = if out_w > 1 {
        (in_w - 1) as f32 / (out_w - 1) as f32
    } else {
        0.0
    };

    let mut data = Vec::with_capacity(batch_size * channels * out_h * out_w);
    for b in 0..batch_size {
        for c in 0..channels {
            for oh in 0..out_h {
                let src_h = oh as f32 * scale_h;
                let h0 = src_h.floor() as usize;
                let h1 = (h0 + 1).min(in_h - 1);
                let weight_h = src_h - h0 as f32;
                for ow in 0..out_w {
                    let src_w = ow as f32 * scale_w;
                    let w0 = src_w.floor() as usize;
                    let w1 = (w0 + 1).min(in_w - 1);
                    let weight_w = src_w - w0 as f32;

                    let top = input[[b, c, h0, w0]] * (1.0 - weight_w)
                        + input[[b, c, h0, w1]] * weight_w;
                    let bottom = input[[b, c, h1, w0]] * (1.0 - weight_w)
                        + input[[b, c, h1, w1]] * weight_w;
                    data.push(top * (1.0 - weight_h) + bottom * weight_h);
                }
            }
        }
    }
    Ok(Tensor::new(
        &data,
        &[batch_size, channels, out_h, out_w],
    ))
}
