/*
 * @Author       : 老董
 * @Date         : 2026-02-11
 * @Description  : conv2d核的单元测试（含PyTorch数值对照，参考值为手算）
 */

use crate::errors::OpError;
use crate::ops::functional::conv2d;
use crate::tensor::Tensor;
use approx::assert_abs_diff_eq;

// 测试1：简单前向 (batch=1, C_in=1, H=4, W=4, C_out=2, kernel=2x2, 无偏置)
#[rustfmt::skip]
const FWD_X: &[f32] = &[
    1.0, 2.0, 3.0, 4.0,
    5.0, 6.0, 7.0, 8.0,
    9.0, 10.0, 11.0, 12.0,
    13.0, 14.0, 15.0, 16.0,
];
#[rustfmt::skip]
const FWD_KERNEL: &[f32] = &[
    1.0, 0.0, 0.0, 1.0,  // filter 0: 对角线
    0.5, 0.0, 0.0, 0.0,  // filter 1: 左上角取半
];
#[rustfmt::skip]
const FWD_OUTPUT: &[f32] = &[
    7.0, 9.0, 11.0,
    15.0, 17.0, 19.0,
    23.0, 25.0, 27.0,
    0.5, 1.0, 1.5,
    2.5, 3.0, 3.5,
    4.5, 5.0, 5.5,
];

#[test]
fn test_conv2d_simple_forward() {
    let input = Tensor::new(FWD_X, &[1, 1, 4, 4]);
    let kernel = Tensor::new(FWD_KERNEL, &[2, 1, 2, 2]);
    let output = conv2d(&input, &kernel, (1, 1), (0, 0), (1, 1), 1).unwrap();
    assert_eq!(output.shape(), &[1, 2, 3, 3]);
    for (actual, expected) in output.to_vec().iter().zip(FWD_OUTPUT) {
        assert_abs_diff_eq!(actual, expected, epsilon = 1e-6);
    }
}

#[test]
fn test_conv2d_stride_and_padding() {
    // 全一输入配全一3x3核，stride=2、padding=1：输出即各窗口的界内元素个数
    let input = Tensor::ones(&[1, 1, 4, 4]);
    let kernel = Tensor::ones(&[1, 1, 3, 3]);
    let output = conv2d(&input, &kernel, (2, 2), (1, 1), (1, 1), 1).unwrap();
    assert_eq!(output.shape(), &[1, 1, 2, 2]);
    assert_eq!(output.to_vec(), vec![4.0, 6.0, 6.0, 9.0]);
}

#[test]
fn test_conv2d_dilation() {
    // 5x5输入配dilation=2的3x3核：有效感受野5x5，输出1x1，
    // 采样到(0,0),(0,2),(0,4),(2,0),...,(4,4)共9个元素
    let data: Vec<f32> = (1..=25).map(|x| x as f32).collect();
    let input = Tensor::new(&data, &[1, 1, 5, 5]);
    let kernel = Tensor::ones(&[1, 1, 3, 3]);
    let output = conv2d(&input, &kernel, (1, 1), (0, 0), (2, 2), 1).unwrap();
    assert_eq!(output.shape(), &[1, 1, 1, 1]);
    // 1+3+5+11+13+15+21+23+25
    assert_abs_diff_eq!(output[[0, 0, 0, 0]], 117.0, epsilon = 1e-6);
}

#[test]
fn test_conv2d_depthwise_groups() {
    // groups == C_in：每个通道独立卷积，不混合通道
    let mut data: Vec<f32> = (1..=9).map(|x| x as f32).collect();
    data.extend((10..=18).map(|x| x as f32));
    let input = Tensor::new(&data, &[1, 2, 3, 3]);
    #[rustfmt::skip]
    let kernel = Tensor::new(&[
        1.0, 1.0, 1.0, 1.0, // 通道0：求和
        2.0, 2.0, 2.0, 2.0, // 通道1：两倍求和
    ], &[2, 1, 2, 2]);
    let output = conv2d(&input, &kernel, (1, 1), (0, 0), (1, 1), 2).unwrap();
    assert_eq!(output.shape(), &[1, 2, 2, 2]);
    assert_eq!(
        output.to_vec(),
        vec![12.0, 16.0, 24.0, 28.0, 96.0, 104.0, 120.0, 128.0]
    );
}

#[test]
fn test_conv2d_kernel_exceeds_input() {
    let input = Tensor::ones(&[1, 1, 2, 2]);
    let kernel = Tensor::ones(&[1, 1, 3, 3]);
    let result = conv2d(&input, &kernel, (1, 1), (0, 0), (1, 1), 1);
    assert!(matches!(result, Err(OpError::ShapeMismatch { .. })));
}

#[test]
fn test_conv2d_channel_mismatch() {
    let input = Tensor::ones(&[1, 3, 4, 4]);
    let kernel = Tensor::ones(&[2, 2, 2, 2]);
    let result = conv2d(&input, &kernel, (1, 1), (0, 0), (1, 1), 1);
    assert!(matches!(result, Err(OpError::ShapeMismatch { .. })));
}

#[test]
fn test_conv2d_invalid_groups() {
    let input = Tensor::ones(&[1, 3, 4, 4]);
    let kernel = Tensor::ones(&[2, 1, 2, 2]);
    // groups=2不能整除C_in=3
    let result = conv2d(&input, &kernel, (1, 1), (0, 0), (1, 1), 2);
    assert!(matches!(result, Err(OpError::InvalidConfiguration(_))));
}

#[test]
fn test_conv2d_non_4d_input() {
    let input = Tensor::ones(&[3, 4, 4]);
    let kernel = Tensor::ones(&[1, 3, 2, 2]);
    let result = conv2d(&input, &kernel, (1, 1), (0, 0), (1, 1), 1);
    assert!(matches!(result, Err(OpError::ShapeMismatch { .. })));
}
