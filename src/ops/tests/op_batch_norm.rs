/*
 * @Author       : 老董
 * @Date         : 2026-02-11
 * @Description  : BatchNorm2d的单元测试（PyTorch训练模式数值对照，参考值为手算）
 */

use crate::errors::OpError;
use crate::ops::BatchNorm2d;
use crate::tensor::Tensor;
use approx::assert_abs_diff_eq;

// 输入 [1, 2, 2, 2]：通道0为[1,2,3,4]（均值2.5，有偏方差1.25），
// 通道1为常数2（方差0，归一化后应为0）
#[rustfmt::skip]
const BN_X: &[f32] = &[
    1.0, 2.0, 3.0, 4.0,
    2.0, 2.0, 2.0, 2.0,
];
// (x - 2.5) / sqrt(1.25 + 1e-5)
const BN_CH0_EXPECTED: &[f32] = &[-1.3416353, -0.4472118, 0.4472118, 1.3416353];

#[test]
fn test_batch_norm_normalizes_with_batch_stats() {
    let input = Tensor::new(BN_X, &[1, 2, 2, 2]);
    let mut bn = BatchNorm2d::new(2, 1e-5, 0.1, false);
    let output = bn.forward(&input).unwrap();
    assert!(output.is_same_shape(&input));

    let values = output.to_vec();
    for (actual, expected) in values[..4].iter().zip(BN_CH0_EXPECTED) {
        assert_abs_diff_eq!(actual, expected, epsilon = 1e-4);
    }
    for actual in &values[4..] {
        assert_abs_diff_eq!(actual, &0.0, epsilon = 1e-4);
    }
}

#[test]
fn test_batch_norm_updates_running_stats() {
    let input = Tensor::new(BN_X, &[1, 2, 2, 2]);
    let mut bn = BatchNorm2d::new(2, 1e-5, 0.1, false);
    bn.forward(&input).unwrap();

    // running = 0.9 * 初始值 + 0.1 * batch统计量（方差用无偏：1.25 * 4/3）
    let idx0 = [0usize];
    let idx1 = [1usize];
    assert_abs_diff_eq!(bn.running_mean()[&idx0[..]], 0.25, epsilon = 1e-5);
    assert_abs_diff_eq!(bn.running_var()[&idx0[..]], 1.0666667, epsilon = 1e-5);
    assert_abs_diff_eq!(bn.running_mean()[&idx1[..]], 0.2, epsilon = 1e-5);
    assert_abs_diff_eq!(bn.running_var()[&idx1[..]], 0.9, epsilon = 1e-5);
}

#[test]
fn test_batch_norm_affine_initial_identity() {
    // gamma初始为1、beta初始为0，首次前向与无仿射版本一致
    let input = Tensor::new(BN_X, &[1, 2, 2, 2]);
    let mut bn_affine = BatchNorm2d::new(2, 1e-5, 0.1, true);
    let mut bn_plain = BatchNorm2d::new(2, 1e-5, 0.1, false);
    let out_affine = bn_affine.forward(&input).unwrap();
    let out_plain = bn_plain.forward(&input).unwrap();
    for (a, p) in out_affine.to_vec().iter().zip(out_plain.to_vec()) {
        assert_abs_diff_eq!(a, &p, epsilon = 1e-6);
    }
}

#[test]
fn test_batch_norm_param_count() {
    assert_eq!(BatchNorm2d::new(8, 1e-3, 3e-4, true).param_count(), 16);
    assert_eq!(BatchNorm2d::new(8, 1e-3, 3e-4, false).param_count(), 0);
}

#[test]
fn test_batch_norm_channel_mismatch() {
    let input = Tensor::ones(&[1, 3, 2, 2]);
    let mut bn = BatchNorm2d::new(2, 1e-5, 0.1, true);
    let result = bn.forward(&input);
    assert!(matches!(result, Err(OpError::ShapeMismatch { .. })));
}
