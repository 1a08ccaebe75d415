/*
 * @Author       : 老董
 * @Date         : 2026-02-11
 * @Description  : 双线性上采样（角点对齐）的单元测试
 */

use crate::ops::functional::upsample_bilinear;
use crate::tensor::Tensor;
use approx::assert_abs_diff_eq;

#[test]
fn test_upsample_bilinear_2x2_to_4x4() {
    // 角点值为f(y,x) = 2y + x（y,x ∈ [0,1]），角点对齐下
    // 输出[i][j] = (2i + j) / 3
    let input = Tensor::new(&[0.0, 1.0, 2.0, 3.0], &[1, 1, 2, 2]);
    let output = upsample_bilinear(&input, 4, 4).unwrap();
    assert_eq!(output.shape(), &[1, 1, 4, 4]);
    for i in 0..4 {
        for j in 0..4 {
            let expected = (2 * i + j) as f32 / 3.0;
            assert_abs_diff_eq!(output[[0, 0, i, j]], expected, epsilon = 1e-5);
        }
    }
}

#[test]
fn test_upsample_bilinear_corners_are_exact() {
    let input = Tensor::new(&[10.0, -2.0, 4.0, 8.0], &[1, 1, 2, 2]);
    let output = upsample_bilinear(&input, 5, 5).unwrap();
    assert_abs_diff_eq!(output[[0, 0, 0, 0]], 10.0, epsilon = 1e-6);
    assert_abs_diff_eq!(output[[0, 0, 0, 4]], -2.0, epsilon = 1e-6);
    assert_abs_diff_eq!(output[[0, 0, 4, 0]], 4.0, epsilon = 1e-6);
    assert_abs_diff_eq!(output[[0, 0, 4, 4]], 8.0, epsilon = 1e-6);
}

#[test]
fn test_upsample_bilinear_from_1x1_broadcasts() {
    // ASPP全局池化分支的场景：1x1上采样到任意尺寸即常数填充
    let input = Tensor::new(&[3.25, -1.5], &[1, 2, 1, 1]);
    let output = upsample_bilinear(&input, 6, 6).unwrap();
    assert_eq!(output.shape(), &[1, 2, 6, 6]);
    for h in 0..6 {
        for w in 0..6 {
            assert_abs_diff_eq!(output[[0, 0, h, w]], 3.25, epsilon = 1e-6);
            assert_abs_diff_eq!(output[[0, 1, h, w]], -1.5, epsilon = 1e-6);
        }
    }
}

#[test]
fn test_upsample_bilinear_same_size_is_identity() {
    let input = Tensor::new_random(-1.0, 1.0, &[2, 3, 4, 4]);
    let output = upsample_bilinear(&input, 4, 4).unwrap();
    assert_eq!(output, input);
}
