/*
 * @Author       : 老董
 * @Date         : 2026-02-11
 * @Description  : 算子注册表（按名称构建与分发）的单元测试
 */

use crate::errors::OpError;
use crate::ops::{DEFAULT_BN_EPS, DEFAULT_BN_MOMENTUM, OP_NAMES, Op, TraitOp};
use crate::tensor::Tensor;
use rand::SeedableRng;
use rand::rngs::StdRng;

/// 构建注册表算子的便捷封装（C=8、默认归一化超参）
fn build(name: &str, stride: usize) -> Op {
    Op::build(name, 8, stride, DEFAULT_BN_EPS, DEFAULT_BN_MOMENTUM, true).unwrap()
}

#[test]
fn test_all_ops_preserve_batch_and_channels_at_stride_1() {
    let input = Tensor::new_random(-1.0, 1.0, &[2, 8, 8, 8]);
    for name in OP_NAMES {
        let output = build(name, 1).forward(&input).unwrap();
        assert_eq!(output.shape(), &[2, 8, 8, 8], "算子{name}违反stride=1的形状契约");
    }
}

#[test]
fn test_all_ops_halve_spatial_size_at_stride_2() {
    let input = Tensor::new_random(-1.0, 1.0, &[2, 8, 8, 8]);
    for name in OP_NAMES {
        let output = build(name, 2).forward(&input).unwrap();
        assert_eq!(output.shape(), &[2, 8, 4, 4], "算子{name}违反stride=2的形状契约");
    }
}

#[test]
fn test_unknown_operator_fails_without_constructing() {
    let result = Op::build("bogus_op", 8, 1, DEFAULT_BN_EPS, DEFAULT_BN_MOMENTUM, true);
    match result {
        Err(OpError::UnknownOperator(name)) => assert_eq!(name, "bogus_op"),
        other => panic!("期望UnknownOperator，实际为{other:?}"),
    }
}

#[test]
fn test_skip_connect_stride_1_is_identity() {
    let input = Tensor::new_random(-1.0, 1.0, &[2, 8, 8, 8]);
    let output = build("skip_connect", 1).forward(&input).unwrap();
    assert_eq!(output, input);
}

#[test]
fn test_skip_connect_stride_2_requires_even_channels() {
    // stride>1时skip_connect即FactorizedReduce，奇数通道在构建期失败
    let result = Op::build("skip_connect", 7, 2, DEFAULT_BN_EPS, DEFAULT_BN_MOMENTUM, true);
    assert!(matches!(result, Err(OpError::InvalidConfiguration(_))));
}

#[test]
fn test_none_op_produces_zeros() {
    let input = Tensor::new_random(-1.0, 1.0, &[2, 8, 8, 8]);
    let output = build("none", 1).forward(&input).unwrap();
    assert!(output.to_vec().iter().all(|&x| x == 0.0));
}

#[test]
fn test_build_with_rng_is_reproducible() {
    let input = Tensor::new_random(-1.0, 1.0, &[1, 8, 8, 8]);
    let mut rng_1 = StdRng::seed_from_u64(42);
    let mut rng_2 = StdRng::seed_from_u64(42);
    let mut op_1 =
        Op::build_with_rng("sep_conv_3x3", 8, 1, DEFAULT_BN_EPS, DEFAULT_BN_MOMENTUM, true, &mut rng_1)
            .unwrap();
    let mut op_2 =
        Op::build_with_rng("sep_conv_3x3", 8, 1, DEFAULT_BN_EPS, DEFAULT_BN_MOMENTUM, true, &mut rng_2)
            .unwrap();
    assert_eq!(op_1.forward(&input).unwrap(), op_2.forward(&input).unwrap());
}

#[test]
fn test_kind_names() {
    assert_eq!(build("none", 1).kind_name(), "zero");
    assert_eq!(build("skip_connect", 1).kind_name(), "identity");
    assert_eq!(build("skip_connect", 2).kind_name(), "factorized_reduce");
    assert_eq!(build("avg_pool_3x3", 1).kind_name(), "avg_pool");
    assert_eq!(build("max_pool_3x3", 1).kind_name(), "max_pool");
    assert_eq!(build("sep_conv_5x5", 1).kind_name(), "sep_conv");
    assert_eq!(build("dil_conv_5x5", 1).kind_name(), "dil_conv");
}

#[test]
fn test_parameter_free_ops_report_zero_params() {
    for name in ["none", "avg_pool_3x3", "max_pool_3x3", "skip_connect"] {
        assert_eq!(build(name, 1).param_count(), 0, "算子{name}不应有参数");
    }
    assert!(build("sep_conv_3x3", 1).param_count() > 0);
}
