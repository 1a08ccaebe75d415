//! # Only NAS
//!
//! `only_nas`项目旨在用纯rust提供一套[DARTS](https://arxiv.org/abs/1806.09055)风格的
//! 神经架构搜索（NAS）候选算子目录：按名称构建出形状契约固定的可微变换，
//! 供上层搜索算法在计算图的边上互换使用。
//! 本库只负责“构建 + 前向”，搜索控制器、训练循环与自动微分均由外部协作者承担。
//!

pub mod errors;
pub mod ops;
pub mod tensor;
