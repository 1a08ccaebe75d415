use thiserror::Error;

/// 算子层的错误类型。
/// 本层不做恢复：所有错误都直接上抛给调用方，不重试、不替换算子。
#[derive(Error, Debug, PartialEq)]
pub enum OpError {
    // 注册表查询未命中（固定算子名集合之外的名称）
    #[error("未知算子名：{0}")]
    UnknownOperator(String),

    // 构建期即可判定的非法配置（如FactorizedReduce的输出通道数为奇数）
    #[error("非法配置：{0}")]
    InvalidConfiguration(String),

    // 张量形状与请求的运算不兼容（如卷积核大于填充后的输入）
    #[error("形状不匹配：期望{expected:?}，实际{got:?}。{message}")]
    ShapeMismatch {
        expected: Vec<usize>,
        got: Vec<usize>,
        message: String,
    },
}
