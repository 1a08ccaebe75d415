/*
 * @Author       : 老董
 * @Date         : 2026-02-10
 * @Description  : 本类仅包含一些属性方法，不包含任何运算方法，所以不会需要用到mut
 */

use super::Tensor;

impl Tensor {
    /// 返回张量的形状，如4D张量为[batch, channels, height, width]。
    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    /// 张量的维（dim）数、阶（rank）数，即`shape()`的元素个数。
    /// NOTE: 这里用`dimension`是参照了大多数库的命名规范，如PyTorch、NumPy等。
    pub fn dimension(&self) -> usize {
        self.data.ndim()
    }

    /// 计算张量中所有元素的数量。
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// 判断两个张量的形状是否严格一致。如：形状为[1, 4]和[4]是不一致的，会返回false。
    pub fn is_same_shape(&self, other: &Self) -> bool {
        self.shape() == other.shape()
    }

    /// 将张量的所有元素按（行优先）顺序导出为Vec。
    pub fn to_vec(&self) -> Vec<f32> {
        self.data.iter().copied().collect()
    }
}
