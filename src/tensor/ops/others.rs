use crate::tensor::Tensor;
use ndarray::Zip;
use std::cmp::PartialEq;

impl PartialEq for Tensor {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
    }
}

impl Tensor {
    /// 对张量中的所有元素求和并返回纯数。
    pub fn sum(&self) -> f32 {
        let mut value = 0.0;
        Zip::from(&self.data).for_each(|a| value += a);
        value
    }

    /// 逐元素ReLU（max(x, 0)），返回一个新的张量。
    /// 对应PyTorch中`nn.ReLU(inplace=False)`的非破坏性语义。
    pub fn relu(&self) -> Tensor {
        Tensor {
            data: self.data.mapv(|x| x.max(0.0)),
        }
    }
}
