use super::Tensor;
use ndarray::IxDyn;
use std::ops::{Index, IndexMut};

// 4D（Batch-First）张量的直接索引：`x[[b, c, h, w]]`
impl Index<[usize; 4]> for Tensor {
    type Output = f32;

    fn index(&self, indices: [usize; 4]) -> &Self::Output {
        &self.data[IxDyn(&indices)]
    }
}

impl IndexMut<[usize; 4]> for Tensor {
    fn index_mut(&mut self, indices: [usize; 4]) -> &mut Self::Output {
        &mut self.data[IxDyn(&indices)]
    }
}

// 任意维张量的切片索引
impl Index<&[usize]> for Tensor {
    type Output = f32;

    fn index(&self, indices: &[usize]) -> &Self::Output {
        &self.data[IxDyn(indices)]
    }
}

impl IndexMut<&[usize]> for Tensor {
    fn index_mut(&mut self, indices: &[usize]) -> &mut Self::Output {
        &mut self.data[IxDyn(indices)]
    }
}
