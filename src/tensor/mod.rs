use ndarray::{Array, IxDyn};
use rand::Rng;
use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;

mod ops {
    pub mod add;
    pub mod mul;
    pub mod others;
}

mod index;
mod property;
mod slice;


/// 定义张量的结构体。其可以是标量、向量、矩阵或更高维度的数组，
/// 但本库的算子统一约定4D（Batch-First）：[batch, channels, height, width]。
#[derive(Debug, Clone)]
pub struct Tensor {
    data: Array<f32, IxDyn>,
}

impl Tensor {
    /// 创建一个张量。
    /// 注：`data`的长度必须和`shape`中所有元素的乘积相等，否则panic。
    pub fn new(data: &[f32], shape: &[usize]) -> Tensor {
        let data = Array::from_shape_vec(IxDyn(shape), data.to_vec()).unwrap();
        Tensor { data }
    }

    /// 创建一个全零张量。
    pub fn zeros(shape: &[usize]) -> Tensor {
        Tensor {
            data: Array::zeros(IxDyn(shape)),
        }
    }

    /// 创建一个全一张量。
    pub fn ones(shape: &[usize]) -> Tensor {
        Tensor {
            data: Array::ones(IxDyn(shape)),
        }
    }

    /// 创建一个与本张量形状相同的全零张量。
    pub fn zeros_like(&self) -> Tensor {
        Tensor::zeros(self.shape())
    }

    /// 创建一个随机张量，其值在[min, max]的闭区间内均匀分布。
    pub fn new_random(min: f32, max: f32, shape: &[usize]) -> Tensor {
        let mut rng = rand::thread_rng();
        let data = (0..shape.iter().product::<usize>())
            .map(|_| Uniform::from(min..=max).sample(&mut rng))
            .collect::<Vec<_>>();
        Tensor::new(&data, shape)
    }

    /// 创建一个服从正态分布的随机张量（Box-Muller法）。
    pub fn new_normal(mean: f32, std_dev: f32, shape: &[usize]) -> Tensor {
        let mut rng = rand::thread_rng();
        Self::normal_with(&mut rng, mean, std_dev, shape)
    }

    /// 创建一个服从正态分布的随机张量（使用指定的RNG，确保可重复性）。
    pub fn new_normal_with_rng(
        mean: f32,
        std_dev: f32,
        shape: &[usize],
        rng: &mut StdRng,
    ) -> Tensor {
        Self::normal_with(rng, mean, std_dev, shape)
    }

    fn normal_with<R: Rng>(rng: &mut R, mean: f32, std_dev: f32, shape: &[usize]) -> Tensor {
        let data_len = shape.iter().product::<usize>();
        let mut data = Vec::with_capacity(data_len);

        while data.len() < data_len {
            let u1: f32 = rng.r#gen();
            let u2: f32 = rng.r#gen();
            let r = (-2.0 * u1.ln()).sqrt();
            let theta = 2.0 * std::f32::consts::PI * u2;
            let z0 = mean + std_dev * r * theta.cos();
            let z1 = mean + std_dev * r * theta.sin();

            if z0.is_finite() {
                data.push(z0);
            }
            if data.len() < data_len && z1.is_finite() {
                data.push(z1);
            }
        }

        Tensor::new(&data, shape)
    }
}
