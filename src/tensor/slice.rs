/*
 * @Author       : 老董
 * @Date         : 2026-02-10
 * @Description  : 面向4D（Batch-First）张量的切片原语：空间子采样、偏移裁剪与通道拼接。
 *                 这些是搜索空间算子（Zero、FactorizedReduce、ASPP等）前向所需的全部切片操作。
 */

use super::Tensor;
use crate::errors::OpError;
use ndarray::{Axis, Slice, concatenate};

impl Tensor {
    /// 沿高、宽两个空间轴每隔`stride`取一个元素，等价于`x[:, :, ::sH, ::sW]`。
    /// 输出空间尺寸为ceil(H/sH) x ceil(W/sW)。
    /// 仅支持4D张量，否则panic。
    pub fn subsample(&self, stride_h: usize, stride_w: usize) -> Tensor {
        assert_eq!(self.dimension(), 4, "subsample只支持4D张量");
        assert!(stride_h >= 1 && stride_w >= 1, "子采样步长须≥1");
        let data = self
            .data
            .slice_each_axis(|ax| match ax.axis.index() {
                2 => Slice::new(0, None, stride_h as isize),
                3 => Slice::new(0, None, stride_w as isize),
                _ => Slice::new(0, None, 1),
            })
            .to_owned();
        Tensor { data }
    }

    /// 裁掉前`rows`行与前`cols`列，等价于`x[:, :, rows:, cols:]`。
    /// 仅支持4D张量，否则panic。
    pub fn crop_offset(&self, rows: usize, cols: usize) -> Tensor {
        assert_eq!(self.dimension(), 4, "crop_offset只支持4D张量");
        let data = self
            .data
            .slice_each_axis(|ax| match ax.axis.index() {
                2 => Slice::new(rows as isize, None, 1),
                3 => Slice::new(cols as isize, None, 1),
                _ => Slice::new(0, None, 1),
            })
            .to_owned();
        Tensor { data }
    }

    /// 沿通道轴（axis=1）拼接若干4D张量。
    /// 所有张量的batch与空间尺寸必须一致，否则返回`ShapeMismatch`。
    pub fn concat_channels(tensors: &[&Tensor]) -> Result<Tensor, OpError> {
        if tensors.is_empty() {
            return Err(OpError::InvalidConfiguration(
                "待拼接的张量列表为空".to_string(),
            ));
        }
        let first_shape = tensors[0].shape();
        for tensor in tensors {
            let shape = tensor.shape();
            let compatible = shape.len() == 4
                && first_shape.len() == 4
                && shape[0] == first_shape[0]
                && shape[2] == first_shape[2]
                && shape[3] == first_shape[3];
            if !compatible {
                return Err(OpError::ShapeMismatch {
                    expected: first_shape.to_vec(),
                    got: shape.to_vec(),
                    message: "通道拼接要求batch与空间尺寸一致".to_string(),
                });
            }
        }

        let views = tensors.iter().map(|t| t.data.view()).collect::<Vec<_>>();
        let data = concatenate(Axis(1), &views).map_err(|_| OpError::ShapeMismatch {
            expected: first_shape.to_vec(),
            got: vec![],
            message: "通道拼接失败".to_string(),
        })?;
        Ok(Tensor { data })
    }
}
