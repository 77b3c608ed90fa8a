use ndarray::prelude::*;

use super::DisparityRange;

/// 视差图
///
/// 每个像素存储相对 `min_disparity` 的视差偏移量 (亚像素时为小数),
/// 无法得到可靠匹配的像素存储无效标记值 `max_disparity - min_disparity`.
#[derive(Clone, Debug, PartialEq)]
pub struct DisparityMap {
    data: Array2<f32>,
    range: DisparityRange,
}

impl Default for DisparityMap {
    fn default() -> Self {
        Self {
            data: Array2::<f32>::zeros((0, 0)),
            range: DisparityRange::new(0, 0),
        }
    }
}

impl DisparityMap {
    pub fn new(width: usize, height: usize, range: DisparityRange) -> Self {
        Self {
            data: Array2::<f32>::from_elem((height, width), range.len() as f32),
            range,
        }
    }
    /// 调整尺寸并重置为无效值, 尺寸不变时复用内存
    pub fn reshape(&mut self, width: usize, height: usize, range: DisparityRange) {
        self.range = range;
        let invalid = self.invalid_value();
        if self.data.dim() == (height, width) {
            self.data.fill(invalid);
        } else {
            self.data = Array2::<f32>::from_elem((height, width), invalid);
        }
    }
    pub fn width(&self) -> usize {
        self.data.ncols()
    }
    pub fn height(&self) -> usize {
        self.data.nrows()
    }
    pub fn range(&self) -> DisparityRange {
        self.range
    }
    /// 无效标记值
    pub fn invalid_value(&self) -> f32 {
        self.range.len() as f32
    }
    /// 原始存储值(偏移量或无效标记)
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.data[(y, x)]
    }
    pub fn is_valid(&self, x: usize, y: usize) -> bool {
        self.get(x, y) < self.invalid_value()
    }
    /// 绝对视差值, 无效时返回 None
    pub fn disparity(&self, x: usize, y: usize) -> Option<f32> {
        if self.is_valid(x, y) {
            Some(self.get(x, y) + self.range.min() as f32)
        } else {
            None
        }
    }
    /// 有效像素数量
    pub fn valid_count(&self) -> usize {
        let invalid = self.invalid_value();
        self.data.iter().filter(|v| **v < invalid).count()
    }
    pub fn view(&self) -> ArrayView2<f32> {
        self.data.view()
    }
    pub(crate) fn view_mut(&mut self) -> ArrayViewMut2<f32> {
        self.data.view_mut()
    }
}
