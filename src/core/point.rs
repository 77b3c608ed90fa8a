use getset::{CopyGetters, Getters, MutGetters, Setters};

#[derive(Getters, Setters, MutGetters, CopyGetters, Copy, Clone, Debug, PartialEq, Eq)]
pub struct Point {
    #[getset(get = "pub", set = "pub")]
    x: usize,
    #[getset(get = "pub", set = "pub")]
    y: usize,
}
impl Point {
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}
impl Default for Point {
    fn default() -> Self {
        Self {
            x: 0usize,
            y: 0usize,
        }
    }
}

/// 单点视差查询结果
#[derive(Getters, CopyGetters, Copy, Clone, Debug, PartialEq)]
pub struct PointDisparity {
    /// 查询的像素
    #[getset(get = "pub")]
    point: Point,
    /// 相对最小视差的偏移量, 与稠密视差图中存储的值相同; 无效时为无效标记值
    #[getset(get_copy = "pub")]
    value: f32,
    /// 最小视差
    #[getset(get_copy = "pub")]
    min_disparity: usize,
    #[getset(get_copy = "pub")]
    valid: bool,
}

impl PointDisparity {
    pub fn new(point: Point, value: f32, min_disparity: usize, valid: bool) -> Self {
        Self {
            point,
            value,
            min_disparity,
            valid,
        }
    }
    /// 绝对视差值, 无效时返回 None
    pub fn disparity(&self) -> Option<f32> {
        if self.valid {
            Some(self.value + self.min_disparity as f32)
        } else {
            None
        }
    }
}
