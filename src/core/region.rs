/// 视差搜索范围 [min, max)
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DisparityRange {
    min: usize,
    max: usize,
}

impl DisparityRange {
    pub fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }
    pub fn min(&self) -> usize {
        self.min
    }
    pub fn max(&self) -> usize {
        self.max
    }
    /// 视差数量, 同时也是无效视差的标记值
    pub fn len(&self) -> usize {
        self.max.saturating_sub(self.min)
    }
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
    /// 第 i 个视差
    pub fn disparity(&self, index: usize) -> usize {
        self.min + index
    }
}

/// 匹配窗口, 大小为 (2*radius_x+1) x (2*radius_y+1)
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MatchingWindow {
    radius_x: usize,
    radius_y: usize,
}

impl MatchingWindow {
    pub fn new(radius_x: usize, radius_y: usize) -> Self {
        Self { radius_x, radius_y }
    }
    pub fn radius_x(&self) -> usize {
        self.radius_x
    }
    pub fn radius_y(&self) -> usize {
        self.radius_y
    }
    pub fn width(&self) -> usize {
        2 * self.radius_x + 1
    }
    pub fn height(&self) -> usize {
        2 * self.radius_y + 1
    }
    pub fn area(&self) -> usize {
        self.width() * self.height()
    }
}
