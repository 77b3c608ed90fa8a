use getset::{CopyGetters, Getters, MutGetters, Setters};

use super::{BorderPolicy, DisparityRange, MatchingWindow};
use crate::error::{self, Error, Result};

/// 匹配代价类型
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CostMetric {
    /// 绝对差之和(SAD)
    Sad,
    /// Census变换后的汉明距离, 需要提供Census变换
    Census,
    /// 归一化互相关(NCC), 代价为 1 - ncc
    Ncc,
}

impl Default for CostMetric {
    fn default() -> Self {
        CostMetric::Sad
    }
}

/// 匹配方式
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Approach {
    /// 单个矩形窗口
    Block,
    /// 五区域: 中心窗口加上四个角窗口 (x±rx, y±ry) 中代价最小的两个, 对遮挡边界更稳定
    BestFive,
}

impl Default for Approach {
    fn default() -> Self {
        Approach::Block
    }
}

/// 块匹配参数设置
#[derive(Getters, Setters, MutGetters, CopyGetters, Copy, Clone, Debug, PartialEq)]
pub struct BlockMatchOption {
    /// 最小视差
    #[getset(get = "pub", set = "pub")]
    min_disparity: i32,
    /// 最大视差(不包含)
    #[getset(get = "pub", set = "pub")]
    max_disparity: i32,
    /// 匹配窗口水平半径
    #[getset(get = "pub", set = "pub")]
    radius_x: i32,
    /// 匹配窗口垂直半径
    #[getset(get = "pub", set = "pub")]
    radius_y: i32,
    /// 匹配方式
    #[getset(get = "pub", set = "pub")]
    approach: Approach,
    /// 代价类型
    #[getset(get = "pub", set = "pub")]
    cost_metric: CostMetric,
    /// 纹理阈值: 像素纹理 <= 阈值 * 当前行最大纹理时视为无效, 0 关闭
    #[getset(get = "pub", set = "pub")]
    texture_threshold: f32,
    /// 唯一性阈值: 次优代价 - 最优代价 <= 阈值 * 最优代价时视为无效, 0 关闭
    #[getset(get = "pub", set = "pub")]
    uniqueness: f32,
    /// 单像素最大误差, 最优代价 > 窗口面积 * 该值时视为无效 (SAD/Census)
    #[getset(get = "pub", set = "pub")]
    max_per_pixel_error: Option<f32>,
    /// 是否做亚像素拟合
    #[getset(get = "pub", set = "pub")]
    subpixel: bool,
    /// 图像边界处理
    #[getset(get = "pub", set = "pub")]
    border: BorderPolicy,
    /// 右到左一致性检查容差, None 时不检查 (仅稠密匹配支持)
    #[getset(get = "pub", set = "pub")]
    right_to_left_tolerance: Option<u32>,
    /// 是否按行块并行
    #[getset(get = "pub", set = "pub")]
    concurrent: bool,
}

impl Default for BlockMatchOption {
    fn default() -> Self {
        Self {
            min_disparity: 0,
            max_disparity: 64,
            radius_x: 3,
            radius_y: 3,
            approach: Approach::Block,
            cost_metric: CostMetric::Sad,
            texture_threshold: 0.0,
            uniqueness: 0.15,
            max_per_pixel_error: None,
            subpixel: false,
            border: BorderPolicy::Skip,
            right_to_left_tolerance: None,
            concurrent: true,
        }
    }
}

impl BlockMatchOption {
    pub fn new(min_disparity: i32, max_disparity: i32) -> Self {
        let mut r = BlockMatchOption::default();
        r.min_disparity = min_disparity;
        r.max_disparity = max_disparity;
        r
    }
    ///
    pub fn build(&self) -> Self {
        *self
    }
    /// 参数检查
    pub fn validate(&self) -> Result<()> {
        if self.min_disparity < 0 {
            return Err(Error::new(1005, error::ERROR_1005));
        }
        if self.max_disparity <= self.min_disparity {
            return Err(Error::new(1002, error::ERROR_1002));
        }
        if self.radius_x < 0 || self.radius_y < 0 {
            return Err(Error::new(1004, error::ERROR_1004));
        }
        let thresholds_ok = [self.texture_threshold, self.uniqueness]
            .iter()
            .chain(self.max_per_pixel_error.iter())
            .all(|v| v.is_finite() && *v >= 0f32);
        if !thresholds_ok {
            return Err(Error::new(1008, error::ERROR_1008));
        }
        if let BorderPolicy::Value(v) = self.border {
            if !v.is_finite() {
                return Err(Error::new(1008, error::ERROR_1008));
            }
        }
        Ok(())
    }
    /// 视差搜索范围, 调用前需先通过 validate
    pub fn range(&self) -> DisparityRange {
        DisparityRange::new(self.min_disparity as usize, self.max_disparity as usize)
    }
    /// 匹配窗口, 调用前需先通过 validate
    pub fn window(&self) -> MatchingWindow {
        MatchingWindow::new(self.radius_x as usize, self.radius_y as usize)
    }
    /// 一个像素的代价由几个窗口相加得到
    pub fn region_count(&self) -> usize {
        match self.approach {
            Approach::Block => 1,
            Approach::BestFive => 3,
        }
    }
    /// 代价上限: 窗口数 * 窗口面积 * 单像素最大误差. NCC 不使用
    pub fn max_error(&self) -> Option<f64> {
        if self.cost_metric == CostMetric::Ncc {
            return None;
        }
        let samples = (self.region_count() * self.window().area()) as f64;
        self.max_per_pixel_error.map(|e| samples * e as f64)
    }
}
