//! 核线像对及其边界扩展
use ndarray::prelude::*;

use crate::census::CensusTransform;
use crate::core::{Approach, BlockMatchOption, BorderPolicy, CostMetric, DisparityRange, MatchingWindow};
use crate::error::{self, Error, Result};
use crate::pixel::Pixel;

/// 图像尺寸, 边界扩展量与搜索参数. 稠密与稀疏匹配共用, 保证两者判断有效区域的方式一致
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Geometry {
    /// 原图宽
    pub width: usize,
    /// 原图高
    pub height: usize,
    pub pad_x: usize,
    pub pad_y: usize,
    pub range: DisparityRange,
    pub window: MatchingWindow,
    pub approach: Approach,
}

impl Geometry {
    pub fn new(width: usize, height: usize, option: &BlockMatchOption) -> Self {
        let window = option.window();
        let (pad_x, pad_y) = if option.border().is_skip() {
            (0, 0)
        } else {
            (window.radius_x(), window.radius_y())
        };
        Self {
            width,
            height,
            pad_x,
            pad_y,
            range: option.range(),
            window,
            approach: *option.approach(),
        }
    }
    /// 扩展后图像宽
    pub fn working_width(&self) -> usize {
        self.width + 2 * self.pad_x
    }
    /// 扩展后图像高
    pub fn working_height(&self) -> usize {
        self.height + 2 * self.pad_y
    }
    /// 原图第 y 行在扩展图中的行号, 窗口越界时返回 None
    pub fn row(&self, y: usize) -> Option<usize> {
        let yp = y + self.pad_y;
        let ry = self.window.radius_y();
        if yp >= ry && yp + ry < self.working_height() {
            Some(yp)
        } else {
            None
        }
    }
    /// 中心列 xc 的窗口在视差 d 下左右图都在图像内: xc + rx < 宽, xc - d - rx >= 0
    pub fn window_fits(&self, xc: usize, d: usize) -> bool {
        let rx = self.window.radius_x();
        xc >= d + rx && xc + rx < self.working_width()
    }
    /// 扩展图列 xp 可测试的视差数量, 可测试的视差总是从最小视差开始连续排列
    ///
    /// 五区域匹配还要求左侧或右侧的一对角窗口在图像内
    pub fn disparity_count(&self, xp: usize) -> usize {
        let rx = self.window.radius_x();
        let first = self.range.min() + rx;
        if xp < first || xp + rx >= self.working_width() {
            return 0;
        }
        let count = self.range.len().min(xp - first + 1);
        match self.approach {
            Approach::Block => count,
            Approach::BestFive => {
                if self.window_fits(xp + rx, self.range.min()) {
                    return count;
                }
                // 只剩左侧角窗口: xp - rx - d - rx >= 0
                let first = self.range.min() + 2 * rx;
                if xp < first {
                    0
                } else {
                    count.min(xp - first + 1)
                }
            }
        }
    }
    /// 五区域匹配中上方角窗口的中心行, 超出图像时向内移动
    pub fn five_row_top(&self, yp: usize) -> usize {
        let ry = self.window.radius_y();
        yp.saturating_sub(ry).max(ry)
    }
    /// 五区域匹配中下方角窗口的中心行
    pub fn five_row_bottom(&self, yp: usize) -> usize {
        let ry = self.window.radius_y();
        (yp + ry).min(self.working_height() - ry - 1)
    }
}

/// 左右图尺寸检查, 返回 (宽, 高)
pub fn check_shape<A, B>(left: &ArrayView2<A>, right: &ArrayView2<B>) -> Result<(usize, usize)> {
    let (height, width) = left.dim();
    if width == 0 || height == 0 {
        return Err(Error::new(1001, error::ERROR_1001));
    }
    if left.dim() != right.dim() {
        return Err(Error::new(2001, error::ERROR_2001));
    }
    Ok((width, height))
}

/// 窗口代价累加值不能溢出
pub fn check_accumulator<P: Pixel>(option: &BlockMatchOption) -> Result<()> {
    let samples = (option.region_count() * option.window().area()) as f64;
    let fits = match option.cost_metric() {
        CostMetric::Sad => P::sum_fits(samples),
        CostMetric::Census => samples * 64f64 <= i32::MAX as f64,
        CostMetric::Ncc => true,
    };
    if fits {
        Ok(())
    } else {
        Err(Error::new(1009, error::ERROR_1009))
    }
}

/// 核线校正后的像对, 边界方式不为 Skip 时四周各扩展一个窗口半径
pub struct RectifiedPair<P> {
    pub left: Array2<P>,
    pub right: Array2<P>,
    geometry: Geometry,
    border: BorderPolicy,
}

impl<P: Pixel> RectifiedPair<P> {
    pub fn new(left: &ArrayView2<P>, right: &ArrayView2<P>, option: &BlockMatchOption) -> Result<Self> {
        check_accumulator::<P>(option)?;
        let (width, height) = check_shape(left, right)?;
        let geometry = Geometry::new(width, height, option);
        let border = *option.border();
        let (left, right) = if border.is_skip() {
            (left.to_owned(), right.to_owned())
        } else {
            (
                border.extend(left, geometry.pad_x, geometry.pad_y),
                border.extend(right, geometry.pad_x, geometry.pad_y),
            )
        };
        Ok(Self {
            left,
            right,
            geometry,
            border,
        })
    }
    pub fn geometry(&self) -> Geometry {
        self.geometry
    }
    /// 左图灰度值, 用于纹理检测和 census 变换
    pub fn intensity_left(&self) -> Array2<f64> {
        self.left.mapv(|v| v.to_f64())
    }
    pub fn intensity_right(&self) -> Array2<f64> {
        self.right.mapv(|v| v.to_f64())
    }
    /// 左右图 census 变换, 使用与视差计算相同的边界方式
    pub fn census(&self, census: &dyn CensusTransform) -> (Array2<u64>, Array2<u64>) {
        let left = census.transform(&self.intensity_left().view(), self.border);
        let right = census.transform(&self.intensity_right().view(), self.border);
        (left, right)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_mismatch() {
        let left = Array2::<u8>::zeros((4, 5));
        let right = Array2::<u8>::zeros((4, 6));
        let err = check_shape(&left.view(), &right.view()).unwrap_err();
        assert!(err.is_shape_mismatch());
        let empty = Array2::<u8>::zeros((0, 5));
        assert_eq!(check_shape(&empty.view(), &empty.view()).unwrap_err().code, 1001);
    }

    #[test]
    fn test_disparity_count_skip() {
        let option = BlockMatchOption::new(2, 6).set_radius_x(1).set_radius_y(1).build();
        let g = Geometry::new(12, 5, &option);
        assert_eq!(g.disparity_count(2), 0);
        assert_eq!(g.disparity_count(3), 1);
        assert_eq!(g.disparity_count(5), 3);
        assert_eq!(g.disparity_count(10), 4);
        assert_eq!(g.disparity_count(11), 0);
        assert_eq!(g.row(0), None);
        assert_eq!(g.row(1), Some(1));
        assert_eq!(g.row(4), None);
    }

    #[test]
    fn test_disparity_count_extended() {
        let option = BlockMatchOption::new(0, 4)
            .set_radius_x(2)
            .set_radius_y(1)
            .set_border(BorderPolicy::Extended)
            .build();
        let g = Geometry::new(10, 3, &option);
        assert_eq!((g.working_width(), g.working_height()), (14, 5));
        // 原图列 x 可测试 x + 1 个视差
        assert_eq!(g.disparity_count(2), 1);
        assert_eq!(g.disparity_count(4), 3);
        assert_eq!(g.disparity_count(11), 4);
        assert_eq!(g.row(0), Some(1));
        assert_eq!(g.row(2), Some(3));
    }

    #[test]
    fn test_disparity_count_best_five() {
        let option = BlockMatchOption::new(1, 6)
            .set_radius_x(2)
            .set_radius_y(1)
            .set_approach(Approach::BestFive)
            .build();
        let g = Geometry::new(16, 7, &option);
        // 右侧角窗口在图像内, 与单窗口相同
        assert_eq!(g.disparity_count(3), 1);
        assert_eq!(g.disparity_count(9), 5);
        assert_eq!(g.disparity_count(11), 5);
        // xp + 2rx >= 16, 只能用左侧角窗口: d <= xp - 2rx
        assert_eq!(g.disparity_count(12), 5);
        assert_eq!(g.disparity_count(13), 5);
        let option = BlockMatchOption::new(0, 10)
            .set_radius_x(3)
            .set_radius_y(1)
            .set_approach(Approach::BestFive)
            .build();
        let g = Geometry::new(12, 7, &option);
        assert_eq!(g.disparity_count(5), 3);
        assert_eq!(g.disparity_count(6), 1);
        assert_eq!(g.disparity_count(8), 3);
        assert_eq!((g.five_row_top(1), g.five_row_bottom(1)), (1, 2));
        assert_eq!((g.five_row_top(3), g.five_row_bottom(3)), (2, 4));
        assert_eq!(g.five_row_bottom(5), 5);
    }

    #[test]
    fn test_accumulator_limit() {
        let option = BlockMatchOption::new(0, 4)
            .set_radius_x(1500)
            .set_radius_y(1500)
            .build();
        assert_eq!(check_accumulator::<u8>(&option).unwrap_err().code, 1009);
        assert!(check_accumulator::<u16>(&option).is_ok());
        assert!(check_accumulator::<f32>(&option).is_ok());
        let census = BlockMatchOption::new(0, 4)
            .set_radius_x(3000)
            .set_radius_y(3000)
            .set_cost_metric(CostMetric::Census)
            .build();
        assert_eq!(check_accumulator::<u8>(&census).unwrap_err().code, 1009);
        let small = BlockMatchOption::new(0, 4).set_approach(Approach::BestFive).build();
        assert!(check_accumulator::<u8>(&small).is_ok());
    }

    #[test]
    fn test_pair_is_padded() {
        let option = BlockMatchOption::new(0, 4)
            .set_radius_x(2)
            .set_radius_y(1)
            .set_border(BorderPolicy::Extended)
            .build();
        let left = Array2::<u8>::from_elem((3, 4), 7);
        let pair = RectifiedPair::new(&left.view(), &left.view(), &option).unwrap();
        assert_eq!(pair.left.dim(), (5, 8));
        assert!(pair.right.iter().all(|v| *v == 7));
    }
}
