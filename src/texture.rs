//! 纹理检测
//!
//! 像素的纹理值为窗口内二阶导数绝对值之和:
//!      |2*I(x,y) - I(x-1,y) - I(x+1,y)| + |2*I(x,y) - I(x,y-1) - I(x,y+1)|
//! 图像边缘处的邻点取最近的边缘像素. 与视差无关, 每个左图像素只计算一次.
//! 纹理值 <= 阈值 * 当前行最大纹理值的像素被视为弱纹理, 匹配结果不可靠.
use ndarray::prelude::*;

use crate::core::MatchingWindow;

fn second_derivative(image: &ArrayView2<f64>, x: usize, y: usize) -> f64 {
    let (height, width) = image.dim();
    let center = 2f64 * image[(y, x)];
    let left = image[(y, x.saturating_sub(1))];
    let right = image[(y, (x + 1).min(width - 1))];
    let top = image[(y.saturating_sub(1), x)];
    let bottom = image[((y + 1).min(height - 1), x)];
    (center - left - right).abs() + (center - top - bottom).abs()
}

/// ## 计算第 y 行的纹理值
///
/// 输出第 i 个元素对应列 x = i + radius_x, 共 width - 2*radius_x 个.
/// 调用方保证 y 行的窗口在图像内.
///
///### 返回
/// 该行最大纹理值
pub fn texture_row(
    image: &ArrayView2<f64>,
    y: usize,
    window: MatchingWindow,
    column_sums: &mut Vec<f64>,
    out: &mut Vec<f64>,
) -> f64 {
    let width = image.ncols();
    let (rx, ry) = (window.radius_x(), window.radius_y());
    out.clear();
    column_sums.clear();
    if width < window.width() {
        return 0f64;
    }
    column_sums.extend((0..width).map(|x| {
        (y - ry..=y + ry)
            .map(|yy| second_derivative(image, x, yy))
            .sum::<f64>()
    }));
    let region_width = window.width();
    let mut sum: f64 = column_sums[..region_width].iter().sum();
    let mut row_max = sum;
    out.push(sum);
    for i in 1..width - 2 * rx {
        sum += column_sums[i + region_width - 1] - column_sums[i - 1];
        row_max = row_max.max(sum);
        out.push(sum);
    }
    row_max
}

/// 纹理检查
#[derive(Copy, Clone, Debug)]
pub struct TextureValidator {
    threshold: f64,
}

impl TextureValidator {
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold: threshold as f64,
        }
    }
    pub fn is_enabled(&self) -> bool {
        self.threshold > 0f64
    }
    /// 纹理足够时返回 true; 整行没有纹理时所有像素都不通过
    pub fn accepts(&self, texture: f64, row_max: f64) -> bool {
        !self.is_enabled() || texture > self.threshold * row_max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_image_has_no_texture() {
        let image = Array2::<f64>::from_elem((7, 9), 42.0);
        let (mut sums, mut out) = (Vec::new(), Vec::new());
        let row_max = texture_row(&image.view(), 3, MatchingWindow::new(2, 2), &mut sums, &mut out);
        assert_eq!(out.len(), 5);
        assert_eq!(row_max, 0.0);
        let validator = TextureValidator::new(0.1);
        assert!(out.iter().all(|t| !validator.accepts(*t, row_max)));
    }

    #[test]
    fn test_texture_matches_direct_sum() {
        let image = Array2::<f64>::from_shape_fn((6, 10), |(y, x)| ((x * x + 3 * y) % 11) as f64);
        let window = MatchingWindow::new(1, 2);
        let (mut sums, mut out) = (Vec::new(), Vec::new());
        let row_max = texture_row(&image.view(), 2, window, &mut sums, &mut out);
        for (i, t) in out.iter().enumerate() {
            let x = i + 1;
            let mut expected = 0f64;
            for yy in 0..=4 {
                for xx in x - 1..=x + 1 {
                    expected += second_derivative(&image.view(), xx, yy);
                }
            }
            assert_eq!(*t, expected);
        }
        assert_eq!(row_max, out.iter().cloned().fold(0f64, f64::max));
    }

    #[test]
    fn test_single_spike() {
        let mut image = Array2::<f64>::zeros((3, 3));
        image[(1, 1)] = 10.0;
        assert_eq!(second_derivative(&image.view(), 1, 1), 40.0);
        assert_eq!(second_derivative(&image.view(), 0, 1), 10.0);
    }

    #[test]
    fn test_disabled_accepts_everything() {
        let validator = TextureValidator::new(0.0);
        assert!(validator.accepts(0.0, 0.0));
        assert!(!TextureValidator::new(0.5).accepts(5.0, 10.0));
        assert!(TextureValidator::new(0.5).accepts(5.1, 10.0));
    }
}
