use ndarray::prelude::*;

use crate::pixel::Pixel;

/// 图像边界处理方式
///
/// Census变换与视差计算必须使用同一个边界设置, 否则边界区域的稠密和稀疏结果无法一致.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum BorderPolicy {
    /// 不处理边界, 窗口越界的像素直接标记为无效
    Skip,
    /// 复制最近的边界像素
    Extended,
    /// 以边界像素为轴镜像(不重复边界像素)
    Reflect,
    /// 周期延拓
    Wrap,
    /// 固定值填充
    Value(f32),
}

impl Default for BorderPolicy {
    fn default() -> Self {
        BorderPolicy::Skip
    }
}

impl BorderPolicy {
    pub fn is_skip(&self) -> bool {
        matches!(self, BorderPolicy::Skip)
    }
    /// 将越界坐标映射到 [0, len), Skip 和 Value 对越界坐标返回 None
    pub fn index(&self, i: isize, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        if i >= 0 && (i as usize) < len {
            return Some(i as usize);
        }
        let n = len as isize;
        match self {
            BorderPolicy::Skip | BorderPolicy::Value(_) => None,
            BorderPolicy::Extended => Some(i.clamp(0, n - 1) as usize),
            BorderPolicy::Wrap => Some(i.rem_euclid(n) as usize),
            BorderPolicy::Reflect => {
                if n == 1 {
                    return Some(0);
                }
                let period = 2 * (n - 1);
                let m = i.rem_euclid(period);
                let r = if m >= n { period - m } else { m };
                Some(r as usize)
            }
        }
    }
    /// 读取 (x, y) 处的像素, 越界时按边界方式处理
    pub fn sample<P: Pixel>(&self, image: &ArrayView2<P>, x: isize, y: isize) -> Option<P> {
        let (height, width) = image.dim();
        match (self.index(x, width), self.index(y, height)) {
            (Some(xx), Some(yy)) => Some(image[(yy, xx)]),
            _ => match self {
                BorderPolicy::Value(v) => Some(P::from_f32(*v)),
                _ => None,
            },
        }
    }
    /// 生成四周各扩展 (pad_x, pad_y) 的图像副本
    pub fn extend<P: Pixel>(&self, image: &ArrayView2<P>, pad_x: usize, pad_y: usize) -> Array2<P> {
        let (height, width) = image.dim();
        Array2::from_shape_fn((height + 2 * pad_y, width + 2 * pad_x), |(y, x)| {
            self.sample(
                image,
                x as isize - pad_x as isize,
                y as isize - pad_y as isize,
            )
            .unwrap_or_default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index() {
        assert_eq!(BorderPolicy::Skip.index(-1, 5), None);
        assert_eq!(BorderPolicy::Skip.index(4, 5), Some(4));
        assert_eq!(BorderPolicy::Extended.index(-3, 5), Some(0));
        assert_eq!(BorderPolicy::Extended.index(7, 5), Some(4));
        assert_eq!(BorderPolicy::Wrap.index(-1, 5), Some(4));
        assert_eq!(BorderPolicy::Wrap.index(6, 5), Some(1));
        assert_eq!(BorderPolicy::Reflect.index(-1, 5), Some(1));
        assert_eq!(BorderPolicy::Reflect.index(-2, 5), Some(2));
        assert_eq!(BorderPolicy::Reflect.index(5, 5), Some(3));
        assert_eq!(BorderPolicy::Reflect.index(-3, 1), Some(0));
    }

    #[test]
    fn test_extend() {
        let image = array![[1u8, 2, 3], [4, 5, 6]];
        let ext = BorderPolicy::Extended.extend(&image.view(), 1, 1);
        assert_eq!(ext.dim(), (4, 5));
        assert_eq!(ext[(0, 0)], 1);
        assert_eq!(ext[(3, 4)], 6);
        assert_eq!(ext[(1, 1)], 1);

        let val = BorderPolicy::Value(9.0).extend(&image.view(), 2, 0);
        assert_eq!(val.row(0).to_vec(), vec![9, 9, 1, 2, 3, 9, 9]);
    }

    #[test]
    fn test_skip_has_no_pad_value() {
        let image = array![[1.5f32, 2.5]];
        assert_eq!(BorderPolicy::Skip.sample(&image.view(), -1, 0), None);
        assert_eq!(BorderPolicy::Skip.sample(&image.view(), 1, 0), Some(2.5));
    }
}
