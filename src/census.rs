//! Census变换
//!
//! 在视图中选取任一点, 以该点为中心划出一个矩形, 矩形中除中心点之外的每一点都与中心点进行比较,
//! 灰度值小于中心点记为1, 否则记为0, 所得的 0/1 序列即为中心点的 census 值.
//! 两点的相似度通过 census 值异或后 1 的个数(汉明距离)衡量, 汉明距越小相似度越高.
//!
//! ```text
//! 127  126  130                1    1    0
//! 126  128  129      --->      1    *    0    ---> census序列 {11010101}
//! 127  131  111                1    0    1
//! ```
use ndarray::{prelude::*, Zip};

use crate::core::BorderPolicy;
use crate::error::{self, Error, Result};

/// Census变换接口
///
/// 视差计算通过 `BorderPolicy` 把自己的边界设置传给变换, 稠密和稀疏匹配得到的编码图完全相同.
pub trait CensusTransform: Send + Sync {
    /// 编码位数
    fn bits(&self) -> u32;
    /// 计算 (x, y) 处的 census 值. 邻域越界且边界方式为 Skip 时返回 0
    fn code_at(&self, image: &ArrayView2<f64>, x: usize, y: usize, border: BorderPolicy) -> u64;
    /// 整幅图像的 census 变换
    fn transform(&self, image: &ArrayView2<f64>, border: BorderPolicy) -> Array2<u64> {
        let mut ret = Array2::<u64>::zeros(image.dim());
        Zip::indexed(&mut ret).par_for_each(|(y, x), code| {
            *code = self.code_at(image, x, y, border);
        });
        ret
    }
}

/// 矩形邻域 census 变换, 邻域大小 (2*radius_x+1) x (2*radius_y+1), 最多 64 位
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Census {
    radius_x: usize,
    radius_y: usize,
}

impl Census {
    pub fn new(radius_x: usize, radius_y: usize) -> Result<Self> {
        let bits = (2 * radius_x + 1) * (2 * radius_y + 1) - 1;
        if bits == 0 || bits > 64 {
            return Err(Error::new(1003, error::ERROR_1003));
        }
        Ok(Self { radius_x, radius_y })
    }
    pub fn radius_x(&self) -> usize {
        self.radius_x
    }
    pub fn radius_y(&self) -> usize {
        self.radius_y
    }
}

impl Default for Census {
    /// 5x5 邻域, 24 位
    fn default() -> Self {
        Self {
            radius_x: 2,
            radius_y: 2,
        }
    }
}

impl CensusTransform for Census {
    fn bits(&self) -> u32 {
        ((2 * self.radius_x + 1) * (2 * self.radius_y + 1) - 1) as u32
    }

    fn code_at(&self, image: &ArrayView2<f64>, x: usize, y: usize, border: BorderPolicy) -> u64 {
        let center = image[(y, x)];
        let rx = self.radius_x as isize;
        let ry = self.radius_y as isize;
        let mut val = 0u64;
        for dy in -ry..=ry {
            for dx in -rx..=rx {
                if dx == 0 && dy == 0 {
                    continue;
                }
                let neighbour = match border.sample(image, x as isize + dx, y as isize + dy) {
                    Some(v) => v,
                    None => return 0,
                };
                val = (val << 1) | if neighbour < center { 1 } else { 0 };
            }
        }
        val
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::hamming_distance;

    #[test]
    fn test_code_3x3() {
        let image = array![
            [127.0, 126.0, 130.0],
            [126.0, 128.0, 129.0],
            [127.0, 131.0, 111.0]
        ];
        let census = Census::new(1, 1).unwrap();
        let code = census.code_at(&image.view(), 1, 1, BorderPolicy::Skip);
        assert_eq!(code, 0b1101_0101);
        assert_eq!(census.bits(), 8);
    }

    #[test]
    fn test_skip_border_is_zero() {
        let image = Array2::<f64>::from_shape_fn((4, 4), |(y, x)| (x * 7 + y * 3) as f64);
        let census = Census::new(1, 1).unwrap();
        let codes = census.transform(&image.view(), BorderPolicy::Skip);
        assert_eq!(codes[(0, 2)], 0);
        assert_eq!(codes[(2, 3)], 0);
        assert_eq!(codes[(1, 1)], census.code_at(&image.view(), 1, 1, BorderPolicy::Skip));
    }

    #[test]
    fn test_transform_matches_code_at() {
        let image = Array2::<f64>::from_shape_fn((6, 7), |(y, x)| ((x * 31 + y * 17) % 13) as f64);
        let census = Census::new(2, 1).unwrap();
        let codes = census.transform(&image.view(), BorderPolicy::Reflect);
        for ((y, x), code) in codes.indexed_iter() {
            assert_eq!(*code, census.code_at(&image.view(), x, y, BorderPolicy::Reflect));
        }
    }

    #[test]
    fn test_constant_image_codes_equal() {
        let image = Array2::<f64>::from_elem((5, 5), 10.0);
        let census = Census::default();
        let codes = census.transform(&image.view(), BorderPolicy::Extended);
        assert!(codes.iter().all(|c| *c == 0));
        assert_eq!(hamming_distance(codes[(0, 0)], codes[(4, 4)]), 0);
    }

    #[test]
    fn test_window_limits() {
        assert_eq!(Census::new(0, 0).unwrap_err().code, 1003);
        assert_eq!(Census::new(4, 4).unwrap_err().code, 1003);
        assert!(Census::new(3, 3).is_ok());
    }
}
