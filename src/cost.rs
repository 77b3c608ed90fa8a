//! 单像素匹配代价
//!
//! 每种代价由两部分组成: 左右一对采样的单像素代价 `element`, 以及窗口累加值到最终代价的转换 `score`.
//! 聚合部分只依赖 `Accumulate` 的加减, 与具体代价无关.
use std::marker::PhantomData;
use std::ops::{Add, AddAssign, Sub, SubAssign};

use crate::pixel::{Accumulate, Pixel, Score};
use crate::utils::hamming_distance;

pub trait BlockRowScore<T>: Send + Sync {
    /// 单像素代价, 在窗口内累加
    type Element: Accumulate;
    /// 窗口代价, 越小越好
    type Score: Score;

    fn element(&self, left: T, right: T) -> Self::Element;
    /// 窗口累加值转换为最终代价, area 为窗口像素数量
    fn score(&self, sum: Self::Element, area: usize) -> Self::Score;
}

/// 绝对差之和
pub struct SadScore<P>(PhantomData<P>);

impl<P> SadScore<P> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<P> Default for SadScore<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Pixel> BlockRowScore<P> for SadScore<P> {
    type Element = P::Sum;
    type Score = P::Sum;

    fn element(&self, left: P, right: P) -> P::Sum {
        left.abs_error(right)
    }
    fn score(&self, sum: P::Sum, _area: usize) -> P::Sum {
        sum
    }
}

/// census 值的汉明距离
#[derive(Default)]
pub struct HammingScore;

impl BlockRowScore<u64> for HammingScore {
    type Element = i32;
    type Score = i32;

    fn element(&self, left: u64, right: u64) -> i32 {
        hamming_distance(left, right) as i32
    }
    fn score(&self, sum: i32, _area: usize) -> i32 {
        sum
    }
}

/// NCC 所需的累加量
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct NccSums {
    pub left: f64,
    pub right: f64,
    pub left_sq: f64,
    pub right_sq: f64,
    pub cross: f64,
}

impl NccSums {
    pub fn new(l: f64, r: f64) -> Self {
        Self {
            left: l,
            right: r,
            left_sq: l * l,
            right_sq: r * r,
            cross: l * r,
        }
    }
}

impl Add for NccSums {
    type Output = Self;
    fn add(self, o: Self) -> Self {
        Self {
            left: self.left + o.left,
            right: self.right + o.right,
            left_sq: self.left_sq + o.left_sq,
            right_sq: self.right_sq + o.right_sq,
            cross: self.cross + o.cross,
        }
    }
}

impl Sub for NccSums {
    type Output = Self;
    fn sub(self, o: Self) -> Self {
        Self {
            left: self.left - o.left,
            right: self.right - o.right,
            left_sq: self.left_sq - o.left_sq,
            right_sq: self.right_sq - o.right_sq,
            cross: self.cross - o.cross,
        }
    }
}

impl AddAssign for NccSums {
    fn add_assign(&mut self, o: Self) {
        *self = *self + o;
    }
}

impl SubAssign for NccSums {
    fn sub_assign(&mut self, o: Self) {
        *self = *self - o;
    }
}

impl Accumulate for NccSums {}

/// 归一化互相关, 代价为 1 - ncc, 范围 [0, 2]. 任一窗口方差为 0 时代价为 1
pub struct NccScore<P>(PhantomData<P>);

impl<P> NccScore<P> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<P> Default for NccScore<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Pixel> BlockRowScore<P> for NccScore<P> {
    type Element = NccSums;
    type Score = f64;

    fn element(&self, left: P, right: P) -> NccSums {
        NccSums::new(left.to_f64(), right.to_f64())
    }

    fn score(&self, sum: NccSums, area: usize) -> f64 {
        let n = area as f64;
        let var_left = n * sum.left_sq - sum.left * sum.left;
        let var_right = n * sum.right_sq - sum.right * sum.right;
        if var_left <= 0f64 || var_right <= 0f64 {
            return 1f64;
        }
        let cov = n * sum.cross - sum.left * sum.right;
        let ncc = (cov / (var_left * var_right).sqrt()).clamp(-1f64, 1f64);
        1f64 - ncc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window_sum<T: Copy, R: BlockRowScore<T>>(scorer: &R, left: &[T], right: &[T]) -> R::Score {
        let sum = left
            .iter()
            .zip(right.iter())
            .fold(R::Element::default(), |acc, (l, r)| acc + scorer.element(*l, *r));
        scorer.score(sum, left.len())
    }

    #[test]
    fn test_sad() {
        let scorer = SadScore::<u8>::new();
        assert_eq!(window_sum(&scorer, &[10u8, 20, 30], &[12u8, 20, 25]), 7);
        let scorer = SadScore::<f32>::new();
        assert_eq!(window_sum(&scorer, &[0.5f32, 1.0], &[1.0f32, 0.25]), 1.25);
    }

    #[test]
    fn test_hamming() {
        let scorer = HammingScore;
        assert_eq!(scorer.element(0b1011, 0b0001), 2);
        assert_eq!(window_sum(&scorer, &[u64::MAX, 0], &[0u64, 0]), 64);
    }

    #[test]
    fn test_ncc_perfect_and_inverted() {
        let scorer = NccScore::<u8>::new();
        let left = [10u8, 50, 90, 20];
        let scaled = [20u8, 100, 180, 40];
        let inverted = [90u8, 50, 10, 80];
        assert!(window_sum(&scorer, &left, &scaled).abs() < 1e-12);
        assert!((window_sum(&scorer, &left, &inverted) - 2f64).abs() < 1e-12);
    }

    #[test]
    fn test_ncc_flat_window() {
        let scorer = NccScore::<u8>::new();
        assert_eq!(window_sum(&scorer, &[7u8, 7, 7], &[1u8, 2, 3]), 1f64);
    }

    #[test]
    fn test_ncc_sums_sliding() {
        let a = NccSums::new(3.0, 4.0);
        let b = NccSums::new(1.0, 2.0);
        let mut s = a + b;
        s -= a;
        assert_eq!(s, b);
    }
}
