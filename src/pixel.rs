//! 像素类型与代价累加类型
use std::fmt::Debug;
use std::ops::{Add, AddAssign, Sub, SubAssign};

/// 可滑动累加的量: 支持加减的零元类型
pub trait Accumulate:
    Copy + Default + Send + Sync + Debug + Add<Output = Self> + Sub<Output = Self> + AddAssign + SubAssign
{
}

impl Accumulate for i32 {}
impl Accumulate for i64 {}
impl Accumulate for f64 {}

/// 窗口代价, 越小越好. 五区域匹配时多个窗口的代价相加
pub trait Score: Copy + PartialOrd + Send + Sync + Debug + Add<Output = Self> {
    fn as_f64(self) -> f64;
}

impl Score for i32 {
    fn as_f64(self) -> f64 {
        self as f64
    }
}

impl Score for i64 {
    fn as_f64(self) -> f64 {
        self as f64
    }
}

impl Score for f64 {
    fn as_f64(self) -> f64 {
        self
    }
}

/// 灰度像素类型
///
/// 8 位图像的 SAD 在 `i32` 中累加, 窗口面积上限约 8.4M 像素; 16 位图像在 `i64` 中累加.
pub trait Pixel: Copy + Default + Send + Sync + Debug + 'static {
    /// SAD 累加类型
    type Sum: Accumulate + Score;

    fn abs_error(self, other: Self) -> Self::Sum;
    /// samples 个单像素误差之和能否放入 `Sum`
    fn sum_fits(_samples: f64) -> bool {
        true
    }
    fn to_f64(self) -> f64;
    fn from_f32(v: f32) -> Self;
}

impl Pixel for u8 {
    type Sum = i32;

    fn abs_error(self, other: Self) -> i32 {
        (self as i32 - other as i32).abs()
    }
    fn sum_fits(samples: f64) -> bool {
        samples * u8::MAX as f64 <= i32::MAX as f64
    }
    fn to_f64(self) -> f64 {
        self as f64
    }
    fn from_f32(v: f32) -> Self {
        v.round().clamp(0f32, u8::MAX as f32) as u8
    }
}

impl Pixel for u16 {
    type Sum = i64;

    fn abs_error(self, other: Self) -> i64 {
        (self as i64 - other as i64).abs()
    }
    fn sum_fits(samples: f64) -> bool {
        samples * u16::MAX as f64 <= i64::MAX as f64
    }
    fn to_f64(self) -> f64 {
        self as f64
    }
    fn from_f32(v: f32) -> Self {
        v.round().clamp(0f32, u16::MAX as f32) as u16
    }
}

impl Pixel for f32 {
    type Sum = f64;

    fn abs_error(self, other: Self) -> f64 {
        (self as f64 - other as f64).abs()
    }
    fn to_f64(self) -> f64 {
        self as f64
    }
    fn from_f32(v: f32) -> Self {
        v
    }
}

impl Pixel for f64 {
    type Sum = f64;

    fn abs_error(self, other: Self) -> f64 {
        (self - other).abs()
    }
    fn to_f64(self) -> f64 {
        self
    }
    fn from_f32(v: f32) -> Self {
        v as f64
    }
}
