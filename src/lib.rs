//! 块匹配立体视差
//!
//! 对核线校正后的左右灰度图, 以固定大小窗口在视差范围内搜索最相似的匹配块.
//! 提供两种入口:
//! * [`BlockMatcher`]: 稠密匹配, 输出整幅视差图
//! * [`SparseBlockMatcher`]: 单点查询, 结果与稠密匹配相同
//!
//! ```no_run
//! use ndarray::Array2;
//! use stereo_bm::core::BlockMatchOption;
//! use stereo_bm::BlockMatcher;
//!
//! let left = Array2::<u8>::zeros((480, 640));
//! let right = Array2::<u8>::zeros((480, 640));
//! let option = BlockMatchOption::new(0, 64).set_texture_threshold(0.15).build();
//! let mut matcher = BlockMatcher::new(Some(option)).unwrap();
//! let disparity = matcher.process(&left.view(), &right.view()).unwrap();
//! println!("valid: {}", disparity.valid_count());
//! ```
pub mod aggregate;
pub mod census;
pub mod core;
pub mod cost;
pub mod cpu;
pub mod error;
pub mod pair;
pub mod pixel;
pub mod select;
pub mod sparse;
pub mod subpixel;
pub mod texture;
pub mod utils;

#[cfg(test)]
mod test_utils;

pub use crate::cpu::BlockMatcher;
pub use crate::sparse::SparseBlockMatcher;
