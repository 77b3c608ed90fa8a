mod border;
mod disparity_map;
mod option;
mod point;
mod region;

pub use border::BorderPolicy;
pub use disparity_map::DisparityMap;
pub use option::{Approach, BlockMatchOption, CostMetric};
pub use point::{Point, PointDisparity};
pub use region::{DisparityRange, MatchingWindow};
