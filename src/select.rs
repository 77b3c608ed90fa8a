//! 视差选择
//!
//! 赢家通吃(WTA): 每列在所有视差中选择代价最小者, 之后依次做:
//! 1. 最大误差检查: 最优代价超过上限时无效
//! 2. 唯一性检查: 次优代价(与最优视差相差超过 1)不够大时无效, 避免重复纹理误匹配
//! 3. 可选的亚像素拟合
use crate::core::BlockMatchOption;
use crate::pixel::Score;
use crate::subpixel;

/// 单列视差选择结果
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Selection {
    /// 最优视差下标(相对最小视差)
    pub index: usize,
    /// 输出值, 开启亚像素时为小数
    pub value: f32,
}

#[derive(Copy, Clone, Debug)]
pub struct DisparitySelector {
    max_error: Option<f64>,
    uniqueness: f64,
    subpixel: bool,
}

impl DisparitySelector {
    pub fn new(max_error: Option<f64>, uniqueness: f32, subpixel: bool) -> Self {
        Self {
            max_error,
            uniqueness: uniqueness as f64,
            subpixel,
        }
    }

    pub fn from_option(option: &BlockMatchOption) -> Self {
        Self::new(option.max_error(), *option.uniqueness(), *option.subpixel())
    }

    /// 选择代价最小的视差, 代价相同时取较小的视差
    pub fn best<S: Score>(scores: &[S]) -> Option<usize> {
        let mut best: Option<(usize, S)> = None;
        for (i, s) in scores.iter().enumerate() {
            match best {
                Some((_, b)) if !(*s < b) => {}
                _ => best = Some((i, *s)),
            }
        }
        best.map(|(i, _)| i)
    }

    /// ## 单列视差选择
    ///
    ///### 参数
    /// * scores: 该列所有可测试视差的代价, 第 i 个对应最小视差 + i
    pub fn select<S: Score>(&self, scores: &[S]) -> Option<Selection> {
        let index = Self::best(scores)?;
        let best = scores[index].as_f64();
        if let Some(max_error) = self.max_error {
            if best > max_error {
                return None;
            }
        }
        if self.uniqueness > 0f64 {
            let second = scores
                .iter()
                .enumerate()
                .filter(|(i, _)| (*i as isize - index as isize).abs() > 1)
                .map(|(_, s)| s.as_f64())
                .fold(None, |acc: Option<f64>, s| match acc {
                    Some(a) if a <= s => Some(a),
                    _ => Some(s),
                });
            if let Some(second) = second {
                if second - best <= self.uniqueness * best.abs() {
                    return None;
                }
            }
        }
        let value = if self.subpixel {
            subpixel::refine(scores, index)
        } else {
            index as f32
        };
        Some(Selection { index, value })
    }
}

/// ## 右到左一致性检查(可选扩展, 仅稠密匹配)
///
/// 左图列 x 的最优视差为 d, 对应右图列 xr = x - d. 以右图为参考, 在所有能看到 xr 的左图列
/// xr + d' 中选出代价最小的 d', 两者相差超过容差时视为不一致.
///
///### 参数
/// * score_at: (视差下标, 左图列) -> 代价, 不在有效范围时返回 None
/// * disparity_count: 视差数量
pub fn right_to_left_consistent<S, F>(
    score_at: F,
    x: usize,
    index: usize,
    min_disparity: usize,
    disparity_count: usize,
    tolerance: u32,
) -> bool
where
    S: Score,
    F: Fn(usize, usize) -> Option<S>,
{
    let d = min_disparity + index;
    let xr = x - d;
    let mut best: Option<(usize, S)> = None;
    for i in 0..disparity_count {
        let column = xr + min_disparity + i;
        if let Some(s) = score_at(i, column) {
            match best {
                Some((_, b)) if !(s < b) => {}
                _ => best = Some((i, s)),
            }
        }
    }
    match best {
        Some((i, _)) => (i as i64 - index as i64).abs() <= tolerance as i64,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_winner_take_all() {
        let selector = DisparitySelector::new(None, 0.0, false);
        let s = selector.select(&[50, 40, 3, 40, 60]).unwrap();
        assert_eq!(s, Selection { index: 2, value: 2.0 });
    }

    #[test]
    fn test_ties_pick_smallest_disparity() {
        assert_eq!(DisparitySelector::best(&[5, 1, 3, 1]), Some(1));
        assert_eq!(DisparitySelector::best::<i32>(&[]), None);
    }

    #[test]
    fn test_max_error() {
        let selector = DisparitySelector::new(Some(10.0), 0.0, false);
        assert!(selector.select(&[20, 11, 30]).is_none());
        assert!(selector.select(&[20, 10, 30]).is_some());
    }

    #[test]
    fn test_uniqueness_rejects_ambiguous() {
        let selector = DisparitySelector::new(None, 0.2, false);
        // 相邻视差不参与次优
        assert!(selector.select(&[100, 11, 10, 12, 100]).is_some());
        // 远处视差只比最优大 10%
        assert!(selector.select(&[11, 50, 10, 50, 100]).is_none());
        // 完全一致的两个匹配
        assert!(selector.select(&[0, 50, 0, 50]).is_none());
        assert!(selector.select(&[0, 50, 1, 50]).is_some());
    }

    #[test]
    fn test_subpixel_selection() {
        let selector = DisparitySelector::new(None, 0.0, true);
        let s = selector.select(&[9.0f64, 4.0, 1.0, 4.0, 9.0]).unwrap();
        assert_eq!(s.index, 2);
        assert_eq!(s.value, 2.0);
        let s = selector.select(&[1.0f64, 4.0, 9.0]).unwrap();
        assert_eq!(s.value, 0.0);
    }

    #[test]
    fn test_right_to_left() {
        // 行代价: score[i][x], 视差下标 0..3, 最小视差 0
        let table = vec![
            vec![9, 9, 9, 9, 9, 9],
            vec![9, 9, 9, 1, 9, 9],
            vec![9, 9, 9, 9, 0, 9],
        ];
        let score_at = |i: usize, x: usize| table[i].get(x).copied();
        // x=3, d=1 -> xr=2, 右图列 2 的候选: (0, x=2)=9, (1, x=3)=1, (2, x=4)=0 -> d'=2
        assert!(right_to_left_consistent(score_at, 3, 1, 0, 3, 1));
        assert!(!right_to_left_consistent(score_at, 3, 1, 0, 3, 0));
    }
}
