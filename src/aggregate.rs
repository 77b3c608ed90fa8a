//! 行代价聚合
//!
//! 对于同一行, 同一视差下相邻窗口共享大部分像素, 因此以视差为最外层循环:
//! 每个视差只计算一次单像素代价, 然后用滑动窗口求和, 每列的代价为 O(1).
//! 垂直方向同样用滑动求和: 加上新进入窗口的行, 减去移出窗口的行.
use ndarray::prelude::*;

use crate::core::{DisparityRange, MatchingWindow};
use crate::cost::BlockRowScore;
use crate::pixel::{Accumulate, Score};

/// 一行的视差代价表 score[d][x]
///
/// 视差 d 下, 左图中心列 x 的窗口 [x-rx, x+rx] 与右图窗口 [x-d-rx, x-d+rx] 都必须在图像内,
/// 即 x ∈ [d + rx, width - rx). 视差每增加 1, 有效列数减少 1.
/// 所有视差存放在一个连续数组中, 每个视差的起始位置预先计算.
#[derive(Clone, Debug, Default)]
pub struct ScoreTable<E> {
    data: Vec<E>,
    offsets: Vec<usize>,
    lengths: Vec<usize>,
    min_disparity: usize,
    radius_x: usize,
}

impl<E: Copy + Default> ScoreTable<E> {
    pub fn new(width: usize, range: DisparityRange, radius_x: usize) -> Self {
        let mut table = Self {
            data: Vec::new(),
            offsets: Vec::new(),
            lengths: Vec::new(),
            min_disparity: 0,
            radius_x: 0,
        };
        table.reset(width, range, radius_x);
        table
    }
    /// 重新设置尺寸, 尽量复用已分配的内存
    pub fn reset(&mut self, width: usize, range: DisparityRange, radius_x: usize) {
        self.min_disparity = range.min();
        self.radius_x = radius_x;
        self.offsets.clear();
        self.lengths.clear();
        let mut total = 0usize;
        for i in 0..range.len() {
            let len = width.saturating_sub(range.disparity(i) + 2 * radius_x);
            self.offsets.push(total);
            self.lengths.push(len);
            total += len;
        }
        self.data.clear();
        self.data.resize(total, E::default());
    }
    /// 视差数量
    pub fn disparity_count(&self) -> usize {
        self.lengths.len()
    }
    /// 第 i 个视差的有效列数
    pub fn len(&self, index: usize) -> usize {
        self.lengths[index]
    }
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
    pub fn row(&self, index: usize) -> &[E] {
        let start = self.offsets[index];
        &self.data[start..start + self.lengths[index]]
    }
    pub fn row_mut(&mut self, index: usize) -> &mut [E] {
        let start = self.offsets[index];
        let end = start + self.lengths[index];
        &mut self.data[start..end]
    }
    /// 第 i 个视差下, 左图中心列 x 的代价
    pub fn get(&self, index: usize, x: usize) -> Option<E> {
        let first = self.min_disparity + index + self.radius_x;
        if x < first {
            return None;
        }
        self.row(index).get(x - first).copied()
    }
    /// 收集左图中心列 x 前 count 个视差的代价, 调用方保证这些视差都有效
    pub fn gather_column(&self, x: usize, count: usize, out: &mut Vec<E>) {
        out.clear();
        out.extend((0..count).map(|i| self.row(i)[x - (self.min_disparity + i + self.radius_x)]));
    }
    /// 所有视差的原始数据, 与 `as_slice_mut` 布局相同
    pub fn as_slice(&self) -> &[E] {
        &self.data
    }
    pub fn as_slice_mut(&mut self) -> &mut [E] {
        &mut self.data
    }
}

impl<E: Accumulate> ScoreTable<E> {
    /// self += other, 两表布局必须相同
    pub fn add_assign(&mut self, other: &ScoreTable<E>) {
        for (a, b) in self.data.iter_mut().zip(other.data.iter()) {
            *a += *b;
        }
    }
    /// self -= other, 两表布局必须相同
    pub fn sub_assign(&mut self, other: &ScoreTable<E>) {
        for (a, b) in self.data.iter_mut().zip(other.data.iter()) {
            *a -= *b;
        }
    }
}

/// ## 计算一行所有视差的水平窗口代价
///
/// 1. 计算该视差下每个有效列的单像素代价, 共 width - d 个
/// 2. 第一个窗口直接求和
/// 3. 之后每列: score[x+1] = score[x] + element[x + region_width] - element[x]
///
///### 参数
/// * left_row / right_row: 左右图同一行
/// * elements: 单像素代价缓存, 长度不足时自动扩展
/// * table: 输出, 需已按该行宽度 reset
pub fn score_row<T, R>(
    scorer: &R,
    left_row: ArrayView1<T>,
    right_row: ArrayView1<T>,
    region_width: usize,
    elements: &mut Vec<R::Element>,
    table: &mut ScoreTable<R::Element>,
) where
    T: Copy,
    R: BlockRowScore<T>,
{
    let width = left_row.len();
    let min_disparity = table.min_disparity;
    for i in 0..table.disparity_count() {
        let len = table.len(i);
        if len == 0 {
            continue;
        }
        let d = min_disparity + i;
        let col_max = width - d;
        elements.clear();
        elements.extend((0..col_max).map(|c| scorer.element(left_row[c + d], right_row[c])));

        let out = table.row_mut(i);
        let mut score = elements[..region_width]
            .iter()
            .fold(R::Element::default(), |acc, e| acc + *e);
        out[0] = score;
        for col in 1..len {
            score += elements[col + region_width - 1] - elements[col - 1];
            out[col] = score;
        }
    }
}

/// 直接计算左图 (x, y) 处视差 d 的窗口累加值, 不做任何复用. 调用方保证窗口在图像内
pub fn block_sum<T, R>(
    scorer: &R,
    left: &ArrayView2<T>,
    right: &ArrayView2<T>,
    x: usize,
    y: usize,
    d: usize,
    window: MatchingWindow,
) -> R::Element
where
    T: Copy,
    R: BlockRowScore<T>,
{
    let (rx, ry) = (window.radius_x(), window.radius_y());
    let mut sum = R::Element::default();
    for yy in y - ry..=y + ry {
        for xx in x - rx..=x + rx {
            sum += scorer.element(left[(yy, xx)], right[(yy, xx - d)]);
        }
    }
    sum
}

/// ## 五区域代价
/// 中心窗口代价加上四个角窗口中最小的两个. 角窗口中心为 (x±rx, top/bottom 行),
/// 角窗口不在图像内时不参与比较.
///
///### 参数
/// * top / middle / bottom: 上方角窗口行, 中心行, 下方角窗口行的窗口代价
/// * out: 输出, 与 middle 布局相同
pub fn five_region_scores<S: Score + Default>(
    top: &ScoreTable<S>,
    middle: &ScoreTable<S>,
    bottom: &ScoreTable<S>,
    out: &mut ScoreTable<S>,
) {
    let rx = middle.radius_x;
    for i in 0..middle.disparity_count() {
        let first = middle.min_disparity + i + rx;
        let dst = out.row_mut(i);
        for (k, center) in middle.row(i).iter().enumerate() {
            let x = first + k;
            let corners = [
                top.get(i, x - rx),
                bottom.get(i, x - rx),
                top.get(i, x + rx),
                bottom.get(i, x + rx),
            ];
            dst[k] = match best_two(&corners) {
                Some(s) => *center + s,
                None => *center,
            };
        }
    }
}

/// 最小两个代价之和, 不足两个时返回 None
pub fn best_two<S: Score>(values: &[Option<S>]) -> Option<S> {
    let mut first: Option<S> = None;
    let mut second: Option<S> = None;
    for v in values.iter().flatten() {
        match first {
            Some(a) if !(*v < a) => match second {
                Some(b) if !(*v < b) => {}
                _ => second = Some(*v),
            },
            _ => {
                second = first;
                first = Some(*v);
            }
        }
    }
    Some(first? + second?)
}

/// 每个线程私有的缓存, 首次使用时分配, 之后跨帧复用
#[derive(Debug, Default)]
pub struct Workspace<E, S> {
    /// 单像素代价
    pub elements: Vec<E>,
    /// 最近 region_height 行的水平代价(环形)
    pub horizontal: Vec<ScoreTable<E>>,
    /// 垂直累加后的窗口代价
    pub vertical: ScoreTable<E>,
    /// 当前行的最终代价
    pub scores: ScoreTable<S>,
    /// 五区域匹配: 最近 region_height 个中心行的窗口代价(环形)
    pub centers: Vec<ScoreTable<S>>,
    /// 单列所有视差的代价
    pub column: Vec<S>,
    /// 当前行纹理
    pub texture: Vec<f64>,
    pub laplacian: Vec<f64>,
    /// begin_rows 时的中心行
    origin: usize,
}

impl<E: Copy + Default, S: Copy + Default> Workspace<E, S> {
    /// 按图像宽度和窗口调整缓存大小, centers 为五区域匹配需要保存的中心行数量
    pub fn check_size(
        &mut self,
        width: usize,
        range: DisparityRange,
        window: MatchingWindow,
        centers: usize,
    ) {
        let rx = window.radius_x();
        self.horizontal
            .resize_with(window.height(), ScoreTable::default);
        self.horizontal.truncate(window.height());
        for table in self.horizontal.iter_mut() {
            table.reset(width, range, rx);
        }
        self.centers.resize_with(centers, ScoreTable::default);
        self.centers.truncate(centers);
        for table in self.centers.iter_mut() {
            table.reset(width, range, rx);
        }
        self.vertical.reset(width, range, rx);
        self.scores.reset(width, range, rx);
        self.elements.reserve(width);
    }
}

impl<E: Accumulate, S: Copy + Default> Workspace<E, S> {
    /// 以 center 行为中心, 直接计算窗口内每一行的水平代价并累加到 `vertical`
    pub fn begin_rows<T, R>(
        &mut self,
        scorer: &R,
        left: &ArrayView2<T>,
        right: &ArrayView2<T>,
        center: usize,
        window: MatchingWindow,
    ) where
        T: Copy,
        R: BlockRowScore<T, Element = E>,
    {
        self.origin = center;
        for v in self.vertical.as_slice_mut() {
            *v = E::default();
        }
        let top = center - window.radius_y();
        for r in 0..window.height() {
            score_row(
                scorer,
                left.row(top + r),
                right.row(top + r),
                window.width(),
                &mut self.elements,
                &mut self.horizontal[r],
            );
            self.vertical.add_assign(&self.horizontal[r]);
        }
    }

    /// 窗口中心从 center - 1 下移到 center: 减去移出的 center - 1 - ry 行, 加上新进入的 center + ry 行
    pub fn advance_row<T, R>(
        &mut self,
        scorer: &R,
        left: &ArrayView2<T>,
        right: &ArrayView2<T>,
        center: usize,
        window: MatchingWindow,
    ) where
        T: Copy,
        R: BlockRowScore<T, Element = E>,
    {
        let row = center + window.radius_y();
        let slot = (center - 1 - self.origin) % window.height();
        self.vertical.sub_assign(&self.horizontal[slot]);
        score_row(
            scorer,
            left.row(row),
            right.row(row),
            window.width(),
            &mut self.elements,
            &mut self.horizontal[slot],
        );
        self.vertical.add_assign(&self.horizontal[slot]);
    }
}
