use std::any::Any;
use std::sync::Arc;

use getset::Getters;
use ndarray::{parallel::prelude::*, prelude::*};
use ndarray_stats::QuantileExt;

use crate::aggregate::{five_region_scores, ScoreTable, Workspace};
use crate::census::CensusTransform;
use crate::core::{Approach, BlockMatchOption, CostMetric, DisparityMap};
use crate::cost::{BlockRowScore, HammingScore, NccScore, SadScore};
use crate::error::{self, Error, Result};
use crate::pair::{Geometry, RectifiedPair};
use crate::pixel::Pixel;
use crate::select::{right_to_left_consistent, DisparitySelector};
use crate::texture::{texture_row, TextureValidator};

use log::{debug, trace};

/// 一次匹配中所有行块共享的只读数据
struct BlockContext<'a, T, R> {
    left: ArrayView2<'a, T>,
    right: ArrayView2<'a, T>,
    /// 左图灰度, 仅在开启纹理检测时存在
    texture: Option<ArrayView2<'a, f64>>,
    scorer: &'a R,
    geometry: Geometry,
    selector: DisparitySelector,
    validator: TextureValidator,
    right_to_left: Option<u32>,
}

impl<'a, T, R> BlockContext<'a, T, R>
where
    T: Copy + Sync,
    R: BlockRowScore<T>,
    R::Score: Default,
{
    /// ## 计算一块连续输出行
    /// 第一个中心行的窗口内各行直接计算水平代价并累加, 之后每行减去移出窗口的行, 加上新进入的行.
    /// 五区域匹配时中心行向上下各多滑动 ry 行, 保存最近 region_height 个中心行的窗口代价.
    ///
    ///### 参数
    /// * y0: 该块第一行在原图中的行号
    /// * out: 该块对应的视差图行
    fn compute_block(
        &self,
        ws: &mut Workspace<R::Element, R::Score>,
        y0: usize,
        out: &mut ArrayViewMut2<f32>,
    ) {
        let g = self.geometry;
        let rows = y0..y0 + out.nrows();
        let first = rows.clone().find(|y| g.row(*y).is_some());
        let last = rows.rev().find(|y| g.row(*y).is_some());
        let (first, last) = match (first, last) {
            (Some(a), Some(b)) => (a + g.pad_y, b + g.pad_y),
            _ => return,
        };
        let (c0, c1, ring) = match g.approach {
            Approach::Block => (first, last, 0),
            Approach::BestFive => (
                g.five_row_top(first),
                g.five_row_bottom(last),
                g.window.height(),
            ),
        };
        ws.check_size(g.working_width(), g.range, g.window, ring);
        let offset = g.pad_y + y0;

        let mut next = first;
        for c in c0..=c1 {
            if c == c0 {
                ws.begin_rows(self.scorer, &self.left, &self.right, c, g.window);
            } else {
                ws.advance_row(self.scorer, &self.left, &self.right, c, g.window);
            }
            match g.approach {
                Approach::Block => {
                    self.region_scores(&ws.vertical, &mut ws.scores);
                    self.select_row(ws, c, out.row_mut(c - offset));
                }
                Approach::BestFive => {
                    let n = ws.centers.len();
                    self.region_scores(&ws.vertical, &mut ws.centers[c % n]);
                    while next <= last && g.five_row_bottom(next) <= c {
                        five_region_scores(
                            &ws.centers[g.five_row_top(next) % n],
                            &ws.centers[next % n],
                            &ws.centers[g.five_row_bottom(next) % n],
                            &mut ws.scores,
                        );
                        self.select_row(ws, next, out.row_mut(next - offset));
                        next += 1;
                    }
                }
            }
        }
    }

    /// 窗口累加值转换为窗口代价
    fn region_scores(&self, vertical: &ScoreTable<R::Element>, out: &mut ScoreTable<R::Score>) {
        let area = self.geometry.window.area();
        for (s, e) in out.as_slice_mut().iter_mut().zip(vertical.as_slice().iter()) {
            *s = self.scorer.score(*e, area);
        }
    }

    /// 由 `ws.scores` 对扩展图第 yp 行的每一列选择视差
    fn select_row(
        &self,
        ws: &mut Workspace<R::Element, R::Score>,
        yp: usize,
        mut out: ArrayViewMut1<f32>,
    ) {
        let g = self.geometry;
        let row_max = match self.texture {
            Some(ref image) if self.validator.is_enabled() => {
                texture_row(image, yp, g.window, &mut ws.laplacian, &mut ws.texture)
            }
            _ => 0f64,
        };

        let rx = g.window.radius_x();
        let min_disparity = g.range.min();
        let invalid = g.range.len() as f32;
        for x in 0..g.width {
            let xp = x + g.pad_x;
            let count = g.disparity_count(xp);
            if count == 0 {
                out[x] = invalid;
                continue;
            }
            if self.validator.is_enabled() && !self.validator.accepts(ws.texture[xp - rx], row_max) {
                out[x] = invalid;
                continue;
            }
            ws.scores.gather_column(xp, count, &mut ws.column);
            let selection = match self.selector.select(&ws.column) {
                Some(v) => v,
                None => {
                    out[x] = invalid;
                    continue;
                }
            };
            if let Some(tolerance) = self.right_to_left {
                let scores = &ws.scores;
                let consistent = right_to_left_consistent(
                    |i, column| {
                        if i < g.disparity_count(column) {
                            scores.get(i, column)
                        } else {
                            None
                        }
                    },
                    xp,
                    selection.index,
                    min_disparity,
                    g.range.len(),
                    tolerance,
                );
                if !consistent {
                    out[x] = invalid;
                    continue;
                }
            }
            out[x] = selection.value;
        }
    }
}

/// 取出可复用的缓存, 类型不符时重新创建
fn take_workspace<E, S>(slot: &mut Option<Box<dyn Any + Send>>) -> Box<Workspace<E, S>>
where
    E: Copy + Default + Send + 'static,
    S: Copy + Default + Send + 'static,
{
    match slot.take().map(|w| w.downcast::<Workspace<E, S>>()) {
        Some(Ok(ws)) => ws,
        _ => Box::default(),
    }
}

/// 稠密块匹配
///
/// 对整幅图像的每个像素计算视差. 行与行之间互不依赖, 开启 `concurrent` 时按行块并行,
/// 每个线程使用自己的缓存; 否则使用匹配器持有的缓存, 跨帧复用.
#[derive(Getters)]
pub struct BlockMatcher {
    /// 算法参数
    #[getset(get = "pub")]
    option: BlockMatchOption,
    census: Option<Arc<dyn CensusTransform>>,
    /// 视差图
    #[getset(get = "pub")]
    disparity: DisparityMap,
    workspace: Option<Box<dyn Any + Send>>,
}

impl BlockMatcher {
    pub fn new(option: Option<BlockMatchOption>) -> Result<Self> {
        let option = option.unwrap_or_default();
        option.validate()?;
        Ok(Self {
            option,
            census: None,
            disparity: DisparityMap::default(),
            workspace: None,
        })
    }
    /// 设置 census 变换, 代价类型为 Census 时必须提供
    pub fn with_census_transform(mut self, census: Arc<dyn CensusTransform>) -> Self {
        self.census = Some(census);
        self
    }
    pub fn set_census_transform(&mut self, census: Arc<dyn CensusTransform>) {
        self.census = Some(census);
    }
    pub fn set_option(&mut self, option: BlockMatchOption) -> Result<()> {
        option.validate()?;
        self.option = option;
        Ok(())
    }

    /// ## 立体匹配
    ///
    ///### 参数
    /// * left / right: 核线校正后的左右灰度图, 尺寸必须相同
    ///### 返回
    /// 视差图, 下次调用时被覆盖
    pub fn process<P: Pixel>(
        &mut self,
        left: &ArrayView2<P>,
        right: &ArrayView2<P>,
    ) -> Result<&DisparityMap> {
        self.option.validate()?;
        let census = match self.option.cost_metric() {
            CostMetric::Census => Some(
                self.census
                    .clone()
                    .ok_or_else(|| Error::new(1006, error::ERROR_1006))?,
            ),
            _ => None,
        };
        let mut sw = stopwatch::Stopwatch::start_new();
        let pair = RectifiedPair::new(left, right, &self.option)?;
        let geometry = pair.geometry();
        debug!(
            "[process] image: {} x {}, working: {} x {}, disparity: {:?}, window: {:?}, metric: {:?}, approach: {:?}. elapse time: {}ms",
            geometry.width,
            geometry.height,
            geometry.working_width(),
            geometry.working_height(),
            geometry.range,
            geometry.window,
            self.option.cost_metric(),
            geometry.approach,
            sw.elapsed_ms()
        );
        self.disparity
            .reshape(geometry.width, geometry.height, geometry.range);

        let validator = TextureValidator::new(*self.option.texture_threshold());
        let intensity = if validator.is_enabled() {
            Some(pair.intensity_left())
        } else {
            None
        };
        let texture = intensity.as_ref().map(|v| v.view());

        sw.restart();
        match census {
            Some(census) => {
                let (left_census, right_census) = pair.census(census.as_ref());
                debug!(
                    "[process] compute census end. elapse time: {}ms, value: {} - {}",
                    sw.elapsed_ms(),
                    left_census.min().map(|v| *v).unwrap_or_default(),
                    left_census.max().map(|v| *v).unwrap_or_default()
                );
                sw.restart();
                self.run(
                    left_census.view(),
                    right_census.view(),
                    texture,
                    &HammingScore,
                    geometry,
                );
            }
            None => match self.option.cost_metric() {
                CostMetric::Ncc => self.run(
                    pair.left.view(),
                    pair.right.view(),
                    texture,
                    &NccScore::<P>::new(),
                    geometry,
                ),
                _ => self.run(
                    pair.left.view(),
                    pair.right.view(),
                    texture,
                    &SadScore::<P>::new(),
                    geometry,
                ),
            },
        }
        debug!(
            "[process] compute disparity end. valid: {} / {}. elapse time: {}ms",
            self.disparity.valid_count(),
            geometry.width * geometry.height,
            sw.elapsed_ms()
        );
        Ok(&self.disparity)
    }

    fn run<'a, T, R>(
        &mut self,
        left: ArrayView2<'a, T>,
        right: ArrayView2<'a, T>,
        texture: Option<ArrayView2<'a, f64>>,
        scorer: &'a R,
        geometry: Geometry,
    ) where
        T: Copy + Sync,
        R: BlockRowScore<T>,
        R::Element: 'static,
        R::Score: Default + 'static,
    {
        let ctx = BlockContext {
            left,
            right,
            texture,
            scorer,
            geometry,
            selector: DisparitySelector::from_option(&self.option),
            validator: TextureValidator::new(*self.option.texture_threshold()),
            right_to_left: *self.option.right_to_left_tolerance(),
        };
        let mut disparity = self.disparity.view_mut();
        if *self.option.concurrent() {
            let threads = rayon::current_num_threads().max(1);
            let block_rows = ((geometry.height + threads - 1) / threads).max(geometry.window.height());
            trace!(
                "    [run] {} threads, {} rows per block",
                threads,
                block_rows
            );
            disparity
                .axis_chunks_iter_mut(Axis(0), block_rows)
                .into_par_iter()
                .enumerate()
                .for_each_init(
                    Workspace::<R::Element, R::Score>::default,
                    |ws, (i, mut chunk)| ctx.compute_block(ws, i * block_rows, &mut chunk),
                );
        } else {
            let mut ws = take_workspace::<R::Element, R::Score>(&mut self.workspace);
            ctx.compute_block(&mut ws, 0, &mut disparity);
            self.workspace = Some(ws);
        }
    }
}
