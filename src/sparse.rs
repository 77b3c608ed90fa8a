//! 稀疏块匹配: 单点视差查询
//!
//! 每次查询直接累加窗口代价, 不复用相邻像素的结果. 与稠密匹配使用相同的几何范围,
//! 纹理检测与视差选择, 整型图像上两者的结果逐位一致.
use std::sync::Arc;

use getset::Getters;
use ndarray::prelude::*;

use crate::aggregate::{best_two, block_sum};
use crate::census::CensusTransform;
use crate::core::{Approach, BlockMatchOption, CostMetric, Point, PointDisparity};
use crate::cost::{BlockRowScore, HammingScore, NccScore, SadScore};
use crate::error::{self, Error, Result};
use crate::pair::{Geometry, RectifiedPair};
use crate::pixel::Pixel;
use crate::select::DisparitySelector;
use crate::texture::{texture_row, TextureValidator};

use log::debug;

/// set_images 之后的只读数据
struct Prepared<P> {
    pair: RectifiedPair<P>,
    census: Option<(Array2<u64>, Array2<u64>)>,
    intensity: Option<Array2<f64>>,
}

/// 稀疏块匹配
///
/// `query_at` 只读访问内部数据, 可在多个线程中同时调用.
#[derive(Getters)]
pub struct SparseBlockMatcher<P> {
    #[getset(get = "pub")]
    option: BlockMatchOption,
    census: Option<Arc<dyn CensusTransform>>,
    prepared: Option<Prepared<P>>,
}

impl<P: Pixel> SparseBlockMatcher<P> {
    /// 稀疏匹配不支持右到左一致性检查, 设置后返回错误
    pub fn new(option: Option<BlockMatchOption>) -> Result<Self> {
        let option = option.unwrap_or_default();
        option.validate()?;
        if option.right_to_left_tolerance().is_some() {
            return Err(Error::new(1007, error::ERROR_1007));
        }
        Ok(Self {
            option,
            census: None,
            prepared: None,
        })
    }
    pub fn with_census_transform(mut self, census: Arc<dyn CensusTransform>) -> Self {
        self.census = Some(census);
        self
    }
    pub fn set_census_transform(&mut self, census: Arc<dyn CensusTransform>) {
        self.census = Some(census);
    }

    /// ## 设置左右图
    /// 按边界方式扩展图像, 代价类型为 Census 时计算编码图, 开启纹理检测时保存左图灰度
    pub fn set_images(&mut self, left: &ArrayView2<P>, right: &ArrayView2<P>) -> Result<()> {
        self.option.validate()?;
        let census = match self.option.cost_metric() {
            CostMetric::Census => Some(
                self.census
                    .clone()
                    .ok_or_else(|| Error::new(1006, error::ERROR_1006))?,
            ),
            _ => None,
        };
        let sw = stopwatch::Stopwatch::start_new();
        let pair = RectifiedPair::new(left, right, &self.option)?;
        let census = census.map(|c| pair.census(c.as_ref()));
        let intensity = if TextureValidator::new(*self.option.texture_threshold()).is_enabled() {
            Some(pair.intensity_left())
        } else {
            None
        };
        debug!(
            "[set_images] {} x {}, census: {}. elapse time: {}ms",
            pair.geometry().width,
            pair.geometry().height,
            census.is_some(),
            sw.elapsed_ms()
        );
        self.prepared = Some(Prepared {
            pair,
            census,
            intensity,
        });
        Ok(())
    }

    /// ## 查询单点视差
    ///
    ///### 参数
    /// * x, y: 原图坐标
    ///### 返回
    /// 视差偏移量与有效标志, 与稠密视差图 (x, y) 处的值相同
    pub fn query_at(&self, x: usize, y: usize) -> Result<PointDisparity> {
        let prepared = self
            .prepared
            .as_ref()
            .ok_or_else(|| Error::new(2003, error::ERROR_2003))?;
        let g = prepared.pair.geometry();
        if x >= g.width || y >= g.height {
            return Err(Error::new(2002, error::ERROR_2002));
        }
        let point = Point::new(x, y);
        let min_disparity = g.range.min();
        let invalid = PointDisparity::new(point, g.range.len() as f32, min_disparity, false);

        let yp = match g.row(y) {
            Some(v) => v,
            None => return Ok(invalid),
        };
        let xp = x + g.pad_x;
        let count = g.disparity_count(xp);
        if count == 0 {
            return Ok(invalid);
        }

        let validator = TextureValidator::new(*self.option.texture_threshold());
        if let Some(ref image) = prepared.intensity {
            let (mut sums, mut texture) = (Vec::new(), Vec::new());
            let row_max = texture_row(&image.view(), yp, g.window, &mut sums, &mut texture);
            if !validator.accepts(texture[xp - g.window.radius_x()], row_max) {
                return Ok(invalid);
            }
        }

        let selector = DisparitySelector::from_option(&self.option);
        let value = match (&prepared.census, self.option.cost_metric()) {
            (Some((left, right)), _) => {
                select_at(&HammingScore, &selector, &left.view(), &right.view(), xp, yp, count, &g)
            }
            (None, CostMetric::Ncc) => select_at(
                &NccScore::<P>::new(),
                &selector,
                &prepared.pair.left.view(),
                &prepared.pair.right.view(),
                xp,
                yp,
                count,
                &g,
            ),
            (None, _) => select_at(
                &SadScore::<P>::new(),
                &selector,
                &prepared.pair.left.view(),
                &prepared.pair.right.view(),
                xp,
                yp,
                count,
                &g,
            ),
        };
        Ok(match value {
            Some(v) => PointDisparity::new(point, v, min_disparity, true),
            None => invalid,
        })
    }
}

/// 计算扩展图 (xp, yp) 处前 count 个视差的代价并选择视差
///
/// 五区域匹配时每个视差额外计算四个角窗口, 角窗口的顺序和取舍与稠密匹配相同
#[allow(clippy::too_many_arguments)]
fn select_at<T, R>(
    scorer: &R,
    selector: &DisparitySelector,
    left: &ArrayView2<T>,
    right: &ArrayView2<T>,
    xp: usize,
    yp: usize,
    count: usize,
    g: &Geometry,
) -> Option<f32>
where
    T: Copy,
    R: BlockRowScore<T>,
{
    let area = g.window.area();
    let rx = g.window.radius_x();
    let region = |xc: usize, yc: usize, d: usize| -> Option<R::Score> {
        if g.window_fits(xc, d) {
            Some(scorer.score(block_sum(scorer, left, right, xc, yc, d, g.window), area))
        } else {
            None
        }
    };
    let scores: Vec<R::Score> = (0..count)
        .map(|i| {
            let d = g.range.disparity(i);
            let center = region(xp, yp, d)?;
            match g.approach {
                Approach::Block => Some(center),
                Approach::BestFive => {
                    let (top, bottom) = (g.five_row_top(yp), g.five_row_bottom(yp));
                    let left_x = xp.checked_sub(rx);
                    let corners = [
                        left_x.and_then(|x| region(x, top, d)),
                        left_x.and_then(|x| region(x, bottom, d)),
                        region(xp + rx, top, d),
                        region(xp + rx, bottom, d),
                    ];
                    Some(match best_two(&corners) {
                        Some(s) => center + s,
                        None => center,
                    })
                }
            }
        })
        .collect::<Option<Vec<_>>>()?;
    selector.select(&scores).map(|s| s.value)
}
