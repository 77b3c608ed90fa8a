use image::{GrayImage, RgbImage};
use log::LevelFilter;
use log4rs::{
    append::console::ConsoleAppender,
    config::{Appender, Root},
    encode::pattern::PatternEncoder,
};
use ndarray::{parallel::prelude::*, prelude::*, Zip};

use ndarray_stats::QuantileExt;
use nshare::{ToNdarray2, ToNdarray3};

use crate::core::DisparityMap;
use crate::error::{self, Error, Result};

/// 初始化控制台日志, 重复初始化返回错误
pub fn init_log(level: &str) -> Result<()> {
    let stdout: ConsoleAppender = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new(
            "{d(%Y-%m-%d %H:%M:%S)} [{h({l})}] - {m}{n}",
        )))
        .build();
    let log_config = log4rs::config::Config::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout)))
        .build(
            Root::builder()
                .appender("stdout")
                .build(if level == "trace" {
                    LevelFilter::Trace
                } else if level == "debug" {
                    LevelFilter::Debug
                } else {
                    LevelFilter::Info
                }),
        )
        .map_err(|_| Error::new(3001, error::ERROR_3001))?;
    log4rs::init_config(log_config).map_err(|_| Error::new(3001, error::ERROR_3001))?;
    Ok(())
}

/// 彩色图转换为灰度数组
pub fn rgb_to_gray(source: &RgbImage) -> Array2<u8> {
    let (width, height) = source.dimensions();
    let mut source_nd = source.clone().into_ndarray3();
    source_nd.swap_axes(0, 1);
    source_nd.swap_axes(1, 2);
    let mut ret = Array2::<u8>::zeros((height as usize, width as usize));
    Zip::indexed(&mut ret).par_for_each(|(y, x), val| {
        let pixel = source_nd.slice(s![y, x, ..]);
        let v = pixel[0] as f32 * 0.299f32 + pixel[1] as f32 * 0.587f32 + pixel[2] as f32 * 0.114f32;
        *val = v.round().min(255f32) as u8
    });
    ret
}

/// 灰度图转换为二维数组, 形状为 (高, 宽)
pub fn gray_image_to_array(source: &GrayImage) -> Array2<u8> {
    source.clone().into_ndarray2()
}

/// 计算汉明距离
pub fn hamming_distance(a: u64, b: u64) -> u32 {
    (a ^ b).count_ones()
}

/// 转换为视差图, 有效视差线性拉伸到 [0, 255], 无效像素为 0
pub fn to_disparity_image(map: &DisparityMap) -> Option<GrayImage> {
    let (height, width) = (map.height(), map.width());
    let invalid = map.invalid_value();
    let source = map.view();
    let valid = source.mapv(|v| if v < invalid { v } else { f32::NAN });
    let disparity_min = *valid.min_skipnan();
    let disparity_max = *valid.max_skipnan();
    let mut ret = Array2::<u8>::zeros((height, width));
    if !disparity_min.is_nan() {
        let d = (disparity_max - disparity_min).max(f32::EPSILON);
        par_azip!((r in &mut ret, s in &valid) {
            if !s.is_nan() {
                *r = (1f32 + (s - disparity_min) / d * 254f32) as u8;
            }
        });
    }
    GrayImage::from_raw(width as u32, height as u32, ret.into_raw_vec())
}
