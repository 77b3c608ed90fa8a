use std::sync::Arc;

use stereo_bm::census::Census;
use stereo_bm::core::*;
use stereo_bm::{utils, BlockMatcher, SparseBlockMatcher};

use log::{debug, info};

/// 用法: disparity [left.png] [right.png] [sad|census|ncc]
pub fn main() -> Result<(), Box<dyn std::error::Error>> {
    utils::init_log("debug")?;
    let args: Vec<String> = std::env::args().collect();
    let left_path = args.get(1).map(String::as_str).unwrap_or("images/left.png");
    let right_path = args.get(2).map(String::as_str).unwrap_or("images/right.png");
    let metric = match args.get(3).map(String::as_str) {
        Some("census") => CostMetric::Census,
        Some("ncc") => CostMetric::Ncc,
        _ => CostMetric::Sad,
    };

    let limg = utils::rgb_to_gray(&image::open(left_path)?.to_rgb8());
    let rimg = utils::rgb_to_gray(&image::open(right_path)?.to_rgb8());

    let option = BlockMatchOption::new(0, 64)
        .set_radius_x(4)
        .set_radius_y(4)
        .set_cost_metric(metric)
        .set_texture_threshold(0.15)
        .set_uniqueness(0.15)
        .set_subpixel(true)
        .set_border(BorderPolicy::Extended)
        .build();

    let mut stereo = BlockMatcher::new(Some(option))?.with_census_transform(Arc::new(Census::default()));
    let mut sw = stopwatch::Stopwatch::start_new();
    let disparity = stereo.process(&limg.view(), &rimg.view())?;
    info!(
        "matching elapse time: {}ms, valid: {} / {}",
        sw.elapsed_ms(),
        disparity.valid_count(),
        disparity.width() * disparity.height()
    );

    // 图像中心点的单点查询
    let mut sparse = SparseBlockMatcher::<u8>::new(Some(option))?
        .with_census_transform(Arc::new(Census::default()));
    sparse.set_images(&limg.view(), &rimg.view())?;
    let (cx, cy) = (disparity.width() / 2, disparity.height() / 2);
    let point = sparse.query_at(cx, cy)?;
    info!(
        "query ({}, {}): {:?}, dense: {:?}",
        cx,
        cy,
        point.disparity(),
        disparity.disparity(cx, cy)
    );

    sw.restart();
    if let Some(image) = utils::to_disparity_image(disparity) {
        image.save("disparity.png")?;
    }
    debug!("[match] save disparity image. elapse time: {}ms", sw.elapsed_ms());
    Ok(())
}
