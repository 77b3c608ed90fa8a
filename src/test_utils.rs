//! 测试用随机图像
use ndarray::prelude::*;
use rand::distr::{Distribution, StandardUniform};
use rand::Rng;

pub fn random_image<T>(rng: &mut impl Rng, width: usize, height: usize) -> Array2<T>
where
    StandardUniform: Distribution<T>,
{
    Array2::from_shape_simple_fn((height, width), || rng.random())
}

/// 随机纹理像对, 右图为左图左移 shift 列: right(x) = left(x + shift), 右侧空出的列填随机值
pub fn shifted_pair(
    rng: &mut impl Rng,
    width: usize,
    height: usize,
    shift: usize,
) -> (Array2<u8>, Array2<u8>) {
    let left = random_image::<u8>(rng, width, height);
    let mut right = random_image::<u8>(rng, width, height);
    for ((y, x), v) in right.indexed_iter_mut() {
        if x + shift < width {
            *v = left[(y, x + shift)];
        }
    }
    (left, right)
}
