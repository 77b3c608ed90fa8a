use crate::pixel::Score;

/// 偏移量上限, 小于 0.5 使结果不会与相邻视差重合
pub const MAX_OFFSET: f64 = 0.5 - 1f64 / 256f64;

/// ## 亚像素拟合
/// 以最优视差及其前后两个视差的代价拟合一元二次曲线, 取曲线极值位置.
///
/// ```text
/// offset = (cost(d-1) - cost(d+1)) / (2 * (cost(d-1) + cost(d+1) - 2*cost(d)))
/// ```
///
/// 最优视差位于搜索范围两端时不拟合; 曲率为 0 时退化为整数视差. 偏移量限制在开区间 (-0.5, 0.5) 内.
///
///### 参数
/// * scores: 单列所有视差的代价
/// * best: 最优视差的下标
///### 返回
/// 亚像素视差下标
pub fn refine<S: Score>(scores: &[S], best: usize) -> f32 {
    if best == 0 || best + 1 >= scores.len() {
        return best as f32;
    }
    let c0 = scores[best].as_f64();
    let c_up = scores[best - 1].as_f64();
    let c_down = scores[best + 1].as_f64();
    let denom = c_up + c_down - 2f64 * c0;
    if denom == 0f64 || !denom.is_finite() {
        return best as f32;
    }
    let offset = ((c_up - c_down) / (denom * 2f64)).clamp(-MAX_OFFSET, MAX_OFFSET);
    best as f32 + offset as f32
}
