//! # 插值工具
//!
//! 有序采样点上的分段线性插值，不做外推。
//!
//! ## 依赖关系
//! - 被 `xray/attenuation.rs` 和 `models/spectrum.rs` 使用
//! - 无外部模块依赖

/// 在严格递增的 `xs` 上对 `ys` 做线性插值
///
/// `x` 超出 `[xs[0], xs[n-1]]`（或为 NaN）时返回 `None`。
/// 恰好落在采样点上时返回该点的原始值。
pub fn linear(xs: &[f64], ys: &[f64], x: f64) -> Option<f64> {
    let first = *xs.first()?;
    let last = *xs.last()?;

    if !(x >= first && x <= last) {
        return None;
    }

    // 第一个大于 x 的下标，必然 >= 1
    let idx = xs.partition_point(|&v| v <= x);
    if idx >= xs.len() {
        return ys.get(xs.len() - 1).copied();
    }

    let (x0, x1) = (xs[idx - 1], xs[idx]);
    let (y0, y1) = (*ys.get(idx - 1)?, *ys.get(idx)?);

    Some(y0 + (x - x0) * (y1 - y0) / (x1 - x0))
}

/// 检查序列是否严格递增
pub fn is_strictly_increasing(xs: &[f64]) -> bool {
    xs.windows(2).all(|w| w[0] < w[1])
}
