//! CT窗口（HU截断）规范化。

use super::consts::{HU_LOWER, HU_UPPER};
use super::error::{PrepError, Result};
use ndarray::{Array3, ArrayView3, ArrayViewMut3};

/// HU窗口：区间外的值被截断，区间内的值线性映射到[0, 1]。
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct HuWindow {
    lower: f32,
    upper: f32,
}

impl HuWindow {
    /// 以闭区间[`lower`, `upper`]构造窗口。区间必须非空且有限。
    pub fn new(lower: f32, upper: f32) -> Result<Self> {
        if !lower.is_finite() || !upper.is_finite() || lower >= upper {
            return Err(PrepError::Config(format!(
                "HU window [{lower}, {upper}] is empty or not finite"
            )));
        }
        Ok(Self { lower, upper })
    }

    /// 以CT窗位`centre`与窗宽`width`构造窗口。
    #[inline]
    pub fn from_centre_width(centre: f32, width: f32) -> Result<Self> {
        let offset = width / 2.0;
        Self::new(centre - offset, centre + offset)
    }

    #[inline]
    pub fn lower(&self) -> f32 {
        self.lower
    }

    #[inline]
    pub fn upper(&self) -> f32 {
        self.upper
    }

    /// 单个值的规范化：`(clip(x, lower, upper) - lower) / (upper - lower)`。
    #[inline]
    pub fn apply(&self, ct: f32) -> f32 {
        (ct.clamp(self.lower, self.upper) - self.lower) / (self.upper - self.lower)
    }

    /// 规范化整个体数据，返回新数组。
    pub fn normalize(&self, volume: ArrayView3<f32>) -> Array3<f32> {
        volume.mapv(|v| self.apply(v))
    }

    /// 原地规范化。
    pub fn normalize_inplace(&self, mut volume: ArrayViewMut3<f32>) {
        volume.mapv_inplace(|v| self.apply(v));
    }
}

impl Default for HuWindow {
    fn default() -> Self {
        Self {
            lower: HU_LOWER,
            upper: HU_UPPER,
        }
    }
}

/// 以默认窗口[-1000, 0]规范化。
#[inline]
pub fn normalize(volume: ArrayView3<f32>) -> Array3<f32> {
    HuWindow::default().normalize(volume)
}

/// 将[0, 1]区间的值映射为灰度。
#[inline]
pub fn to_gray(v: f32) -> u8 {
    if v >= 1.0 {
        255_u8
    } else if v <= 0.0 {
        0_u8
    } else {
        (v * 256.0).floor() as u8
    }
}
