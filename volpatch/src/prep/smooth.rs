//! 随机高斯平滑。

use super::consts::{GAUSSIAN_TRUNCATE, SIGMA_LOWER, SIGMA_UPPER};
use super::error::{PrepError, Result};
use ndarray::{ArrayViewMut3, Axis};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// 归一化的一维高斯核，半径为`floor(4 * sigma + 0.5)`。
pub fn gaussian_kernel(sigma: f64) -> Vec<f32> {
    let radius = (GAUSSIAN_TRUNCATE * sigma + 0.5) as isize;
    let denom = 2.0 * sigma * sigma;
    let weights: Vec<f64> = (-radius..=radius)
        .map(|x| (-((x * x) as f64) / denom).exp())
        .collect();
    let sum: f64 = weights.iter().sum();
    weights.into_iter().map(|v| (v / sum) as f32).collect()
}

/// 半采样对称的边界延拓：(d c b a | a b c d | d c b a)。
#[inline]
fn reflect(idx: isize, len: usize) -> usize {
    let n = len as isize;
    let m = idx.rem_euclid(2 * n);
    (if m < n { m } else { 2 * n - 1 - m }) as usize
}

/// 三维可分离高斯滤波（原地）。`sigma <= 0`时不做任何修改。
pub fn gaussian_filter3(mut volume: ArrayViewMut3<f32>, sigma: f64) {
    if sigma <= 0.0 || volume.is_empty() {
        return;
    }
    let kernel = gaussian_kernel(sigma);
    let radius = (kernel.len() / 2) as isize;
    let mut line: Vec<f32> = Vec::new();

    for axis in 0..3 {
        for mut lane in volume.lanes_mut(Axis(axis)) {
            line.clear();
            line.extend(lane.iter().copied());
            let len = line.len();
            for (i, out) in lane.iter_mut().enumerate() {
                *out = kernel
                    .iter()
                    .enumerate()
                    .map(|(k, w)| w * line[reflect(i as isize + k as isize - radius, len)])
                    .sum();
            }
        }
    }
}

/// 按深度方向每`size`层为一组，每组随机抽取sigma进行高斯平滑。
#[derive(Clone, Debug)]
pub struct Smoother {
    rng: ChaCha8Rng,
    sigma_lower: f64,
    sigma_upper: f64,
}

impl Smoother {
    /// 给定种子时结果可复现；否则从系统熵初始化。
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => ChaCha8Rng::seed_from_u64(s),
            None => ChaCha8Rng::from_entropy(),
        };
        Self {
            rng,
            sigma_lower: SIGMA_LOWER,
            sigma_upper: SIGMA_UPPER,
        }
    }

    /// 修改sigma的采样区间[`lower`, `upper`]。
    pub fn with_sigma_range(mut self, lower: f64, upper: f64) -> Result<Self> {
        if !(0.0..=upper).contains(&lower) || !upper.is_finite() {
            return Err(PrepError::Config(format!(
                "sigma range [{lower}, {upper}] is invalid"
            )));
        }
        self.sigma_lower = lower;
        self.sigma_upper = upper;
        Ok(self)
    }

    fn draw_sigma(&mut self) -> f64 {
        if self.sigma_lower == self.sigma_upper {
            self.sigma_lower
        } else {
            self.rng.gen_range(self.sigma_lower..=self.sigma_upper)
        }
    }

    /// 原地平滑`volume`，返回每组实际使用的sigma。最后一组可能不足`size`层。
    pub fn smooth(&mut self, mut volume: ArrayViewMut3<f32>, size: usize) -> Result<Vec<f64>> {
        if size == 0 {
            return Err(PrepError::ZeroPatchSize);
        }
        let mut sigmas = Vec::with_capacity(volume.len_of(Axis(2)) / size + 1);
        for chunk in volume.axis_chunks_iter_mut(Axis(2), size) {
            let sigma = self.draw_sigma();
            gaussian_filter3(chunk, sigma);
            sigmas.push(sigma);
        }
        log::debug!("高斯平滑{}组，sigma: {:?}", sigmas.len(), sigmas);
        Ok(sigmas)
    }
}
