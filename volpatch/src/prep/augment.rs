//! 图像/标签对的数据增强。

use super::error::{PrepError, Result};
use super::smooth::Smoother;
use super::{Mask, Volume};
use ndarray::Axis;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// 数据增强接口：接受一对图像/标签，返回同形状的增强结果。
///
/// 实现必须对图像与标签施加相同的几何变换。
pub trait Augment {
    fn augment(&mut self, image: &Volume, mask: &Mask, size: usize) -> Result<(Volume, Mask)>;
}

/// 不做任何变换，直接复制。
#[derive(Copy, Clone, Debug, Default)]
pub struct Replicate;

impl Augment for Replicate {
    fn augment(&mut self, image: &Volume, mask: &Mask, _size: usize) -> Result<(Volume, Mask)> {
        Ok((image.clone(), mask.clone()))
    }
}

/// 随机沿高度、宽度方向翻转，可选地对图像做分组高斯平滑。
#[derive(Clone, Debug)]
pub struct RandomAugmenter {
    rng: ChaCha8Rng,
    flip_prob: f64,
    smoother: Option<Smoother>,
}

impl RandomAugmenter {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => ChaCha8Rng::seed_from_u64(s),
            None => ChaCha8Rng::from_entropy(),
        };
        Self {
            rng,
            flip_prob: 0.5,
            smoother: None,
        }
    }

    /// 每个轴被翻转的概率。
    pub fn with_flip_prob(mut self, prob: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&prob) {
            return Err(PrepError::Config(format!(
                "flip probability {prob} is outside [0, 1]"
            )));
        }
        self.flip_prob = prob;
        Ok(self)
    }

    /// 增强后再对图像做分组平滑（标签不变）。
    pub fn with_smoother(mut self, smoother: Smoother) -> Self {
        self.smoother = Some(smoother);
        self
    }
}

impl Augment for RandomAugmenter {
    fn augment(&mut self, image: &Volume, mask: &Mask, size: usize) -> Result<(Volume, Mask)> {
        if image.dim() != mask.dim() {
            return Err(PrepError::PairMismatch {
                image: image.shape().to_vec(),
                mask: mask.shape().to_vec(),
            });
        }
        let mut image = image.clone();
        let mut mask = mask.clone();
        for axis in [Axis(0), Axis(1)] {
            if self.rng.gen_bool(self.flip_prob) {
                image.invert_axis(axis);
                mask.invert_axis(axis);
                log::debug!("翻转第{}轴", axis.index());
            }
        }
        let mut image = image.as_standard_layout().into_owned();
        let mask = mask.as_standard_layout().into_owned();
        if let Some(smoother) = self.smoother.as_mut() {
            smoother.smooth(image.view_mut(), size)?;
        }
        Ok((image, mask))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{s, Array3};

    fn pair() -> (Volume, Mask) {
        let image = Array3::from_shape_fn((4, 6, 3), |(h, w, d)| (h * 30 + w * 5 + d) as f32);
        let mask = Array3::from_shape_fn((4, 6, 3), |(h, w, d)| (h * 30 + w * 5 + d) as u8);
        (image, mask)
    }

    #[test]
    fn test_replicate() {
        let (image, mask) = pair();
        let (i2, m2) = Replicate.augment(&image, &mask, 2).unwrap();
        assert_eq!(i2, image);
        assert_eq!(m2, mask);
    }

    #[test]
    fn test_always_flip_both_axes() {
        let (image, mask) = pair();
        let mut aug = RandomAugmenter::new(Some(0)).with_flip_prob(1.0).unwrap();
        let (i2, m2) = aug.augment(&image, &mask, 2).unwrap();
        assert_eq!(i2, image.slice(s![..;-1, ..;-1, ..]));
        assert_eq!(m2, mask.slice(s![..;-1, ..;-1, ..]));
        assert!(i2.is_standard_layout());
    }

    #[test]
    fn test_flip_keeps_pair_aligned() {
        let (image, mask) = pair();
        let mut aug = RandomAugmenter::new(Some(42));
        for _ in 0..8 {
            let (i2, m2) = aug.augment(&image, &mask, 2).unwrap();
            assert_eq!(i2.dim(), image.dim());
            assert_eq!(i2.mapv(|v| v as u8), m2);
        }
    }

    #[test]
    fn test_never_flip_with_zero_sigma_smoother() {
        let (image, mask) = pair();
        let smoother = Smoother::new(Some(1)).with_sigma_range(0.0, 0.0).unwrap();
        let mut aug = RandomAugmenter::new(None)
            .with_flip_prob(0.0)
            .unwrap()
            .with_smoother(smoother);
        let (i2, m2) = aug.augment(&image, &mask, 2).unwrap();
        assert_eq!(i2, image);
        assert_eq!(m2, mask);
    }

    #[test]
    fn test_rejects_mismatched_pair() {
        let (image, _) = pair();
        let mask = Array3::<u8>::zeros((4, 4, 3));
        assert!(matches!(
            RandomAugmenter::new(None).augment(&image, &mask, 2),
            Err(PrepError::PairMismatch { .. })
        ));
    }
}
