//! 训练数据预处理流水线。
//!
//! 读取 -> 规范化 -> 复制与增强 -> （可选）平滑 -> 切块 -> 通道化 -> 分batch -> （可选）划分。

use super::augment::Augment;
use super::batch::{check_ratio, get_batches, get_split, reshape_data};
use super::consts::{DEFAULT_PATCH_SIZE, TRAIN_RATIO};
use super::error::{PrepError, Result};
use super::io::{load_volume, save_array};
use super::smooth::Smoother;
use super::tile::TileLayout;
use super::timer::StageTimer;
use super::window::HuWindow;
use super::{Mask, Volume};
use json::JsonValue;
use ndarray::{concatenate, Array3, Array5, ArrayView3, Axis};
use ndarray_npy::WritableElement;
use std::path::{Path, PathBuf};

/// 流水线配置。
#[derive(Clone, Debug, PartialEq)]
pub struct PrepConfig {
    /// 切块边长，同时也是每个batch的切块层数。
    pub patch_size: usize,
    /// 图像规范化使用的HU窗口。
    pub window: HuWindow,
    /// 复制份数（包含原数据）。`None`或`Some(1)`表示不复制。
    pub replica: Option<usize>,
    /// 训练集比例。`None`表示不划分。
    pub split: Option<f64>,
    pub layout: TileLayout,
    /// 是否对图像做分组高斯平滑。
    pub smooth: bool,
    /// 平滑用的随机种子。
    pub seed: Option<u64>,
}

impl Default for PrepConfig {
    fn default() -> Self {
        Self {
            patch_size: DEFAULT_PATCH_SIZE,
            window: HuWindow::default(),
            replica: None,
            split: Some(TRAIN_RATIO),
            layout: TileLayout::default(),
            smooth: false,
            seed: None,
        }
    }
}

impl PrepConfig {
    pub fn validate(&self) -> Result<()> {
        if self.patch_size == 0 {
            return Err(PrepError::ZeroPatchSize);
        }
        if self.replica == Some(0) {
            return Err(PrepError::Config("replica must be at least 1".to_string()));
        }
        if let Some(ratio) = self.split {
            check_ratio(ratio)?;
        }
        HuWindow::new(self.window.lower(), self.window.upper())?;
        Ok(())
    }
}

/// 分batch后的数据，可能已经划分为训练集与验证集。
#[derive(Clone, Debug, PartialEq)]
pub enum Split<A> {
    Whole(Array5<A>),
    TrainValid { train: Array5<A>, valid: Array5<A> },
}

impl<A> Split<A> {
    /// batch总数。
    pub fn batch_count(&self) -> usize {
        match self {
            Split::Whole(all) => all.len_of(Axis(0)),
            Split::TrainValid { train, valid } => train.len_of(Axis(0)) + valid.len_of(Axis(0)),
        }
    }

    fn shapes_json(&self) -> JsonValue {
        let mut obj = JsonValue::new_object();
        match self {
            Split::Whole(all) => {
                obj["batches"] = all.shape().to_vec().into();
            }
            Split::TrainValid { train, valid } => {
                obj["train"] = train.shape().to_vec().into();
                obj["valid"] = valid.shape().to_vec().into();
            }
        }
        obj
    }
}

impl<A: WritableElement> Split<A> {
    /// 写入`dir/{prefix}_train.npy`与`dir/{prefix}_valid.npy`，未划分时写入`dir/{prefix}_batches.npy`。
    pub fn save<P: AsRef<Path>>(&self, dir: P, prefix: &str) -> Result<Vec<PathBuf>> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        let mut written = Vec::with_capacity(2);
        match self {
            Split::Whole(all) => {
                let path = dir.join(format!("{prefix}_batches.npy"));
                save_array(&path, all)?;
                written.push(path);
            }
            Split::TrainValid { train, valid } => {
                let path = dir.join(format!("{prefix}_train.npy"));
                save_array(&path, train)?;
                written.push(path);
                let path = dir.join(format!("{prefix}_valid.npy"));
                save_array(&path, valid)?;
                written.push(path);
            }
        }
        Ok(written)
    }
}

/// 一对预处理完成的图像与标签。
#[derive(Clone, Debug, PartialEq)]
pub struct PreparedPair {
    pub image: Split<f32>,
    pub mask: Split<u8>,
}

impl PreparedPair {
    /// 写入图像与标签的所有batch文件。
    pub fn save<P: AsRef<Path>>(&self, dir: P) -> Result<Vec<PathBuf>> {
        let mut written = self.image.save(dir.as_ref(), "image")?;
        written.extend(self.mask.save(dir.as_ref(), "mask")?);
        Ok(written)
    }

    /// 描述输出形状与配置的清单。
    pub fn manifest(&self, config: &PrepConfig) -> JsonValue {
        let mut m = JsonValue::new_object();
        m["patch_size"] = config.patch_size.into();
        m["layout"] = config.layout.name().into();
        m["window"] = json::array![config.window.lower(), config.window.upper()];
        m["replica"] = config.replica.map_or(JsonValue::Null, JsonValue::from);
        m["split"] = config.split.map_or(JsonValue::Null, JsonValue::from);
        m["smooth"] = config.smooth.into();
        m["image"] = self.image.shapes_json();
        m["mask"] = self.mask.shapes_json();
        m
    }
}

/// 预处理流水线。`G`为复制时使用的数据增强。
pub struct Pipeline<G> {
    config: PrepConfig,
    augmenter: G,
    smoother: Option<Smoother>,
    timer: StageTimer,
}

impl<G: Augment> Pipeline<G> {
    pub fn new(config: PrepConfig, augmenter: G) -> Result<Self> {
        config.validate()?;
        let smoother = config.smooth.then(|| Smoother::new(config.seed));
        Ok(Self {
            config,
            augmenter,
            smoother,
            timer: StageTimer::new(),
        })
    }

    #[inline]
    pub fn config(&self) -> &PrepConfig {
        &self.config
    }

    #[inline]
    pub fn timer(&self) -> &StageTimer {
        &self.timer
    }

    /// 从文件读取图像（`f32`）与标签（`u8`）后运行流水线。
    pub fn run_files<P: AsRef<Path>, Q: AsRef<Path>>(
        &mut self,
        image_path: P,
        mask_path: Q,
    ) -> Result<PreparedPair> {
        self.timer.start();
        let image: Volume = load_volume(image_path)?;
        let mask: Mask = load_volume(mask_path)?;
        self.timer.elapsed("load");
        self.run(image, mask)
    }

    /// 对一对图像与标签运行流水线。
    pub fn run(&mut self, image: Volume, mask: Mask) -> Result<PreparedPair> {
        let (image, mask) = self.prepare_volumes(image, mask)?;
        self.tile_volumes(image.view(), mask.view())
    }

    /// 切块前的全部步骤：规范化、复制与增强、（可选）平滑。
    ///
    /// 返回的体数据就是随后被切块的体数据。
    pub fn prepare_volumes(&mut self, mut image: Volume, mask: Mask) -> Result<(Volume, Mask)> {
        if image.dim() != mask.dim() {
            return Err(PrepError::PairMismatch {
                image: image.shape().to_vec(),
                mask: mask.shape().to_vec(),
            });
        }
        log::info!("图像形状: {:?}", image.dim());

        self.timer.start();
        self.config.window.normalize_inplace(image.view_mut());
        self.timer.elapsed("normalize");

        self.timer.start();
        let (mut image, mask) = self.replicate(image, mask)?;
        self.timer.elapsed("augment");

        if let Some(smoother) = self.smoother.as_mut() {
            self.timer.start();
            smoother.smooth(image.view_mut(), self.config.patch_size)?;
            self.timer.elapsed("smooth");
        }
        Ok((image, mask))
    }

    /// 切块、通道化、分batch与（可选）划分。
    pub fn tile_volumes(
        &mut self,
        image: ArrayView3<f32>,
        mask: ArrayView3<u8>,
    ) -> Result<PreparedPair> {
        if image.dim() != mask.dim() {
            return Err(PrepError::PairMismatch {
                image: image.shape().to_vec(),
                mask: mask.shape().to_vec(),
            });
        }
        self.timer.start();
        let image = self.to_batches(image)?;
        let mask = self.to_batches(mask)?;
        self.timer.elapsed("tile");
        log::info!("batch形状: {:?}", image.shape());

        self.timer.start();
        let image = self.split(image)?;
        let mask = self.split(mask)?;
        self.timer.elapsed("split");

        Ok(PreparedPair { image, mask })
    }

    /// 只处理图像：先切块，再把切块结果原样复制拼接，不做增强。
    ///
    /// 每份副本包含全部切块，副本之间首尾相接。
    pub fn run_image(&mut self, mut image: Volume) -> Result<Split<f32>> {
        let size = self.config.patch_size;
        self.timer.start();
        self.config.window.normalize_inplace(image.view_mut());
        let mut patches = self.config.layout.crop(image.view(), size)?;
        let copies = self.config.replica.unwrap_or(1);
        if copies > 1 {
            let joined = concatenate(Axis(2), &vec![patches.view(); copies])?;
            patches = joined;
        }
        let reshaped = reshape_data(patches.view());
        let batches = get_batches(reshaped.view(), size)?;
        let split = self.split(batches)?;
        self.timer.elapsed("image");
        Ok(split)
    }

    /// 以上一份结果为输入反复增强，沿深度方向拼接。
    fn replicate(&mut self, image: Volume, mask: Mask) -> Result<(Volume, Mask)> {
        let copies = self.config.replica.unwrap_or(1);
        if copies <= 1 {
            return Ok((image, mask));
        }
        let mut images = vec![image];
        let mut masks = vec![mask];
        for i in 1..copies {
            let last = images.len() - 1;
            let (img_re, msk_re) =
                self.augmenter
                    .augment(&images[last], &masks[last], self.config.patch_size)?;
            if img_re.dim() != images[last].dim() || msk_re.dim() != masks[last].dim() {
                return Err(PrepError::PairMismatch {
                    image: img_re.shape().to_vec(),
                    mask: msk_re.shape().to_vec(),
                });
            }
            log::debug!("第{i}份增强数据完成");
            images.push(img_re);
            masks.push(msk_re);
        }
        let image = concat_depth(&images)?;
        let mask = concat_depth(&masks)?;
        log::info!("复制{copies}份后形状: {:?}", image.dim());
        Ok((image, mask))
    }

    fn to_batches<A: Clone>(&self, volume: ArrayView3<A>) -> Result<Array5<A>> {
        let size = self.config.patch_size;
        let patches = self.config.layout.crop(volume, size)?;
        let reshaped = reshape_data(patches.view());
        get_batches(reshaped.view(), size)
    }

    fn split<A: Clone>(&self, batches: Array5<A>) -> Result<Split<A>> {
        match self.config.split {
            None => Ok(Split::Whole(batches)),
            Some(ratio) => {
                let (train, valid) = get_split(batches.view(), ratio)?;
                Ok(Split::TrainValid {
                    train: train.to_owned(),
                    valid: valid.to_owned(),
                })
            }
        }
    }
}

fn concat_depth<A: Clone>(volumes: &[Array3<A>]) -> Result<Array3<A>> {
    let views: Vec<ArrayView3<A>> = volumes.iter().map(|v| v.view()).collect();
    Ok(concatenate(Axis(2), &views)?)
}

/// 读取两个文件并以`config`预处理。
pub fn preprocess_data_train<P, Q, G>(
    image_path: P,
    mask_path: Q,
    config: PrepConfig,
    augmenter: G,
) -> Result<PreparedPair>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
    G: Augment,
{
    Pipeline::new(config, augmenter)?.run_files(image_path, mask_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prep::augment::{RandomAugmenter, Replicate};
    use crate::prep::recover::recover;
    use ndarray::s;

    fn hu_volume(dim: (usize, usize, usize)) -> Volume {
        Array3::from_shape_fn(dim, |(h, w, d)| -1200.0 + (h * 37 + w * 11 + d * 5) as f32)
    }

    fn label_volume(dim: (usize, usize, usize)) -> Mask {
        Array3::from_shape_fn(dim, |(h, w, d)| ((h + w + d) % 3) as u8)
    }

    fn small_config() -> PrepConfig {
        PrepConfig {
            patch_size: 4,
            ..PrepConfig::default()
        }
    }

    #[test]
    fn test_default_config() {
        let c = PrepConfig::default();
        assert_eq!(c.patch_size, 64);
        assert_eq!(c.split, Some(0.9));
        assert_eq!(c.layout, TileLayout::Cube);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let bad = [
            PrepConfig {
                patch_size: 0,
                ..PrepConfig::default()
            },
            PrepConfig {
                replica: Some(0),
                ..PrepConfig::default()
            },
            PrepConfig {
                split: Some(1.2),
                ..PrepConfig::default()
            },
        ];
        for c in bad {
            assert!(Pipeline::new(c, Replicate).is_err());
        }
    }

    #[test]
    fn test_run_split_shapes() {
        // 8 * 8 * 20 -> 4个切块 * 20层 = 80 -> 20个batch -> 18 / 2
        let mut p = Pipeline::new(small_config(), Replicate).unwrap();
        let out = p.run(hu_volume((8, 8, 20)), label_volume((8, 8, 20))).unwrap();
        match (&out.image, &out.mask) {
            (
                Split::TrainValid { train, valid },
                Split::TrainValid {
                    train: mtrain,
                    valid: mvalid,
                },
            ) => {
                assert_eq!(train.dim(), (18, 4, 4, 4, 1));
                assert_eq!(valid.dim(), (2, 4, 4, 4, 1));
                assert_eq!(mtrain.dim(), train.dim());
                assert_eq!(mvalid.dim(), valid.dim());
                assert!(train.iter().all(|v| (0.0..=1.0).contains(v)));
            }
            _ => panic!("expected a train/valid split"),
        }
        assert_eq!(out.image.batch_count(), 20);
        assert!(p.timer().stage_ms("tile").is_some());
    }

    #[test]
    fn test_run_without_split_recovers_mask() {
        let config = PrepConfig {
            split: None,
            ..small_config()
        };
        let mask = label_volume((8, 12, 9));
        let mut p = Pipeline::new(config, Replicate).unwrap();
        let out = p.run(hu_volume((8, 12, 9)), mask.clone()).unwrap();
        let Split::Whole(batches) = out.mask else {
            panic!("expected whole batches");
        };
        let back = recover(batches.view(), 4, TileLayout::Cube, 8, 12).unwrap();
        assert_eq!(back, mask.slice(s![.., .., ..8]));
    }

    #[test]
    fn test_replica_concatenates_depth() {
        let config = PrepConfig {
            split: None,
            replica: Some(3),
            ..small_config()
        };
        let mask = label_volume((4, 4, 4));
        let mut p = Pipeline::new(config, Replicate).unwrap();
        let out = p.run(hu_volume((4, 4, 4)), mask.clone()).unwrap();
        let Split::Whole(batches) = out.mask else {
            panic!("expected whole batches");
        };
        assert_eq!(batches.dim(), (3, 4, 4, 4, 1));
        let back = recover(batches.view(), 4, TileLayout::Cube, 4, 4).unwrap();
        for k in 0..3 {
            assert_eq!(back.slice(s![.., .., k * 4..(k + 1) * 4]), mask);
        }
    }

    #[test]
    fn test_random_augmenter_keeps_pair_consistent() {
        let config = PrepConfig {
            split: None,
            replica: Some(4),
            ..small_config()
        };
        let aug = RandomAugmenter::new(Some(9));
        let image = Array3::from_shape_fn((8, 8, 4), |(h, w, d)| -1000.0 + (h * 16 + w * 2 + d) as f32);
        let mask = image.mapv(|v| (v + 1000.0) as u8);
        let mut p = Pipeline::new(config, aug).unwrap();
        let out = p.run(image, mask).unwrap();
        let (Split::Whole(img), Split::Whole(msk)) = (out.image, out.mask) else {
            panic!("expected whole batches");
        };
        assert_eq!(img.dim(), msk.dim());
        let restored = img.mapv(|v| (v * 1000.0).round() as u8);
        assert_eq!(restored, msk);
    }

    #[test]
    fn test_smoothing_zero_volume_stays_zero() {
        let config = PrepConfig {
            split: None,
            smooth: true,
            seed: Some(5),
            ..small_config()
        };
        let mut p = Pipeline::new(config, Replicate).unwrap();
        let image = Array3::<f32>::from_elem((4, 4, 8), -2000.0);
        let out = p.run(image, Array3::zeros((4, 4, 8))).unwrap();
        let Split::Whole(img) = out.image else {
            panic!("expected whole batches");
        };
        assert!(img.iter().all(|v| v.abs() < 1e-6));
        assert!(p.timer().stage_ms("smooth").is_some());
    }

    #[test]
    fn test_mismatched_pair() {
        let mut p = Pipeline::new(small_config(), Replicate).unwrap();
        let err = p
            .run(hu_volume((8, 8, 8)), label_volume((8, 4, 8)))
            .unwrap_err();
        assert!(matches!(err, PrepError::PairMismatch { .. }));
    }

    #[test]
    fn test_run_image_copies_patches_after_cropping() {
        // 深度6不是4的整数倍：先切块截断为4层，再复制
        let config = PrepConfig {
            replica: Some(2),
            split: None,
            ..small_config()
        };
        let mut p = Pipeline::new(config, Replicate).unwrap();
        let Split::Whole(batches) = p.run_image(hu_volume((8, 4, 6))).unwrap() else {
            panic!("expected whole batches");
        };
        // 2个切块 * 4层 = 8，复制后16 -> 4个batch
        assert_eq!(batches.dim(), (4, 4, 4, 4, 1));
        assert_eq!(
            batches.slice(s![..2, .., .., .., ..]),
            batches.slice(s![2.., .., .., .., ..])
        );
        let raw = Array3::<f32>::from_elem((4, 4, 4), -1000.0);
        let config = PrepConfig {
            split: None,
            ..small_config()
        };
        let mut p = Pipeline::new(config, Replicate).unwrap();
        let Split::Whole(normalized) = p.run_image(raw).unwrap() else {
            panic!("expected whole batches");
        };
        assert_eq!(normalized.dim(), (1, 4, 4, 4, 1));
        assert!(normalized.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_prepared_volumes_are_tiled_volumes() {
        let config = PrepConfig {
            replica: Some(2),
            smooth: true,
            seed: Some(4),
            split: None,
            ..small_config()
        };
        let (image, mask) = (hu_volume((8, 8, 10)), label_volume((8, 8, 10)));
        let mut p = Pipeline::new(config.clone(), Replicate).unwrap();
        let (pi, pm) = p.prepare_volumes(image.clone(), mask.clone()).unwrap();
        assert_eq!(pi.dim(), (8, 8, 20));
        assert_eq!(pm.dim(), (8, 8, 20));
        let tiled = p.tile_volumes(pi.view(), pm.view()).unwrap();
        let whole = Pipeline::new(config, Replicate).unwrap().run(image, mask).unwrap();
        assert_eq!(tiled, whole);
    }

    #[test]
    fn test_run_image_replicates_copies() {
        let config = PrepConfig {
            replica: Some(2),
            split: Some(0.5),
            ..small_config()
        };
        let mut p = Pipeline::new(config, Replicate).unwrap();
        let out = p.run_image(hu_volume((4, 4, 4))).unwrap();
        let Split::TrainValid { train, valid } = out else {
            panic!("expected a train/valid split");
        };
        assert_eq!(train, valid);
    }

    #[test]
    fn test_manifest() {
        let config = small_config();
        let mut p = Pipeline::new(config.clone(), Replicate).unwrap();
        let out = p.run(hu_volume((8, 8, 20)), label_volume((8, 8, 20))).unwrap();
        let m = out.manifest(&config);
        assert_eq!(m["patch_size"], 4);
        assert_eq!(m["layout"], "cube");
        assert_eq!(m["image"]["train"][0], 18);
        assert_eq!(m["mask"]["valid"][0], 2);
        assert!(m["replica"].is_null());
    }
}
