use super::utils::{layout_name, positive_size, ratio_legal_range};
use super::MANIFEST;
use anyhow::Context;
use clap::Args;
use std::fs;
use std::path::PathBuf;
use volpatch::prelude::*;
use volpatch::prep::{load_volume, save_preprocessed};

#[derive(Args, Debug)]
pub struct Prepare {
    /// CT图像npy文件(f32)。
    #[arg(long = "image", short = 'i')]
    image: PathBuf,
    /// 标签npy文件(u8)。
    #[arg(long = "mask", short = 'm')]
    mask: PathBuf,
    /// 输出目录。
    #[arg(long = "out-dir", short = 'o')]
    out_dir: PathBuf,
    /// 切块边长。
    #[arg(long, value_parser = positive_size, default_value_t = DEFAULT_PATCH_SIZE)]
    size: usize,
    /// 复制份数（包含原数据）。
    #[arg(long, value_parser = positive_size)]
    replica: Option<usize>,
    /// 训练集比例。
    #[arg(long, value_parser = ratio_legal_range, default_value_t = TRAIN_RATIO)]
    ratio: f64,
    /// 不划分训练/验证集。
    #[arg(long = "no-split", conflicts_with = "ratio")]
    no_split: bool,
    /// 切块布局：`cube`或`slab`。
    #[arg(long, value_parser = layout_name, default_value = "cube")]
    layout: TileLayout,
    /// 复制时随机翻转。
    #[arg(long)]
    augment: bool,
    /// 对图像做分组高斯平滑。
    #[arg(long)]
    smooth: bool,
    /// 随机种子。
    #[arg(long)]
    seed: Option<u64>,
    /// 额外保存切块前（规范化、复制、平滑之后）的整体数据。
    #[arg(long = "save-preprocessed")]
    save_preprocessed: bool,
    /// 输出各阶段耗时。
    #[arg(long)]
    bench: bool,
}

impl Prepare {
    pub fn run(&mut self) -> anyhow::Result<()> {
        let config = PrepConfig {
            patch_size: self.size,
            replica: self.replica,
            split: (!self.no_split).then_some(self.ratio),
            layout: self.layout,
            smooth: self.smooth,
            seed: self.seed,
            ..PrepConfig::default()
        };
        if self.augment {
            let augmenter = RandomAugmenter::new(augment_seed(self.seed));
            self.run_with(config, augmenter)
        } else {
            self.run_with(config, Replicate)
        }
    }

    fn run_with<G: Augment>(&self, config: PrepConfig, augmenter: G) -> anyhow::Result<()> {
        let mut pipeline = Pipeline::new(config.clone(), augmenter)?;

        log::info!("读取`{}`与`{}`...", self.image.display(), self.mask.display());
        let image: Volume = load_volume(&self.image)
            .with_context(|| format!("cannot load image `{}`", self.image.display()))?;
        let mask: Mask = load_volume(&self.mask)
            .with_context(|| format!("cannot load mask `{}`", self.mask.display()))?;

        let (image, mask) = pipeline.prepare_volumes(image, mask)?;
        if self.save_preprocessed {
            let (ip, mp) = save_preprocessed(&self.out_dir, &image, &mask)?;
            log::info!("已保存`{}`与`{}`", ip.display(), mp.display());
        }

        let pair = pipeline.tile_volumes(image.view(), mask.view())?;
        for path in pair.save(&self.out_dir)? {
            log::info!("已写入`{}`", path.display());
        }

        let manifest_path = self.out_dir.join(MANIFEST);
        fs::write(&manifest_path, pair.manifest(&config).pretty(2))
            .with_context(|| format!("cannot write `{}`", manifest_path.display()))?;

        if self.bench {
            pipeline.timer().summary();
        }
        Ok(())
    }
}

/// 翻转用的种子，与平滑用的种子错开。
#[inline]
fn augment_seed(seed: Option<u64>) -> Option<u64> {
    seed.map(|s| s.wrapping_add(1))
}

#[cfg(test)]
mod tests {
    use super::augment_seed;

    #[test]
    fn test_augment_seed_differs_from_smooth_seed() {
        assert_eq!(augment_seed(None), None);
        assert_eq!(augment_seed(Some(7)), Some(8));
        assert_eq!(augment_seed(Some(u64::MAX)), Some(0));
    }
}
