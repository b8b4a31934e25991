use super::utils::{layout_name, positive_size};
use anyhow::Context;
use clap::Args;
use ndarray::ArrayD;
use std::path::PathBuf;
use volpatch::prelude::*;
use volpatch::prep::{load_array, save_array};

#[derive(Args, Debug)]
pub struct Recover {
    /// batch npy文件，形状为(b, len, size, size, 1)或(n, size, size, 1)。
    #[arg(long = "input", short = 'i')]
    input: PathBuf,
    /// 输出的体数据npy文件。
    #[arg(long = "output", short = 'o')]
    output: PathBuf,
    /// 切块边长。
    #[arg(long, value_parser = positive_size, default_value_t = DEFAULT_PATCH_SIZE)]
    size: usize,
    /// 体数据高度。
    #[arg(long, value_parser = positive_size, required_unless_present = "legacy")]
    height: Option<usize>,
    /// 体数据宽度。
    #[arg(long, value_parser = positive_size, required_unless_present = "legacy")]
    width: Option<usize>,
    /// 切块布局：`cube`或`slab`。
    #[arg(long, value_parser = layout_name, default_value = "cube")]
    layout: TileLayout,
    /// 旧版数据：板状布局，512 * 512。
    #[arg(long, conflicts_with_all = ["height", "width", "layout"])]
    legacy: bool,
    /// 以u8读写（标签）；默认为f32（图像）。
    #[arg(long)]
    mask: bool,
}

impl Recover {
    pub fn run(&mut self) -> anyhow::Result<()> {
        if self.mask {
            self.run_typed::<u8>()
        } else {
            self.run_typed::<f32>()
        }
    }

    fn run_typed<A>(&self) -> anyhow::Result<()>
    where
        A: Clone + ndarray_npy::ReadableElement + ndarray_npy::WritableElement,
    {
        let batches: ArrayD<A> = load_array(&self.input)
            .with_context(|| format!("cannot load batches `{}`", self.input.display()))?;
        log::info!("batch形状: {:?}", batches.shape());

        let volume = match (self.legacy, self.height, self.width) {
            (true, _, _) => recover_legacy(batches.view(), self.size)?,
            (false, Some(height), Some(width)) => {
                recover(batches.view(), self.size, self.layout, height, width)?
            }
            _ => anyhow::bail!("`--height` and `--width` are required without `--legacy`"),
        };
        log::info!("恢复后形状: {:?}", volume.dim());

        save_array(&self.output, &volume)?;
        Ok(())
    }
}
