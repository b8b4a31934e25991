use super::utils::{layout_name, positive_size};
use anyhow::Context;
use clap::Args;
use ndarray::{s, Array3};
use std::path::{Path, PathBuf};
use volpatch::prelude::*;
use volpatch::prep::tile::kept_depth;
use volpatch::prep::{get_batches, load_volume, reshape_data};

#[derive(Args, Debug)]
pub struct Verify {
    /// 待验证的npy体数据(f32)。
    #[arg(long = "input", short = 'i')]
    input: PathBuf,
    /// 切块边长。
    #[arg(long, value_parser = positive_size, default_value_t = DEFAULT_PATCH_SIZE)]
    size: usize,
    /// 切块布局：`cube`或`slab`。
    #[arg(long, value_parser = layout_name, default_value = "cube")]
    layout: TileLayout,
}

impl Verify {
    pub fn run(&mut self) -> anyhow::Result<()> {
        let volume: Volume = load_volume(&self.input)
            .with_context(|| format!("cannot load `{}`", self.input.display()))?;
        println!("正在文件`{}`中验证性质...", self.input.display());
        let ok = Program::new(&self.input, volume, self.size, self.layout).run()?;
        if !ok {
            anyhow::bail!("verification failed");
        }
        println!("验证通过");
        Ok(())
    }
}

struct Program<'a> {
    input: &'a Path,
    volume: Volume,
    size: usize,
    layout: TileLayout,
}

impl<'a> Program<'a> {
    #[inline]
    pub fn new(input: &'a Path, volume: Volume, size: usize, layout: TileLayout) -> Self {
        Self {
            input,
            volume,
            size,
            layout,
        }
    }

    pub fn run(&self) -> anyhow::Result<bool> {
        let (height, width, depth) = self.volume.dim();
        let expected = self.layout.patch_count(self.volume.dim(), self.size)?;

        println!("\t切块中...");
        let patches = self.layout.crop(self.volume.view(), self.size)?;
        let mut ok = true;
        if patches.dim().2 != expected {
            eprintln!(
                "`check_count` failed: expected {expected} patches, got {}.",
                patches.dim().2
            );
            ok = false;
        }

        let reshaped = reshape_data(patches.view());
        let batches = get_batches(reshaped.view(), self.size)?;
        println!("\tbatch形状: {:?}", batches.shape());

        println!("\t恢复中...");
        let back = recover(batches.view(), self.size, self.layout, height, width)?;
        let kept = match self.layout {
            TileLayout::Cube => kept_depth(depth, self.size),
            TileLayout::Slab => depth,
        };
        let target = self.volume.slice(s![.., .., ..kept]);
        if back.dim() != target.dim() {
            eprintln!(
                "`check_recover` failed: recovered shape {:?}, expected {:?}.",
                back.dim(),
                target.dim()
            );
            return Ok(false);
        }
        ok &= self.check_voxels(&back, height, width, kept);
        Ok(ok)
    }

    fn check_voxels(&self, back: &Array3<f32>, height: usize, width: usize, depth: usize) -> bool {
        // 逐体素比较，报告每个不一致的位置
        let mut ok = true;
        for z in 0..depth {
            for h in 0..height {
                for w in 0..width {
                    if back[[h, w, z]].to_bits() != self.volume[[h, w, z]].to_bits() {
                        self.print_failed_info_pos("check_recover", (h, w), z);
                        ok = false;
                    }
                }
            }
        }
        ok
    }

    #[inline]
    fn print_failed_info_pos(&self, fn_name: &str, (h, w): (usize, usize), z: usize) {
        eprintln!(
            "`{fn_name}` failed: in `{}`, slice {z}, position ({h}, {w}).",
            self.input.display()
        );
    }
}
