use super::utils::{ct_centre_legal_range, ct_width_legal_range};
use anyhow::Context;
use clap::Args;
use image::GrayImage;
use ndarray::Axis;
use std::fs;
use std::path::PathBuf;
use volpatch::prelude::*;
use volpatch::prep::{load_volume, save_array, to_gray};

#[derive(Args, Debug)]
pub struct Window {
    /// 原始CT npy文件。
    #[arg(long = "input", short = 'i')]
    input: PathBuf,
    /// 规范化后的npy文件。
    #[arg(long = "output", short = 'o')]
    output: PathBuf,
    /// CT窗位。缺省时使用[-1000, 0]窗口。
    #[arg(long = "centre", value_parser = ct_centre_legal_range, requires = "ct_width")]
    ct_centre: Option<f32>,
    /// CT窗宽。
    #[arg(long = "width", value_parser = ct_width_legal_range, requires = "ct_centre")]
    ct_width: Option<f32>,
    /// 逐层输出灰度png的目录。
    #[arg(long = "png-dir")]
    png_dir: Option<PathBuf>,
}

impl Window {
    pub fn run(&mut self) -> anyhow::Result<()> {
        let window = match (self.ct_centre, self.ct_width) {
            (Some(centre), Some(width)) => HuWindow::from_centre_width(centre, width)?,
            _ => HuWindow::default(),
        };
        println!(
            "CT窗口规范化范围: [{:.2}, {:.2}]",
            window.lower(),
            window.upper()
        );

        let mut volume: Volume = load_volume(&self.input)
            .with_context(|| format!("cannot load `{}`", self.input.display()))?;
        window.normalize_inplace(volume.view_mut());
        save_array(&self.output, &volume)?;

        if let Some(png_dir) = self.png_dir.as_mut() {
            fs::create_dir_all(png_dir.as_path())?;
            let (height, width, slice_len) = volume.dim();
            println!("\t切片个数: {slice_len}");
            for (i, slice) in volume.axis_iter(Axis(2)).enumerate() {
                let buf: Vec<u8> = slice.iter().copied().map(to_gray).collect();
                let png = GrayImage::from_vec(width as u32, height as u32, buf)
                    .context("slice buffer does not match its dimensions")?;
                png_dir.push(format!("{i}.png"));
                png.save(png_dir.as_path())
                    .with_context(|| format!("cannot save `{}`", png_dir.display()))?;
                png_dir.pop();
            }
        }
        Ok(())
    }
}
