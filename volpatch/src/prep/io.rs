//! `.npy`文件的读写。

use super::consts::{PREPROCESSED_IMAGE, PREPROCESSED_MASK};
use super::error::{PrepError, Result};
use super::{Mask, Volume};
use ndarray::{Array, Array3, ArrayBase, Data, Dimension};
use ndarray_npy::{ReadableElement, WritableElement};
use std::fs;
use std::path::{Path, PathBuf};

/// 读取(height, width, n_samples)形状的体数据。
#[inline]
pub fn load_volume<A: ReadableElement, P: AsRef<Path>>(path: P) -> Result<Array3<A>> {
    load_array(path)
}

/// 读取任意维度的数组。
pub fn load_array<A, D, P>(path: P) -> Result<Array<A, D>>
where
    A: ReadableElement,
    D: Dimension,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let array: Array<A, D> = ndarray_npy::read_npy(path).map_err(|source| PrepError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    log::debug!("读取`{}`，形状{:?}", path.display(), array.shape());
    Ok(array)
}

/// 写入数组。
pub fn save_array<A, S, D, P>(path: P, array: &ArrayBase<S, D>) -> Result<()>
where
    A: WritableElement,
    S: Data<Elem = A>,
    D: Dimension,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    ndarray_npy::write_npy(path, array).map_err(|source| PrepError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    log::debug!("写入`{}`，形状{:?}", path.display(), array.shape());
    Ok(())
}

/// 在`dir`下写入`preprocessed_image.npy`与`preprocessed_mask.npy`，返回两者路径。
pub fn save_preprocessed<P: AsRef<Path>>(
    dir: P,
    image: &Volume,
    mask: &Mask,
) -> Result<(PathBuf, PathBuf)> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;
    let image_path = dir.join(PREPROCESSED_IMAGE);
    let mask_path = dir.join(PREPROCESSED_MASK);
    save_array(&image_path, image)?;
    save_array(&mask_path, mask)?;
    Ok((image_path, mask_path))
}
