//! 体数据切块（以及其逆运算）。
//!
//! 体数据的形状为(height, width, depth)，切块结果的形状为(size, size, n)。
//! 提供两种互不兼容的布局，见[`TileLayout`]。

use super::error::{ensure_divisible, PrepError, Result};
use super::iter::TileGrid;
use ndarray::{concatenate, s, Array3, ArrayView3, Axis, ErrorKind, Order, ShapeError};

/// 切块布局。
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum TileLayout {
    /// 立方体切块：高度、宽度都按`size`切分，深度截断为`size`的整数倍。
    ///
    /// 切块按先高度、后宽度的顺序排列，每个切块的全部（截断后）深度连续存放。
    #[default]
    Cube,
    /// 旧版的板状切块：先按列优先重排为(size, width, -1)，再按行优先重排为(size, size, -1)。
    ///
    /// 只切分高度方向，宽度方向整体并入切块个数。仅用于读写旧数据。
    Slab,
}

impl TileLayout {
    #[inline]
    pub fn name(self) -> &'static str {
        match self {
            TileLayout::Cube => "cube",
            TileLayout::Slab => "slab",
        }
    }

    /// 将体数据切块，返回(size, size, n)的数组。
    pub fn crop<A: Clone>(self, volume: ArrayView3<A>, size: usize) -> Result<Array3<A>> {
        match self {
            TileLayout::Cube => crop_cubes(volume, size),
            TileLayout::Slab => crop_slabs(volume, size),
        }
    }

    /// `crop`的逆运算：由(size, size, n)的切块恢复(`height`, `width`, -1)的体数据。
    pub fn uncrop<A: Clone>(
        self,
        patches: ArrayView3<A>,
        height: usize,
        width: usize,
    ) -> Result<Array3<A>> {
        let (size, size_w, _) = patches.dim();
        if size != size_w {
            return Err(ShapeError::from_kind(ErrorKind::IncompatibleShape).into());
        }
        if height == 0 || width == 0 {
            return Err(PrepError::Config(format!(
                "cannot recover a ({height}, {width}) plane"
            )));
        }
        match self {
            TileLayout::Cube => uncrop_cubes(patches, height, width),
            TileLayout::Slab => uncrop_slabs(patches, height, width),
        }
    }

    /// 形状为`dim`的体数据切块后，切块轴的长度。
    pub fn patch_count(self, dim: (usize, usize, usize), size: usize) -> Result<usize> {
        let (height, width, depth) = dim;
        ensure_divisible("height", height, size)?;
        ensure_divisible("width", width, size)?;
        Ok(match self {
            TileLayout::Cube => (height / size) * (width / size) * kept_depth(depth, size),
            TileLayout::Slab => height * width * depth / (size * size),
        })
    }
}

/// 以默认的立方体布局切块。
#[inline]
pub fn crop_data<A: Clone>(volume: ArrayView3<A>, size: usize) -> Result<Array3<A>> {
    TileLayout::Cube.crop(volume, size)
}

/// 深度截断为`size`的整数倍后剩下的层数。
#[inline]
pub fn kept_depth(depth: usize, size: usize) -> usize {
    depth / size * size
}

fn crop_cubes<A: Clone>(volume: ArrayView3<A>, size: usize) -> Result<Array3<A>> {
    let (height, width, depth) = volume.dim();
    let grid = TileGrid::covering(height, width, size)?;
    let keep_z = kept_depth(depth, size);

    let tiles: Vec<ArrayView3<A>> = grid
        .map(|tile| {
            let ((h0, h1), (w0, w1)) = tile.span(size);
            volume.slice_move(s![h0..h1, w0..w1, ..keep_z])
        })
        .collect();
    if tiles.is_empty() {
        return Ok(Array3::from_shape_vec((size, size, 0), Vec::new())?);
    }
    Ok(concatenate(Axis(2), &tiles)?)
}

fn uncrop_cubes<A: Clone>(patches: ArrayView3<A>, height: usize, width: usize) -> Result<Array3<A>> {
    let (size, _, n) = patches.dim();
    let grid = TileGrid::covering(height, width, size)?;
    let w_tiles = width / size;
    ensure_divisible("patch axis", n, grid.tile_count())?;
    let keep_z = n / grid.tile_count();

    // 第t个切块占据切块轴上[t * keep_z, (t + 1) * keep_z)
    Ok(Array3::from_shape_fn((height, width, keep_z), |(h, w, z)| {
        let t = (h / size) * w_tiles + w / size;
        patches[[h % size, w % size, t * keep_z + z]].clone()
    }))
}

fn crop_slabs<A: Clone>(volume: ArrayView3<A>, size: usize) -> Result<Array3<A>> {
    let (height, width, depth) = volume.dim();
    ensure_divisible("height", height, size)?;
    ensure_divisible("width", width, size)?;

    let slabs = volume.to_shape(((size, width, height / size * depth), Order::ColumnMajor))?;
    let patches = slabs.to_shape((
        (size, size, height * width * depth / (size * size)),
        Order::RowMajor,
    ))?;
    Ok(patches.into_owned())
}

fn uncrop_slabs<A: Clone>(patches: ArrayView3<A>, height: usize, width: usize) -> Result<Array3<A>> {
    let size = patches.dim().0;
    let total = patches.len();
    ensure_divisible("height", height, size)?;
    ensure_divisible("patch elements", total, height * width)?;

    let slabs = patches.to_shape(((size, width, total / (size * width)), Order::RowMajor))?;
    let volume = slabs.to_shape(((height, width, total / (height * width)), Order::ColumnMajor))?;
    Ok(volume.into_owned())
}
