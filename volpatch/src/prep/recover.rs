//! 由batch数据恢复体数据。

use super::batch::unreshape_data;
use super::consts::LEGACY_EDGE;
use super::error::Result;
use super::tile::TileLayout;
use ndarray::{Array3, ArrayView, Dimension};

/// 撤销通道化与分batch，再按`layout`撤销切块，得到(`height`, `width`, -1)的体数据。
///
/// `batches`可以是(b, len, size, size, 1)、(n, size, size, 1)或者任何能按行优先展开为
/// (n, size, size)的数组。对于立方体布局，恢复出的深度是切块时截断后的深度。
pub fn recover<A: Clone, D: Dimension>(
    batches: ArrayView<A, D>,
    size: usize,
    layout: TileLayout,
    height: usize,
    width: usize,
) -> Result<Array3<A>> {
    let patches = unreshape_data(batches, size)?;
    log::debug!(
        "恢复{:?}布局切块{:?} -> ({height}, {width}, -1)",
        layout,
        patches.dim()
    );
    layout.uncrop(patches.view(), height, width)
}

/// 旧版恢复流程：板状布局，且体数据固定为512 * 512。
#[inline]
pub fn recover_legacy<A: Clone, D: Dimension>(
    batches: ArrayView<A, D>,
    size: usize,
) -> Result<Array3<A>> {
    recover(batches, size, TileLayout::Slab, LEGACY_EDGE, LEGACY_EDGE)
}
