use super::error::{ensure_divisible, Result};
use super::pos::Tile;

/// 按切块顺序（先高度、后宽度）枚举网格中的所有切块。
#[derive(Clone, Debug)]
pub struct TileGrid {
    cur_h: usize,
    cur_w: usize,
    h: usize,
    w: usize,
}

impl TileGrid {
    /// 直接以切块个数构造网格：高度方向`h_tiles`个，宽度方向`w_tiles`个。
    #[inline]
    pub fn new(h_tiles: usize, w_tiles: usize) -> Self {
        Self {
            cur_h: 0,
            cur_w: 0,
            h: if w_tiles == 0 { 0 } else { h_tiles },
            w: w_tiles,
        }
    }

    /// 以`size`为边长覆盖(`height` * `width`)平面的网格。`size`必须整除两条边。
    pub fn covering(height: usize, width: usize, size: usize) -> Result<Self> {
        ensure_divisible("height", height, size)?;
        ensure_divisible("width", width, size)?;
        Ok(Self::new(height / size, width / size))
    }

    /// 网格中切块的总数。
    #[inline]
    pub fn tile_count(&self) -> usize {
        self.h * self.w
    }
}

impl Iterator for TileGrid {
    type Item = Tile;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cur_h == self.h {
            return None;
        }
        let ret = Tile::new(self.cur_h, self.cur_w);
        if self.cur_w + 1 == self.w {
            self.cur_w = 0;
            self.cur_h += 1;
        } else {
            self.cur_w += 1;
        }
        Some(ret)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.tile_count() - (self.cur_h * self.w + self.cur_w);
        (left, Some(left))
    }
}

impl ExactSizeIterator for TileGrid {}
