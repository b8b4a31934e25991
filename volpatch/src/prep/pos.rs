/// 代表一个切块在网格中的(height, width)索引，不负责边界检查。
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Tile {
    pub h: usize,
    pub w: usize,
}

impl Tile {
    #[inline]
    pub fn new(h: usize, w: usize) -> Self {
        Self { h, w }
    }

    /// 切块在体数据中的左上角坐标（切块边长为`size`）。
    #[inline]
    pub fn origin(self, size: usize) -> (usize, usize) {
        (self.h * size, self.w * size)
    }

    /// 切块覆盖的高度、宽度区间（左闭右开）。
    #[inline]
    pub fn span(self, size: usize) -> ((usize, usize), (usize, usize)) {
        let (h0, w0) = self.origin(size);
        ((h0, h0 + size), (w0, w0 + size))
    }
}

impl From<(usize, usize)> for Tile {
    #[inline]
    fn from(tile: (usize, usize)) -> Self {
        Tile::new(tile.0, tile.1)
    }
}
