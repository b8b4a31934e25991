//! 预处理过程中的错误类型。

use ndarray::ShapeError;
use ndarray_npy::{ReadNpyError, WriteNpyError};
use std::path::PathBuf;

/// 预处理流水线的统一错误。
#[derive(Debug, thiserror::Error)]
pub enum PrepError {
    #[error("patch size must be positive")]
    ZeroPatchSize,

    #[error("{what} of length {len} is not a multiple of {size}")]
    Indivisible {
        what: &'static str,
        len: usize,
        size: usize,
    },

    #[error("image shape {image:?} does not match mask shape {mask:?}")]
    PairMismatch { image: Vec<usize>, mask: Vec<usize> },

    #[error("shape error: {0}")]
    Shape(#[from] ShapeError),

    #[error("failed to read `{}`: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: ReadNpyError,
    },

    #[error("failed to write `{}`: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: WriteNpyError,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, PrepError>;

/// 检查`len`能否被`size`整除。
#[inline]
pub(crate) fn ensure_divisible(what: &'static str, len: usize, size: usize) -> Result<()> {
    if size == 0 {
        return Err(PrepError::ZeroPatchSize);
    }
    if len % size != 0 {
        return Err(PrepError::Indivisible { what, len, size });
    }
    Ok(())
}
