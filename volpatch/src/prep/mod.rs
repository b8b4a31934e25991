pub mod augment;
pub mod batch;
pub mod consts;
pub mod error;
pub mod io;
pub mod iter;
pub mod pipeline;
pub mod pos;
pub mod recover;
pub mod smooth;
pub mod tile;
pub mod timer;
pub mod window;

use ndarray::Array3;

/// CT体数据，形状为(height, width, n_samples)。
pub type Volume = Array3<f32>;
/// 与[`Volume`]同形状的分割标签。
pub type Mask = Array3<u8>;

pub use augment::{Augment, RandomAugmenter, Replicate};
pub use batch::{flatten_batches, get_batches, get_split, reshape_data, unreshape_data};
pub use error::{PrepError, Result};
pub use io::{load_array, load_volume, save_array, save_preprocessed};
pub use iter::TileGrid;
pub use pipeline::{preprocess_data_train, Pipeline, PrepConfig, PreparedPair, Split};
pub use pos::Tile;
pub use recover::{recover, recover_legacy};
pub use smooth::{gaussian_filter3, Smoother};
pub use tile::{crop_data, TileLayout};
pub use timer::StageTimer;
pub use window::{normalize, to_gray, HuWindow};
