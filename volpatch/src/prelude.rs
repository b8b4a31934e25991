pub use super::prep::augment::{Augment, RandomAugmenter, Replicate};
pub use super::prep::consts::{
    DEFAULT_PATCH_SIZE, HU_LOWER, HU_UPPER, LEGACY_EDGE, PREPROCESSED_IMAGE, PREPROCESSED_MASK,
    TRAIN_RATIO,
};
pub use super::prep::error::PrepError;
pub use super::prep::pipeline::{Pipeline, PrepConfig, PreparedPair, Split};
pub use super::prep::recover::{recover, recover_legacy};
pub use super::prep::smooth::Smoother;
pub use super::prep::tile::TileLayout;
pub use super::prep::timer::StageTimer;
pub use super::prep::window::HuWindow;
pub use super::prep::{Mask, Volume};
