//! 预处理用到的常量。

/// 默认的切块边长（同时也是每个batch的切块层数）。
pub const DEFAULT_PATCH_SIZE: usize = 64;

/// HU窗口下界。
pub const HU_LOWER: f32 = -1000.0;

/// HU窗口上界。
pub const HU_UPPER: f32 = 0.0;

/// 默认训练集比例。
pub const TRAIN_RATIO: f64 = 0.9;

/// 旧版恢复流程假定的体数据边长(512 * 512)。
pub const LEGACY_EDGE: usize = 512;

/// 高斯平滑sigma的采样下界。
pub const SIGMA_LOWER: f64 = 0.6;

/// 高斯平滑sigma的采样上界。
pub const SIGMA_UPPER: f64 = 1.3;

/// 高斯核截断半径（以sigma为单位）。
pub const GAUSSIAN_TRUNCATE: f64 = 4.0;

/// 预处理后整体输出的图像文件名。
pub const PREPROCESSED_IMAGE: &str = "preprocessed_image.npy";

/// 预处理后整体输出的标签文件名。
pub const PREPROCESSED_MASK: &str = "preprocessed_mask.npy";
