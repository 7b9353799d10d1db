/// Largest width or height a resize may target, in pixels.
pub const MAX_RESIZE_DIMENSION: u32 = 1024;

/// Lower bound of the enlarge percentage range (inclusive).
pub const MIN_ENLARGE_PERCENTAGE: u32 = 1;

/// Upper bound of the enlarge percentage range (inclusive).
pub const MAX_ENLARGE_PERCENTAGE: u32 = 200;

/// Largest source width or height we will decode, in pixels.
pub const MAX_DECODE_DIMENSION: u32 = 8192;

/// Bounds applied to transformation parameters before any pixel work happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransformLimits {
    pub max_resize_dimension: u32,
    pub min_enlarge_percentage: u32,
    pub max_enlarge_percentage: u32,
}

impl Default for TransformLimits {
    fn default() -> Self {
        Self {
            max_resize_dimension: MAX_RESIZE_DIMENSION,
            min_enlarge_percentage: MIN_ENLARGE_PERCENTAGE,
            max_enlarge_percentage: MAX_ENLARGE_PERCENTAGE,
        }
    }
}
