use crate::codec;
use crate::error::{Result, TransformationError};
use crate::limits::TransformLimits;
use crate::registry::OperationKind;
use image::imageops::FilterType;
use image::DynamicImage;

/// Clockwise rotation accepted by [`Operation::Rotate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RightAngle {
    D90,
    D180,
    D270,
}

impl TryFrom<i64> for RightAngle {
    type Error = TransformationError;

    fn try_from(angle: i64) -> Result<Self> {
        match angle {
            90 => Ok(Self::D90),
            180 => Ok(Self::D180),
            270 => Ok(Self::D270),
            _ => Err(TransformationError::InvalidAngle(format!(
                "{}, must be 90, 180, or 270",
                angle
            ))),
        }
    }
}

/// A transformation with its parameters already validated.
///
/// Values are only built through the checked constructors, so [`Operation::apply`]
/// never has to re-validate parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Resize { width: u32, height: u32 },
    Enlarge { percentage: u32 },
    Rotate(RightAngle),
}

impl Operation {
    pub fn resize(width: i64, height: i64, limits: &TransformLimits) -> Result<Self> {
        let width = checked_dimension("width", width, limits.max_resize_dimension)?;
        let height = checked_dimension("height", height, limits.max_resize_dimension)?;
        Ok(Self::Resize { width, height })
    }

    pub fn enlarge(percentage: i64, limits: &TransformLimits) -> Result<Self> {
        let min = i64::from(limits.min_enlarge_percentage);
        let max = i64::from(limits.max_enlarge_percentage);

        if percentage == 0 || percentage == 100 || percentage < min || percentage > max {
            return Err(TransformationError::InvalidPercentage(format!(
                "{}, must be between {} and {} and different from 0 and 100",
                percentage, min, max
            )));
        }

        Ok(Self::Enlarge {
            percentage: percentage as u32,
        })
    }

    pub fn rotate(angle: i64) -> Result<Self> {
        Ok(Self::Rotate(RightAngle::try_from(angle)?))
    }

    pub fn kind(&self) -> OperationKind {
        match self {
            Self::Resize { .. } => OperationKind::Resize,
            Self::Enlarge { .. } => OperationKind::Enlarge,
            Self::Rotate(_) => OperationKind::Rotate,
        }
    }

    /// Decodes `image`, applies the transformation and re-encodes in the source format.
    pub fn apply(&self, image: &[u8]) -> Result<Vec<u8>> {
        let (decoded, format) = codec::decode(image)?;
        let transformed = self.apply_to(decoded)?;
        codec::encode(&transformed, format)
    }

    /// Applies the transformation to an already decoded image.
    pub fn apply_to(&self, image: DynamicImage) -> Result<DynamicImage> {
        match *self {
            Self::Resize { width, height } => {
                Ok(image.resize_exact(width, height, FilterType::Lanczos3))
            }
            Self::Enlarge { percentage } => {
                let (width, height) = scaled_dimensions(image.width(), image.height(), percentage);
                if width == 0 || height == 0 {
                    return Err(TransformationError::Processing(format!(
                        "scaling {}x{} by {}% yields an empty {}x{} image",
                        image.width(),
                        image.height(),
                        percentage,
                        width,
                        height
                    )));
                }
                Ok(image.resize_exact(width, height, FilterType::Lanczos3))
            }
            Self::Rotate(RightAngle::D90) => Ok(image.rotate90()),
            Self::Rotate(RightAngle::D180) => Ok(image.rotate180()),
            Self::Rotate(RightAngle::D270) => Ok(image.rotate270()),
        }
    }
}

/// Force-resizes `image` to exactly `width` x `height`, ignoring aspect ratio.
pub fn resize(image: &[u8], width: i64, height: i64, limits: &TransformLimits) -> Result<Vec<u8>> {
    Operation::resize(width, height, limits)?.apply(image)
}

/// Scales `image` by `percentage`, truncating the scaled dimensions.
pub fn enlarge(image: &[u8], percentage: i64, limits: &TransformLimits) -> Result<Vec<u8>> {
    Operation::enlarge(percentage, limits)?.apply(image)
}

/// Rotates `image` clockwise by exactly 90, 180 or 270 degrees.
pub fn rotate(image: &[u8], angle: i64) -> Result<Vec<u8>> {
    Operation::rotate(angle)?.apply(image)
}

fn checked_dimension(axis: &str, value: i64, max: u32) -> Result<u32> {
    if value < 1 || value > i64::from(max) {
        return Err(TransformationError::InvalidDimension(format!(
            "{} {}, must be between 1 and {}",
            axis, value, max
        )));
    }
    Ok(value as u32)
}

fn scaled_dimensions(width: u32, height: u32, percentage: u32) -> (u32, u32) {
    let scale = |side: u32| (u64::from(side) * u64::from(percentage) / 100) as u32;
    (scale(width), scale(height))
}
