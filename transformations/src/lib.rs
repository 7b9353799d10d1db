pub mod codec;
pub mod error;
pub mod limits;
pub mod operations;
pub mod registry;

pub use error::{Result, TransformationError};
pub use limits::TransformLimits;
pub use operations::{enlarge, resize, rotate, Operation, RightAngle};
pub use registry::OperationKind;
