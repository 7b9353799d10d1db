use crate::error::{ImageWorkerError, Result};
use serde::Deserialize;
use serde_json::{Map, Value};
use transformations::{Operation, OperationKind, TransformLimits, TransformationError};

/// The operation descriptor as sent by the client.
#[derive(Debug, Clone, Deserialize)]
pub struct OperationRequest {
    pub operation: String,
    #[serde(default)]
    pub parameters: Map<String, Value>,
}

impl OperationRequest {
    pub fn parse(raw: &str) -> Result<Self> {
        serde_json::from_str(raw)
            .map_err(|e| ImageWorkerError::InvalidOperationDescriptor(e.to_string()))
    }

    /// Looks the operation up and binds its parameters into a validated [`Operation`].
    pub fn resolve(&self, limits: &TransformLimits) -> Result<Operation> {
        let kind = OperationKind::from_name(&self.operation)
            .ok_or_else(|| ImageWorkerError::UnknownOperation(self.operation.clone()))?;

        self.bind(kind, limits)
            .map_err(ImageWorkerError::InvalidParameters)
    }

    fn bind(
        &self,
        kind: OperationKind,
        limits: &TransformLimits,
    ) -> std::result::Result<Operation, TransformationError> {
        match kind {
            OperationKind::Resize => {
                let width = self
                    .integer("width")
                    .ok_or_else(|| missing(kind, "width"))?;
                let height = self
                    .integer("height")
                    .ok_or_else(|| missing(kind, "height"))?;
                Operation::resize(width, height, limits)
            }
            OperationKind::Enlarge => {
                let percentage = self
                    .integer("percentage")
                    .ok_or_else(|| missing(kind, "percentage"))?;
                Operation::enlarge(percentage, limits)
            }
            OperationKind::Rotate => {
                let angle = self.integer("angle").ok_or_else(|| missing(kind, "angle"))?;
                Operation::rotate(angle)
            }
        }
    }

    /// Reads an integer parameter. Whole-valued floats such as `500.0` are accepted.
    fn integer(&self, name: &str) -> Option<i64> {
        let value = self.parameters.get(name)?;
        value.as_i64().or_else(|| {
            value
                .as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64)
                .map(|f| f as i64)
        })
    }
}

fn missing(kind: OperationKind, parameter: &str) -> TransformationError {
    let message = format!("{} requires an integer `{}` parameter", kind, parameter);
    match kind {
        OperationKind::Resize => TransformationError::InvalidDimension(message),
        OperationKind::Enlarge => TransformationError::InvalidPercentage(message),
        OperationKind::Rotate => TransformationError::InvalidAngle(message),
    }
}

/// Decodes the raw `operation` form field and resolves it against the registry.
pub fn resolve_operation(raw: Option<&str>, limits: &TransformLimits) -> Result<Operation> {
    let raw = raw.ok_or_else(|| {
        ImageWorkerError::InvalidOperationDescriptor("missing operation field".to_string())
    })?;

    let request = OperationRequest::parse(raw)?;
    let operation = request.resolve(limits)?;
    log::info!("Resolved operation {:?}", operation);
    Ok(operation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use transformations::RightAngle;

    fn resolve(raw: &str) -> Result<Operation> {
        resolve_operation(Some(raw), &TransformLimits::default())
    }

    #[test]
    fn test_resolve_resize() {
        let operation =
            resolve(r#"{"operation": "resize", "parameters": {"width": 500, "height": 300}}"#)
                .unwrap();
        assert_eq!(operation, Operation::Resize { width: 500, height: 300 });
    }

    #[test]
    fn test_resolve_accepts_whole_floats() {
        let operation =
            resolve(r#"{"operation": "enlarge", "parameters": {"percentage": 150.0}}"#).unwrap();
        assert_eq!(operation, Operation::Enlarge { percentage: 150 });
    }

    #[test]
    fn test_resolve_rotate() {
        let operation = resolve(r#"{"operation": "rotate", "parameters": {"angle": 270}}"#).unwrap();
        assert_eq!(operation, Operation::Rotate(RightAngle::D270));
    }

    #[test]
    fn test_missing_field_is_invalid_descriptor() {
        let err = resolve_operation(None, &TransformLimits::default()).unwrap_err();
        assert!(matches!(err, ImageWorkerError::InvalidOperationDescriptor(_)));
    }

    #[test]
    fn test_malformed_json_is_invalid_descriptor() {
        for raw in ["", "not json", r#"{"parameters": {}}"#, r#"{"operation": 5}"#] {
            let err = resolve(raw).unwrap_err();
            assert!(
                matches!(err, ImageWorkerError::InvalidOperationDescriptor(_)),
                "unexpected error for {:?}: {:?}",
                raw,
                err
            );
        }
    }

    #[test]
    fn test_unknown_operation() {
        let err = resolve(r#"{"operation": "blur", "parameters": {"radius": 3}}"#).unwrap_err();
        assert!(matches!(err, ImageWorkerError::UnknownOperation(ref name) if name == "blur"));
    }

    #[test]
    fn test_invalid_parameters_keep_operation_error() {
        let err = resolve(r#"{"operation": "resize", "parameters": {"width": 0, "height": 500}}"#)
            .unwrap_err();
        assert!(matches!(
            err,
            ImageWorkerError::InvalidParameters(TransformationError::InvalidDimension(_))
        ));

        let err = resolve(r#"{"operation": "enlarge", "parameters": {"percentage": 100}}"#)
            .unwrap_err();
        assert!(matches!(
            err,
            ImageWorkerError::InvalidParameters(TransformationError::InvalidPercentage(_))
        ));

        let err = resolve(r#"{"operation": "rotate", "parameters": {"angle": 45}}"#).unwrap_err();
        assert!(matches!(
            err,
            ImageWorkerError::InvalidParameters(TransformationError::InvalidAngle(_))
        ));
    }

    #[test]
    fn test_missing_or_fractional_parameters() {
        let err = resolve(r#"{"operation": "resize", "parameters": {"width": 10}}"#).unwrap_err();
        assert!(matches!(
            err,
            ImageWorkerError::InvalidParameters(TransformationError::InvalidDimension(_))
        ));

        let err = resolve(r#"{"operation": "rotate"}"#).unwrap_err();
        assert!(matches!(
            err,
            ImageWorkerError::InvalidParameters(TransformationError::InvalidAngle(_))
        ));

        let err = resolve(r#"{"operation": "enlarge", "parameters": {"percentage": 12.5}}"#)
            .unwrap_err();
        assert!(matches!(
            err,
            ImageWorkerError::InvalidParameters(TransformationError::InvalidPercentage(_))
        ));
    }
}
