//! Pipeline document import and export.
//!
//! Export is plain pretty-printed JSON. Import is strict about the
//! top-level shape: a document without a string `id`, a string `name` and
//! a `middlewares` array is rejected before any node is decoded, so a
//! truncated or foreign document never turns into an empty pipeline.

use crate::error::{DaedalusError, DaedalusResult};
use crate::pipeline::Pipeline;
use serde_json::Value;

/// Serializes a pipeline as pretty-printed JSON.
///
/// # Errors
///
/// Returns [`DaedalusError::Json`] if serialization fails.
pub fn export_to_json(pipeline: &Pipeline) -> DaedalusResult<String> {
    Ok(serde_json::to_string_pretty(pipeline)?)
}

/// Parses a pipeline from JSON text.
///
/// # Errors
///
/// Returns [`DaedalusError::Json`] for text that is not JSON, and
/// [`DaedalusError::InvalidDocument`] for JSON that is not a pipeline.
///
/// # Example
///
/// ```
/// use daedalus_core::document::import_from_json;
///
/// let pipeline = import_from_json(r#"{"id":"p","name":"P","middlewares":[]}"#).unwrap();
/// assert!(pipeline.is_empty());
///
/// let err = import_from_json(r#"{"id":"p","name":"P"}"#).unwrap_err();
/// assert!(err.is_document_error());
/// ```
pub fn import_from_json(json: &str) -> DaedalusResult<Pipeline> {
    let value: Value = serde_json::from_str(json)?;
    import_from_value(value)
}

/// Converts an already-parsed JSON value into a pipeline.
///
/// # Errors
///
/// Returns [`DaedalusError::InvalidDocument`] if the value lacks the
/// pipeline shape or any node fails to decode.
pub fn import_from_value(value: Value) -> DaedalusResult<Pipeline> {
    check_shape(&value)?;
    let pipeline: Pipeline = serde_json::from_value(value)
        .map_err(|e| DaedalusError::invalid_document(e.to_string()))?;

    tracing::debug!(
        pipeline_id = %pipeline.id,
        nodes = pipeline.middlewares.len(),
        "Imported pipeline document"
    );
    Ok(pipeline)
}

fn check_shape(value: &Value) -> DaedalusResult<()> {
    let Some(object) = value.as_object() else {
        return Err(DaedalusError::invalid_document("expected a JSON object"));
    };

    for field in ["id", "name"] {
        match object.get(field) {
            Some(Value::String(_)) => {}
            Some(_) => {
                return Err(DaedalusError::invalid_document(format!(
                    "`{field}` must be a string"
                )))
            }
            None => {
                return Err(DaedalusError::invalid_document(format!(
                    "missing field `{field}`"
                )))
            }
        }
    }

    match object.get("middlewares") {
        Some(Value::Array(_)) => Ok(()),
        Some(_) => Err(DaedalusError::invalid_document(
            "`middlewares` must be an array",
        )),
        None => Err(DaedalusError::invalid_document(
            "missing field `middlewares`",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BranchCondition, BranchConfig, ConditionOperator, MiddlewareKind, MiddlewareNode};
    use serde_json::json;

    fn branching_pipeline() -> Pipeline {
        let mut pipeline = Pipeline::new("p1", "Branching").with_description("nested arms");
        let branch = BranchConfig::new(BranchCondition::header(
            "X-Beta",
            ConditionOperator::Equals,
            "on",
        ))
        .on_true(vec![MiddlewareNode::new("beta", MiddlewareKind::Custom, 0)])
        .on_false(vec![]);
        pipeline
            .add_node(MiddlewareNode::new("route", MiddlewareKind::Routing, 0).with_branch(branch))
            .unwrap();
        pipeline
    }

    #[test]
    fn test_round_trip_with_branches() {
        let pipeline = branching_pipeline();
        let json = export_to_json(&pipeline).unwrap();
        assert_eq!(import_from_json(&json).unwrap(), pipeline);
    }

    #[test]
    fn test_export_uses_document_names() {
        let json = export_to_json(&branching_pipeline()).unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        let node = &value["middlewares"][0];
        assert_eq!(node["type"], "Routing");
        assert_eq!(node["branch"]["onTrue"][0]["id"], "beta");
        assert_eq!(node["branch"]["onFalse"], json!([]));
    }

    #[test]
    fn test_rejects_missing_fields() {
        for doc in [
            json!({"name": "P", "middlewares": []}),
            json!({"id": "p", "middlewares": []}),
            json!({"id": "p", "name": "P"}),
        ] {
            let err = import_from_value(doc).unwrap_err();
            assert!(matches!(err, DaedalusError::InvalidDocument { .. }), "{err}");
        }
    }

    #[test]
    fn test_rejects_wrong_types() {
        let err = import_from_value(json!({"id": 7, "name": "P", "middlewares": []})).unwrap_err();
        assert!(err.to_string().contains("`id` must be a string"));

        let err =
            import_from_value(json!({"id": "p", "name": "P", "middlewares": {}})).unwrap_err();
        assert!(err.to_string().contains("`middlewares` must be an array"));

        let err = import_from_value(json!([1, 2])).unwrap_err();
        assert!(err.is_document_error());
    }

    #[test]
    fn test_rejects_unknown_kind() {
        let doc = json!({
            "id": "p",
            "name": "P",
            "middlewares": [{"id": "n", "type": "Tracing", "order": 0}]
        });
        let err = import_from_value(doc).unwrap_err();
        assert!(matches!(err, DaedalusError::InvalidDocument { .. }));
    }

    #[test]
    fn test_malformed_text_is_json_error() {
        let err = import_from_json("{not json").unwrap_err();
        assert!(matches!(err, DaedalusError::Json(_)));
    }
}
