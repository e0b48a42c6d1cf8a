//! Coercions from raw tool arguments to typed values. Clients are loose
//! with JSON types, so numeric strings count as numbers, numbers count as
//! strings, and list parameters accept either an array or a
//! comma-separated string. An absent or null optional stays `None` rather
//! than collapsing to zero or empty.

use rmcp::ErrorData as McpError;
use rmcp::model::JsonObject;
use serde_json::Value;

fn missing(key: &str) -> McpError {
    McpError::invalid_params(format!("Missing required parameter: {key}"), None)
}

fn invalid(key: &str, expected: &str) -> McpError {
    McpError::invalid_params(format!("Parameter '{key}' must be {expected}"), None)
}

pub fn require_str(args: &JsonObject, key: &str) -> Result<String, McpError> {
    match args.get(key) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        None | Some(Value::Null) => Err(missing(key)),
        Some(_) => Err(invalid(key, "a string")),
    }
}

pub fn opt_string(args: &JsonObject, key: &str) -> Result<Option<String>, McpError> {
    match args.get(key) {
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        None | Some(Value::Null) => Ok(None),
        Some(_) => Err(invalid(key, "a string")),
    }
}

pub fn string_or(args: &JsonObject, key: &str, default: &str) -> Result<String, McpError> {
    Ok(opt_string(args, key)?.unwrap_or_else(|| default.to_string()))
}

pub fn require_u64(args: &JsonObject, key: &str) -> Result<u64, McpError> {
    match opt_u64(args, key)? {
        Some(value) => Ok(value),
        None => Err(missing(key)),
    }
}

pub fn opt_u64(args: &JsonObject, key: &str) -> Result<Option<u64>, McpError> {
    match args.get(key) {
        Some(Value::Number(n)) => n
            .as_u64()
            .map(Some)
            .ok_or_else(|| invalid(key, "a non-negative integer")),
        Some(Value::String(s)) => s
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|_| invalid(key, "a non-negative integer")),
        None | Some(Value::Null) => Ok(None),
        Some(_) => Err(invalid(key, "a non-negative integer")),
    }
}

pub fn u64_or(args: &JsonObject, key: &str, default: u64) -> Result<u64, McpError> {
    Ok(opt_u64(args, key)?.unwrap_or(default))
}

pub fn opt_bool(args: &JsonObject, key: &str) -> Result<Option<bool>, McpError> {
    match args.get(key) {
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(Value::String(s)) => match s.trim() {
            "true" => Ok(Some(true)),
            "false" => Ok(Some(false)),
            _ => Err(invalid(key, "a boolean")),
        },
        None | Some(Value::Null) => Ok(None),
        Some(_) => Err(invalid(key, "a boolean")),
    }
}

pub fn require_bool(args: &JsonObject, key: &str) -> Result<bool, McpError> {
    match opt_bool(args, key)? {
        Some(value) => Ok(value),
        None => Err(missing(key)),
    }
}

pub fn bool_or(args: &JsonObject, key: &str, default: bool) -> Result<bool, McpError> {
    Ok(opt_bool(args, key)?.unwrap_or(default))
}

/// List of strings, given either as a JSON array or as one
/// comma-separated string. An empty string counts as unset.
pub fn opt_csv(args: &JsonObject, key: &str) -> Result<Option<Vec<String>>, McpError> {
    match args.get(key) {
        Some(Value::String(s)) => {
            let items: Vec<String> = s
                .split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(str::to_string)
                .collect();
            Ok((!items.is_empty()).then_some(items))
        }
        Some(Value::Array(values)) => {
            let mut items = Vec::with_capacity(values.len());
            for value in values {
                match value {
                    Value::String(s) => items.push(s.clone()),
                    Value::Number(n) => items.push(n.to_string()),
                    _ => return Err(invalid(key, "a list of strings")),
                }
            }
            Ok((!items.is_empty()).then_some(items))
        }
        None | Some(Value::Null) => Ok(None),
        Some(_) => Err(invalid(key, "a list of strings")),
    }
}

/// Like [`opt_csv`] but every element must parse as an ID.
pub fn opt_csv_u64(args: &JsonObject, key: &str) -> Result<Option<Vec<u64>>, McpError> {
    match args.get(key) {
        Some(Value::Array(values)) => {
            let mut items = Vec::with_capacity(values.len());
            for value in values {
                match value {
                    Value::Number(n) => items.push(
                        n.as_u64()
                            .ok_or_else(|| invalid(key, "a list of non-negative integers"))?,
                    ),
                    Value::String(s) => items.push(
                        s.trim()
                            .parse::<u64>()
                            .map_err(|_| invalid(key, "a list of non-negative integers"))?,
                    ),
                    _ => return Err(invalid(key, "a list of non-negative integers")),
                }
            }
            Ok((!items.is_empty()).then_some(items))
        }
        Some(Value::String(s)) => {
            let mut items = Vec::new();
            for part in s.split(',').map(str::trim).filter(|part| !part.is_empty()) {
                items.push(
                    part.parse::<u64>()
                        .map_err(|_| invalid(key, "a list of non-negative integers"))?,
                );
            }
            Ok((!items.is_empty()).then_some(items))
        }
        None | Some(Value::Null) => Ok(None),
        Some(_) => Err(invalid(key, "a list of non-negative integers")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rmcp::model::ErrorCode;
    use serde_json::json;

    fn args(value: Value) -> JsonObject {
        value.as_object().expect("test args must be an object").clone()
    }

    #[test]
    fn test_require_str_accepts_strings_and_numbers() {
        let args = args(json!({"id": "group/project", "iid": 42}));
        assert_eq!(require_str(&args, "id").unwrap(), "group/project");
        assert_eq!(require_str(&args, "iid").unwrap(), "42");
    }

    #[test]
    fn test_require_str_missing_is_invalid_params() {
        let args = args(json!({"other": "x", "null_id": null}));
        let err = require_str(&args, "id").unwrap_err();
        assert_eq!(err.code, ErrorCode::INVALID_PARAMS);
        assert!(err.message.contains("id"));
        assert!(require_str(&args, "null_id").is_err());
    }

    #[test]
    fn test_require_str_rejects_other_types() {
        let args = args(json!({"id": true}));
        assert!(require_str(&args, "id").is_err());
    }

    #[test]
    fn test_opt_string_absent_stays_none() {
        let args = args(json!({"present": "x", "null": null}));
        assert_eq!(opt_string(&args, "present").unwrap().as_deref(), Some("x"));
        assert_eq!(opt_string(&args, "absent").unwrap(), None);
        assert_eq!(opt_string(&args, "null").unwrap(), None);
    }

    #[test]
    fn test_opt_u64_unset_stays_none_not_zero() {
        let args = args(json!({"milestone_id": null}));
        assert_eq!(opt_u64(&args, "milestone_id").unwrap(), None);
        assert_eq!(opt_u64(&args, "assignee_id").unwrap(), None);
    }

    #[test]
    fn test_opt_u64_coerces_numeric_strings() {
        let args = args(json!({"a": 7, "b": "42", "c": " 9 "}));
        assert_eq!(opt_u64(&args, "a").unwrap(), Some(7));
        assert_eq!(opt_u64(&args, "b").unwrap(), Some(42));
        assert_eq!(opt_u64(&args, "c").unwrap(), Some(9));
    }

    #[test]
    fn test_opt_u64_rejects_floats_negatives_and_junk() {
        let args = args(json!({"a": 1.5, "b": -3, "c": "soon", "d": []}));
        for key in ["a", "b", "c", "d"] {
            let err = opt_u64(&args, key).unwrap_err();
            assert_eq!(err.code, ErrorCode::INVALID_PARAMS);
        }
    }

    #[test]
    fn test_u64_or_applies_default_only_when_absent() {
        let args = args(json!({"per_page": 50}));
        assert_eq!(u64_or(&args, "per_page", 20).unwrap(), 50);
        assert_eq!(u64_or(&args, "page", 1).unwrap(), 1);
    }

    #[test]
    fn test_string_or_applies_default_only_when_absent() {
        let args = args(json!({"sort": "asc"}));
        assert_eq!(string_or(&args, "sort", "desc").unwrap(), "asc");
        assert_eq!(string_or(&args, "order_by", "created_at").unwrap(), "created_at");
    }

    #[test]
    fn test_bool_coercions() {
        let args = args(json!({"a": true, "b": "true", "c": "false", "d": "yes"}));
        assert_eq!(opt_bool(&args, "a").unwrap(), Some(true));
        assert_eq!(opt_bool(&args, "b").unwrap(), Some(true));
        assert_eq!(opt_bool(&args, "c").unwrap(), Some(false));
        assert!(opt_bool(&args, "d").is_err());
        assert_eq!(opt_bool(&args, "absent").unwrap(), None);
    }

    #[test]
    fn test_require_bool_missing_is_invalid_params() {
        let args = args(json!({"resolved": false}));
        assert!(!require_bool(&args, "resolved").unwrap());
        let err = require_bool(&args, "absent").unwrap_err();
        assert_eq!(err.code, ErrorCode::INVALID_PARAMS);
    }

    #[test]
    fn test_bool_or_applies_default() {
        let args = args(json!({"squash": false}));
        assert!(!bool_or(&args, "squash", true).unwrap());
        assert!(bool_or(&args, "with_diverged", true).unwrap());
        assert!(!bool_or(&args, "with_diverged_off", false).unwrap());
    }

    #[test]
    fn test_opt_csv_splits_and_trims() {
        let args = args(json!({"labels": "bug, backend ,,triage"}));
        assert_eq!(
            opt_csv(&args, "labels").unwrap(),
            Some(vec![
                "bug".to_string(),
                "backend".to_string(),
                "triage".to_string()
            ])
        );
    }

    #[test]
    fn test_opt_csv_accepts_arrays() {
        let args = args(json!({"milestones": ["v1.0", "v1.1"], "mixed": ["a", 2]}));
        assert_eq!(
            opt_csv(&args, "milestones").unwrap(),
            Some(vec!["v1.0".to_string(), "v1.1".to_string()])
        );
        assert_eq!(
            opt_csv(&args, "mixed").unwrap(),
            Some(vec!["a".to_string(), "2".to_string()])
        );
    }

    #[test]
    fn test_opt_csv_empty_counts_as_unset() {
        let args = args(json!({"labels": "", "spaces": " , ", "empty_list": []}));
        assert_eq!(opt_csv(&args, "labels").unwrap(), None);
        assert_eq!(opt_csv(&args, "spaces").unwrap(), None);
        assert_eq!(opt_csv(&args, "empty_list").unwrap(), None);
        assert_eq!(opt_csv(&args, "absent").unwrap(), None);
    }

    #[test]
    fn test_opt_csv_u64_from_string_and_array() {
        let args = args(json!({"a": "1, 2,3", "b": [4, "5"], "c": "1,x"}));
        assert_eq!(opt_csv_u64(&args, "a").unwrap(), Some(vec![1, 2, 3]));
        assert_eq!(opt_csv_u64(&args, "b").unwrap(), Some(vec![4, 5]));
        let err = opt_csv_u64(&args, "c").unwrap_err();
        assert_eq!(err.code, ErrorCode::INVALID_PARAMS);
        assert_eq!(opt_csv_u64(&args, "absent").unwrap(), None);
    }
}
