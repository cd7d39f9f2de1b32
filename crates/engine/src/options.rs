//! Option merging, schema validation, and typed access to option values.

use anyhow::{Result, bail};
use serde_json::{Number, Value};
use stagehand_types::{OptionSchema, TaskOptions};

use crate::error::TaskError;

/// Merge configured options with caller overrides; overrides win.
pub fn merge_options(configured: Option<&TaskOptions>, overrides: TaskOptions) -> TaskOptions {
    let mut options = configured.cloned().unwrap_or_default();
    options.extend(overrides);
    options
}

/// Fill absent optional options that declare a default.
pub fn apply_schema_defaults(options: &mut TaskOptions, schema: &OptionSchema) {
    for (name, spec) in schema.iter() {
        if let Some(default) = &spec.default
            && !options.contains_key(name)
        {
            options.insert(name.clone(), default.clone());
        }
    }
}

/// Required option names absent from `options`, in schema declaration order.
pub fn missing_required_options(schema: &OptionSchema, options: &TaskOptions) -> Vec<String> {
    schema
        .iter()
        .filter(|(name, spec)| spec.required && !options.contains_key(name.as_str()))
        .map(|(name, _)| name.clone())
        .collect()
}

/// Fail with [`TaskError::Options`] naming every missing required option.
pub fn validate_options(task: &str, schema: &OptionSchema, options: &TaskOptions) -> Result<(), TaskError> {
    let missing = missing_required_options(schema, options);
    if missing.is_empty() {
        return Ok(());
    }
    Err(TaskError::Options {
        task: task.to_string(),
        missing,
    })
}

/// Truthiness of an option value: null, false, zero, and empty strings or
/// collections are falsy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|value| value != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Read a numeric-like option: a JSON number or a string that parses as one.
///
/// Missing and null options read as `None`.
pub fn option_number(options: &TaskOptions, key: &str) -> Result<Option<f64>> {
    let parsed = match options.get(key) {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(number)) => number.as_f64(),
        Some(Value::String(text)) if text.trim().is_empty() => return Ok(None),
        Some(Value::String(text)) => text.trim().parse::<f64>().ok(),
        Some(Value::Bool(flag)) => Some(if *flag { 1.0 } else { 0.0 }),
        Some(_) => None,
    };
    match parsed {
        Some(value) if value.is_finite() => Ok(Some(value)),
        _ => bail!("option '{key}' must be a number, got {}", options[key]),
    }
}

/// Read a boolean option, accepting `true/false`, `yes/no`, `1/0` strings.
pub fn option_bool(options: &TaskOptions, key: &str) -> Result<Option<bool>> {
    match options.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(flag)) => Ok(Some(*flag)),
        Some(Value::Number(number)) => Ok(Some(number.as_f64().is_some_and(|value| value != 0.0))),
        Some(Value::String(text)) => match text.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "y" | "1" | "on" => Ok(Some(true)),
            "false" | "no" | "n" | "0" | "off" | "" => Ok(Some(false)),
            other => bail!("option '{key}' must be a boolean, got '{other}'"),
        },
        Some(other) => bail!("option '{key}' must be a boolean, got {other}"),
    }
}

/// Read a list option given either as an array or a comma-separated string.
pub fn option_list(options: &TaskOptions, key: &str) -> Vec<String> {
    match options.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            })
            .collect(),
        Some(Value::String(text)) => text
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

/// JSON number for `value`, kept integral when it has no fractional part.
pub fn number_value(value: f64) -> Value {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        Value::Number(Number::from(value as i64))
    } else {
        Number::from_f64(value).map(Value::Number).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> OptionSchema {
        OptionSchema::new()
            .required("tag", "Release tag")
            .optional("notes", "Release notes")
            .required("version", "Package version")
            .with_default("draft", "Create as draft", false)
    }

    #[test]
    fn overrides_replace_configured_values() {
        let configured = TaskOptions::from([("tag".to_string(), json!("beta/1.0")), ("draft".to_string(), json!(true))]);
        let merged = merge_options(Some(&configured), TaskOptions::from([("tag".to_string(), json!("release/1.0"))]));

        assert_eq!(merged["tag"], "release/1.0");
        assert_eq!(merged["draft"], true);
        assert_eq!(merge_options(None, TaskOptions::new()), TaskOptions::new());
    }

    #[test]
    fn validation_reports_all_missing_options_in_declaration_order() {
        let error = validate_options("CreateRelease", &schema(), &TaskOptions::new()).expect_err("options missing");

        match error {
            TaskError::Options { task, missing } => {
                assert_eq!(task, "CreateRelease");
                assert_eq!(missing, vec!["tag".to_string(), "version".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn present_but_null_options_satisfy_validation() {
        let options = TaskOptions::from([("tag".to_string(), Value::Null), ("version".to_string(), json!("1.0"))]);
        assert!(validate_options("CreateRelease", &schema(), &options).is_ok());
    }

    #[test]
    fn defaults_fill_only_absent_options() {
        let mut options = TaskOptions::new();
        apply_schema_defaults(&mut options, &schema());
        assert_eq!(options, TaskOptions::from([("draft".to_string(), json!(false))]));

        let mut explicit = TaskOptions::from([("draft".to_string(), json!(true))]);
        apply_schema_defaults(&mut explicit, &schema());
        assert_eq!(explicit["draft"], true);
    }

    #[test]
    fn numeric_options_accept_numbers_and_numeric_strings() {
        let options = TaskOptions::from([
            ("retries".to_string(), json!(3)),
            ("retry_interval".to_string(), json!("1.5")),
            ("label".to_string(), json!("soon")),
        ]);

        assert_eq!(option_number(&options, "retries").unwrap(), Some(3.0));
        assert_eq!(option_number(&options, "retry_interval").unwrap(), Some(1.5));
        assert_eq!(option_number(&options, "missing").unwrap(), None);
        assert!(option_number(&options, "label").is_err());
    }

    #[test]
    fn boolean_and_list_options_parse_string_forms() {
        let options = TaskOptions::from([
            ("unmanaged".to_string(), json!("Yes")),
            ("namespaced".to_string(), json!(false)),
            ("paths".to_string(), json!("src, unpackaged/pre ,")),
            ("tags".to_string(), json!(["a", 1])),
        ]);

        assert_eq!(option_bool(&options, "unmanaged").unwrap(), Some(true));
        assert_eq!(option_bool(&options, "namespaced").unwrap(), Some(false));
        assert_eq!(option_list(&options, "paths"), vec!["src".to_string(), "unpackaged/pre".to_string()]);
        assert_eq!(option_list(&options, "tags"), vec!["a".to_string(), "1".to_string()]);
    }

    #[test]
    fn number_value_keeps_integers_integral() {
        assert_eq!(number_value(2.0), json!(2));
        assert_eq!(number_value(2.5), json!(2.5));
        assert!(!is_truthy(&json!(0)));
        assert!(is_truthy(&json!("x")));
    }
}
