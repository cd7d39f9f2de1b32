//! Project attribute references inside option values.
//!
//! A string option may embed `$project_config.<attribute>`; the reference is
//! replaced with the attribute's text once, when the task is constructed.
//! Attributes come from a [`ProjectLookup`] table: the project's declared
//! repository fields plus every path of the project document, with nested
//! keys joined by `__` (`project__package__name`).

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::Value;
use stagehand_types::{ProjectConfig, TaskOptions};

/// Text substituted for attributes the project does not define.
pub const MISSING_ATTRIBUTE: &str = "None";

static PROJECT_CONFIG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$project_config\.(\w+)").unwrap());

/// Attribute table built from a project configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectLookup {
    values: IndexMap<String, String>,
}

impl ProjectLookup {
    pub fn from_project(project: &ProjectConfig) -> Self {
        let mut values = IndexMap::new();
        let declared = [
            ("repo_root", project.repo_root().map(|root| root.display().to_string())),
            ("repo_name", project.repo.name.clone()),
            ("repo_owner", project.repo.owner.clone()),
            ("repo_url", project.repo.url.clone()),
            ("repo_branch", project.repo.branch.clone()),
            ("repo_commit", project.repo.commit.clone()),
        ];
        for (attribute, value) in declared {
            if let Some(value) = value {
                values.insert(attribute.to_string(), value);
            }
        }

        if let Value::Object(document) = project.document() {
            for (key, value) in &document {
                flatten_into(&mut values, key.clone(), value);
            }
        }

        Self { values }
    }

    pub fn get(&self, attribute: &str) -> Option<&str> {
        self.values.get(attribute).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

fn flatten_into(values: &mut IndexMap<String, String>, path: String, value: &Value) {
    if let Value::Object(children) = value {
        for (key, child) in children {
            flatten_into(values, format!("{path}__{key}"), child);
        }
    }
    values.entry(path).or_insert_with(|| render_project_value(value));
}

/// Text form of a project attribute value.
pub fn render_project_value(value: &Value) -> String {
    match value {
        Value::Null => MISSING_ATTRIBUTE.to_string(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Expand every `$project_config.<attribute>` in `text`.
///
/// Returns the expanded text and the attributes that were not found.
pub fn expand_project_references(text: &str, lookup: &ProjectLookup) -> (String, Vec<String>) {
    let mut missing = Vec::new();
    let expanded = PROJECT_CONFIG_RE.replace_all(text, |captures: &Captures| {
        let attribute = &captures[1];
        match lookup.get(attribute) {
            Some(value) => value.to_string(),
            None => {
                missing.push(attribute.to_string());
                MISSING_ATTRIBUTE.to_string()
            }
        }
    });
    (expanded.into_owned(), missing)
}

/// Rewrite string-valued options in place.
///
/// Non-string values are left untouched. Returns the referenced attributes the
/// project did not define, in the order they were encountered.
pub fn resolve_option_templates(options: &mut TaskOptions, lookup: &ProjectLookup) -> Vec<String> {
    let mut missing = Vec::new();
    for value in options.values_mut() {
        let Value::String(text) = value else {
            continue;
        };
        if !text.contains("$project_config") {
            continue;
        }
        let (expanded, unresolved) = expand_project_references(text, lookup);
        *text = expanded;
        missing.extend(unresolved);
    }
    missing
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use stagehand_types::RepoInfo;

    fn project() -> ProjectConfig {
        let mut project = ProjectConfig::default()
            .with_repo(RepoInfo {
                name: Some("release-tools".into()),
                branch: Some("main".into()),
                ..Default::default()
            })
            .with_repo_root("/work/release-tools");
        project.project.insert("package".into(), json!({"name": "rt", "api_version": 59.0, "namespace": null}));
        project
    }

    #[test]
    fn replaces_declared_attributes() {
        let lookup = ProjectLookup::from_project(&project());
        let mut options = TaskOptions::from([
            ("tag".to_string(), json!("$project_config.repo_name/$project_config.repo_branch")),
            ("path".to_string(), json!("$project_config.repo_root/src")),
        ]);

        let missing = resolve_option_templates(&mut options, &lookup);

        assert!(missing.is_empty());
        assert_eq!(options["tag"], "release-tools/main");
        assert_eq!(options["path"], "/work/release-tools/src");
    }

    #[test]
    fn resolves_nested_document_paths() {
        let lookup = ProjectLookup::from_project(&project());
        let (expanded, missing) = expand_project_references(
            "$project_config.project__package__name@$project_config.project__package__api_version",
            &lookup,
        );

        assert_eq!(expanded, "rt@59.0");
        assert!(missing.is_empty());
    }

    #[test]
    fn missing_attributes_become_the_sentinel() {
        let lookup = ProjectLookup::from_project(&project());
        let mut options = TaskOptions::from([
            ("commit".to_string(), json!("sha-$project_config.repo_commit")),
            ("namespace".to_string(), json!("$project_config.project__package__namespace")),
        ]);

        let missing = resolve_option_templates(&mut options, &lookup);

        assert_eq!(options["commit"], "sha-None");
        assert_eq!(options["namespace"], "None");
        assert_eq!(missing, vec!["repo_commit".to_string()]);
    }

    #[test]
    fn non_string_options_pass_through() {
        let lookup = ProjectLookup::from_project(&project());
        let mut options = TaskOptions::from([
            ("retries".to_string(), json!(3)),
            ("paths".to_string(), json!(["$project_config.repo_name"])),
        ]);

        resolve_option_templates(&mut options, &lookup);

        assert_eq!(options["retries"], 3);
        assert_eq!(options["paths"], json!(["$project_config.repo_name"]));
    }
}
