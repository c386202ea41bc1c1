// Query construction for the remote file-index service

use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};

/// One query request, as understood by the service.
#[derive(Debug, Clone, Serialize)]
pub struct QueryParams {
    pub relative_root: String,
    /// An explicit empty path restricts the query to the tree rooted at
    /// `relative_root`.
    pub path: Vec<String>,
    pub fields: Vec<String>,
    pub expression: JsonValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sync_timeout: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub warning: Option<String>,
    #[serde(default)]
    pub files: Option<Vec<String>>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Build the match expression for one glob: regular files or symlinks whose
/// whole relative path matches any include pattern and no exclude pattern.
pub fn build_query_params(
    includes: &[String],
    excludes: &[String],
    include_dotfiles: bool,
    relative_root: &str,
) -> QueryParams {
    let mut match_flags = serde_json::Map::new();
    if include_dotfiles {
        match_flags.insert("includedotfiles".to_string(), JsonValue::Bool(true));
    }
    let match_flags = JsonValue::Object(match_flags);

    let mut expression = vec![
        json!("allof"),
        json!("exists"),
        json!(["anyof", ["type", "f"], ["type", "l"]]),
    ];
    if !includes.is_empty() {
        let mut any = vec![json!("anyof")];
        any.extend(
            includes
                .iter()
                .map(|pattern| json!(["match", pattern, "wholename", match_flags.clone()])),
        );
        expression.push(JsonValue::Array(any));
    }
    if !excludes.is_empty() {
        let mut any = vec![json!("anyof")];
        any.extend(
            excludes
                .iter()
                .map(|pattern| json!(["match", pattern, "wholename", match_flags.clone()])),
        );
        expression.push(json!(["not", JsonValue::Array(any)]));
    }

    QueryParams {
        relative_root: relative_root.to_string(),
        path: vec![String::new()],
        fields: vec!["name".to_string()],
        expression: JsonValue::Array(expression),
        sync_timeout: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_the_match_expression() {
        let params = build_query_params(
            &["*.java".to_string()],
            &["Gen.java".to_string()],
            false,
            "src/java",
        );
        assert_eq!(params.relative_root, "src/java");
        assert_eq!(params.path, vec![String::new()]);
        assert_eq!(params.fields, vec!["name".to_string()]);
        assert_eq!(
            params.expression,
            json!([
                "allof",
                "exists",
                ["anyof", ["type", "f"], ["type", "l"]],
                ["anyof", ["match", "*.java", "wholename", {}]],
                ["not", ["anyof", ["match", "Gen.java", "wholename", {}]]],
            ])
        );
        assert!(params.sync_timeout.is_none());
    }

    #[test]
    fn dotfile_flag_rides_on_every_match() {
        let params = build_query_params(&["*".to_string()], &[], true, "");
        assert_eq!(
            params.expression[3],
            json!(["anyof", ["match", "*", "wholename", { "includedotfiles": true }]])
        );
    }

    #[test]
    fn serializes_without_sync_timeout_when_unset() {
        let params = build_query_params(&["*.c".to_string()], &[], false, "lib");
        let encoded = serde_json::to_string(&params).unwrap();
        assert!(!encoded.contains("sync_timeout"));

        let mut params = params;
        params.sync_timeout = Some(0);
        let encoded = serde_json::to_string(&params).unwrap();
        assert!(encoded.contains("\"sync_timeout\":0"));
    }
}
