use serde_json::Value;

/// Read a required string parameter.
pub fn read_string_param(params: &Value, key: &str) -> Result<String, String> {
    read_optional_string_param(params, key)
        .ok_or_else(|| format!("Missing required parameter: {}", key))
}

/// Read an optional string parameter. Blank values count as absent.
pub fn read_optional_string_param(params: &Value, key: &str) -> Option<String> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
