//! Object name extraction from REST paths

use std::sync::LazyLock;

use regex::Regex;

static SOQL_FROM_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bFROM\+([A-Za-z0-9_]+)").unwrap());

/// Salesforce object a relative REST path refers to, if any.
///
/// Handles `sobjects/{name}/describe`, SOQL queries (`query?q=SELECT+..+FROM+{name}..`) and
/// record paths `sobjects/{name}[/{id}]`. The bare `sobjects` listing and other resources such
/// as `limits` refer to no object.
pub fn object_name_from_path(path: &str) -> Option<String> {
    if path == "sobjects" {
        return None;
    }

    if path.contains("describe") {
        return path
            .split('/')
            .nth(1)
            .filter(|name| !name.is_empty())
            .map(str::to_string);
    }

    if path.starts_with("query") {
        return SOQL_FROM_REGEX
            .captures(path)
            .and_then(|captures| captures.get(1))
            .map(|name| name.as_str().to_string());
    }

    let mut segments = path.split('/');
    segments
        .position(|segment| segment == "sobjects")
        .and_then(|_| segments.next())
        .filter(|name| !name.is_empty())
        .map(|name| name.split('?').next().unwrap_or(name).to_string())
}
