//! Secret payload parsing

use std::fmt;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use santoku_errors::{AppError, AppResult};
use serde::de::DeserializeOwned;
use serde_json::error::Category;
use serde_json::{Map, Value};

/// Raw secret as returned by a store.
#[derive(Clone, PartialEq, Eq)]
pub enum SecretValue {
    Text(String),
    Binary(Vec<u8>),
}

impl fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(_) => f.write_str("SecretValue::Text([REDACTED])"),
            Self::Binary(bytes) => write!(f, "SecretValue::Binary({} bytes)", bytes.len()),
        }
    }
}

/// Credential fields fetched from a secret store.
#[derive(Clone, PartialEq)]
pub struct SecretPayload {
    fields: Map<String, Value>,
}

impl fmt::Debug for SecretPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretPayload")
            .field("keys", &self.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl SecretPayload {
    pub fn from_map(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Parse a stored secret into key/value pairs.
    ///
    /// Text secrets must hold a JSON object. Binary secrets may hold the JSON directly or its
    /// base64 encoding.
    pub fn parse(value: &SecretValue) -> AppResult<Self> {
        let fields = match value {
            SecretValue::Text(text) => parse_object(text.as_bytes()),
            SecretValue::Binary(bytes) => parse_object(bytes).or_else(|| {
                let trimmed: Vec<u8> = bytes
                    .iter()
                    .copied()
                    .filter(|b| !b.is_ascii_whitespace())
                    .collect();
                B64.decode(trimmed)
                    .ok()
                    .and_then(|decoded| parse_object(&decoded))
            }),
        };

        fields.map(Self::from_map).ok_or_else(|| {
            AppError::malformed("The secret payload is not a JSON object of key/value pairs.")
        })
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Value::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Fail with a configuration error naming every absent field.
    pub fn require(&self, fields: &[&str]) -> AppResult<()> {
        let missing: Vec<&str> = fields
            .iter()
            .copied()
            .filter(|field| !self.contains(field))
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(AppError::configuration(format!(
                "The secret is missing required fields: {}",
                missing.join(", ")
            )))
        }
    }

    /// Unpack the payload into constructor arguments.
    pub fn extract<T: DeserializeOwned>(&self) -> AppResult<T> {
        serde_json::from_value(Value::Object(self.fields.clone())).map_err(|e| {
            match missing_field(&e) {
                Some(field) => AppError::configuration(format!(
                    "The secret is missing required fields: {}",
                    field
                )),
                None => AppError::malformed(format!("The secret has an unexpected shape: {}", e)),
            }
        })
    }
}

/// Serialized name of the field a derived `Deserialize` reported as absent.
///
/// Derived impls report it through `serde::de::Error::missing_field`, whose message is
/// ``missing field `name` ``.
fn missing_field(err: &serde_json::Error) -> Option<String> {
    if err.classify() != Category::Data {
        return None;
    }
    err.to_string()
        .strip_prefix("missing field `")
        .and_then(|rest| rest.split_once('`'))
        .map(|(field, _)| field.to_string())
}

fn parse_object(bytes: &[u8]) -> Option<Map<String, Value>> {
    match serde_json::from_slice(bytes) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use santoku_errors::ErrorKind;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Credentials {
        username: String,
        port: u16,
        #[serde(default)]
        sandbox: bool,
    }

    fn text(json: &str) -> SecretValue {
        SecretValue::Text(json.to_string())
    }

    #[test]
    fn test_parse_text_object() {
        let payload = SecretPayload::parse(&text(r#"{"username":"svc","port":5432}"#)).unwrap();
        assert_eq!(payload.len(), 2);
        assert_eq!(payload.get_str("username"), Some("svc"));
        assert!(payload.contains("port"));
        assert_eq!(payload.get_str("port"), None);
    }

    #[test]
    fn test_parse_rejects_non_objects() {
        for raw in ["not json", "[1, 2]", "\"plain\"", ""] {
            let err = SecretPayload::parse(&text(raw)).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Malformed, "input: {raw:?}");
        }
    }

    #[test]
    fn test_parse_binary_json_and_base64() {
        let raw = br#"{"API_TOKEN":"xoxb-1"}"#.to_vec();
        let direct = SecretPayload::parse(&SecretValue::Binary(raw.clone())).unwrap();
        let encoded = SecretPayload::parse(&SecretValue::Binary(B64.encode(&raw).into_bytes()))
            .unwrap();

        assert_eq!(direct, encoded);
        assert_eq!(encoded.get_str("API_TOKEN"), Some("xoxb-1"));

        let err = SecretPayload::parse(&SecretValue::Binary(vec![0xff, 0x00])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Malformed);
    }

    #[test]
    fn test_require_lists_missing_fields() {
        let payload = SecretPayload::parse(&text(r#"{"username":"svc"}"#)).unwrap();
        assert!(payload.require(&["username"]).is_ok());

        let err = payload.require(&["username", "password", "token"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(err.to_string().contains("password, token"));
    }

    #[test]
    fn test_extract() {
        let payload =
            SecretPayload::parse(&text(r#"{"username":"svc","port":5432,"extra":1}"#)).unwrap();
        let creds: Credentials = payload.extract().unwrap();
        assert_eq!(creds.username, "svc");
        assert_eq!(creds.port, 5432);
        assert!(!creds.sandbox);

        let missing = SecretPayload::parse(&text(r#"{"username":"svc"}"#)).unwrap();
        let err = missing.extract::<Credentials>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);

        let wrong = SecretPayload::parse(&text(r#"{"username":"svc","port":"x"}"#)).unwrap();
        let err = wrong.extract::<Credentials>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Malformed);
    }

    #[derive(Debug, Deserialize)]
    struct KeyFile {
        #[serde(rename = "type")]
        key_type: String,
        #[serde(rename = "API_TOKEN")]
        api_token: String,
    }

    #[test]
    fn test_extract_renamed_fields() {
        let missing = SecretPayload::parse(&text(r#"{"API_TOKEN":"t"}"#)).unwrap();
        let err = missing.extract::<KeyFile>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(err.to_string().ends_with("missing required fields: type"));

        let wrong = SecretPayload::parse(&text(r#"{"type":7,"API_TOKEN":"t"}"#)).unwrap();
        assert_eq!(wrong.extract::<KeyFile>().unwrap_err().kind(), ErrorKind::Malformed);

        let complete = SecretPayload::parse(&text(r#"{"type":"bot","API_TOKEN":"t"}"#)).unwrap();
        let key = complete.extract::<KeyFile>().unwrap();
        assert_eq!((key.key_type.as_str(), key.api_token.as_str()), ("bot", "t"));
    }

    #[test]
    fn test_debug_hides_values() {
        let payload = SecretPayload::parse(&text(r#"{"password":"hunter2"}"#)).unwrap();
        let rendered = format!("{:?} {:?}", payload, text("hunter2"));
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("password"));
    }
}
