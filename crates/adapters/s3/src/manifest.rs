//! QuickSight manifest

use santoku_errors::{AppError, AppResult};
use serde::Serialize;
use serde_json::{Map, Value, json};

/// Manifest describing which S3 files a QuickSight data set imports.
///
/// See <https://docs.aws.amazon.com/quicksight/latest/user/supported-manifest-file-format.html>.
#[derive(Debug, Clone, Default)]
pub struct QuickSightManifest {
    /// Absolute `s3://` paths of individual files.
    pub uris: Option<Vec<String>>,
    /// Prefixes whose files are all included.
    pub uri_prefixes: Option<Vec<String>>,
    pub format: Option<String>,
    pub delimiter: Option<String>,
    pub text_qualifier: Option<String>,
    pub contains_header: Option<bool>,
}

impl QuickSightManifest {
    pub fn with_uris(uris: Vec<String>) -> Self {
        Self {
            uris: Some(uris),
            ..Default::default()
        }
    }

    pub fn with_uri_prefixes(uri_prefixes: Vec<String>) -> Self {
        Self {
            uri_prefixes: Some(uri_prefixes),
            ..Default::default()
        }
    }

    pub fn to_value(&self) -> AppResult<Value> {
        if self.uris.is_none() && self.uri_prefixes.is_none() {
            return Err(AppError::validation("No file nor prefix were specified."));
        }

        let mut file_locations = Vec::new();
        if let Some(uris) = &self.uris {
            file_locations.push(json!({ "URIs": uris }));
        }
        if let Some(prefixes) = &self.uri_prefixes {
            file_locations.push(json!({ "URIPrefixes": prefixes }));
        }

        let mut upload_settings = Map::new();
        if let Some(format) = &self.format {
            upload_settings.insert("format".into(), json!(format));
        }
        if let Some(delimiter) = &self.delimiter {
            upload_settings.insert("delimiter".into(), json!(delimiter));
        }
        if let Some(qualifier) = &self.text_qualifier {
            upload_settings.insert("textqualifier".into(), json!(qualifier));
        }
        if let Some(header) = self.contains_header {
            upload_settings.insert("containsHeader".into(), json!(header));
        }

        let mut manifest = Map::new();
        manifest.insert("fileLocations".into(), Value::Array(file_locations));
        if !upload_settings.is_empty() {
            manifest.insert("globalUploadSettings".into(), Value::Object(upload_settings));
        }
        Ok(Value::Object(manifest))
    }

    /// Render with sorted keys and four-space indentation.
    pub fn to_json_string(&self) -> AppResult<String> {
        let value = self.to_value()?;

        let mut buffer = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
        value
            .serialize(&mut serializer)
            .map_err(|e| AppError::internal(format!("Failed to render manifest: {}", e)))?;

        String::from_utf8(buffer)
            .map_err(|e| AppError::internal(format!("Manifest is not valid UTF-8: {}", e)))
    }
}
