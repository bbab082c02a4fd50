//! 消息与消息属性

use std::collections::{HashMap, HashSet};

use aws_sdk_sqs::primitives::Blob;
use aws_sdk_sqs::types::{MessageAttributeValue, SendMessageBatchRequestEntry};
use santoku_errors::{AppError, AppResult};

/// SQS accepts at most this many attributes per message.
pub const MAX_MESSAGE_ATTRIBUTES: usize = 10;

/// SQS accepts at most this many entries per batch.
pub const MAX_BATCH_ENTRIES: usize = 10;

/// Typed message attribute.
///
/// `data_type` is `String`, `Number` or `Binary`, optionally followed by a custom label such as
/// `Number.int`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageAttribute {
    pub data_type: String,
    pub string_value: Option<String>,
    pub binary_value: Option<Vec<u8>>,
}

impl MessageAttribute {
    pub fn string(value: impl Into<String>) -> Self {
        Self {
            data_type: "String".to_string(),
            string_value: Some(value.into()),
            binary_value: None,
        }
    }

    pub fn number(value: impl ToString) -> Self {
        Self {
            data_type: "Number".to_string(),
            string_value: Some(value.to_string()),
            binary_value: None,
        }
    }

    pub fn binary(value: Vec<u8>) -> Self {
        Self {
            data_type: "Binary".to_string(),
            string_value: None,
            binary_value: Some(value),
        }
    }

    fn base_type(&self) -> &str {
        self.data_type
            .split_once('.')
            .map_or(self.data_type.as_str(), |(base, _)| base)
    }

    fn validate(&self) -> Result<(), &'static str> {
        match self.base_type() {
            "String" if self.string_value.is_none() => {
                Err("'StringValue' argument is required for message attributes of type String.")
            }
            "Number" if self.string_value.is_none() => {
                Err("'StringValue' argument is required for message attributes of type Number.")
            }
            "Binary" if self.binary_value.is_none() => {
                Err("'BinaryValue' argument is required for message attributes of type Binary.")
            }
            "String" | "Number" | "Binary" => Ok(()),
            _ => Err("The supported types for 'DataType' argument are: Binary, Number and String."),
        }
    }

    pub(crate) fn to_sdk(&self) -> AppResult<MessageAttributeValue> {
        MessageAttributeValue::builder()
            .data_type(&self.data_type)
            .set_string_value(self.string_value.clone())
            .set_binary_value(self.binary_value.clone().map(Blob::new))
            .build()
            .map_err(|e| AppError::internal(format!("Invalid message attribute: {}", e)))
    }

    pub(crate) fn from_sdk(value: &MessageAttributeValue) -> Self {
        Self {
            data_type: value.data_type().to_string(),
            string_value: value.string_value().map(str::to_string),
            binary_value: value.binary_value().map(|blob| blob.as_ref().to_vec()),
        }
    }
}

/// Check attributes against the structure SQS requires.
pub fn validate_message_attributes(attributes: &HashMap<String, MessageAttribute>) -> AppResult<()> {
    if attributes.len() > MAX_MESSAGE_ATTRIBUTES {
        return Err(AppError::validation("Messages can have up to 10 attributes."));
    }

    for attribute in attributes.values() {
        attribute.validate().map_err(AppError::validation)?;
    }
    Ok(())
}

pub(crate) fn attributes_to_sdk(
    attributes: &HashMap<String, MessageAttribute>,
) -> AppResult<Option<HashMap<String, MessageAttributeValue>>> {
    if attributes.is_empty() {
        return Ok(None);
    }
    attributes
        .iter()
        .map(|(name, attribute)| Ok((name.clone(), attribute.to_sdk()?)))
        .collect::<AppResult<HashMap<_, _>>>()
        .map(Some)
}

/// One message of a batch send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchEntry {
    /// Identifier unique within the batch.
    pub id: String,
    pub body: String,
    pub attributes: HashMap<String, MessageAttribute>,
}

impl BatchEntry {
    pub fn new(id: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            body: body.into(),
            attributes: HashMap::new(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, attribute: MessageAttribute) -> Self {
        self.attributes.insert(name.into(), attribute);
        self
    }

    pub(crate) fn to_sdk(&self) -> AppResult<SendMessageBatchRequestEntry> {
        SendMessageBatchRequestEntry::builder()
            .id(&self.id)
            .message_body(&self.body)
            .set_message_attributes(attributes_to_sdk(&self.attributes)?)
            .build()
            .map_err(|e| AppError::internal(format!("Invalid batch entry: {}", e)))
    }
}

pub(crate) fn validate_batch(entries: &[BatchEntry]) -> AppResult<()> {
    if entries.is_empty() {
        return Err(AppError::validation("The list of 'entries' cannot be empty."));
    }
    if entries.len() > MAX_BATCH_ENTRIES {
        return Err(AppError::validation(
            "The maximum number of messages allowed in a batch is 10.",
        ));
    }

    let mut ids = HashSet::with_capacity(entries.len());
    for entry in entries {
        if entry.id.is_empty() {
            return Err(AppError::validation("'Id' attribute is required for each message."));
        }
        validate_message_attributes(&entry.attributes)?;
        if !ids.insert(entry.id.as_str()) {
            return Err(AppError::validation(
                "'Id' attribute must be unique along all the messages.",
            ));
        }
    }
    Ok(())
}

/// Result of a single send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub message_id: Option<String>,
    pub md5_of_body: Option<String>,
    /// Only set for FIFO queues.
    pub sequence_number: Option<String>,
}

/// Message read from a queue. `receipt_handle` is needed to delete it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedMessage {
    pub message_id: Option<String>,
    pub receipt_handle: Option<String>,
    pub body: Option<String>,
    pub attributes: HashMap<String, MessageAttribute>,
}
