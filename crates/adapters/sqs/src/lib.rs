//! adapter-sqs - Amazon SQS adapter
//!
//! Sends, receives and deletes queue messages. Queue URLs are looked up once per handler and
//! cached.

pub mod client;
pub mod error;
pub mod message;

pub use client::SqsHandler;
pub use message::{
    BatchEntry, MAX_BATCH_ENTRIES, MAX_MESSAGE_ATTRIBUTES, MessageAttribute, ReceivedMessage,
    SentMessage, validate_message_attributes,
};
