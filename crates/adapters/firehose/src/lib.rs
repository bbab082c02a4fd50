//! adapter-firehose - Amazon Kinesis Data Firehose adapter

pub mod client;

pub use client::{FirehoseHandler, MAX_BATCH_RECORDS};
