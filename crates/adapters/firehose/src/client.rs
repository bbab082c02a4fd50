//! Firehose client implementation

use aws_sdk_firehose::Client;
use aws_sdk_firehose::primitives::Blob;
use aws_sdk_firehose::types::Record;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use santoku_common::{BatchFailure, BatchOutcome};
use santoku_config::AwsConfig;
use santoku_errors::{AppError, AppResult};
use tracing::{debug, info};

const SERVICE: &str = "firehose";

/// Firehose accepts at most this many records per `PutRecordBatch` call.
pub const MAX_BATCH_RECORDS: usize = 500;

/// Delivery stream handler
#[derive(Debug, Clone)]
pub struct FirehoseHandler {
    client: Client,
}

impl FirehoseHandler {
    pub async fn new(config: &AwsConfig) -> Self {
        let sdk_config = santoku_common::load_sdk_config(config).await;
        info!("Firehose handler created");
        Self::from_client(Client::new(&sdk_config))
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    pub fn encode_base64(data: &[u8]) -> String {
        B64.encode(data)
    }

    fn record(data: Vec<u8>) -> AppResult<Record> {
        Record::builder()
            .data(Blob::new(data))
            .build()
            .map_err(|e| AppError::internal(format!("Invalid Firehose record: {}", e)))
    }

    /// Send one record; returns the record id assigned by the stream.
    pub async fn put_record(&self, stream: &str, data: Vec<u8>) -> AppResult<String> {
        let output = self
            .client
            .put_record()
            .delivery_stream_name(stream)
            .record(Self::record(data)?)
            .send()
            .await
            .map_err(|e| AppError::vendor(SERVICE, e))?;

        debug!(stream, "Record delivered");
        Ok(output.record_id().to_string())
    }

    /// Send a batch of records. Failed entries are identified by their position in `records`.
    pub async fn put_records(&self, stream: &str, records: Vec<Vec<u8>>) -> AppResult<BatchOutcome> {
        if records.is_empty() {
            return Err(AppError::validation("At least one record is required."));
        }
        if records.len() > MAX_BATCH_RECORDS {
            return Err(AppError::validation(format!(
                "The maximum number of records allowed in a batch is {}.",
                MAX_BATCH_RECORDS
            )));
        }

        let records = records
            .into_iter()
            .map(Self::record)
            .collect::<AppResult<Vec<_>>>()?;

        let output = self
            .client
            .put_record_batch()
            .delivery_stream_name(stream)
            .set_records(Some(records))
            .send()
            .await
            .map_err(|e| AppError::vendor(SERVICE, e))?;

        let mut outcome = BatchOutcome::default();
        for (index, response) in output.request_responses().iter().enumerate() {
            match response.error_code() {
                Some(code) => outcome.failed.push(BatchFailure {
                    id: index.to_string(),
                    code: code.to_string(),
                    message: response.error_message().map(str::to_string),
                    sender_fault: false,
                }),
                None => outcome
                    .successful
                    .push(response.record_id().unwrap_or_default().to_string()),
            }
        }

        info!(
            stream,
            delivered = outcome.successful.len(),
            failed = output.failed_put_count(),
            "Record batch delivered"
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_firehose::config::retry::RetryConfig;
    use aws_sdk_firehose::config::{BehaviorVersion, Credentials, Region};
    use mockito::{Matcher, Server, ServerGuard};
    use santoku_errors::ErrorKind;

    const JSON_1_1: &str = "application/x-amz-json-1.1";

    fn handler_for(server: &ServerGuard) -> FirehoseHandler {
        let config = aws_sdk_firehose::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .credentials_provider(Credentials::new("AKIDTEST", "secret", None, None, "tests"))
            .endpoint_url(server.url())
            .retry_config(RetryConfig::disabled())
            .build();
        FirehoseHandler::from_client(Client::from_conf(config))
    }

    #[test]
    fn test_encode_base64() {
        assert_eq!(FirehoseHandler::encode_base64(b"{\"a\":1}"), "eyJhIjoxfQ==");
        assert_eq!(FirehoseHandler::encode_base64(b""), "");
    }

    #[tokio::test]
    async fn test_batch_size_is_checked_before_sending() {
        let config = AwsConfig {
            region: Some("us-east-1".to_string()),
            endpoint_url: Some("http://127.0.0.1:1".to_string()),
            profile: None,
        };
        let handler = FirehoseHandler::new(&config).await;

        let err = handler.put_records("stream", Vec::new()).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let too_many = vec![b"x".to_vec(); MAX_BATCH_RECORDS + 1];
        let err = handler.put_records("stream", too_many).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_put_record_returns_record_id() {
        let mut server = Server::new_async().await;
        let put = server
            .mock("POST", "/")
            .match_header("x-amz-target", "Firehose_20150804.PutRecord")
            .match_body(Matcher::PartialJsonString(
                r#"{"DeliveryStreamName":"events","Record":{"Data":"aGVsbG8="}}"#.into(),
            ))
            .with_status(200)
            .with_header("content-type", JSON_1_1)
            .with_body(r#"{"RecordId":"rec-42","Encrypted":false}"#)
            .expect(1)
            .create_async()
            .await;

        let handler = handler_for(&server);
        let record_id = handler.put_record("events", b"hello".to_vec()).await.unwrap();

        assert_eq!(record_id, "rec-42");
        put.assert_async().await;
    }

    #[tokio::test]
    async fn test_failed_records_are_identified_by_position() {
        let mut server = Server::new_async().await;
        let batch = server
            .mock("POST", "/")
            .match_header("x-amz-target", "Firehose_20150804.PutRecordBatch")
            .match_body(Matcher::PartialJsonString(
                r#"{"DeliveryStreamName":"events","Records":[{"Data":"YQ=="},{"Data":"Yg=="},{"Data":"Yw=="}]}"#
                    .into(),
            ))
            .with_status(200)
            .with_header("content-type", JSON_1_1)
            .with_body(
                r#"{
                    "FailedPutCount": 1,
                    "Encrypted": false,
                    "RequestResponses": [
                        {"RecordId": "rec-0"},
                        {"ErrorCode": "ServiceUnavailableException", "ErrorMessage": "Slow down."},
                        {"RecordId": "rec-2"}
                    ]
                }"#,
            )
            .expect(1)
            .create_async()
            .await;

        let handler = handler_for(&server);
        let records = vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()];
        let outcome = handler.put_records("events", records).await.unwrap();

        batch.assert_async().await;
        assert_eq!(outcome.successful, vec!["rec-0", "rec-2"]);
        assert_eq!(
            outcome.failed,
            vec![BatchFailure {
                id: "1".to_string(),
                code: "ServiceUnavailableException".to_string(),
                message: Some("Slow down.".to_string()),
                sender_fault: false,
            }]
        );
    }

    #[tokio::test]
    async fn test_missing_stream_passes_through() {
        let mut server = Server::new_async().await;
        let _put = server
            .mock("POST", "/")
            .match_header("x-amz-target", "Firehose_20150804.PutRecord")
            .with_status(400)
            .with_header("content-type", JSON_1_1)
            .with_body(
                r#"{"__type":"ResourceNotFoundException","message":"Firehose missing not found under account 123456789012."}"#,
            )
            .create_async()
            .await;

        let handler = handler_for(&server);
        let err = handler.put_record("missing", b"x".to_vec()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Passthrough);
    }
}
