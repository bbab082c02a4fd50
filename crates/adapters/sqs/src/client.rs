//! SQS client implementation

use std::collections::HashMap;

use aws_sdk_sqs::Client;
use santoku_common::{BatchFailure, BatchOutcome};
use santoku_config::AwsConfig;
use santoku_errors::{AppError, AppResult};
use tracing::{debug, info, warn};

use crate::error::{is_missing_queue, map_sqs_error};
use crate::message::{
    BatchEntry, MessageAttribute, ReceivedMessage, SentMessage, attributes_to_sdk,
    validate_batch, validate_message_attributes,
};

/// SQS handler
#[derive(Debug, Clone)]
pub struct SqsHandler {
    client: Client,
    queue_urls: HashMap<String, String>,
}

impl SqsHandler {
    /// Create a handler; every queue it touches must live in the configured region.
    pub async fn new(config: &AwsConfig) -> Self {
        let sdk_config = santoku_common::load_sdk_config(config).await;
        info!(region = ?config.region, "SQS handler created");
        Self::from_client(Client::new(&sdk_config))
    }

    pub fn from_client(client: Client) -> Self {
        Self {
            client,
            queue_urls: HashMap::new(),
        }
    }

    pub async fn queue_exists(&self, queue_name: &str) -> AppResult<bool> {
        match self.client.get_queue_url().queue_name(queue_name).send().await {
            Ok(_) => Ok(true),
            Err(err) if is_missing_queue(&err) => Ok(false),
            Err(err) => Err(map_sqs_error(err)),
        }
    }

    pub fn queue_is_fifo(queue_name: &str) -> bool {
        queue_name.ends_with(".fifo")
    }

    /// URL of a queue, looked up once and then served from the handler's cache.
    pub async fn queue_url(&mut self, queue_name: &str) -> AppResult<String> {
        if let Some(url) = self.queue_urls.get(queue_name) {
            return Ok(url.clone());
        }

        debug!("Looking up URL of queue: {}", queue_name);
        let output = match self.client.get_queue_url().queue_name(queue_name).send().await {
            Ok(output) => output,
            Err(err) if is_missing_queue(&err) => {
                return Err(AppError::not_found(format!(
                    "The queue `{}` does not exist.",
                    queue_name
                )));
            }
            Err(err) => return Err(map_sqs_error(err)),
        };

        let url = output
            .queue_url()
            .map(str::to_string)
            .ok_or_else(|| AppError::not_found(format!("The queue `{}` has no URL.", queue_name)))?;
        self.queue_urls.insert(queue_name.to_string(), url.clone());
        Ok(url)
    }

    pub async fn send_message(
        &mut self,
        queue_name: &str,
        body: &str,
        attributes: &HashMap<String, MessageAttribute>,
    ) -> AppResult<SentMessage> {
        let queue_url = self.queue_url(queue_name).await?;

        if let Err(err) = validate_message_attributes(attributes) {
            warn!(queue = queue_name, "Rejected message attributes: {}", err);
            return Err(err);
        }

        let output = self
            .client
            .send_message()
            .queue_url(&queue_url)
            .message_body(body)
            .set_message_attributes(attributes_to_sdk(attributes)?)
            .send()
            .await
            .map_err(map_sqs_error)?;

        debug!(queue = queue_name, "Message sent");
        Ok(SentMessage {
            message_id: output.message_id().map(str::to_string),
            md5_of_body: output.md5_of_message_body().map(str::to_string),
            sequence_number: output.sequence_number().map(str::to_string),
        })
    }

    /// Send up to ten messages in one call. Entries are validated before anything is sent.
    pub async fn send_message_batch(
        &mut self,
        queue_name: &str,
        entries: &[BatchEntry],
    ) -> AppResult<BatchOutcome> {
        if let Err(err) = validate_batch(entries) {
            warn!(queue = queue_name, "Rejected message batch: {}", err);
            return Err(err);
        }

        let queue_url = self.queue_url(queue_name).await?;
        let sdk_entries = entries
            .iter()
            .map(BatchEntry::to_sdk)
            .collect::<AppResult<Vec<_>>>()?;

        let output = self
            .client
            .send_message_batch()
            .queue_url(&queue_url)
            .set_entries(Some(sdk_entries))
            .send()
            .await
            .map_err(map_sqs_error)?;

        let outcome = BatchOutcome {
            successful: output
                .successful()
                .iter()
                .map(|entry| entry.id().to_string())
                .collect(),
            failed: output
                .failed()
                .iter()
                .map(|entry| BatchFailure {
                    id: entry.id().to_string(),
                    code: entry.code().to_string(),
                    message: entry.message().map(str::to_string),
                    sender_fault: entry.sender_fault(),
                })
                .collect(),
        };

        info!(
            queue = queue_name,
            sent = outcome.successful.len(),
            failed = outcome.failed.len(),
            "Message batch sent"
        );
        Ok(outcome)
    }

    /// Receive up to ten messages, including all of their attributes.
    pub async fn receive_messages(&mut self, queue_name: &str) -> AppResult<Vec<ReceivedMessage>> {
        let queue_url = self.queue_url(queue_name).await?;

        let output = self
            .client
            .receive_message()
            .queue_url(&queue_url)
            .max_number_of_messages(10)
            .message_attribute_names("All")
            .send()
            .await
            .map_err(map_sqs_error)?;

        let messages: Vec<ReceivedMessage> = output
            .messages()
            .iter()
            .map(|message| ReceivedMessage {
                message_id: message.message_id().map(str::to_string),
                receipt_handle: message.receipt_handle().map(str::to_string),
                body: message.body().map(str::to_string),
                attributes: message
                    .message_attributes()
                    .map(|attrs| {
                        attrs
                            .iter()
                            .map(|(name, value)| (name.clone(), MessageAttribute::from_sdk(value)))
                            .collect()
                    })
                    .unwrap_or_default(),
            })
            .collect();

        debug!(queue = queue_name, count = messages.len(), "Messages received");
        Ok(messages)
    }

    pub async fn delete_message(&mut self, queue_name: &str, receipt_handle: &str) -> AppResult<()> {
        let queue_url = self.queue_url(queue_name).await?;

        self.client
            .delete_message()
            .queue_url(&queue_url)
            .receipt_handle(receipt_handle)
            .send()
            .await
            .map_err(map_sqs_error)?;

        debug!(queue = queue_name, "Message deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_sqs::config::retry::RetryConfig;
    use aws_sdk_sqs::config::{BehaviorVersion, Credentials, Region};
    use mockito::{Matcher, Mock, Server, ServerGuard};

    #[test]
    fn test_queue_is_fifo() {
        assert!(SqsHandler::queue_is_fifo("orders.fifo"));
        assert!(!SqsHandler::queue_is_fifo("orders"));
        assert!(!SqsHandler::queue_is_fifo("fifo"));
    }

    const QUEUE_URL: &str = "https://sqs.us-east-1.amazonaws.com/123456789012/orders";
    const JSON_1_0: &str = "application/x-amz-json-1.0";

    fn handler_for(server: &ServerGuard) -> SqsHandler {
        let config = aws_sdk_sqs::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .credentials_provider(Credentials::new("AKIDTEST", "secret", None, None, "tests"))
            .endpoint_url(server.url())
            .retry_config(RetryConfig::disabled())
            .build();
        SqsHandler::from_client(Client::from_conf(config))
    }

    async fn mock_queue_url(server: &mut ServerGuard, hits: usize) -> Mock {
        server
            .mock("POST", "/")
            .match_header("x-amz-target", "AmazonSQS.GetQueueUrl")
            .match_body(Matcher::PartialJsonString(r#"{"QueueName":"orders"}"#.into()))
            .with_status(200)
            .with_header("content-type", JSON_1_0)
            .with_body(format!(r#"{{"QueueUrl":"{}"}}"#, QUEUE_URL))
            .expect(hits)
            .create_async()
            .await
    }

    #[tokio::test]
    async fn test_queue_url_is_looked_up_once() {
        let mut server = Server::new_async().await;
        let lookup = mock_queue_url(&mut server, 1).await;
        let send = server
            .mock("POST", "/")
            .match_header("x-amz-target", "AmazonSQS.SendMessage")
            .match_body(Matcher::PartialJsonString(format!(
                r#"{{"QueueUrl":"{}","MessageBody":"order created"}}"#,
                QUEUE_URL
            )))
            .with_status(200)
            .with_header("content-type", JSON_1_0)
            .with_body(
                r#"{"MessageId":"5fea7756-0ea4-451a-a703-a558b933e274","MD5OfMessageBody":"aa1f49e2d82c7777bc7998783f9eef16"}"#,
            )
            .expect(2)
            .create_async()
            .await;

        let mut handler = handler_for(&server);
        for _ in 0..2 {
            let sent = handler
                .send_message("orders", "order created", &HashMap::new())
                .await
                .unwrap();
            assert_eq!(
                sent.message_id.as_deref(),
                Some("5fea7756-0ea4-451a-a703-a558b933e274")
            );
        }
        assert_eq!(handler.queue_url("orders").await.unwrap(), QUEUE_URL);

        lookup.assert_async().await;
        send.assert_async().await;
    }

    #[tokio::test]
    async fn test_missing_queue_is_not_found() {
        let mut server = Server::new_async().await;
        let _lookup = server
            .mock("POST", "/")
            .match_header("x-amz-target", "AmazonSQS.GetQueueUrl")
            .with_status(400)
            .with_header("content-type", JSON_1_0)
            .with_header("x-amzn-query-error", "AWS.SimpleQueueService.NonExistentQueue;Sender")
            .with_body(
                r#"{"__type":"com.amazonaws.sqs#QueueDoesNotExist","message":"The specified queue does not exist."}"#,
            )
            .create_async()
            .await;

        let mut handler = handler_for(&server);
        assert!(!handler.queue_exists("orders").await.unwrap());

        let err = handler
            .send_message("orders", "order created", &HashMap::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(ref m) if m == "The queue `orders` does not exist."));
    }

    #[tokio::test]
    async fn test_batch_outcome_mapping() {
        let mut server = Server::new_async().await;
        let _lookup = mock_queue_url(&mut server, 1).await;
        let batch = server
            .mock("POST", "/")
            .match_header("x-amz-target", "AmazonSQS.SendMessageBatch")
            .match_body(Matcher::PartialJsonString(format!(r#"{{"QueueUrl":"{}"}}"#, QUEUE_URL)))
            .with_status(200)
            .with_header("content-type", JSON_1_0)
            .with_body(
                r#"{
                    "Successful": [
                        {"Id": "1", "MessageId": "m-1", "MD5OfMessageBody": "f97c5d29941bfb1b2fdab0874906ab82"}
                    ],
                    "Failed": [
                        {"Id": "2", "SenderFault": true, "Code": "InvalidParameterValue", "Message": "Body too long"}
                    ]
                }"#,
            )
            .expect(1)
            .create_async()
            .await;

        let mut handler = handler_for(&server);
        let entries = vec![BatchEntry::new("1", "one"), BatchEntry::new("2", "two")];
        let outcome = handler.send_message_batch("orders", &entries).await.unwrap();

        batch.assert_async().await;
        assert_eq!(outcome.successful, vec!["1"]);
        assert_eq!(
            outcome.failed,
            vec![BatchFailure {
                id: "2".to_string(),
                code: "InvalidParameterValue".to_string(),
                message: Some("Body too long".to_string()),
                sender_fault: true,
            }]
        );
        assert!(!outcome.is_complete());
    }

    #[tokio::test]
    async fn test_invalid_batch_is_rejected_before_any_call() {
        let mut server = Server::new_async().await;
        let lookup = mock_queue_url(&mut server, 0).await;

        let mut handler = handler_for(&server);
        let entries = vec![BatchEntry::new("1", "a"), BatchEntry::new("1", "b")];
        let err = handler.send_message_batch("orders", &entries).await.unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
        lookup.assert_async().await;
    }

    #[tokio::test]
    async fn test_receive_then_delete() {
        let mut server = Server::new_async().await;
        let lookup = mock_queue_url(&mut server, 1).await;
        let _receive = server
            .mock("POST", "/")
            .match_header("x-amz-target", "AmazonSQS.ReceiveMessage")
            .match_body(Matcher::PartialJsonString(
                r#"{"MaxNumberOfMessages":10,"MessageAttributeNames":["All"]}"#.into(),
            ))
            .with_status(200)
            .with_header("content-type", JSON_1_0)
            .with_body(
                r#"{"Messages":[{
                    "MessageId": "m-1",
                    "ReceiptHandle": "rh-1",
                    "MD5OfBody": "f97c5d29941bfb1b2fdab0874906ab82",
                    "Body": "one",
                    "MessageAttributes": {"origin": {"DataType": "String", "StringValue": "tests"}}
                }]}"#,
            )
            .create_async()
            .await;
        let delete = server
            .mock("POST", "/")
            .match_header("x-amz-target", "AmazonSQS.DeleteMessage")
            .match_body(Matcher::PartialJsonString(r#"{"ReceiptHandle":"rh-1"}"#.into()))
            .with_status(200)
            .with_header("content-type", JSON_1_0)
            .with_body("{}")
            .expect(1)
            .create_async()
            .await;

        let mut handler = handler_for(&server);
        let messages = handler.receive_messages("orders").await.unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].body.as_deref(), Some("one"));
        assert_eq!(
            messages[0].attributes.get("origin"),
            Some(&MessageAttribute::string("tests"))
        );

        for message in messages {
            if let Some(receipt) = message.receipt_handle {
                handler.delete_message("orders", &receipt).await.unwrap();
            }
        }
        lookup.assert_async().await;
        delete.assert_async().await;
    }
}
