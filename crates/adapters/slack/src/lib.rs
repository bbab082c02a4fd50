//! adapter-slack - Slack bot adapter
//!
//! Posts messages to channels through the Slack Web API as an application bot.

pub mod client;
pub mod error;

pub use client::{PostedMessage, SlackBotHandler, SlackCredentials};
pub use error::SlackApiError;
