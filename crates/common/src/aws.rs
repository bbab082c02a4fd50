//! AWS SDK 配置加载

use aws_config::{BehaviorVersion, Region, SdkConfig};
use santoku_config::AwsConfig;
use tracing::debug;

/// Build the shared SDK config every AWS handler is created from.
///
/// Unset fields fall back to the SDK's default provider chain (environment, profile, IMDS).
pub async fn load_sdk_config(config: &AwsConfig) -> SdkConfig {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());

    if let Some(region) = &config.region {
        loader = loader.region(Region::new(region.clone()));
    }
    if let Some(endpoint_url) = &config.endpoint_url {
        loader = loader.endpoint_url(endpoint_url);
    }
    if let Some(profile) = &config.profile {
        loader = loader.profile_name(profile);
    }

    let sdk_config = loader.load().await;
    debug!(
        region = ?sdk_config.region(),
        endpoint_url = ?sdk_config.endpoint_url(),
        "AWS SDK config loaded"
    );
    sdk_config
}
