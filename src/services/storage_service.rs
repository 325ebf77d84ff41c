use crate::{
    config::StorageConfig,
    error::{ApiError, Result},
};
use aws_config::Region;
use aws_credential_types::Credentials;
use aws_sdk_s3::{
    config::Builder as S3ConfigBuilder, presigning::PresigningConfig, Client as S3Client,
};
use std::time::Duration;
use tracing::{info, instrument, warn};

/// Media storage over an S3-compatible bucket. The payment core only
/// needs one narrow capability from it: resolving a stored object key
/// into a temporary signed URL once entitlement is established.
pub struct StorageService {
    client: S3Client,
    bucket_name: String,
    signed_url_expiration: Duration,
}

impl StorageService {
    pub fn new(config: &StorageConfig) -> Self {
        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None,
            None,
            "fanvault-media",
        );

        let s3_config = S3ConfigBuilder::new()
            .region(Region::new(config.region.clone()))
            .endpoint_url(&config.endpoint_url)
            .credentials_provider(credentials)
            .force_path_style(true)
            .behavior_version_latest()
            .build();

        info!("Media storage initialized with bucket {}", config.bucket_name);

        Self {
            client: S3Client::from_conf(s3_config),
            bucket_name: config.bucket_name.clone(),
            signed_url_expiration: Duration::from_secs(config.signed_url_expiration_seconds),
        }
    }

    /// Temporary signed GET URL for a stored media object.
    #[instrument(skip(self))]
    pub async fn signed_media_url(&self, key: &str) -> Result<String> {
        let presigning_config = PresigningConfig::expires_in(self.signed_url_expiration)
            .map_err(|e| {
                warn!("Failed to create presigning config: {}", e);
                ApiError::Internal(anyhow::anyhow!("Failed to configure signed URL: {}", e))
            })?;

        let presigned_request = self
            .client
            .get_object()
            .bucket(&self.bucket_name)
            .key(key)
            .presigned(presigning_config)
            .await
            .map_err(|e| {
                warn!("Failed to sign media URL for {}: {}", key, e);
                ApiError::Internal(anyhow::anyhow!("Failed to generate signed URL: {}", e))
            })?;

        Ok(presigned_request.uri().to_string())
    }
}
