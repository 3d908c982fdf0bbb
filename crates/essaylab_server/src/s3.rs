//! S3-compatible object store for essay backups (feature `s3`).

use crate::backup::ObjectStore;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::ServerSideEncryption as SdkEncryption;
use aws_sdk_s3::Client;
use essaylab_core::backup::BackupResult;
use essaylab_core::{BackupError, ObjectStoreConfig, ServerSideEncryption};
use log::info;

/// Writes essay copies with `PutObject`, always server-side encrypted.
#[derive(Debug, Clone)]
pub struct S3ObjectStore {
    client: Client,
    config: ObjectStoreConfig,
}

impl S3ObjectStore {
    /// Resolves credentials from the default chain, or from the configured
    /// named profile.
    pub async fn connect(config: ObjectStoreConfig) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(config.region.clone()));
        if let Some(profile) = config.profile.as_deref() {
            loader = loader.profile_name(profile);
        }
        let shared = loader.load().await;

        info!(
            "event=object_store_connect module=s3 status=ok bucket={} region={} prefix={}",
            config.bucket, config.region, config.prefix
        );
        Self {
            client: Client::new(&shared),
            config,
        }
    }

    /// Virtual-hosted URL of a stored essay (unprefixed `key`).
    pub fn public_url(&self, key: &str) -> String {
        self.config.public_url(key)
    }
}

impl ObjectStore for S3ObjectStore {
    async fn put_object(&self, key: &str, body: String) -> BackupResult<String> {
        let full_key = self.config.full_key(key);
        let request = self
            .client
            .put_object()
            .bucket(&self.config.bucket)
            .key(&full_key)
            .content_type("text/plain; charset=utf-8")
            .body(ByteStream::from(body.into_bytes()));
        let request = match &self.config.encryption {
            ServerSideEncryption::Aes256 => request.server_side_encryption(SdkEncryption::Aes256),
            ServerSideEncryption::Kms { key_id } => request
                .server_side_encryption(SdkEncryption::AwsKms)
                .ssekms_key_id(key_id),
        };

        request
            .send()
            .await
            .map_err(|err| BackupError::Remote(DisplayErrorContext(&err).to_string()))?;
        Ok(full_key)
    }
}
