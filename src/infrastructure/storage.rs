use crate::config::StorageConfig;
use crate::services::storage::S3BlobStore;
use anyhow::Result;
use aws_sdk_s3::config::{Credentials, Region};
use std::sync::Arc;
use tracing::info;

pub async fn setup_storage(config: &StorageConfig) -> Result<Arc<S3BlobStore>> {
    let endpoint_url = config.endpoint_url();
    info!("☁️  S3 Storage: {} (Bucket: {})", endpoint_url, config.bucket);

    let aws_config = aws_config::from_env()
        .endpoint_url(&endpoint_url)
        .region(Region::new(config.region.clone()))
        .credentials_provider(Credentials::new(
            config.access_key.clone(),
            config.secret_key.clone(),
            None,
            None,
            "static",
        ))
        .load()
        .await;

    let s3_config = aws_sdk_s3::config::Builder::from(&aws_config)
        .force_path_style(true)
        .build();

    let s3_client = aws_sdk_s3::Client::from_conf(s3_config);

    // Ensure bucket exists
    match s3_client.head_bucket().bucket(&config.bucket).send().await {
        Ok(_) => info!("✅ Bucket '{}' is ready", config.bucket),
        Err(_) => {
            info!("🪣 Bucket '{}' not found, creating...", config.bucket);
            s3_client
                .create_bucket()
                .bucket(&config.bucket)
                .send()
                .await
                .map_err(|e| {
                    tracing::error!("❌ Failed to create bucket '{}': {}", config.bucket, e);
                    anyhow::anyhow!("failed to create bucket '{}': {}", config.bucket, e)
                })?;
            info!("✅ Bucket '{}' created successfully", config.bucket);
        }
    }

    Ok(Arc::new(S3BlobStore::new(s3_client, config.bucket.clone())))
}
