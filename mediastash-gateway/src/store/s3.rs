//! S3-backed store

use super::traits::*;
use crate::config::{ConfigError, StoreConfig};
use async_trait::async_trait;
use aws_sdk_s3::config::retry::RetryConfig;
use aws_sdk_s3::config::timeout::TimeoutConfig;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use aws_smithy_http_client::tls::{self, rustls_provider::CryptoMode};
use bytes::Bytes;
use chrono::DateTime;
use std::time::Duration;
use tracing::debug;

/// Store backed by an S3-compatible endpoint
#[derive(Debug, Clone)]
pub struct S3Store {
    client: Client,
    bucket: String,
}

impl S3Store {
    /// Wrap an already-built client
    pub fn new(client: Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    /// Build a client from `config` and wrap it
    ///
    /// Credentials are static, the endpoint is explicit, and retries are
    /// disabled at the transport level: callers own their retry policy.
    /// When `config.ca_bundle` is set, the HTTPS connector trusts exactly
    /// that PEM bundle in place of the system roots; certificate
    /// verification itself is never turned off.
    pub fn connect(config: &StoreConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let credentials = Credentials::new(
            config.access_key.clone(),
            config.secret_key.clone(),
            None,
            None,
            "static",
        );
        let timeouts = TimeoutConfig::builder()
            .connect_timeout(config.connect_timeout)
            .operation_timeout(config.request_timeout)
            .build();

        let mut builder = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .endpoint_url(config.endpoint.clone())
            .credentials_provider(credentials)
            .force_path_style(config.path_style)
            .timeout_config(timeouts)
            .retry_config(RetryConfig::disabled());

        if let Some(path) = &config.ca_bundle {
            let pem = std::fs::read(path).map_err(|source| ConfigError::CaBundleRead {
                path: path.clone(),
                source,
            })?;
            let tls_context = tls::TlsContext::builder()
                .with_trust_store(tls::TrustStore::empty().with_pem_certificate(pem.as_slice()))
                .build()
                .map_err(|err| ConfigError::CaBundleInvalid {
                    path: path.clone(),
                    reason: err.to_string(),
                })?;
            builder = builder.http_client(
                aws_smithy_http_client::Builder::new()
                    .tls_provider(tls::Provider::Rustls(CryptoMode::Ring))
                    .tls_context(tls_context)
                    .build_https(),
            );
        }

        Ok(Self {
            client: Client::from_conf(builder.build()),
            bucket: config.bucket.clone(),
        })
    }

    /// Bucket this store reads and writes
    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn put_object(
        &self,
        key: &str,
        body: Bytes,
        metadata: ObjectMetadata,
    ) -> Result<(), StoreError> {
        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body));
        if let Some(content_type) = metadata.content_type {
            request = request.content_type(content_type);
        }
        if !metadata.user_metadata.is_empty() {
            request = request.set_metadata(Some(metadata.user_metadata));
        }
        request
            .send()
            .await
            .map_err(|err| StoreError::request("put_object", key, err))?;
        debug!(key = %key, "put object");
        Ok(())
    }

    async fn stat_object(&self, key: &str) -> Result<ObjectStat, StoreError> {
        // A full GET rather than HEAD: some S3-compatible stores drop
        // user metadata from HEAD responses. The body stream is never
        // read.
        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| {
                if err.as_service_error().is_some_and(|e| e.is_no_such_key()) {
                    StoreError::NoSuchKey(key.to_string())
                } else {
                    StoreError::request("get_object", key, err)
                }
            })?;

        let last_modified = response
            .last_modified()
            .and_then(|stamp| DateTime::from_timestamp(stamp.secs(), stamp.subsec_nanos()));
        Ok(ObjectStat {
            content_type: response.content_type().map(str::to_string),
            size: response.content_length().and_then(|len| u64::try_from(len).ok()),
            last_modified,
            user_metadata: response.metadata().cloned().unwrap_or_default(),
        })
    }

    async fn delete_object(&self, key: &str) -> Result<(), StoreError> {
        // S3 DeleteObject succeeds for absent keys, which is the
        // idempotency the gateway relies on.
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| StoreError::request("delete_object", key, err))?;
        debug!(key = %key, "deleted object");
        Ok(())
    }

    async fn presign_get(&self, key: &str, expires_in: Duration) -> Result<String, StoreError> {
        let presigning = PresigningConfig::expires_in(expires_in)
            .map_err(|err| StoreError::request("presign_get", key, err))?;
        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presigning)
            .await
            .map_err(|err| StoreError::request("presign_get", key, err))?;
        Ok(request.uri().to_string())
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let mut keys = Vec::new();
        let mut continuation: Option<String> = None;
        loop {
            let mut request = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(prefix);
            if let Some(token) = &continuation {
                request = request.continuation_token(token);
            }
            let response = request
                .send()
                .await
                .map_err(|err| StoreError::request("list_objects_v2", prefix, err))?;
            keys.extend(
                response
                    .contents()
                    .iter()
                    .filter_map(|object| object.key().map(str::to_string)),
            );
            match response.next_continuation_token() {
                Some(token) => continuation = Some(token.to_string()),
                None => break,
            }
        }
        Ok(keys)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        self.client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .map_err(|err| StoreError::request("head_bucket", self.bucket.clone(), err))?;
        Ok(())
    }
}
