//! S3 object store implementation
//!
//! Wraps aws-sdk-s3 and implements the ObjectStore trait from shelf-core.
//! One store is bound to the single bucket named by its profile.

use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::error::{DisplayErrorContext, SdkError};
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{Delete, ObjectIdentifier};
use aws_smithy_types::DateTime;

use shelf_core::traits::SortBy;
use shelf_core::{
    Error, FolderPath, ListOptions, ObjectStore, Profile, Result, StoreObject, UploadOptions,
};

/// Longest expiry SigV4 presigned URLs accept
pub const MAX_PRESIGN_SECONDS: u64 = 7 * 24 * 60 * 60;

/// Keys per DeleteObjects request
const DELETE_BATCH: usize = 1000;

/// Keys per ListObjectsV2 page
const LIST_PAGE: usize = 1000;

/// S3 bucket exposed as an [`ObjectStore`]
pub struct S3Store {
    inner: aws_sdk_s3::Client,
    bucket: String,
}

impl S3Store {
    /// Create a new store from a profile
    ///
    /// The SDK's retry layer is disabled; a failed request is reported once.
    pub async fn new(profile: &Profile) -> Result<Self> {
        let credentials = aws_credential_types::Credentials::new(
            profile.access_key.clone(),
            profile.secret_key.clone(),
            None, // session token
            None, // expiry
            "shelf-static-credentials",
        );

        let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .credentials_provider(credentials)
            .region(aws_config::Region::new(profile.region.clone()))
            .endpoint_url(&profile.endpoint)
            .retry_config(aws_config::retry::RetryConfig::disabled())
            .load()
            .await;

        let s3_config = aws_sdk_s3::config::Builder::from(&config)
            .force_path_style(profile.force_path_style())
            .build();

        tracing::debug!(
            profile = %profile.name,
            endpoint = %profile.endpoint,
            bucket = %profile.bucket,
            "created s3 store"
        );

        Ok(Self {
            inner: aws_sdk_s3::Client::from_conf(s3_config),
            bucket: profile.bucket.clone(),
        })
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn delete_batch(&self, keys: &[String]) -> Result<()> {
        let objects = keys
            .iter()
            .map(|k| {
                ObjectIdentifier::builder()
                    .key(k)
                    .build()
                    .map_err(|e| Error::General(e.to_string()))
            })
            .collect::<Result<Vec<_>>>()?;

        let delete = Delete::builder()
            .set_objects(Some(objects))
            .quiet(true)
            .build()
            .map_err(|e| Error::General(e.to_string()))?;

        let response = self
            .inner
            .delete_objects()
            .bucket(&self.bucket)
            .delete(delete)
            .send()
            .await
            .map_err(|e| map_sdk_error(e, &self.bucket))?;

        let failed: Vec<&str> = response.errors().iter().filter_map(|e| e.key()).collect();
        if !failed.is_empty() {
            tracing::warn!(?failed, "some objects were not removed");
            return Err(Error::Network(format!(
                "Failed to remove {} object(s): {}",
                failed.len(),
                failed.join(", ")
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn list(&self, folder: &FolderPath, options: ListOptions) -> Result<Vec<StoreObject>> {
        let prefix = folder.as_prefix();
        let wanted = options.offset.saturating_add(options.limit);
        let mut items = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let mut request = self
                .inner
                .list_objects_v2()
                .bucket(&self.bucket)
                .delimiter("/")
                .max_keys(wanted.clamp(1, LIST_PAGE) as i32);
            if !prefix.is_empty() {
                request = request.prefix(&prefix);
            }
            if let Some(token) = &continuation_token {
                request = request.continuation_token(token);
            }

            let response = request
                .send()
                .await
                .map_err(|e| map_sdk_error(e, folder.as_str()))?;

            for common in response.common_prefixes() {
                if let Some(name) = common.prefix().and_then(|p| relative_name(&prefix, p)) {
                    items.push(StoreObject::folder(name));
                }
            }

            for object in response.contents() {
                let Some(key) = object.key() else {
                    continue;
                };
                let Some(name) = relative_name(&prefix, key) else {
                    continue;
                };
                let id = object
                    .e_tag()
                    .map(|etag| etag.trim_matches('"').to_string())
                    .unwrap_or_else(|| key.to_string());
                let mut item = StoreObject::file(name, id, object.size().unwrap_or(0).max(0) as u64);
                item.last_modified = object.last_modified().and_then(to_timestamp);
                items.push(item);
            }

            continuation_token = response.next_continuation_token().map(str::to_string);
            if continuation_token.is_none() || items.len() >= wanted {
                break;
            }
        }

        match options.sort_by {
            SortBy::Name => items.sort_by(|a, b| a.name.cmp(&b.name)),
            SortBy::LastModified => items.sort_by(|a, b| b.last_modified.cmp(&a.last_modified)),
        }

        tracing::debug!(folder = %folder, count = items.len(), "listed s3 prefix");
        Ok(items
            .into_iter()
            .skip(options.offset)
            .take(options.limit)
            .collect())
    }

    async fn upload(&self, key: &str, data: Vec<u8>, options: UploadOptions) -> Result<()> {
        let mut request = self
            .inner
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(data));

        if let Some(ct) = &options.content_type {
            request = request.content_type(ct);
        }
        if !options.upsert {
            request = request.if_none_match("*");
        }

        request.send().await.map_err(|e| map_sdk_error(e, key))?;
        Ok(())
    }

    async fn download(&self, key: &str) -> Result<Vec<u8>> {
        let response = self
            .inner
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| map_sdk_error(e, key))?;

        let data = response
            .body
            .collect()
            .await
            .map_err(|e| Error::Network(e.to_string()))?
            .into_bytes()
            .to_vec();

        Ok(data)
    }

    async fn remove(&self, keys: &[String]) -> Result<()> {
        for batch in keys.chunks(DELETE_BATCH) {
            self.delete_batch(batch).await?;
        }
        Ok(())
    }

    async fn create_signed_url(&self, key: &str, ttl_seconds: u64) -> Result<String> {
        let expires_in = clamp_ttl(ttl_seconds);
        let config = PresigningConfig::expires_in(Duration::from_secs(expires_in))
            .map_err(|e| Error::General(e.to_string()))?;

        let request = self
            .inner
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(config)
            .await
            .map_err(|e| map_sdk_error(e, key))?;

        Ok(request.uri().to_string())
    }

    fn max_signed_url_ttl(&self) -> Option<u64> {
        Some(MAX_PRESIGN_SECONDS)
    }
}

/// Clamp a requested expiry to what presigned URLs support
fn clamp_ttl(ttl_seconds: u64) -> u64 {
    if ttl_seconds > MAX_PRESIGN_SECONDS {
        tracing::warn!(
            requested = ttl_seconds,
            max = MAX_PRESIGN_SECONDS,
            "signed url expiry shortened to the s3 maximum"
        );
        MAX_PRESIGN_SECONDS
    } else {
        ttl_seconds.max(1)
    }
}

/// Name of `full` relative to `prefix`, without a trailing slash
///
/// Returns `None` for the prefix itself, which some tools store as an
/// empty "directory" object.
fn relative_name(prefix: &str, full: &str) -> Option<String> {
    let name = full.strip_prefix(prefix)?.trim_end_matches('/');
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

fn to_timestamp(time: &DateTime) -> Option<jiff::Timestamp> {
    jiff::Timestamp::new(time.secs(), time.subsec_nanos() as i32).ok()
}

fn map_sdk_error<E>(err: SdkError<E, HttpResponse>, key: &str) -> Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    let status = err.raw_response().map(|r| r.status().as_u16());
    classify(status, key, DisplayErrorContext(&err).to_string())
}

fn classify(status: Option<u16>, key: &str, message: String) -> Error {
    match status {
        Some(409 | 412) => Error::Conflict(format!("'{key}' already exists")),
        Some(404) => Error::NotFound(key.to_string()),
        Some(401 | 403) => Error::Auth(message),
        _ => Error::Network(message),
    }
}
