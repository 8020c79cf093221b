//! MinIO/S3-compatible object store
//!
//! Alternative [`ObjectStore`] for deployments that keep evidence images outside
//! the hosted backend. Buckets are addressed per call, path-style.
//!
//! Uses rust-s3 crate for lightweight S3 operations.

use async_trait::async_trait;
use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::{Client, Url};
use s3::creds::Credentials;
use s3::{Bucket, BucketConfiguration, Region};
use serde_json::json;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::core::config::MinIOConfig;
use crate::modules::gateway::{GatewayError, ObjectStore};

type HmacSha256 = Hmac<Sha256>;

pub struct MinIOClient {
    region: Region,
    credentials: Credentials,
    endpoint: String,
    public_endpoint: String,
    /// Access key for AWS Signature v4 signing
    access_key: String,
    /// Secret key for AWS Signature v4 signing
    secret_key: String,
    /// Region name for AWS Signature v4 signing
    region_name: String,
    /// HTTP client for bucket policy operations
    http_client: Client,
}

impl MinIOClient {
    /// Build a client without touching the network; see [`MinIOClient::prepare_bucket`]
    pub fn new(config: MinIOConfig) -> Result<Self, GatewayError> {
        let credentials = Credentials::new(
            Some(&config.access_key),
            Some(&config.secret_key),
            None,
            None,
            None,
        )
        .map_err(|e| GatewayError::Storage(format!("Failed to create MinIO credentials: {}", e)))?;

        let region = Region::Custom {
            region: config.region.clone(),
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
        };

        let http_client = Client::builder()
            .build()
            .map_err(|e| GatewayError::Storage(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            region,
            credentials,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            public_endpoint: config.public_endpoint.trim_end_matches('/').to_string(),
            access_key: config.access_key,
            secret_key: config.secret_key,
            region_name: config.region,
            http_client,
        })
    }

    /// Create `bucket` when missing and, if asked, open it for anonymous reads
    pub async fn prepare_bucket(&self, bucket: &str, public_read: bool) -> Result<(), GatewayError> {
        self.ensure_bucket_exists(bucket).await;
        if public_read {
            self.set_public_read_policy(bucket).await;
        }

        info!(
            "MinIO store ready at {} (bucket: {}, public read: {})",
            self.endpoint, bucket, public_read
        );
        Ok(())
    }

    fn bucket(&self, name: &str) -> Result<Box<Bucket>, GatewayError> {
        let mut bucket = Bucket::new(name, self.region.clone(), self.credentials.clone())
            .map_err(|e| GatewayError::Storage(format!("Invalid bucket '{}': {}", name, e)))?;

        // Use path-style URLs for MinIO (http://endpoint/bucket instead of http://bucket.endpoint)
        bucket.set_path_style();
        Ok(bucket)
    }

    /// Ensure the bucket exists; creation failures are logged, not fatal
    async fn ensure_bucket_exists(&self, name: &str) {
        let created = Bucket::create_with_path_style(
            name,
            self.region.clone(),
            self.credentials.clone(),
            BucketConfiguration::default(),
        )
        .await;

        match created {
            Ok(_) => info!("Bucket '{}' created successfully", name),
            Err(e) => {
                let error_str = e.to_string();
                if error_str.contains("BucketAlreadyOwnedByYou")
                    || error_str.contains("BucketAlreadyExists")
                    || error_str.contains("already own it")
                {
                    debug!("Bucket '{}' already exists", name);
                } else {
                    warn!("Could not create bucket '{}': {}. Assuming it exists.", name, e);
                }
            }
        }
    }

    /// Allow anonymous `GetObject` on the whole bucket
    async fn set_public_read_policy(&self, name: &str) {
        let policy = json!({
            "Version": "2012-10-17",
            "Statement": [
                {
                    "Effect": "Allow",
                    "Principal": {"AWS": "*"},
                    "Action": ["s3:GetObject"],
                    "Resource": [format!("arn:aws:s3:::{name}/*")]
                }
            ]
        });

        match self
            .put_bucket_policy_with_sigv4(name, &policy.to_string())
            .await
        {
            Ok(_) => info!("Set public read policy for {}/*", name),
            Err(e) => warn!(
                "Failed to set bucket policy for '{}': {}. \
                Public URLs will not resolve until it is set (mc anonymous set download minio/{})",
                name, e, name
            ),
        }
    }

    /// Put bucket policy using AWS Signature v4
    async fn put_bucket_policy_with_sigv4(
        &self,
        bucket_name: &str,
        policy: &str,
    ) -> Result<(), GatewayError> {
        let now = Utc::now();
        let date_stamp = now.format("%Y%m%d").to_string();
        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();

        let host_header = self.host_header()?;
        let url = format!("{}/{}?policy", self.endpoint, bucket_name);
        let payload_hash = hex::encode(Sha256::digest(policy.as_bytes()));

        let canonical_headers = format!(
            "host:{}\nx-amz-content-sha256:{}\nx-amz-date:{}\n",
            host_header, payload_hash, amz_date
        );
        let signed_headers = "host;x-amz-content-sha256;x-amz-date";

        let canonical_request = format!(
            "PUT\n/{}\npolicy=\n{}\n{}\n{}",
            bucket_name, canonical_headers, signed_headers, payload_hash
        );

        let algorithm = "AWS4-HMAC-SHA256";
        let credential_scope = format!("{}/{}/s3/aws4_request", date_stamp, self.region_name);
        let string_to_sign = format!(
            "{}\n{}\n{}\n{}",
            algorithm,
            amz_date,
            credential_scope,
            hex::encode(Sha256::digest(canonical_request.as_bytes()))
        );

        let signature = self.calculate_signature(&date_stamp, &string_to_sign)?;
        let authorization_header = format!(
            "{} Credential={}/{}, SignedHeaders={}, Signature={}",
            algorithm, self.access_key, credential_scope, signed_headers, signature
        );

        let response = self
            .http_client
            .put(&url)
            .header("Host", &host_header)
            .header("x-amz-date", &amz_date)
            .header("x-amz-content-sha256", &payload_hash)
            .header("Authorization", &authorization_header)
            .header("Content-Type", "application/json")
            .body(policy.to_string())
            .send()
            .await
            .map_err(|e| GatewayError::Storage(format!("Failed to send policy request: {}", e)))?;

        if response.status().is_success() {
            return Ok(());
        }

        let status = response.status().as_u16();
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        Err(GatewayError::Rejected { status, message })
    }

    /// `host[:port]` of the endpoint, as signed in the canonical headers
    fn host_header(&self) -> Result<String, GatewayError> {
        let endpoint_url = Url::parse(&self.endpoint)
            .map_err(|e| GatewayError::Storage(format!("Invalid endpoint URL: {}", e)))?;
        let host = endpoint_url
            .host_str()
            .ok_or_else(|| GatewayError::Storage("Endpoint URL has no host".to_string()))?;

        Ok(match endpoint_url.port() {
            Some(p) => format!("{}:{}", host, p),
            None => host.to_string(),
        })
    }

    /// Calculate AWS Signature v4 signature
    fn calculate_signature(
        &self,
        date_stamp: &str,
        string_to_sign: &str,
    ) -> Result<String, GatewayError> {
        let k_date = Self::hmac_sha256(
            format!("AWS4{}", self.secret_key).as_bytes(),
            date_stamp.as_bytes(),
        )?;
        let k_region = Self::hmac_sha256(&k_date, self.region_name.as_bytes())?;
        let k_service = Self::hmac_sha256(&k_region, b"s3")?;
        let k_signing = Self::hmac_sha256(&k_service, b"aws4_request")?;

        let signature = Self::hmac_sha256(&k_signing, string_to_sign.as_bytes())?;
        Ok(hex::encode(signature))
    }

    fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<Vec<u8>, GatewayError> {
        let mut mac = HmacSha256::new_from_slice(key)
            .map_err(|e| GatewayError::Storage(format!("HMAC key error: {}", e)))?;
        mac.update(data);
        Ok(mac.finalize().into_bytes().to_vec())
    }

    /// Check if an object exists
    async fn exists(&self, bucket: &Bucket, path: &str) -> Result<bool, GatewayError> {
        match bucket.head_object(path).await {
            Ok((_, 404)) => Ok(false),
            Ok((_, code)) if code < 300 => Ok(true),
            Ok((_, code)) => Err(GatewayError::Rejected {
                status: code,
                message: format!("Failed to check if object '{}' exists", path),
            }),
            Err(e) => {
                let error_str = e.to_string();
                if error_str.contains("404") || error_str.contains("NoSuchKey") {
                    Ok(false)
                } else {
                    Err(GatewayError::Storage(format!(
                        "Failed to check if object '{}' exists: {}",
                        path, e
                    )))
                }
            }
        }
    }
}

#[async_trait]
impl ObjectStore for MinIOClient {
    async fn upload_object(
        &self,
        bucket: &str,
        path: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<String, GatewayError> {
        let target = self.bucket(bucket)?;

        // S3 PUT overwrites silently
        if self.exists(&target, path).await? {
            return Err(GatewayError::Storage(format!(
                "Object '{}' already exists in '{}'",
                path, bucket
            )));
        }

        let response = target
            .put_object_with_content_type(path, &data, content_type)
            .await
            .map_err(|e| GatewayError::Storage(format!("Failed to upload '{}': {}", path, e)))?;

        if response.status_code() >= 300 {
            return Err(GatewayError::Rejected {
                status: response.status_code(),
                message: format!("Failed to upload '{}'", path),
            });
        }

        debug!("Uploaded object '{}' to bucket '{}'", path, bucket);
        Ok(path.to_string())
    }

    async fn create_signed_url(
        &self,
        bucket: &str,
        path: &str,
        ttl_secs: u32,
    ) -> Result<String, GatewayError> {
        self.bucket(bucket)?
            .presign_get(path, ttl_secs, None)
            .await
            .map_err(|e| {
                GatewayError::Storage(format!("Failed to presign URL for '{}': {}", path, e))
            })
    }

    fn get_public_url(&self, bucket: &str, path: &str) -> Result<String, GatewayError> {
        Ok(format!("{}/{}/{}", self.public_endpoint, bucket, path))
    }
}
