use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub gateway: GatewayConfig,
    pub storage: StorageConfig,
    pub auth: AuthConfig,
    pub swagger: SwaggerConfig,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
    pub max_request_body_size: usize,
}

/// Which implementation serves the table API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayBackend {
    /// Hosted Supabase project (PostgREST + Storage)
    Supabase,
    /// Process-local tables and objects, for development
    Memory,
}

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub backend: GatewayBackend,
    /// Project URL, e.g. `https://abcd.supabase.co`
    pub supabase_url: String,
    /// Service role key; row ownership is enforced by the services
    pub service_role_key: String,
}

/// Which implementation stores evidence images
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// Same backend as the table API
    Gateway,
    /// Standalone MinIO/S3-compatible store
    Minio,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Bucket receiving complaint evidence images
    pub complaint_bucket: String,
    /// Validity window of signed evidence URLs
    pub signed_url_ttl_secs: u32,
    pub minio: Option<MinIOConfig>,
}

/// MinIO/S3 storage configuration
#[derive(Debug, Clone)]
pub struct MinIOConfig {
    /// MinIO/S3 endpoint URL
    pub endpoint: String,
    /// Endpoint used when building public URLs (defaults to endpoint)
    pub public_endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    /// AWS region (for S3 compatibility)
    pub region: String,
    /// Apply an anonymous-read policy to the bucket at startup
    pub public_read: bool,
}

#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// HMAC secret the gateway's auth service signs access tokens with
    pub jwt_secret: String,
    pub audience: String,
    pub jwt_leeway: Duration,
}

#[derive(Debug, Clone)]
pub struct SwaggerConfig {
    pub username: Option<String>,
    pub password: Option<String>,
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if exists, ignore if not found (optional for production)
        if let Err(e) = dotenvy::dotenv() {
            if !e.to_string().contains("not found") {
                eprintln!("Warning: Error loading .env file: {}", e);
            }
        }

        Ok(Config {
            app: AppConfig::from_env()?,
            gateway: GatewayConfig::from_env()?,
            storage: StorageConfig::from_env()?,
            auth: AuthConfig::from_env()?,
            swagger: SwaggerConfig::from_env()?,
        })
    }
}

impl AppConfig {
    const DEFAULT_MAX_REQUEST_BODY_SIZE: usize = 10 * 1024 * 1024; // 10MB

    pub fn from_env() -> Result<Self, String> {
        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|e| format!("Invalid PORT: {}", e))?;

        let cors_allowed_origins = parse_origins(
            &env::var("CORS_ALLOWED_ORIGINS").unwrap_or_else(|_| "*".to_string()),
        );

        let max_request_body_size = env::var("MAX_REQUEST_BODY_SIZE")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_REQUEST_BODY_SIZE.to_string())
            .parse::<usize>()
            .map_err(|_| "MAX_REQUEST_BODY_SIZE must be a valid number".to_string())?;

        Ok(Self {
            host,
            port,
            cors_allowed_origins,
            max_request_body_size,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Parse a comma-separated origin list
fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

impl GatewayBackend {
    fn parse(raw: &str) -> Result<Self, String> {
        match raw.trim().to_lowercase().as_str() {
            "supabase" => Ok(Self::Supabase),
            "memory" => Ok(Self::Memory),
            other => Err(format!(
                "GATEWAY_BACKEND must be 'supabase' or 'memory', got '{}'",
                other
            )),
        }
    }
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self, String> {
        let backend =
            GatewayBackend::parse(&env::var("GATEWAY_BACKEND").unwrap_or_else(|_| "supabase".into()))?;

        let (supabase_url, service_role_key) = match backend {
            GatewayBackend::Supabase => (
                env::var("SUPABASE_URL")
                    .map_err(|_| "SUPABASE_URL environment variable is required".to_string())?,
                env::var("SUPABASE_SERVICE_ROLE_KEY").map_err(|_| {
                    "SUPABASE_SERVICE_ROLE_KEY environment variable is required".to_string()
                })?,
            ),
            GatewayBackend::Memory => (String::new(), String::new()),
        };

        Ok(Self {
            backend,
            supabase_url,
            service_role_key,
        })
    }
}

impl StorageBackend {
    fn parse(raw: &str) -> Result<Self, String> {
        match raw.trim().to_lowercase().as_str() {
            "gateway" => Ok(Self::Gateway),
            "minio" => Ok(Self::Minio),
            other => Err(format!(
                "STORAGE_BACKEND must be 'gateway' or 'minio', got '{}'",
                other
            )),
        }
    }
}

impl StorageConfig {
    const DEFAULT_COMPLAINT_BUCKET: &'static str = "complaints-evidence";
    const DEFAULT_SIGNED_URL_TTL_SECS: u32 = 3600; // 1 hour

    pub fn from_env() -> Result<Self, String> {
        let backend =
            StorageBackend::parse(&env::var("STORAGE_BACKEND").unwrap_or_else(|_| "gateway".into()))?;

        let complaint_bucket = env::var("COMPLAINT_BUCKET")
            .unwrap_or_else(|_| Self::DEFAULT_COMPLAINT_BUCKET.to_string());

        let signed_url_ttl_secs = env::var("SIGNED_URL_TTL_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_SIGNED_URL_TTL_SECS.to_string())
            .parse::<u32>()
            .map_err(|_| "SIGNED_URL_TTL_SECS must be a valid number".to_string())?;

        let minio = match backend {
            StorageBackend::Minio => Some(MinIOConfig::from_env()?),
            StorageBackend::Gateway => None,
        };

        Ok(Self {
            backend,
            complaint_bucket,
            signed_url_ttl_secs,
            minio,
        })
    }
}

impl MinIOConfig {
    pub fn from_env() -> Result<Self, String> {
        let endpoint =
            env::var("MINIO_ENDPOINT").unwrap_or_else(|_| "http://localhost:9000".to_string());

        // Public endpoint defaults to the main endpoint if not specified
        let public_endpoint =
            env::var("MINIO_PUBLIC_ENDPOINT").unwrap_or_else(|_| endpoint.clone());

        let access_key = env::var("MINIO_ACCESS_KEY").unwrap_or_else(|_| "minioadmin".to_string());
        let secret_key = env::var("MINIO_SECRET_KEY").unwrap_or_else(|_| "minioadmin".to_string());
        let region = env::var("MINIO_REGION").unwrap_or_else(|_| "us-east-1".to_string());

        let public_read = env::var("MINIO_PUBLIC_READ")
            .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Ok(Self {
            endpoint,
            public_endpoint,
            access_key,
            secret_key,
            region,
            public_read,
        })
    }
}

impl AuthConfig {
    const DEFAULT_AUDIENCE: &'static str = "authenticated";
    const DEFAULT_JWT_LEEWAY_SECS: u64 = 60; // 1 minute

    pub fn from_env() -> Result<Self, String> {
        let jwt_secret = env::var("SUPABASE_JWT_SECRET")
            .map_err(|_| "SUPABASE_JWT_SECRET environment variable is required".to_string())?;

        let audience =
            env::var("JWT_AUDIENCE").unwrap_or_else(|_| Self::DEFAULT_AUDIENCE.to_string());

        let jwt_leeway_secs = env::var("JWT_LEEWAY")
            .unwrap_or_else(|_| Self::DEFAULT_JWT_LEEWAY_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "JWT_LEEWAY must be a valid number".to_string())?;

        Ok(Self {
            jwt_secret,
            audience,
            jwt_leeway: Duration::from_secs(jwt_leeway_secs),
        })
    }
}

impl SwaggerConfig {
    pub fn from_env() -> Result<Self, String> {
        // Only use credentials if they are non-empty
        let username = env::var("SWAGGER_USERNAME").ok().filter(|s| !s.is_empty());
        let password = env::var("SWAGGER_PASSWORD").ok().filter(|s| !s.is_empty());
        let title = env::var("SWAGGER_TITLE").unwrap_or_else(|_| "Ruang Aman API".to_string());
        let version = env::var("SWAGGER_VERSION").unwrap_or_else(|_| "0.1.0".to_string());
        let description = env::var("SWAGGER_DESCRIPTION")
            .unwrap_or_else(|_| "Complaint API for the Ruang Aman student platform".to_string());

        Ok(Self {
            username,
            password,
            title,
            version,
            description,
        })
    }

    /// Returns credentials in "username:password" format if auth is enabled
    pub fn credentials(&self) -> Option<String> {
        match (&self.username, &self.password) {
            (Some(user), Some(pass)) => Some(format!("{}:{}", user, pass)),
            _ => None,
        }
    }
}
