use std::sync::Arc;

use axum::{extract::DefaultBodyLimit, middleware::from_fn, Router};
use ruangaman_core::core::config::{Config, GatewayBackend, StorageBackend};
use ruangaman_core::core::middleware;
use ruangaman_core::core::openapi::{ApiDoc, SwaggerInfoModifier};
use ruangaman_core::features::auth::JwtValidator;
use ruangaman_core::features::complaints::routes as complaints_routes;
use ruangaman_core::features::complaints::{
    AdminComplaintService, ComplaintService, ImageUploadService,
};
use ruangaman_core::features::profiles::ProfileService;
use ruangaman_core::modules::gateway::{InMemoryGateway, ObjectStore, SupabaseClient, TableGateway};
use ruangaman_core::modules::storage::MinIOClient;
use ruangaman_core::shared::constants::COMPLAINTS_TABLE;
use serde_json::json;
use tower::ServiceBuilder;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::Modify;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

fn main() -> anyhow::Result<()> {
    // Build Tokio runtime with configurable worker threads
    let worker_threads = std::env::var("TOKIO_WORKER_THREADS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|p| p.get())
                .unwrap_or(4)
        });

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(worker_threads)
        .enable_all()
        .build()?;

    runtime.block_on(async_main(worker_threads))
}

async fn async_main(worker_threads: usize) -> anyhow::Result<()> {
    // Load .env file BEFORE initializing logger so RUST_LOG is available
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;
    tracing::info!(
        "Configuration loaded (tokio_worker_threads={}, pid={})",
        worker_threads,
        std::process::id()
    );

    // Table API and its object store
    let (tables, gateway_objects): (Arc<dyn TableGateway>, Arc<dyn ObjectStore>) =
        match config.gateway.backend {
            GatewayBackend::Supabase => {
                let client = Arc::new(SupabaseClient::new(
                    &config.gateway.supabase_url,
                    &config.gateway.service_role_key,
                ));
                tracing::info!("Using Supabase gateway at {}", config.gateway.supabase_url);
                let tables: Arc<dyn TableGateway> = client.clone();
                (tables, client)
            }
            GatewayBackend::Memory => {
                let gateway = Arc::new(
                    InMemoryGateway::new()
                        .with_column_default(COMPLAINTS_TABLE, "status", json!("pending"))
                        .with_column_default(COMPLAINTS_TABLE, "priority", json!("medium"))
                        .with_column_default(COMPLAINTS_TABLE, "category", json!("general")),
                );
                tracing::warn!("Using in-memory gateway; data is lost on restart");
                let tables: Arc<dyn TableGateway> = gateway.clone();
                (tables, gateway)
            }
        };

    let objects: Arc<dyn ObjectStore> = match config.storage.backend {
        StorageBackend::Gateway => gateway_objects,
        StorageBackend::Minio => {
            let minio_config = config
                .storage
                .minio
                .clone()
                .ok_or_else(|| anyhow::anyhow!("MinIO storage selected without MinIO config"))?;
            let public_read = minio_config.public_read;
            let client = MinIOClient::new(minio_config)?;
            client
                .prepare_bucket(&config.storage.complaint_bucket, public_read)
                .await?;
            Arc::new(client)
        }
    };

    let jwt_validator = Arc::new(JwtValidator::new(
        &config.auth.jwt_secret,
        config.auth.audience.clone(),
        config.auth.jwt_leeway,
    ));
    tracing::info!("Auth configuration initialized");

    let image_service = Arc::new(ImageUploadService::new(
        objects,
        config.storage.complaint_bucket.clone(),
        config.storage.signed_url_ttl_secs,
    ));
    let complaint_service = Arc::new(ComplaintService::new(
        Arc::clone(&tables),
        Arc::clone(&image_service),
    ));
    let profile_service = Arc::new(ProfileService::new(Arc::clone(&tables)));
    let admin_complaint_service = Arc::new(AdminComplaintService::new(
        Arc::clone(&complaint_service),
        profile_service,
    ));
    tracing::info!(
        "Complaint services initialized (bucket: {})",
        config.storage.complaint_bucket
    );

    let swagger_modifier = SwaggerInfoModifier {
        title: config.swagger.title.clone(),
        version: config.swagger.version.clone(),
        description: config.swagger.description.clone(),
    };

    let mut openapi = ApiDoc::openapi();
    swagger_modifier.modify(&mut openapi);

    let swagger = if let Some(credentials) = config.swagger.credentials() {
        tracing::info!("Swagger UI basic auth enabled");
        Router::new()
            .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
            .layer(from_fn(middleware::basic_auth_middleware(Arc::new(
                credentials,
            ))))
    } else {
        tracing::info!("Swagger UI basic auth disabled (no credentials configured)");
        Router::new().merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
    };

    let protected_routes = Router::new()
        .merge(complaints_routes::routes(
            complaint_service,
            admin_complaint_service,
        ))
        .route_layer(axum::middleware::from_fn_with_state(
            jwt_validator,
            middleware::auth_middleware,
        ));

    async fn health_check() -> axum::http::StatusCode {
        axum::http::StatusCode::OK
    }
    let health_route = Router::new().route("/health", axum::routing::get(health_check));

    let app = Router::new()
        .merge(swagger)
        .merge(protected_routes)
        .merge(health_route)
        .layer(DefaultBodyLimit::max(config.app.max_request_body_size))
        .layer(middleware::cors_layer(
            config.app.cors_allowed_origins.clone(),
        ))
        .layer(
            // Outermost first: the id is set before the trace span reads it
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(middleware::MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(middleware::MakeSpanWithRequestId)
                        .on_request(DefaultOnRequest::new().level(Level::INFO))
                        .on_response(DefaultOnResponse::new().level(Level::INFO)),
                )
                .layer(PropagateRequestIdLayer::x_request_id()),
        );

    let addr = config.app.server_address();
    let socket_addr: std::net::SocketAddr = addr
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid address: {}", e))?;

    let socket = socket2::Socket::new(
        socket2::Domain::for_address(socket_addr),
        socket2::Type::STREAM,
        Some(socket2::Protocol::TCP),
    )?;

    socket.set_reuse_address(true)?;
    #[cfg(unix)]
    socket.set_reuse_port(true)?;
    socket.set_nodelay(true)?;

    #[cfg(target_os = "linux")]
    {
        let keepalive = socket2::TcpKeepalive::new()
            .with_time(std::time::Duration::from_secs(60))
            .with_interval(std::time::Duration::from_secs(10))
            .with_retries(3);
        socket.set_tcp_keepalive(&keepalive)?;
    }
    #[cfg(not(target_os = "linux"))]
    {
        let keepalive = socket2::TcpKeepalive::new().with_time(std::time::Duration::from_secs(60));
        socket.set_tcp_keepalive(&keepalive)?;
    }

    socket.set_nonblocking(true)?;
    socket.bind(&socket_addr.into())?;
    socket.listen(1024)?;

    let listener = tokio::net::TcpListener::from_std(socket.into())?;
    tracing::info!("Server listening on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
