use blob_gateway::config::{GatewayConfig, StorageConfig};
use blob_gateway::infrastructure::storage;
use blob_gateway::{AppState, create_app};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::signal;
use tokio::sync::watch;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a .env file with gateway settings
    #[arg(short, long, env = "CONFIG_PATH", default_value = ".env")]
    config: PathBuf,

    /// Port for the API server (overrides GATEWAY_PORT)
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Environment & Logging Setup
    let args = Args::parse();
    let env_loaded = dotenvy::from_path(&args.config).is_ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "blob_gateway=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("🚀 Starting Blob Gateway...");
    if env_loaded {
        info!("⚙️  Loaded settings from {}", args.config.display());
    }

    // 2. Configuration
    let mut config = GatewayConfig::from_env();
    if let Some(port) = args.port {
        config.port = port;
    }
    let storage_config = StorageConfig::from_env()?;

    info!(
        "🚦 Admission: file ops={}, list ops={}, max body={}MB",
        config.file_ops_concurrency_limit,
        config.list_ops_concurrency_limit,
        config.max_body_size / 1024 / 1024
    );

    // 3. Infrastructure
    let storage_service = storage::setup_storage(&storage_config).await?;
    let state = AppState::new(storage_service, config.clone());

    // 4. HTTP server
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &axum::http::Request<_>| {
            let request_id = request
                .headers()
                .get("x-request-id")
                .and_then(|v| v.to_str().ok())
                .unwrap_or("unknown");
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = %request_id,
            )
        })
        .on_request(|request: &axum::http::Request<_>, _span: &tracing::Span| {
            info!("📥 {} {}", request.method(), request.uri());
        })
        .on_response(
            |response: &axum::http::Response<_>,
             latency: std::time::Duration,
             _span: &tracing::Span| {
                info!(
                    "📤 Finished in {:?} with status {}",
                    latency,
                    response.status()
                );
            },
        );

    let app = create_app(state).layer(trace_layer);
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("✅ API Server listening on: http://{}", addr);
    info!("📖 Swagger UI documentation: http://localhost:{}/swagger-ui", config.port);

    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.changed().await;
            })
            .await
    });

    // 5. Wait for a shutdown signal, then give in-flight calls a grace period
    tokio::select! {
        _ = shutdown_signal() => {}
        res = &mut server => {
            match res {
                Ok(Ok(())) => info!("🛑 Server stopped."),
                Ok(Err(e)) => error!("❌ Server runtime error: {}", e),
                Err(e) => error!("❌ Server task failed: {}", e),
            }
            return Ok(());
        }
    }

    info!("🛑 Shutting down, waiting up to {:?} for in-flight calls...", config.shutdown_timeout);
    let _ = shutdown_tx.send(true);

    match tokio::time::timeout(config.shutdown_timeout, &mut server).await {
        Ok(Ok(Ok(()))) => info!("👋 Server gracefully stopped."),
        Ok(Ok(Err(e))) => error!("❌ Server runtime error during shutdown: {}", e),
        Ok(Err(e)) => error!("❌ Server task failed: {}", e),
        Err(_) => {
            warn!("⏱️  Shutdown timeout elapsed, forcing stop.");
            server.abort();
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("⌨️  Ctrl+C received, initiating graceful shutdown...");
        },
        _ = terminate => {
            info!("💤 SIGTERM received, initiating graceful shutdown...");
        },
    }
}
