use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use helpdesk_core::{
    config::config_path_from_env, create_audit_system, create_authenticator, load_config,
    validate_config, AttachmentLimits, AuditEvent, AuditStore, Authenticator, BlobStore,
    CacheBackend, Config, FsBlobStore, InMemoryPriorityCache, MemoryMessageQueue, MessageQueue,
    PriorityCache, QueueBackend, RecordStore, RedisPriorityCache, SqliteAuditStore,
    SqliteMessageQueue, SqliteRecordStore, TicketArchive, TicketIntake, TicketLifecycle,
    TicketProcessor, UserDirectory,
};
use helpdesk_server::{api::create_router, state::AppState};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Buffer size for audit event channel
const AUDIT_BUFFER_SIZE: usize = 1000;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path = config_path_from_env();

    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Auth method: {:?}", config.auth.method);
    info!("Database path: {:?}", config.database.path);

    // Compute config hash for audit
    let config_json = serde_json::to_string(&config).unwrap_or_default();
    let config_hash = format!("{:x}", Sha256::digest(config_json.as_bytes()));
    let config_hash_short = &config_hash[..16];

    let authenticator: Arc<dyn Authenticator> = Arc::from(
        create_authenticator(&config.auth).context("Failed to create authenticator")?,
    );
    info!("Using authenticator: {}", authenticator.method_name());

    let audit_store: Arc<dyn AuditStore> = Arc::new(
        SqliteAuditStore::new(&config.database.path).context("Failed to create audit store")?,
    );
    info!("Audit store initialized");

    let (audit_handle, audit_writer) =
        create_audit_system(Arc::clone(&audit_store), AUDIT_BUFFER_SIZE);
    let writer_handle = tokio::spawn(audit_writer.run());

    audit_handle
        .emit(AuditEvent::ServiceStarted {
            version: VERSION.to_string(),
            config_hash: config_hash_short.to_string(),
        })
        .await;
    info!("Emitted ServiceStarted audit event");

    let records: Arc<dyn RecordStore> = Arc::new(
        SqliteRecordStore::new(&config.database.path).context("Failed to create record store")?,
    );
    info!("Record store initialized");

    let queue = create_queue(&config)?;
    info!("Message queue initialized ({})", queue.name());

    let cache = create_cache(&config).await?;
    info!("Priority cache initialized ({})", cache.name());

    let blobs: Arc<dyn BlobStore> = Arc::new(FsBlobStore::new(
        &config.blob.root,
        &config.blob.public_base_url,
    ));
    info!("Attachments stored under {:?}", config.blob.root);

    let users = Arc::new(UserDirectory::new(Arc::clone(&records)).with_audit(audit_handle.clone()));
    let lifecycle = Arc::new(
        TicketLifecycle::new(
            queue,
            cache,
            TicketArchive::new(records),
            config.lifecycle.retention_days,
        )
        .with_audit(audit_handle.clone()),
    );
    let intake = Arc::new(TicketIntake::new(
        Arc::clone(&users),
        blobs,
        Arc::clone(&lifecycle),
        AttachmentLimits {
            max_count: config.blob.max_attachments,
            max_bytes: config.blob.max_attachment_bytes,
        },
    ));

    let processor = if config.processor.enabled {
        let processor = Arc::new(TicketProcessor::new(
            Arc::clone(&lifecycle),
            Duration::from_millis(config.processor.poll_interval_ms),
        ));
        processor.start();
        Some(processor)
    } else {
        info!("Ticket processor disabled in config");
        None
    };

    let state = Arc::new(AppState::new(
        config.clone(),
        authenticator,
        audit_store,
        users,
        lifecycle,
        intake,
        processor.clone(),
    ));

    let app = create_router(state);

    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error")?;

    if let Some(ref processor) = processor {
        processor.stop();
    }

    info!("Server shutting down...");
    audit_handle
        .emit(AuditEvent::ServiceStopped {
            reason: "graceful_shutdown".to_string(),
        })
        .await;

    // The writer exits once every AuditHandle clone is gone. The processor
    // task holds the lifecycle (and its handle) until it observes the stop.
    drop(processor);
    drop(audit_handle);

    let _ = writer_handle.await;
    info!("Audit writer stopped");

    Ok(())
}

fn create_queue(config: &Config) -> Result<Arc<dyn MessageQueue>> {
    let visibility = Duration::from_secs(config.queue.visibility_timeout_secs);
    Ok(match config.queue.backend {
        QueueBackend::Memory => Arc::new(MemoryMessageQueue::new(visibility)),
        QueueBackend::Sqlite => Arc::new(
            SqliteMessageQueue::new(&config.database.path, visibility)
                .context("Failed to create message queue")?,
        ),
    })
}

async fn create_cache(config: &Config) -> Result<Arc<dyn PriorityCache>> {
    Ok(match config.cache.backend {
        CacheBackend::Memory => Arc::new(InMemoryPriorityCache::new()),
        CacheBackend::Redis => {
            let url = config
                .cache
                .redis_url
                .as_deref()
                .context("cache.redis_url is required for the redis backend")?;
            let cache = RedisPriorityCache::connect(
                url,
                Duration::from_millis(config.cache.op_timeout_ms),
            )
            .await
            .context("Failed to connect to redis")?;
            Arc::new(cache)
        }
    })
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
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
            Ok(mut sigterm) => {
                sigterm.recv().await;
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
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
