use clap::Parser;
use recipebook::{
    api::{handlers::AppState, routes},
    cli::{Cli, Commands},
    config::Settings,
    db,
    resolver::{generator, LogEmbeddingUpdater},
    store::SqliteRecipeStore,
    Error, Result,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file if it exists
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,recipebook=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let settings = Settings::from_env()?;
    settings.validate()?;

    match cli.command {
        Commands::Serve { port, host } => {
            serve(settings, port, host).await?;
        }
        Commands::Migrate => {
            migrate(settings).await?;
        }
        Commands::Resolve { query } => {
            recipebook::cli::commands::resolve(&server_url(&settings), &query).await?;
        }
        Commands::List {
            query,
            user_id,
            filter,
            page,
            limit,
        } => {
            recipebook::cli::commands::list(
                &server_url(&settings),
                query,
                user_id,
                filter,
                page,
                limit,
            )
            .await?;
        }
        Commands::Get { id } => {
            recipebook::cli::commands::get(&server_url(&settings), &id).await?;
        }
    }

    Ok(())
}

fn server_url(settings: &Settings) -> String {
    settings
        .server
        .external_url
        .clone()
        .unwrap_or_else(|| format!("http://{}:{}", settings.server.host, settings.server.port))
}

async fn serve(mut settings: Settings, port: Option<u16>, host: Option<String>) -> Result<()> {
    if let Some(port) = port {
        settings.server.port = port;
    }
    if let Some(host) = host {
        settings.server.host = host;
    }

    info!("Starting Recipe Book server");
    info!("Database: {}", settings.database.url);
    info!("Server: {}:{}", settings.server.host, settings.server.port);

    let pool = db::init_pool_with_config(&settings.database).await?;
    info!(
        "Database connection established (max_connections: {}, min_connections: {})",
        settings.database.max_connections, settings.database.min_connections
    );

    db::run_migrations(&pool).await?;
    info!("Database migrations completed");

    let store = Arc::new(SqliteRecipeStore::new(pool));
    let generator = generator::from_config(&settings.generator)?;
    info!("Recipe generator: {:?}", settings.generator.mode);
    if !settings.embedding.enabled {
        info!("Embedding updates disabled");
    }

    let state = AppState::new(
        store,
        generator,
        Arc::new(LogEmbeddingUpdater),
        settings.clone(),
    );
    let app = routes::create_router(state, &settings);

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| Error::Internal(format!("Failed to bind to {addr}: {e}")))?;

    info!("Server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .map_err(|e| Error::Internal(format!("Server error: {e}")))?;

    info!("Shutting down...");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

async fn migrate(settings: Settings) -> Result<()> {
    info!("Running database migrations");

    let pool = db::init_pool(&settings.database.url).await?;
    db::run_migrations(&pool).await?;

    println!("✓ Database migrations completed successfully");
    Ok(())
}
