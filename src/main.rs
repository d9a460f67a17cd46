use anyhow::{Context, Result};
use axum::{extract::FromRef, Router};
use reqwest::{Client, Proxy};
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use crate::catalog_api::HttpCatalogClient;
use crate::config::Settings;
use crate::session::SessionRegistry;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, fmt};

// Declare modules
mod catalog_api;
mod config;
mod engine;
mod error;
mod facets;
mod models;
mod orchestrator;
mod page;
mod paginator;
mod routes;
mod session;
mod store;
mod url_sync;
mod validation;

#[cfg(test)]
mod test_support;

// Define the application state struct
#[derive(Clone, FromRef)]
struct AppState {
    sessions: Arc<SessionRegistry>,
}

// Shared reqwest client; every catalog query goes through it
fn build_http_client(settings: &Settings) -> Result<Client> {
    let mut builder = Client::builder()
        .user_agent(settings.user_agent.as_str())
        .timeout(settings.request_timeout());
    if let Some(proxy_url) = settings.proxy_url.as_deref().filter(|url| !url.is_empty()) {
        let proxy = Proxy::all(proxy_url).with_context(|| format!("Invalid proxy URL '{}'", proxy_url))?;
        builder = builder.proxy(proxy);
        tracing::info!("Routing catalog queries through the configured proxy.");
    }
    builder.build().context("Failed to build shared reqwest client")
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file first. Ignore errors (e.g., file not found)
    dotenv::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "catalog_filter=info,tower_http=info".into())) // Default to info if RUST_LOG not set
        .with(fmt::layer())
        .init();

    tracing::info!("Initializing catalog filter server...");

    // Load configuration
    let settings = match Settings::new() {
        Ok(s) => {
            tracing::info!("Configuration loaded successfully.");
            s
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e); // Propagate the error
        }
    };
    // Wrap settings in Arc for shared ownership
    let shared_settings = Arc::new(settings);

    let http_client = Arc::new(build_http_client(&shared_settings)?);
    tracing::info!("Shared HTTP client created.");

    let catalog = HttpCatalogClient::new(
        Arc::clone(&http_client),
        shared_settings.catalog_endpoint.clone(),
        shared_settings.request_timeout(),
    )
    .with_csrf_token(shared_settings.csrf_token.clone());
    tracing::info!(endpoint = %shared_settings.catalog_endpoint, "Catalog client configured.");

    let sessions = Arc::new(
        SessionRegistry::new(Arc::new(catalog), shared_settings.debounce(), shared_settings.default_per_page)
            .with_idle_timeout(shared_settings.session_idle()),
    );

    // Create the application state instance
    let app_state = AppState { sessions };

    let app: Router = routes::create_router(app_state);

    // Parse the server address from settings
    let addr: SocketAddr = match shared_settings.server_address.parse() {
        Ok(a) => a,
        Err(e) => {
            tracing::error!("Invalid server address format in configuration ('{}'): {}", shared_settings.server_address, e);
            return Err(anyhow::anyhow!("Invalid server address format: {}", shared_settings.server_address));
        }
    };

    // Create a TCP listener
    let listener = match TcpListener::bind(&addr).await {
        Ok(l) => {
            tracing::info!("Server listening on {}", addr);
            l
        }
        Err(e) => {
            tracing::error!("Failed to bind to address {}: {}", addr, e);
            return Err(e.into()); // Convert std::io::Error to anyhow::Error
        }
    };

    // Run the server
    axum::serve(listener, app.into_make_service())
        .await?;

    Ok(())
}
