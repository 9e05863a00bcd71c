use std::{sync::Arc, time::Duration};

use anyhow::Context;
use chrono::Utc;

use propdesk_api::{app, client::HttpCredentialExchange, config::ApiConfig};

const PURGE_INTERVAL: Duration = Duration::from_secs(300);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    propdesk_observability::init();

    let config = ApiConfig::from_env().context("invalid configuration")?;
    if config.access.unmapped_routes == propdesk_auth::UnmappedRoutes::Allow {
        tracing::warn!("unmapped routes are open to every signed-in role");
    }

    let exchange = HttpCredentialExchange::new(
        config.auth_api_url.clone(),
        Duration::from_secs(config.http_timeout_secs),
    )
    .context("failed to build credentials client")?;

    let services = Arc::new(app::AppServices::new(
        config.access.evaluator(),
        config.session,
        Arc::new(exchange),
        config.secure_cookies,
    ));

    let sessions = services.sessions.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(PURGE_INTERVAL);
        loop {
            ticker.tick().await;
            sessions.purge(Utc::now());
        }
    });

    let app = app::build_app(services);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!(
        addr = %listener.local_addr()?,
        auth_api = %config.auth_api_url,
        "listening"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
