//! Server assembly and lifecycle

use std::sync::Arc;

use axum::Router;
use storefront_permissions::{
    AuditLogger, PermissionRouteTable, PermissionService, SqlRoleStore,
};
use tokio::{net::TcpListener, signal};
use tracing::info;

use crate::{
    config::ServerConfig, error::ApiResult, middleware::TokenVerifier, routes, state::AppState,
};

/// A configured API server
pub struct ApiServer {
    config: ServerConfig,
    state: AppState,
}

impl ApiServer {
    /// Connect the role store, load the route table and build shared state
    pub async fn build(config: ServerConfig) -> ApiResult<Self> {
        config.validate()?;

        let store = SqlRoleStore::connect(&config.database_url, config.max_connections).await?;
        store.ensure_schema().await?;

        let table = match &config.permission_routes_path {
            Some(path) => {
                info!(path = %path.display(), "loading permission routes");
                PermissionRouteTable::load(path)?
            }
            None => PermissionRouteTable::storefront_defaults()?,
        };
        info!(permissions = table.len(), "permission route table ready");

        let mut builder = PermissionService::builder()
            .table(Arc::new(table))
            .store(Arc::new(store.clone()))
            .ttl(config.permission_cache_ttl());
        if config.audit_capacity > 0 {
            builder = builder.audit_logger(AuditLogger::with_capacity(config.audit_capacity));
        }
        let permissions = Arc::new(builder.build()?);

        let state = AppState::new(permissions, TokenVerifier::new(&config.access_token_secret))
            .with_pool(store.pool().clone());

        Ok(Self { config, state })
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn router(&self) -> Router {
        routes::app(self.state.clone())
    }

    /// Bind and serve until Ctrl+C or SIGTERM
    pub async fn serve(self) -> ApiResult<()> {
        let address = self.config.bind_address();
        let listener = TcpListener::bind(&address).await?;
        info!(%address, "storefront API listening");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("server shut down");
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if signal::ctrl_c().await.is_ok() {
            info!("received Ctrl+C, shutting down");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("received terminate signal, shutting down");
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
