use axum::{
    Router,
    routing::{get, post},
};
use configuration::Config;
use dashboard::{Dashboard, DashboardState};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod error;
pub mod handlers;

/// The shared application state that all handlers can access.
pub struct AppState {
    pub dashboard: Dashboard,
    /// The symbols the dashboard shows, in display order.
    pub symbols: Vec<String>,
    state: RwLock<DashboardState>,
    // Serializes refreshes so concurrent requests don't fetch the same data twice.
    refresh_lock: Mutex<()>,
}

impl AppState {
    pub fn new(dashboard: Dashboard, symbols: Vec<String>) -> Self {
        Self {
            dashboard,
            symbols,
            state: RwLock::new(DashboardState::new()),
            refresh_lock: Mutex::new(()),
        }
    }

    /// The current state, refreshing first if no refresh has completed yet.
    pub async fn current_or_refresh(&self) -> DashboardState {
        {
            let state = self.state.read().await;
            if state.is_populated() {
                return state.clone();
            }
        }

        let _guard = self.refresh_lock.lock().await;
        // Another request may have finished the first refresh while we waited.
        {
            let state = self.state.read().await;
            if state.is_populated() {
                return state.clone();
            }
        }
        self.refresh_locked().await
    }

    /// Reloads every configured symbol and replaces the state wholesale.
    pub async fn refresh(&self) -> DashboardState {
        let _guard = self.refresh_lock.lock().await;
        self.refresh_locked().await
    }

    async fn refresh_locked(&self) -> DashboardState {
        let fresh = self.dashboard.refresh(&self.symbols).await;
        let mut state = self.state.write().await;
        state.replace_with(fresh);
        state.clone()
    }
}

/// Builds the application router with its middleware.
pub fn build_router(app_state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // --- DEFINE THE APPLICATION ROUTES ---
    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/stock/:symbol", get(handlers::get_stock))
        .route("/api/dashboard", get(handlers::get_dashboard))
        .route("/api/dashboard/refresh", post(handlers::refresh_dashboard))
        .with_state(app_state)
        .layer(cors)
        // This middleware will automatically log information about every incoming request.
        .layer(TraceLayer::new_for_http())
}

/// The main function to configure and run the web server.
///
/// Tracing must already be initialized by the caller.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let dashboard = Dashboard::from_config(config)?;
    let app_state = Arc::new(AppState::new(dashboard, config.dashboard.symbols.clone()));
    let app = build_router(app_state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Web server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Web server stopped.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for the shutdown signal.");
        // Without a signal handler, keep serving until the process is killed.
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received.");
}
