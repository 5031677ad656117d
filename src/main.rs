//! Study journal binary entrypoint wiring REST, SSE, and the session store.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use study_journal_back::{
    build_router,
    clock::{Clock, SystemClock},
    config::{AppConfig, StoreBackend},
    dao::store::MemoryStore,
    state::{AppState, SharedState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let app_config = AppConfig::load();
    let clock: Arc<dyn Clock> = Arc::new(SystemClock::new(app_config.day_offset()));

    let app_state = match app_config.store() {
        StoreBackend::Memory => {
            let state = AppState::new(clock, None);
            state.install_store(Arc::new(MemoryStore::new())).await;
            info!("using the in-memory store; data is lost on restart");
            state
        }
        StoreBackend::Firebase => start_firebase(clock)?,
    };

    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Read the Firebase parameters and let the supervisor connect in the background.
///
/// A missing parameter aborts startup; an unreachable database only keeps the
/// service in degraded mode until the supervisor gets through.
#[cfg(feature = "firebase-store")]
fn start_firebase(clock: Arc<dyn Clock>) -> anyhow::Result<SharedState> {
    use study_journal_back::{
        dao::{
            storage::StorageError,
            store::{
                DataStore,
                firebase::{FirebaseConfig, FirebaseStore},
            },
        },
        services::storage_supervisor,
    };

    let config = FirebaseConfig::from_env().context("loading Firebase configuration")?;
    let state = AppState::new(clock, Some(config.web_client()));

    let config = Arc::new(config);
    tokio::spawn(storage_supervisor::run(state.clone(), move || {
        let config = config.clone();
        async move {
            let store = FirebaseStore::connect(&config).await?;
            Ok::<Arc<dyn DataStore>, StorageError>(Arc::new(store))
        }
    }));

    Ok(state)
}

#[cfg(not(feature = "firebase-store"))]
fn start_firebase(_clock: Arc<dyn Clock>) -> anyhow::Result<SharedState> {
    anyhow::bail!("the firebase store requires the `firebase-store` feature")
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut term = match signal(SignalKind::terminate()) {
            Ok(term) => term,
            Err(err) => {
                tracing::warn!(error = %err, "failed to install SIGTERM handler");
                let _ = tokio::signal::ctrl_c().await;
                return;
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = term.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
