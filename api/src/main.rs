use std::{net::SocketAddr, time::Duration};

use diesel_async::{
    AsyncPgConnection,
    pooled_connection::{AsyncDieselConnectionManager, deadpool::Pool},
};
use dotenv::dotenv;
use mimalloc::MiMalloc;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use guestbook_api::{
    App,
    config::{Env, ServerConfig},
    router,
};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

const MAX_DB_CONNECTIONS: usize = 10;

fn init_tracing(env: Env) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "guestbook_api=debug,tower_http=info".into());

    let registry = tracing_subscriber::registry().with(filter);

    match env {
        Env::Production => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        Env::Dev | Env::Staging => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

fn build_pool(database_url: &str) -> Result<Pool<AsyncPgConnection>, eyre::Error> {
    let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(database_url);

    Pool::builder(manager)
        .max_size(MAX_DB_CONNECTIONS)
        .wait_timeout(Some(Duration::from_secs(10)))
        .runtime(deadpool_runtime::Runtime::Tokio1)
        .build()
        .map_err(|err| eyre::eyre!("couldn't build the database pool: {err}"))
}

#[tokio::main]
async fn main() -> Result<(), eyre::Error> {
    dotenv().ok();

    init_tracing(Env::from_env());

    let config = ServerConfig::new_from_env();
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

    let pool = build_pool(&config.database_url)?;
    let app = router(App::new(pool, config));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(?err, "Failed to listen for the shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
