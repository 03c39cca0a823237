use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;

use hoamai_server::config::Config;
use hoamai_server::routes;
use hoamai_server::state::AppState;
use hoamai_server::store::PgStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cfg = Config::from_env()?;
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&cfg.database_url)
        .await?;
    let store = Arc::new(PgStore::new(pool));
    let state = AppState::new(store, &cfg.session_keys, cfg.production)?;

    let app = routes::app(state);
    log::info!("Starting Hoa Mai school server on http://{}", cfg.bind);
    axum::Server::bind(&cfg.bind)
        .serve(app.into_make_service())
        .await?;
    Ok(())
}
