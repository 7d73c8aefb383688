use anyhow::Context;
use dotenv::dotenv;
use listly::token::TokenService;
use listly::{SharedData, app_env, app_router, db, logging, persistence};
use std::env;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    dotenv().ok();
    logging::setup_logging_and_tracing(logging::init_env_filter(), logging::exporters_from_env());

    let db_url =
        env::var(app_env::DB_URL).context("Could not get database URL from environment")?;
    let db_pool = db::connect_sqlx(&db_url).await?;
    db::bootstrap_schema(&db_pool).await?;

    let jwt_secret = env::var(app_env::JWT_SECRET)
        .context("Could not get the token signing secret from environment")?;

    let shared_data = Arc::new(SharedData {
        ext_cxn: persistence::ExternalConnectivity::new(db_pool),
        tokens: TokenService::new(&jwt_secret),
    });
    let app = app_router(shared_data);

    let port: u16 = match env::var(app_env::PORT) {
        Ok(raw_port) => raw_port
            .parse()
            .context("The configured port must be a number")?,
        Err(_) => 3000,
    };
    let listener = TcpListener::bind(("0.0.0.0", port))
        .await
        .context("Binding the API's TCP port")?;

    info!("Starting server on port {port}.");
    axum::serve(listener, app).await.context("Serving the API")?;

    Ok(())
}
