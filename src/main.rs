use sqlx::postgres::PgPoolOptions;

use budget_tracker::config::Settings;
use budget_tracker::{AppState, router, telemetry};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::from_env()?;
    telemetry::init(&settings.log_level);

    let pool = PgPoolOptions::new()
        .max_connections(settings.database_max_connections)
        .connect(&settings.database_url)
        .await?;
    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Migrations completed");

    let app = router(AppState::postgres(pool, &settings));

    let addr = settings.address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!(
        address = %addr,
        environment = ?settings.environment,
        "Server running; API docs at http://{}/api/docs",
        addr
    );

    axum::serve(listener, app).await?;

    Ok(())
}
