mod admin;
mod app;
mod applications;
mod audit;
mod auth;
mod config;
mod error;
mod rate_limit;
mod response;
mod scholarships;
mod state;
mod validation;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "scholarhub=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let app_state = state::AppState::init().await?;

    sqlx::migrate!("./migrations").run(&app_state.db).await?;

    auth::repo::ensure_admin(
        &app_state.db,
        &app_state.config.admin_email,
        &app_state.config.admin_password,
    )
    .await?;

    let app = app::build_app(app_state);
    app::serve(app).await
}
