use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware::Logger, web};
use anyhow::Result;

use payroll_clock::database::init_database;
use payroll_clock::middleware::RequestIdMiddleware;
use payroll_clock::services::roster;
use payroll_clock::{AppState, Config, routes};

#[actix_web::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Starting payroll clock server...");

    let config = Config::from_env()?;
    log::info!(
        "Configuration loaded (environment: {}, timezone: {}, week starts {:?}, {} rostered employees)",
        config.environment,
        config.timezone,
        config.week_start,
        config.roster.len()
    );

    let pool = init_database(&config.database_url).await?;
    log::info!("Database initialized");

    let state = AppState::new(config.clone(), pool);

    let seeded = roster::seed_users(&state.user_repository, &config).await?;
    log::info!(
        "Accounts seeded ({} created, {} updated, {} unchanged)",
        seeded.created,
        seeded.updated,
        seeded.unchanged
    );

    let app_state = web::Data::new(state);
    let server_address = config.server_address();
    log::info!("Server starting on http://{}", server_address);

    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(
                Cors::default()
                    .allowed_origin(&config.cors_origin)
                    .allowed_methods(vec!["GET", "POST"])
                    .supports_credentials()
                    .max_age(3600),
            )
            .wrap(RequestIdMiddleware)
            .wrap(Logger::new(
                r#"%a "%r" %s %b "%{Referer}i" "%{User-Agent}i" %T request_id=%{x-request-id}o"#,
            ))
            .configure(routes::configure)
    })
    .bind(&server_address)?
    .run()
    .await
    .map_err(|e| anyhow::anyhow!("Server error: {}", e))
}
