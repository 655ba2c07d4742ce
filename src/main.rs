use actix_web::{App, HttpServer, middleware::Logger, web};

use subtrack_backend::{
    config::Config,
    database::{create_pool, run_migrations},
    handlers,
    logging::init_logger,
    middlewares::create_cors,
    repositories::SubscriptionRepository,
    services::SubscriptionService,
    swagger::swagger_config,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    init_logger()?;

    let config = Config::from_toml().expect("Failed to load configuration");

    let pool = create_pool(&config.database)
        .await
        .expect("Failed to create database connection pool");

    if config.database.run_migrations {
        run_migrations(&pool)
            .await
            .expect("Failed to run database migrations");
    }

    let subscription_service = SubscriptionService::new(SubscriptionRepository::new(pool));
    let timeouts = web::Data::new(config.timeouts.clone());
    let cors_config = config.cors.clone();

    log::info!(
        "Starting HTTP server at {}:{}",
        config.server.host,
        config.server.port
    );

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(create_cors(&cors_config))
            .app_data(web::Data::new(subscription_service.clone()))
            .app_data(timeouts.clone())
            .configure(swagger_config)
            .service(web::scope("/api").configure(handlers::subscription_config))
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await?;

    log::info!("Server stopped gracefully");
    Ok(())
}
