use delivery_orders::db::DEFAULT_POOL_SIZE;
use delivery_orders::{build_server, create_pool, run_migrations, DeliveryConfig};
use dotenvy::dotenv;
use std::env;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = env::var("PORT")
        .unwrap_or_else(|_| "8080".to_string())
        .parse()
        .expect("PORT must be a valid number");
    let pool_size: u32 = env::var("DB_POOL_SIZE")
        .ok()
        .map(|v| v.parse().expect("DB_POOL_SIZE must be a valid number"))
        .unwrap_or(DEFAULT_POOL_SIZE);
    let config = DeliveryConfig::from_env().expect("Invalid delivery configuration");

    let pool = create_pool(&database_url, pool_size).expect("Failed to create database pool");
    run_migrations(&pool);

    log::info!(
        "Delivering up to {} km from ({}, {})",
        config.radius.max_distance_km(),
        config.store_location.latitude,
        config.store_location.longitude
    );
    log::info!("Starting server at http://{}:{}", host, port);

    build_server(pool, config, &host, port)?.await
}
