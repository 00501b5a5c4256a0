// src/main.rs
// DOCUMENTATION: Application entry point
// PURPOSE: Initialize config, database, and start HTTP server

mod config;
mod db;
mod errors;
mod handlers;
mod models;
mod services;

use actix_web::{middleware::Logger, web, App, HttpServer};
use config::Config;
use dotenv::dotenv;
use governor::{Quota, RateLimiter};
use services::{start_cleanup_task, AiCache, OpenAiClient};
use std::io;
use std::num::NonZeroU32;
use std::sync::Arc;

#[actix_web::main]
async fn main() -> io::Result<()> {
    // 1. Load environment variables
    dotenv().ok();

    // 2. Load configuration
    let config = Config::from_env();
    if let Err(e) = config.validate() {
        eprintln!("Configuration error: {}", e);
        // We continue but log error, or we could panic
    }

    // 3. Initialize logging
    if std::env::var("RUST_LOG").is_err() {
        // Use configured log level or default
        let log_level = if !config.log_level.is_empty() {
            &config.log_level
        } else {
            "info,actix_web=info,sqlx=warn"
        };
        std::env::set_var("RUST_LOG", log_level);
    }
    env_logger::init();

    log::info!("Starting lokal-api service...");
    log::info!("Environment: {}", config.environment);
    log::info!(
        "Server Address: {}:{}",
        config.server_address,
        config.server_port
    );

    // 4. Initialize database connection pool
    let pool = match config::init_db_pool(&config).await {
        Ok(pool) => pool,
        Err(e) => {
            log::error!("Failed to connect to database: {}", e);
            std::process::exit(1);
        }
    };

    // 5. Initialize cache for AI provider responses
    let cache = Arc::new(AiCache::new(3600)); // 1 hour TTL
    log::info!("Initialized AI response cache (TTL: 1 hour)");

    // Start background cleanup task (runs every 5 minutes)
    start_cleanup_task(cache.clone(), 300);
    log::info!("Started cache cleanup task (interval: 5 minutes)");

    // 6. AI client and rate limiter shared across workers
    let openai_client = web::Data::new(OpenAiClient::new_with_cache(
        config.openai_api_key.clone(),
        config.openai_model.clone(),
        cache.clone(),
    ));
    if config.openai_api_key.is_empty() {
        log::warn!("AI features degraded: no OPENAI_API_KEY, heuristics only");
    }

    let quota = Quota::per_minute(
        NonZeroU32::new(config.ai_requests_per_minute.max(1)).unwrap_or(NonZeroU32::MIN),
    );
    let ai_limiter = web::Data::new(RateLimiter::direct(quota));
    log::info!(
        "AI endpoints limited to {} requests/minute",
        config.ai_requests_per_minute.max(1)
    );

    // 7. Start HTTP server
    let server_addr = format!("{}:{}", config.server_address, config.server_port);
    let config_clone = config.clone();

    HttpServer::new(move || {
        App::new()
            // Application state (database pool, config, AI client, limiter)
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::new(config_clone.clone()))
            .app_data(openai_client.clone())
            .app_data(ai_limiter.clone())
            // Middleware
            .wrap(Logger::default())
            .wrap(actix_web::middleware::Compress::default())
            // Routes
            .configure(handlers::health_config)
            .configure(handlers::businesses_config)
            .configure(handlers::reviews_config)
            .configure(handlers::search_config)
            .configure(handlers::recommendations_config)
            .configure(handlers::gamification_config)
            .configure(handlers::users_config)
            .configure(handlers::webhooks_config)
            .configure(handlers::ai_config)
            .configure(handlers::admin_config)
    })
    .bind(&server_addr)?
    .run()
    .await
}
