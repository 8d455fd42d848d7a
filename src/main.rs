mod handlers;
mod models;
mod services;
mod utils;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use utils::config::Config;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file FIRST before anything else
    dotenv::dotenv().ok();

    // Initialize logger with default level if RUST_LOG not set
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("=================================================");
    println!("🚀 GitLab Group Stats Backend");
    println!("=================================================");

    // Load configuration
    let config = Config::from_env().expect("Failed to load configuration");
    let host = config.host.clone();
    let port = config.port;

    println!("📝 Configuration loaded:");
    println!("   - Host: {}", host);
    println!("   - Port: {}", port);
    println!(
        "   - TLS verification: {}",
        if config.verify_tls { "ENABLED" } else { "DISABLED" }
    );
    println!("   - Excluded project IDs: {:?}", config.excluded_project_ids);
    println!(
        "   - Log level: {}",
        std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string())
    );

    // Start HTTP server
    println!("🌐 Starting HTTP server at http://{}:{}", host, port);
    println!("📍 Available endpoints:");
    println!("   - POST http://{}:{}/api/stats", host, port);
    println!("=================================================");

    log::info!("Server started at http://{}:{}", host, port);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(config.clone()))
            .wrap(Logger::default())
            .wrap(Cors::permissive())
            .service(
                web::scope("/api")
                    .route("/stats", web::post().to(handlers::stats::collect_group_stats)),
            )
    })
    .bind((host, port))?
    .run()
    .await
}
