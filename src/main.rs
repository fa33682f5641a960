//! Learning Agent Backend - Main Entry Point
//!
//! Starts the web API server for the learning path assistant.

use learning_agent::api::run_server;
use learning_agent::config::AppConfig;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Initialize logging
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    println!("╔════════════════════════════════════════════════╗");
    println!("║   Learning Agent - AI Learning Path Assistant  ║");
    println!("║   Plan → Study → Quiz → Progress               ║");
    println!("╚════════════════════════════════════════════════╝");
    println!();

    let config = AppConfig::from_env();
    run_server(config).await
}
