use std::sync::Arc;

use colored::Colorize;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use saarthi_backend::api::{start_http_server, AppState};
use saarthi_backend::config::AppConfig;
use saarthi_backend::database::seed::seed_faqs;
use saarthi_backend::database::sqlite::SqliteDatabase;

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer().json().flatten_event(true))
        .init();
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    init_tracing();

    let args: Vec<String> = std::env::args().collect();
    match args.get(1).map(String::as_str) {
        Some("seed-faqs") => {
            if let Err(e) = run_seed().await {
                eprintln!("{}", format!("Seeding failed: {}", e).red());
                std::process::exit(1);
            }
        }
        Some("help") => print_help(),
        Some(other) => {
            eprintln!(
                "{}",
                format!("Unknown command '{}'. Use 'help' to see available commands.", other).red()
            );
            std::process::exit(1);
        }
        None => run_server().await,
    }
}

async fn run_server() {
    let config = AppConfig::load();
    let db = match SqliteDatabase::new(&config.database_path).await {
        Ok(db) => Arc::new(db),
        Err(e) => {
            eprintln!("{}", format!("Database startup failed: {}", e).red());
            std::process::exit(1);
        }
    };
    println!(
        "{}",
        format!("🚀 Saarthi backend starting on port {}", config.port).cyan()
    );
    println!(
        "{}",
        format!("📚 API docs at http://localhost:{}/api/docs", config.port).blue()
    );
    start_http_server(AppState::new(db, config)).await;
}

async fn run_seed() -> saarthi_backend::errors::Result<()> {
    let config = AppConfig::load();
    let db = SqliteDatabase::new(&config.database_path).await?;
    seed_faqs(&db).await?;
    Ok(())
}

fn print_help() {
    println!("{}", "Saarthi campus backend".cyan().bold());
    println!();
    println!("USAGE:");
    println!("  saarthi-backend             Start the HTTP/WebSocket server");
    println!("  saarthi-backend seed-faqs   Load the sample FAQ corpus");
    println!("  saarthi-backend help        Show this help");
}
