//! # Carton Register Entry Point
//!
//! Opens the configured database and prints the dashboard: today's sales,
//! profit and low-stock alerts.
//!
//! ## Startup Sequence
//! 1. Initialize tracing (logging)
//! 2. Load configuration (`CARTON_CONFIG` or `./carton.toml`, then env)
//! 3. Connect to database & run migrations
//! 4. Print the overview
//!
//! ```bash
//! CARTON_DB_PATH=./carton_dev.db cargo run -p carton-register
//! ```

use std::path::PathBuf;

use tracing::{error, info};

use carton_register::commands::{inventory, sales};
use carton_register::{init_tracing, AppState};

#[tokio::main]
async fn main() {
    init_tracing();
    info!("Starting Carton POS register");

    let config_path = std::env::var("CARTON_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("carton.toml"));

    let app = match AppState::bootstrap(Some(&config_path)).await {
        Ok(app) => app,
        Err(e) => {
            error!(error = %e, "Startup failed");
            std::process::exit(1);
        }
    };

    if let Err(e) = print_dashboard(&app).await {
        error!(error = %e, "Could not load dashboard");
        std::process::exit(1);
    }

    app.db.inner().close().await;
}

async fn print_dashboard(app: &AppState) -> Result<(), carton_register::error::ApiError> {
    let summary = sales::get_overview(&app.db, &app.config).await?;

    println!("{}", summary.store_name);
    println!("{}", "=".repeat(summary.store_name.chars().count()));
    println!("Sales today:        {}", summary.overview.sales_today);
    println!("Profit today:       {}", summary.profit_today_display);
    println!("Profit this month:  {}", summary.profit_this_month_display);

    let alerts = inventory::low_stock_alerts(&app.db).await?;
    println!();
    println!("Low stock items: {}", alerts.len());
    for alert in &alerts {
        println!("  {}: {}", alert.name, alert.message);
    }

    Ok(())
}
