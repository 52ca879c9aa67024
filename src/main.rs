//! Dashboard server
//!
//! Usage:
//!   ./target/release/transit_recovery [options]
//!
//! Options:
//!   --data PATH   Daily ridership CSV (env RIDERSHIP_CSV)
//!   --host HOST   Interface to bind (env DASHBOARD_HOST, default 127.0.0.1)
//!   --port PORT   Port to listen on (env DASHBOARD_PORT); when absent the
//!                 first free port in 8700..8800 is used

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use transit_recovery::api::{router, DashboardService};
use transit_recovery::config::{Calendar, DEFAULT_DATA_PATH, DEFAULT_PORT_RANGE};

#[derive(Parser, Debug)]
#[command(name = "transit_recovery")]
#[command(about = "Serve the MTA ridership recovery dashboard")]
struct Args {
    /// Daily ridership CSV
    #[arg(long, env = "RIDERSHIP_CSV", default_value = DEFAULT_DATA_PATH)]
    data: PathBuf,

    /// Interface to bind
    #[arg(long, env = "DASHBOARD_HOST", default_value = "127.0.0.1")]
    host: IpAddr,

    /// Port to listen on
    #[arg(long, env = "DASHBOARD_PORT")]
    port: Option<u16>,
}

fn print_banner(addr: SocketAddr, data: &std::path::Path, days: usize) {
    println!("============================================================");
    println!("              MTA RIDERSHIP RECOVERY DASHBOARD");
    println!("============================================================");
    println!();
    println!("  Data:     {} ({} days)", data.display(), days);
    println!("  Page:     http://{}/", addr);
    println!("  REST:     http://{}/api/v1/", addr);
    println!();
    println!("REST Endpoints:");
    println!("  GET /api/v1/health              Health check");
    println!("  GET /api/v1/dashboard           Full page bundle");
    println!("  GET /api/v1/kpis                Headline KPIs");
    println!("  GET /api/v1/metrics             Card metrics");
    println!("  GET /api/v1/periods             Resampled table");
    println!("  GET /api/v1/charts/:chart       Single figure");
    println!("  GET /api/v1/comparison          Comparison table");
    println!();
    println!("============================================================");
}

/// Bind the configured port, or the first free one in the default range
async fn bind(host: IpAddr, port: Option<u16>) -> Result<TcpListener> {
    if let Some(port) = port {
        let addr = SocketAddr::new(host, port);
        return TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {}", addr));
    }

    for port in DEFAULT_PORT_RANGE {
        match TcpListener::bind(SocketAddr::new(host, port)).await {
            Ok(listener) => return Ok(listener),
            Err(e) => tracing::debug!("Port {} unavailable: {}", port, e),
        }
    }
    bail!(
        "No free port between {} and {}",
        DEFAULT_PORT_RANGE.start,
        DEFAULT_PORT_RANGE.end - 1
    )
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .init();

    let args = Args::parse();

    let service = DashboardService::from_csv(&args.data, Calendar::default())?;
    let days = service.table().len();

    let listener = bind(args.host, args.port).await?;
    let addr = listener.local_addr()?;
    print_banner(addr, &args.data, days);

    let app = router(Arc::new(service));
    tracing::info!("Starting dashboard on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
