use anyhow::{Context, Result};
use load_flattener::{api, config, optimizer::LoadFlattener, telemetry};
use config::{Config, RunMode};
use std::sync::Arc;
use telemetry::init_tracing;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cfg = Config::load()?;
    let flattener = Arc::new(cfg.solver.flattener());

    match cfg.mode {
        RunMode::Solve => solve_once(&cfg, flattener).await,
        RunMode::Serve => serve(&cfg, flattener).await,
    }
}

async fn solve_once(cfg: &Config, flattener: Arc<LoadFlattener>) -> Result<()> {
    let problem = cfg
        .problem
        .clone()
        .context("solve mode requires a [problem] section in the config")?;

    let result = tokio::task::spawn_blocking(move || flattener.solve(&problem))
        .await
        .context("solver task failed")?
        .context("invalid problem")?;

    print!("{}", result.render());

    if !result.has_solution() {
        anyhow::bail!("no schedule found: {}", result.status);
    }
    Ok(())
}

async fn serve(cfg: &Config, flattener: Arc<LoadFlattener>) -> Result<()> {
    let app = api::router(api::AppState::new(flattener), cfg);
    let addr = cfg.server.socket_addr()?;

    if cfg.server.host == "0.0.0.0" {
        warn!("server binding to 0.0.0.0, the API will be reachable from the network");
    }

    info!(%addr, "starting Load Flattener API");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(telemetry::shutdown_signal())
        .await?;

    warn!("shutdown complete");
    Ok(())
}
