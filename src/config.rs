use anyhow::{Context, Result};
use figment::{providers::{Env, Format, Toml}, Figment};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use crate::domain::{SchedulingProblem, DEFAULT_MAX_CELLS};
use crate::optimizer::{LoadFlattener, MilpSolver, SolveParams, DEFAULT_WORKERS};

pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub mode: RunMode,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub solver: SolverConfig,
    /// Problem solved in [`RunMode::Solve`]
    pub problem: Option<SchedulingProblem>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// Solve the configured problem once and print the report
    #[default]
    Solve,
    /// Serve the HTTP API
    Serve,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            request_timeout_secs: 60,
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SolverConfig {
    /// Engine wall-clock budget; absent means no limit
    pub time_limit_secs: Option<u64>,
    /// Engine runs allowed at once, including ones past their time limit
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Largest `machine_count * horizon` grid accepted
    #[serde(default = "default_max_cells")]
    pub max_cells: usize,
}

fn default_workers() -> usize {
    DEFAULT_WORKERS
}

fn default_max_cells() -> usize {
    DEFAULT_MAX_CELLS
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            time_limit_secs: Some(30),
            workers: DEFAULT_WORKERS,
            max_cells: DEFAULT_MAX_CELLS,
        }
    }
}

impl SolverConfig {
    pub fn solve_params(&self) -> SolveParams {
        SolveParams {
            time_limit: self.time_limit_secs.map(Duration::from_secs),
        }
    }

    /// MILP-backed flattener with this section's limits
    pub fn flattener(&self) -> LoadFlattener {
        LoadFlattener::new(
            Box::new(MilpSolver::with_workers(self.workers)),
            self.solve_params(),
        )
        .with_max_cells(self.max_cells)
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// `path` merged with `LF__`-prefixed environment variables,
    /// e.g. `LF__SERVER__PORT=9000`.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let figment = Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("LF__").split("__"));
        Self::extract(figment).with_context(|| format!("loading config from {}", path.display()))
    }

    pub fn extract(figment: Figment) -> Result<Self> {
        Ok(figment.extract()?)
    }
}
