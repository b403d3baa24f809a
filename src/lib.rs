//! Load Flattener
//!
//! Schedules on/off machines over a discrete time grid so that every machine
//! meets its required periods and exact on-time budget while the largest
//! per-period power draw is as small as possible.

pub mod api;
pub mod config;
pub mod domain;
pub mod model;
pub mod optimizer;
pub mod telemetry;
