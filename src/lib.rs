//! traymon core: periodic host metrics resolved through a user template,
//! with bounded per-key history rendered as inline PNG sparklines.

pub mod commands;
pub mod config;
pub mod history;
pub mod metrics;
pub mod rates;
pub mod sampler;
pub mod sparkline;
pub mod template;
