//! # CLI Behavior
//!
//! `holdings` with no arguments lists the collection, seeding the sample
//! items on a fresh store (unless `HOLDINGS_SEED=false`).
//!
//! Logs go to stderr. `RUST_LOG` selects what is shown; `-v` raises the
//! default from `warn` to `debug`.
//!
//! ## Module Structure
//!
//! - `setup`: Argument parsing via clap
//! - `commands`: Runtime setup and per-command handlers
//! - `render`: Output formatting

mod commands;
mod render;
pub mod setup;

pub use commands::run;
