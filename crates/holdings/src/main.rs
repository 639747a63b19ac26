//! # Holdings CLI
//!
//! A command-line client for the holdings store. The binary is thin: the CLI
//! lives in `src/cli/`, while this file only invokes `cli::run()` and handles
//! process termination.
//!
//! ## Layering
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI Layer (crates/holdings/src/cli/)                       │
//! │  - clap argument parsing (setup.rs)                         │
//! │  - runtime, logging and dispatch (commands.rs)              │
//! │  - plain text output (render.rs)                            │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Database facade (crates/holdingsapp/src/database.rs)       │
//! │  - safe defaults, Outcome<T>                                │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything from the facade inward is UI agnostic. The CLI is the only
//! place that knows about stdout, stderr and exit codes. A degraded outcome
//! is fatal here: a command-line user would rather see the fault than an
//! empty list.

mod cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
