//! scope - play shapes as sound and watch them on an XY scope
//!
//! Run with: cargo run --bin scope
//!
//! Logs go to `scope.log` in the working directory so they don't tear up
//! the terminal UI.

mod app;
mod sources;
mod ui;

use std::{fs::File, sync::Mutex};

use color_eyre::eyre::WrapErr;

use app::ScopeApp;

const LOG_FILE: &str = "scope.log";

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let log = File::create(LOG_FILE).wrap_err_with(|| format!("failed to create {}", LOG_FILE))?;
    tracing_subscriber::fmt()
        .with_writer(Mutex::new(log))
        .with_ansi(false)
        .init();

    ScopeApp::new().voices(8).run()
}
