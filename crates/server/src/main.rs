//! `warden` binary
//!
//! Loads the configured stores, validates the group hierarchy, prints a
//! summary and flushes on exit. Exits non-zero if the core cannot start.

use std::process::ExitCode;

use warden_core::CoreConfig;

fn main() -> ExitCode {
    let config = match CoreConfig::load() {
        Ok(config) => config,
        Err(e) => {
            warden_server::init_tracing(false);
            tracing::error!("Failed to load core config: {}", e);
            return ExitCode::FAILURE;
        }
    };
    warden_server::init_tracing(config.debug);

    let core = match warden_server::start(&config) {
        Ok(core) => core,
        Err(e) => {
            tracing::error!("Failed to start: {}", e);
            return ExitCode::FAILURE;
        }
    };

    println!("{}", warden_server::summary(&core));
    core.shutdown();
    ExitCode::SUCCESS
}
