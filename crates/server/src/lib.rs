//! Warden server bootstrap
//!
//! Installs the tracing subscriber, opens the core from `configs/core.toml`
//! and reports what was loaded. Game-side integrations embed [`start`] and
//! call [`Core::shutdown`] when the process stops.

use std::sync::Arc;

use tracing::instrument;
use tracing_subscriber::EnvFilter;

use warden_core::{AssetRegistry, Core, CoreConfig, CoreResult, TracingReporter};

pub const NAME: &str = "Warden";
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Install the global subscriber.
///
/// `RUST_LOG` wins when set; otherwise `debug` selects DEBUG over INFO.
/// Calling this twice is harmless.
pub fn init_tracing(debug: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if debug { "debug" } else { "info" }));

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Open the core with the default reporter and no asset types
#[instrument(skip_all)]
pub fn start(config: &CoreConfig) -> CoreResult<Core> {
    start_with(config, AssetRegistry::new())
}

/// Open the core with the caller's asset types
#[instrument(skip_all)]
pub fn start_with(config: &CoreConfig, assets: AssetRegistry) -> CoreResult<Core> {
    tracing::info!("{} {} loading...", NAME, VERSION);

    let core = Core::open(config, assets, Arc::new(TracingReporter))?;
    tracing::info!("{}", summary(&core));
    Ok(core)
}

/// One-line description of what the core holds
pub fn summary(core: &Core) -> String {
    let groups = core.groups().groups();
    let default = core
        .groups()
        .default_group()
        .map(|g| g.name().to_string())
        .unwrap_or_else(|_| "none".to_string());

    format!(
        "{} groups (default: {}), {} stored players, {} online",
        groups.len(),
        default,
        core.players().store().len(),
        core.players().online_count()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_core::StorageBackend;

    #[test]
    fn test_start_and_summarise_memory_core() {
        let mut config = CoreConfig::default();
        config.storage.backend = StorageBackend::Memory;
        config.groups.default_group = "guest".into();

        let core = start(&config).unwrap();
        assert_eq!(
            summary(&core),
            "1 groups (default: guest), 0 stored players, 0 online"
        );
        assert_eq!(core.shutdown(), 0);
    }

    #[test]
    fn test_start_fails_without_default_group() {
        let mut config = CoreConfig::default();
        config.storage.backend = StorageBackend::Memory;
        config.groups.create_default = false;

        assert!(start(&config).is_err());
    }

    #[test]
    fn test_init_tracing_is_idempotent() {
        init_tracing(true);
        init_tracing(false);
    }
}
