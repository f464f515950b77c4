pub mod core;

use tracing_subscriber::EnvFilter;

pub use crate::core::archive::{make_jar, merge_jars, split_jar};
pub use crate::core::config::UtilsConfig;
pub use crate::core::download::Downloader;
pub use crate::core::error::{UtilError, UtilResult};
pub use crate::core::hash::{HashFunction, HashStore};
pub use crate::core::task::Task;

/// Install a `tracing` fmt subscriber. `RUST_LOG` wins over the configured
/// filter. Does nothing if a global subscriber is already set.
pub fn init_logging(config: &UtilsConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_filter));

    if tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .is_ok()
    {
        tracing::debug!("Logging initialised with filter {:?}", config.log_filter);
    }
}
