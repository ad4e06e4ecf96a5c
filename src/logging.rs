//! Logger setup for both targets.

use std::sync::Once;

static INIT: Once = Once::new();

/// Installs the global logger once; later calls are ignored.
///
/// Natively `RUST_LOG` wins over `level`, and `wgpu` internals are capped at
/// `warn` unless `RUST_LOG` says otherwise. On the web everything goes to the
/// browser console at `level`.
pub fn init_logging(level: log::Level) {
    INIT.call_once(|| {
        #[cfg(not(target_arch = "wasm32"))]
        {
            let mut builder = env_logger::Builder::new();
            match std::env::var("RUST_LOG") {
                Ok(filter) => {
                    builder.parse_filters(&filter);
                }
                Err(_) => {
                    builder
                        .filter_level(level.to_level_filter())
                        .filter_module("wgpu_core", log::LevelFilter::Warn)
                        .filter_module("wgpu_hal", log::LevelFilter::Warn)
                        .filter_module("naga", log::LevelFilter::Warn);
                }
            }
            if let Err(e) = builder.try_init() {
                println!("Warning: Could not initialize logger: {}", e);
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            // Fails only if the page already installed a logger, which is fine.
            let _ = console_log::init_with_level(level);
        }

        log::debug!("logging initialized at {level}");
    });
}
