//! Shared state handed to every handler as `State<Arc<AppState>>`.

use std::sync::Arc;

use rbo_returns::{EngineSettings, ReturnStore};

/// Static build metadata included in health responses.
#[derive(Clone, Debug)]
pub struct BuildInfo {
    pub service: &'static str,
    pub version: &'static str,
}

#[derive(Clone)]
pub struct AppState {
    pub build: BuildInfo,
    pub store: Arc<dyn ReturnStore>,
    pub settings: EngineSettings,
}

impl AppState {
    pub fn new(store: Arc<dyn ReturnStore>, settings: EngineSettings) -> Self {
        Self {
            build: BuildInfo {
                service: "rbo-daemon",
                version: env!("CARGO_PKG_VERSION"),
            },
            store,
            settings,
        }
    }
}
