pub mod config;
pub mod sidecar;

pub use config::{AppConfig, RebuildConfig, SeedingConfig, ShatterConfig, CONFIG_ENV_VAR};
pub use sidecar::{EdgeSidecar, LayoutSidecar, OrderSidecar, EDGES_FILE, LAYOUT_FILE, ORDER_FILE};
