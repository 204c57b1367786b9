pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use app::build_pipeline;
pub use config::{cli::LocalStorage, toml_config::DigestConfig};
pub use core::{etl::DigestEngine, pipeline::DigestPipeline};
pub use utils::error::{DigestError, Result};
