//! Looper configuration
//!
//! - Generic YAML config loading/saving
//! - [`LooperConfig`]: startup state of the engine
//!
//! # Usage
//!
//! ```ignore
//! use looper_core::config::{load_config, save_config, LooperConfig};
//!
//! let config: LooperConfig = load_config(&config_path);
//! save_config(&config, &config_path)?;
//! ```

mod io;
mod looper;

pub use io::{load_config, save_config};
pub use looper::{FilterConfig, LooperConfig};
