//! Looper Core - Real-time engine for a dual-channel tape looper

pub mod config;
pub mod dsp;
pub mod engine;
pub mod error;
pub mod types;

pub use error::{LooperError, LooperResult};
pub use types::*;
