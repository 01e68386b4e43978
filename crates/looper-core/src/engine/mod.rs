//! Looper engine - heads, channel loopers, stereo engine
//!
//! This module contains the real-time side of the looper:
//! - Loop geometry and boundary resolution shared by every head
//! - Head: a read or write cursor over one channel buffer
//! - ChannelLooper: a read/write head pair with transport and drunk walk
//! - StereoLooper: two channels, phase state machine and signal path
//! - Lock-free command queue and published state for a control thread

mod atomics;
mod boundary;
mod command;
mod head;
mod looper;
mod params;
mod stereo;

pub use atomics::*;
pub use boundary::*;
pub use command::*;
pub use head::*;
pub use looper::*;
pub use params::*;
pub use stereo::*;
