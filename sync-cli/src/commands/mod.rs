//! CLI command implementations.

pub mod list;
pub mod refresh;
pub mod reserve;
pub mod status;
pub mod sync;
pub mod watch;
