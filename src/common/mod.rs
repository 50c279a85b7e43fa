//! Common utilities and types shared across topokit

pub mod cancel;
pub mod config;
pub mod error;
pub mod logging;
pub mod utils;

pub use cancel::{cancel_pair, CancelHandle, CancelSignal};
pub use config::{Config, QueryLogConfig, TopoConfig};
pub use error::{Error, ErrorKind, Result};
pub use logging::init_tracing;
pub use utils::{child_prefix, format_seconds, join_path};
