//! Operation log side channel
//!
//! Components publish a [`LogStats`] for every finished operation on a
//! [`QueryLogger`]. The `/querylogz` view subscribes, drains what arrives
//! within its window and renders it as an HTML table classified by latency.

pub mod http;
pub mod logger;
pub mod stats;
pub mod view;

pub use http::{querylogz_router, QueryLogState};
pub use logger::{drain, QueryLogger};
pub use stats::LogStats;
pub use view::{classify, escape_html, render_querylogz, wrappable, LatencyLevel};
