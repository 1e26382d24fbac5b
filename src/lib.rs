pub mod config;
pub mod constants;
pub mod error;
pub mod loader;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod preview;
pub mod queries;
pub mod schema;
pub mod types;
pub mod writer;

pub use config::Config;
pub use error::{AnalyticsError, Result};
pub use pipeline::{run, RunReport, Task};
