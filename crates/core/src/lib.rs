pub mod agent;
pub mod catalog;
pub mod config;
pub mod error;
pub mod gateway;
pub mod metrics;
pub mod response;

pub use agent::{AgentTranslation, UNPARSEABLE_COMMAND};
pub use catalog::{CatalogEntry, CommandCatalog, SUMMARY_PROBES};
pub use config::{ConfigError, GatewayConfig};
pub use error::{ErrorKind, GatewayError};
pub use gateway::{FreeFormRequest, Gateway, MetricReport};
pub use metrics::{Metrics, MetricsSnapshot};
pub use response::ApiResponse;
