//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → MonitorConfig (validated, immutable)
//!     → handed to the session and admin API at startup
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → daemon re-syncs the tenant's targets into the store
//! ```
//!
//! # Design Decisions
//! - Only the target list is hot-reloaded; other settings need a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, ConfigError};
pub use schema::{
    AdminConfig, CacheConfig, MonitorConfig, NotificationConfig, ObservabilityConfig, ProbeConfig,
    QueueConfig, SchedulerConfig, SessionConfig, StoreConfig, TargetConfig,
};
