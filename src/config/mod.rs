//! Unified configuration system.
//!
//! Consolidates configuration from several tiers with field-by-field YAML merging:
//! 1. **Defaults** - `Config::default()`
//! 2. **Project** - `$CWD/task-tracker/config.yaml`
//! 3. **User** - `~/.task-tracker/config.yaml`
//! 4. **Environment** - `TASK_TRACKER_*` variables
//!
//! Command-line flags are applied on top by the binary.
//!
//! ## Environment Variables
//! - `TASK_TRACKER_CONFIG_PATH` - Explicit config file (replaces the file tiers)
//! - `TASK_TRACKER_DB_PATH` - Database path (`:memory:` for an in-memory store)
//! - `TASK_TRACKER_PORT` - HTTP port
//! - `TASK_TRACKER_BIND_ADDRESS` - HTTP bind address
//! - `TASK_TRACKER_USER_DIR` - User config dir (default: `~/.task-tracker`)
//! - `TASK_TRACKER_PROJECT_DIR` - Project config dir (default: `./task-tracker`)

mod loader;
mod merge;
mod types;

pub use loader::{ConfigLoader, ConfigPaths, ConfigTier, ENV_CONFIG_PATH};
pub use merge::deep_merge;
pub use types::*;
