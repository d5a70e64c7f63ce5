//! Canonical schema constants for structured logging
//!
//! These constants keep field names and event names consistent between the
//! logging macros, the test capture layer, and assertions.

pub const FIELD_COMPONENT: &str = "component";
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";
pub const FIELD_DURATION_MS: &str = "duration_ms";

// Protocol fields
pub const FIELD_SNAPSHOT_PATH: &str = "snapshot_path";
pub const FIELD_BOOTSTRAP_PATH: &str = "bootstrap_path";
pub const FIELD_SHOULD_RUN_SEED: &str = "should_run_seed";
pub const FIELD_MIGRATION_COUNT: &str = "migration_count";

// Error fields
pub const FIELD_ERR_KIND: &str = "err_kind";
pub const FIELD_ERR_CODE: &str = "err_code";

// Canonical event names
pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";
