//! Boundary logging macros
//!
//! The layer that owns an operation logs its start, its end, and its failure.
//! Everything beneath it uses `tracing::debug!` only.

/// Log the start of an operation
///
/// ```
/// # use snapmig_core::log_op_start;
/// log_op_start!("prepare_database");
/// log_op_start!("prepare_database", should_run_seed = true);
/// ```
#[macro_export]
macro_rules! log_op_start {
    ($op:expr) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::core_types::schema::EVENT_START,
        );
    };
    ($op:expr, $($field:tt)*) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::core_types::schema::EVENT_START,
            $($field)*
        );
    };
}

/// Log the successful end of an operation
///
/// ```
/// # use snapmig_core::log_op_end;
/// log_op_end!("prepare_database", duration_ms = 42);
/// ```
#[macro_export]
macro_rules! log_op_end {
    ($op:expr, duration_ms = $duration:expr) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::core_types::schema::EVENT_END,
            duration_ms = $duration,
        );
    };
    ($op:expr, duration_ms = $duration:expr, $($field:tt)*) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::core_types::schema::EVENT_END,
            duration_ms = $duration,
            $($field)*
        );
    };
}

/// Log an operation failure with its kind and stable code
///
/// ```
/// # use snapmig_core::{log_op_error, errors::SnapError};
/// let err = SnapError::config("missing [database] table");
/// log_op_error!("prepare_database", &err, duration_ms = 10);
/// ```
#[macro_export]
macro_rules! log_op_error {
    ($op:expr, $err:expr, duration_ms = $duration:expr) => {{
        let snap_err: &$crate::errors::SnapError = $err;
        tracing::error!(
            component = module_path!(),
            op = $op,
            event = $crate::core_types::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err_kind = ?snap_err.kind(),
            err_code = snap_err.code(),
            error = %snap_err,
        );
    }};
    ($op:expr, $err:expr, duration_ms = $duration:expr, $($field:tt)*) => {{
        let snap_err: &$crate::errors::SnapError = $err;
        tracing::error!(
            component = module_path!(),
            op = $op,
            event = $crate::core_types::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err_kind = ?snap_err.kind(),
            err_code = snap_err.code(),
            error = %snap_err,
            $($field)*
        );
    }};
}
