//! Constants for the request module (timeouts, retry defaults).

use std::time::Duration;

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default number of extra attempts after a failed call.
pub const DEFAULT_RETRY_COUNT: u32 = 0;

/// Default pause between attempts (immediate re-invocation).
pub const DEFAULT_RETRY_DELAY: Duration = Duration::ZERO;

/// Reason recorded when a call is aborted by a newer call on the same hook.
pub const SUPERSEDED_REASON: &str = "superseded by a newer request";

/// Reason recorded when a call is aborted because its scope unmounted.
pub const UNMOUNTED_REASON: &str = "component unmounted";

/// Reason recorded by a plain [`cancel`](crate::request::UseRequest::cancel).
pub const MANUAL_CANCEL_REASON: &str = "cancelled by caller";
