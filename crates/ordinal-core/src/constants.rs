//! Fixed limits and defaults for sequence allocation.
//!
//! Tiger Style: Constants are fixed and immutable, enforced at compile time.
//! Each constant has explicit bounds to prevent unbounded resource allocation.

// ============================================================================
// Counter Identity
// ============================================================================

/// Maximum length of an owner or field name in bytes.
///
/// Owner and field together form the counter's identity in the store, so both
/// are bounded to keep keys small.
pub const MAX_NAME_LENGTH: u32 = 256;

/// Field tracked when a configuration names only its owner.
pub const DEFAULT_SEQUENCE_FIELD: &str = "_id";

/// First value handed out by a counter that does not configure one.
pub const DEFAULT_START_VALUE: i64 = 0;

/// Step applied on each consumption when none is configured.
pub const DEFAULT_INCREMENT: i64 = 1;

/// Reserved collection holding counter rows.
///
/// The leading underscores keep it apart from user collections.
pub const DEFAULT_COUNTER_COLLECTION: &str = "__ordinal_counters";

// ============================================================================
// Readiness Wait
// ============================================================================

/// Re-check interval while a counter is bootstrapping (5 ms).
pub const DEFAULT_READINESS_POLL_INTERVAL_MS: u64 = 5;

/// Upper bound on how long a consumer waits for a counter to become ready (10 s).
pub const DEFAULT_READINESS_TIMEOUT_MS: u64 = 10_000;

/// Largest accepted readiness poll interval (1 s).
pub const MAX_READINESS_POLL_INTERVAL_MS: u64 = 1_000;

/// Largest accepted readiness timeout (5 min).
pub const MAX_READINESS_TIMEOUT_MS: u64 = 300_000;

// ============================================================================
// Arbiter
// ============================================================================

/// Default mailbox depth of a per-counter arbiter task.
pub const DEFAULT_ARBITER_QUEUE_DEPTH: u32 = 1_024;

/// Largest accepted arbiter mailbox depth.
pub const MAX_ARBITER_QUEUE_DEPTH: u32 = 65_536;

// ============================================================================
// Compile-time assertions
// ============================================================================

const _: () = assert!(MAX_NAME_LENGTH > 0);
const _: () = assert!(DEFAULT_INCREMENT != 0);
const _: () = assert!(DEFAULT_READINESS_POLL_INTERVAL_MS > 0);
const _: () = assert!(DEFAULT_READINESS_POLL_INTERVAL_MS <= MAX_READINESS_POLL_INTERVAL_MS);
const _: () = assert!(DEFAULT_READINESS_POLL_INTERVAL_MS < DEFAULT_READINESS_TIMEOUT_MS);
const _: () = assert!(DEFAULT_READINESS_TIMEOUT_MS <= MAX_READINESS_TIMEOUT_MS);
const _: () = assert!(DEFAULT_ARBITER_QUEUE_DEPTH > 0);
const _: () = assert!(DEFAULT_ARBITER_QUEUE_DEPTH <= MAX_ARBITER_QUEUE_DEPTH);
const _: () = assert!(DEFAULT_COUNTER_COLLECTION.len() as u32 <= MAX_NAME_LENGTH);
