//! Pure counter arithmetic.
//!
//! Deterministic functions with no I/O, shared by every store and by the
//! allocator so that the start/step rules live in one place.
//!
//! All arithmetic is checked: `None` means the operation would overflow and
//! must be rejected without touching the stored row.

/// Count stored in a freshly created row so that the first consumption
/// returns `start_value`.
#[inline]
pub fn compute_initial_count(start_value: i64, increment: i64) -> Option<i64> {
    start_value.checked_sub(increment)
}

/// Count after applying `delta` to `count`.
#[inline]
pub fn compute_incremented_count(count: i64, delta: i64) -> Option<i64> {
    count.checked_add(delta)
}

/// Value a consumption would return right now.
///
/// With no row yet, the first consumption returns `start_value`.
#[inline]
pub fn compute_peek_value(stored_count: Option<i64>, start_value: i64, increment: i64) -> Option<i64> {
    match stored_count {
        Some(count) => count.checked_add(increment),
        None => Some(start_value),
    }
}

/// Whether a name is usable as an owner or field.
#[inline]
pub fn is_valid_name(name: &str, max_len: u32) -> bool {
    !name.is_empty() && name.len() <= max_len as usize
}
