//! Record key generation.

use crate::error::{CoreError, CoreResult};
use crate::key::ItemKey;
use parking_lot::Mutex;
use rand::rngs::OsRng;
use rand::RngCore;
use std::time::{SystemTime, UNIX_EPOCH};

/// Largest timestamp that fits the 48-bit time component.
pub const MAX_TIMESTAMP_MS: u64 = (1 << 48) - 1;

/// Generates a key for the current time with fresh OS randomness.
///
/// Keys from different milliseconds sort by time. Within one millisecond
/// order is random; use [`MonotonicKeyGenerator`] when that matters.
///
/// # Errors
///
/// Fails if the clock is before the epoch or past the 48-bit range, or if
/// the operating system cannot supply randomness.
pub fn generate() -> CoreResult<ItemKey> {
    generate_at(now_ms()?)
}

/// Generates a key for a given millisecond timestamp.
///
/// # Errors
///
/// Fails if `timestamp_ms` exceeds [`MAX_TIMESTAMP_MS`] or the operating
/// system cannot supply randomness.
pub fn generate_at(timestamp_ms: u64) -> CoreResult<ItemKey> {
    if timestamp_ms > MAX_TIMESTAMP_MS {
        return Err(CoreError::key_generation(format!(
            "timestamp {timestamp_ms} exceeds 48 bits"
        )));
    }
    let mut random = [0u8; 10];
    OsRng
        .try_fill_bytes(&mut random)
        .map_err(|e| CoreError::key_generation(e.to_string()))?;
    Ok(ItemKey::from_parts(timestamp_ms, random))
}

fn now_ms() -> CoreResult<u64> {
    let elapsed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| CoreError::key_generation(e.to_string()))?;
    u64::try_from(elapsed.as_millis())
        .map_err(|_| CoreError::key_generation("clock out of range"))
}

/// Generator whose keys strictly increase, even within a millisecond or
/// across a clock step backwards.
///
/// When the clock has not advanced past the last key, the last key's
/// random component is incremented instead of drawing new randomness.
#[derive(Debug, Default)]
pub struct MonotonicKeyGenerator {
    last: Mutex<Option<ItemKey>>,
}

impl MonotonicKeyGenerator {
    /// Creates a generator with no history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Generates the next key.
    ///
    /// # Errors
    ///
    /// Fails for the reasons [`generate`] does, or when more keys are
    /// requested in one millisecond than the random component can hold.
    pub fn generate(&self) -> CoreResult<ItemKey> {
        self.generate_at(now_ms()?)
    }

    /// Generates the next key as if the clock read `timestamp_ms`.
    pub fn generate_at(&self, timestamp_ms: u64) -> CoreResult<ItemKey> {
        let mut last = self.last.lock();
        let next = match *last {
            Some(prev) if prev.timestamp_ms() >= timestamp_ms => prev
                .increment()
                .ok_or_else(|| CoreError::key_generation("random component exhausted"))?,
            _ => generate_at(timestamp_ms)?,
        };
        *last = Some(next);
        Ok(next)
    }
}
