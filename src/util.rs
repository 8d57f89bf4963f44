use crate::b64;
use crate::crypto;
use crate::error::*;
use std::convert::TryFrom;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Create a random string with `bytes` bytes of entropy.  The string
/// is base64-encoded. so it will be longer than bytes characters.
pub(crate) fn random_string(bytes: usize) -> Result<String> {
    let mut bytes = vec![0u8; bytes];
    crypto::rand_bytes(&mut bytes)?;
    Ok(b64::encode(&bytes))
}

/// Whole seconds since the epoch; times before the epoch collapse to zero.
pub(crate) fn unix_secs(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

pub(crate) fn from_unix_secs(secs: u64) -> Option<SystemTime> {
    UNIX_EPOCH.checked_add(Duration::from_secs(secs))
}

/// Shift `time` by a signed number of milliseconds, saturating at the epoch.
pub(crate) fn offset_by_ms(time: SystemTime, offset_ms: i64) -> SystemTime {
    let delta = Duration::from_millis(offset_ms.unsigned_abs());
    if offset_ms >= 0 {
        time.checked_add(delta).unwrap_or(time)
    } else {
        time.checked_sub(delta).unwrap_or(UNIX_EPOCH)
    }
}

/// Milliseconds from `from` to `to`, negative when `to` is earlier.  None if the
/// difference does not fit in an `i64`.
pub(crate) fn signed_ms_between(from: SystemTime, to: SystemTime) -> Option<i64> {
    match to.duration_since(from) {
        Ok(d) => i64::try_from(d.as_millis()).ok(),
        Err(e) => i64::try_from(e.duration().as_millis()).ok().map(|ms| -ms),
    }
}
