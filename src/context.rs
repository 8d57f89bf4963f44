use crate::error::*;
use crate::util::{offset_by_ms, random_string};
use std::fmt;
use std::time::SystemTime;

/// A source of the current time.  Implement this to control time in tests or to use a clock
/// other than the system clock.
pub trait Clock: Send + Sync {
    fn now(&self) -> SystemTime;
}

/// The system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// A clock that always reads the same time.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub SystemTime);

impl Clock for FixedClock {
    fn now(&self) -> SystemTime {
        self.0
    }
}

/// A source of nonces for outgoing requests and messages.
pub trait NonceGenerator: Send + Sync {
    fn nonce(&self) -> Result<String>;
}

/// Generates six random bytes from the configured `Cryptographer`, base64-encoded.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomNonce;

impl NonceGenerator for RandomNonce {
    fn nonce(&self) -> Result<String> {
        random_string(6)
    }
}

pub(crate) static SYSTEM_CLOCK: SystemClock = SystemClock;
static RANDOM_NONCE: RandomNonce = RandomNonce;

/// Context for Hawk client operations.  This contains the information that does not change
/// from request to request: where time and nonces come from, and the offset between the local
/// clock and the server's.
///
/// Most users will use the default context, via the free functions in `client`.
#[derive(Clone, Copy)]
pub struct Context<'a> {
    pub clock: &'a dyn Clock,
    pub nonces: &'a dyn NonceGenerator,

    /// Milliseconds added to the clock's reading, as learned from `client::clock_offset`
    pub localtime_offset_ms: i64,
}

impl<'a> Context<'a> {
    /// The current time, adjusted by `localtime_offset_ms`.
    pub fn now(&self) -> SystemTime {
        offset_by_ms(self.clock.now(), self.localtime_offset_ms)
    }

    pub fn nonce(&self) -> Result<String> {
        self.nonces.nonce()
    }
}

impl<'a> Default for Context<'a> {
    fn default() -> Self {
        Context {
            clock: &SYSTEM_CLOCK,
            nonces: &RANDOM_NONCE,
            localtime_offset_ms: 0,
        }
    }
}

impl<'a> fmt::Debug for Context<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Context")
            .field("localtime_offset_ms", &self.localtime_offset_ms)
            .finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::time::{Duration, UNIX_EPOCH};

    struct CountingNonce(std::sync::atomic::AtomicUsize);

    impl NonceGenerator for CountingNonce {
        fn nonce(&self) -> Result<String> {
            let n = self.0.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Ok(format!("n{}", n))
        }
    }

    #[test]
    fn test_fixed_clock_with_offset() {
        let clock = FixedClock(UNIX_EPOCH + Duration::from_secs(1000));
        let context = Context {
            clock: &clock,
            localtime_offset_ms: -1500,
            ..Default::default()
        };
        assert_eq!(context.now(), UNIX_EPOCH + Duration::from_millis(998_500));
    }

    #[test]
    fn test_custom_nonces() {
        let nonces = CountingNonce(Default::default());
        let context = Context {
            nonces: &nonces,
            ..Default::default()
        };
        assert_eq!(context.nonce().unwrap(), "n0");
        assert_eq!(context.nonce().unwrap(), "n1");
    }

    #[cfg(any(feature = "use_ring", feature = "use_openssl"))]
    #[test]
    fn test_random_nonce() {
        let context = Context::default();
        let nonce = context.nonce().unwrap();
        assert_eq!(nonce.len(), 8);
        assert_ne!(nonce, context.nonce().unwrap());
    }
}
