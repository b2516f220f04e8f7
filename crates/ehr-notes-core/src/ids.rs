//! Random version-4 identifiers for records and visits.
//!
//! Three strategies, best first:
//!
//! 1. [`IdStrategy::PlatformUuid`]: the `uuid` crate's v4 generator.
//! 2. [`IdStrategy::SecureBytes`]: 16 bytes from the OS random source, version
//!    and variant bits forced, hex-encoded.
//! 3. [`IdStrategy::Weak`]: a seeded non-cryptographic PRNG filling the v4
//!    template. Logs a warning every time it is used.
//!
//! The strategy is chosen once per [`IdGenerator`] and never re-checked.

use std::fmt;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::rngs::{OsRng, SmallRng};
use rand::{Rng, RngCore, SeedableRng};

const V4_TEMPLATE: &str = "xxxxxxxx-xxxx-4xxx-yxxx-xxxxxxxxxxxx";

/// How identifiers are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdStrategy {
    /// Delegate to the platform UUID generator
    PlatformUuid,
    /// Format raw bytes from the OS CSPRNG
    SecureBytes,
    /// Non-cryptographic fallback
    Weak,
}

impl IdStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdStrategy::PlatformUuid => "platform",
            IdStrategy::SecureBytes => "secure-bytes",
            IdStrategy::Weak => "weak",
        }
    }
}

impl fmt::Display for IdStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifier generator with a fixed strategy.
pub struct IdGenerator {
    strategy: IdStrategy,
    weak_rng: Mutex<SmallRng>,
}

impl IdGenerator {
    /// Test the OS random source and pick the best available strategy.
    pub fn detect() -> Self {
        let strategy = if os_random_available() {
            IdStrategy::PlatformUuid
        } else {
            log::warn!("secure randomness unavailable, identifiers will use the weak fallback");
            IdStrategy::Weak
        };
        log::debug!("identifier strategy: {}", strategy);
        Self::with_strategy(strategy)
    }

    /// Use a specific strategy without probing.
    pub fn with_strategy(strategy: IdStrategy) -> Self {
        Self {
            strategy,
            weak_rng: Mutex::new(SmallRng::seed_from_u64(clock_seed())),
        }
    }

    pub fn strategy(&self) -> IdStrategy {
        self.strategy
    }

    /// Produce a new identifier. Never fails.
    pub fn generate(&self) -> String {
        match self.strategy {
            IdStrategy::PlatformUuid => uuid::Uuid::new_v4().to_string(),
            IdStrategy::SecureBytes => match secure_bytes_id() {
                Some(id) => id,
                None => self.weak_id(),
            },
            IdStrategy::Weak => self.weak_id(),
        }
    }

    fn weak_id(&self) -> String {
        log::warn!("secure randomness unavailable, using weak identifier fallback");
        // A poisoned lock still holds a usable PRNG state.
        let mut rng = self
            .weak_rng
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        fill_template(&mut *rng)
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::detect()
    }
}

impl fmt::Debug for IdGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdGenerator")
            .field("strategy", &self.strategy)
            .finish_non_exhaustive()
    }
}

fn os_random_available() -> bool {
    let mut buf = [0u8; 16];
    OsRng.try_fill_bytes(&mut buf).is_ok()
}

fn secure_bytes_id() -> Option<String> {
    let mut bytes = [0u8; 16];
    if let Err(e) = OsRng.try_fill_bytes(&mut bytes) {
        log::debug!("OS random source failed: {}", e);
        return None;
    }
    Some(format_v4(bytes))
}

/// Force version 4 and the RFC 4122 variant, then hyphenate 8-4-4-4-12.
fn format_v4(mut bytes: [u8; 16]) -> String {
    bytes[6] = (bytes[6] & 0x0f) | 0x40;
    bytes[8] = (bytes[8] & 0x3f) | 0x80;

    let hex = hex::encode(bytes);
    format!(
        "{}-{}-{}-{}-{}",
        &hex[0..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..32]
    )
}

fn fill_template<R: Rng>(rng: &mut R) -> String {
    V4_TEMPLATE
        .chars()
        .map(|c| match c {
            'x' => hex_digit(rng.gen_range(0..16)),
            'y' => hex_digit((rng.gen_range(0..16) & 0x3) | 0x8),
            other => other,
        })
        .collect()
}

fn hex_digit(nibble: u8) -> char {
    char::from_digit(u32::from(nibble), 16).unwrap_or('0')
}

fn clock_seed() -> u64 {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0);
    nanos ^ u64::from(std::process::id()).rotate_left(32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn assert_v4(id: &str) {
        assert_eq!(id.len(), 36, "bad length: {}", id);
        for (i, c) in id.chars().enumerate() {
            match i {
                8 | 13 | 18 | 23 => assert_eq!(c, '-', "{}", id),
                14 => assert_eq!(c, '4', "{}", id),
                19 => assert!(matches!(c, '8' | '9' | 'a' | 'b'), "{}", id),
                _ => assert!(c.is_ascii_hexdigit() && !c.is_ascii_uppercase(), "{}", id),
            }
        }
    }

    #[test]
    fn test_detect_prefers_platform() {
        let ids = IdGenerator::detect();
        assert_eq!(ids.strategy(), IdStrategy::PlatformUuid);
    }

    #[test]
    fn test_every_strategy_emits_v4() {
        for strategy in [IdStrategy::PlatformUuid, IdStrategy::SecureBytes, IdStrategy::Weak] {
            let ids = IdGenerator::with_strategy(strategy);
            for _ in 0..50 {
                assert_v4(&ids.generate());
            }
        }
    }

    #[test]
    fn test_ids_are_distinct() {
        let ids = IdGenerator::with_strategy(IdStrategy::Weak);
        let a = ids.generate();
        let b = ids.generate();
        assert_ne!(a, b);
    }

    #[test]
    fn test_format_v4_known_bytes() {
        let id = format_v4([0xff; 16]);
        assert_eq!(id, "ffffffff-ffff-4fff-bfff-ffffffffffff");

        let id = format_v4([0x00; 16]);
        assert_eq!(id, "00000000-0000-4000-8000-000000000000");
    }

    struct CaptureLogger {
        lines: Mutex<Vec<String>>,
    }

    impl log::Log for CaptureLogger {
        fn enabled(&self, metadata: &log::Metadata) -> bool {
            metadata.level() <= log::Level::Warn
        }

        fn log(&self, record: &log::Record) {
            if self.enabled(record.metadata()) {
                let mut lines = self.lines.lock().unwrap_or_else(|p| p.into_inner());
                lines.push(format!("{} {}", record.level(), record.args()));
            }
        }

        fn flush(&self) {}
    }

    static CAPTURE: CaptureLogger = CaptureLogger {
        lines: Mutex::new(Vec::new()),
    };

    #[test]
    fn test_weak_fallback_warns() {
        let _ = log::set_logger(&CAPTURE);
        log::set_max_level(log::LevelFilter::Warn);

        assert_v4(&IdGenerator::with_strategy(IdStrategy::Weak).generate());

        let lines = CAPTURE.lines.lock().unwrap();
        assert!(
            lines
                .iter()
                .any(|l| l.starts_with("WARN") && l.contains("weak identifier fallback")),
            "{:?}",
            *lines
        );
    }

    proptest! {
        #[test]
        fn prop_format_v4_always_valid(bytes in any::<[u8; 16]>()) {
            assert_v4(&format_v4(bytes));
        }

        #[test]
        fn prop_weak_template_always_valid(seed in any::<u64>()) {
            let mut rng = SmallRng::seed_from_u64(seed);
            assert_v4(&fill_template(&mut rng));
        }
    }
}
