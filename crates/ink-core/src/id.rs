use lasso::{Spur, ThreadedRodeo};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicU64, Ordering};

/// Global string interner for node and group IDs.
static INTERNER: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);

/// Per-session counter appended to generated ids so two ids minted in the
/// same millisecond never collide.
static COUNTER: AtomicU64 = AtomicU64::new(0);

/// Wall-clock milliseconds since the Unix epoch. The browser has no
/// `SystemTime`, so wasm reads the JS clock.
#[cfg(all(target_arch = "wasm32", target_os = "unknown"))]
fn now_millis() -> u64 {
    js_sys::Date::now() as u64
}

#[cfg(not(all(target_arch = "wasm32", target_os = "unknown")))]
fn now_millis() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Mint `{prefix}-{millis}-{n}`.
fn mint(prefix: &str) -> String {
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}-{}-{n}", now_millis())
}

/// First purely numeric `-`-separated segment, read as a creation timestamp.
fn embedded_timestamp(s: &str) -> Option<u64> {
    s.split('-')
        .find(|seg| !seg.is_empty() && seg.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|seg| seg.parse().ok())
}

macro_rules! interned_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(Spur);

        impl $name {
            /// Intern a string as an id, or return the existing one.
            pub fn intern(s: &str) -> Self {
                $name(INTERNER.get_or_intern(s))
            }

            /// Resolve back to a string slice.
            pub fn as_str(&self) -> &str {
                INTERNER.resolve(&self.0)
            }

            /// Generate a fresh id, unique within this session.
            pub fn generate() -> Self {
                Self::intern(&mint($prefix))
            }

            /// Generate a fresh id under a custom prefix (e.g. `n-story`).
            pub fn with_prefix(prefix: &str) -> Self {
                Self::intern(&mint(prefix))
            }

            /// Creation timestamp (ms) embedded in generated ids, if any.
            pub fn timestamp(&self) -> Option<u64> {
                embedded_timestamp(self.as_str())
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "#{}", self.as_str())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                Ok($name::intern(&s))
            }
        }
    };
}

interned_id!(
    /// Identifier of a node on the canvas. Interned: 4 bytes, Copy, O(1) Eq/Hash.
    NodeId,
    "n"
);

interned_id!(
    /// Identifier of a group overlay.
    GroupId,
    "g"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_roundtrip() {
        let a = NodeId::intern("n-prompt");
        let b = NodeId::intern("n-prompt");
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "n-prompt");
    }

    #[test]
    fn generated_ids_are_unique() {
        let a = NodeId::generate();
        let b = NodeId::generate();
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("n-"));
        assert!(GroupId::generate().as_str().starts_with("g-"));
    }

    #[test]
    fn timestamp_is_first_numeric_segment() {
        assert_eq!(NodeId::intern("n-1700000000000-42").timestamp(), Some(1_700_000_000_000));
        assert_eq!(NodeId::intern("n-story-1700000000123-3").timestamp(), Some(1_700_000_000_123));
        assert_eq!(NodeId::intern("custom").timestamp(), None);
        assert!(NodeId::generate().timestamp().is_some());
    }

    #[test]
    fn generated_ids_embed_the_current_time() {
        let before = now_millis();
        let stamp = NodeId::with_prefix("n-story").timestamp().unwrap();
        let after = now_millis();
        assert!(before > 1_600_000_000_000);
        assert!((before..=after).contains(&stamp));
        assert!(GroupId::generate().timestamp().unwrap() >= stamp);
    }
}
