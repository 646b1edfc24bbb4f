//! Key patterns for Epics, Features, and Tasks.
//!
//! The regexes here are the single source of truth for key shape: every
//! other component — PatternMatcher, MetadataParser, ConflictDetector, the
//! storage schema's `CHECK`-free validation — goes through these
//! constructors rather than re-deriving the pattern.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Epic keys reserved outside the `E\d{2}` numbering scheme.
pub const RESERVED_EPIC_KEYS: &[&str] = &["tech-debt", "bugs", "change-cards"];

static EPIC_NUMBERED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^E\d{2}$").unwrap());
static FEATURE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(E\d{2})-(F\d{2})$").unwrap());
static TASK_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^T-(E\d{2})-(F\d{2})-(\d{3})$").unwrap());

/// Exposed for `shark sync`'s JSON metadata block (`patterns.epic` etc.).
pub const EPIC_PATTERN_SRC: &str = r"^E\d{2}$|^(tech-debt|bugs|change-cards)$";
pub const FEATURE_PATTERN_SRC: &str = r"^E\d{2}-F\d{2}$";
pub const TASK_PATTERN_SRC: &str = r"^T-E\d{2}-F\d{2}-\d{3}\.md$";

/// A key failed to match the kind's pattern.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[error("'{value}' does not match the {kind} key pattern ({pattern})")]
pub struct KeyError {
    pub kind: &'static str,
    pub value: String,
    pub pattern: &'static str,
}

macro_rules! newtype_key {
    ($name:ident, $kind:literal) => {
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

newtype_key!(EpicKey, "epic");
newtype_key!(FeatureKey, "feature");
newtype_key!(TaskKey, "task");

impl EpicKey {
    pub fn parse(value: &str) -> Result<Self, KeyError> {
        if EPIC_NUMBERED.is_match(value) || RESERVED_EPIC_KEYS.contains(&value) {
            Ok(Self(value.to_string()))
        } else {
            Err(KeyError {
                kind: "epic",
                value: value.to_string(),
                pattern: EPIC_PATTERN_SRC,
            })
        }
    }
}

impl TryFrom<String> for EpicKey {
    type Error = KeyError;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl FeatureKey {
    pub fn parse(value: &str) -> Result<Self, KeyError> {
        if FEATURE_PATTERN.is_match(value) {
            Ok(Self(value.to_string()))
        } else {
            Err(KeyError {
                kind: "feature",
                value: value.to_string(),
                pattern: FEATURE_PATTERN_SRC,
            })
        }
    }

    /// The owning Epic's key, e.g. `E02-F01` -> `E02`.
    pub fn epic_key(&self) -> EpicKey {
        let caps = FEATURE_PATTERN.captures(&self.0).expect("validated at construction");
        EpicKey(caps[1].to_string())
    }
}

impl TryFrom<String> for FeatureKey {
    type Error = KeyError;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl TaskKey {
    pub fn parse(value: &str) -> Result<Self, KeyError> {
        if TASK_PATTERN.is_match(value) {
            Ok(Self(value.to_string()))
        } else {
            Err(KeyError {
                kind: "task",
                value: value.to_string(),
                pattern: TASK_PATTERN_SRC,
            })
        }
    }

    /// The owning Feature's key, e.g. `T-E02-F01-007` -> `E02-F01`.
    pub fn feature_key(&self) -> FeatureKey {
        let caps = TASK_PATTERN.captures(&self.0).expect("validated at construction");
        FeatureKey(format!("{}-{}", &caps[1], &caps[2]))
    }

    /// The owning Epic's key, e.g. `T-E02-F01-007` -> `E02`.
    pub fn epic_key(&self) -> EpicKey {
        let caps = TASK_PATTERN.captures(&self.0).expect("validated at construction");
        EpicKey(caps[1].to_string())
    }
}

impl TryFrom<String> for TaskKey {
    type Error = KeyError;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

/// Matches the task filename pattern `T-E\d{2}-F\d{2}-\d{3}\.md`, extracting
/// the key without the extension. Used by the PatternMatcher's filename rule.
pub fn task_key_from_filename(filename: &str) -> Option<TaskKey> {
    let stem = filename.strip_suffix(".md")?;
    TaskKey::parse(stem).ok()
}

/// Matches a feature directory name against `E\d{2}-F\d{2}-[a-z0-9-]+`,
/// returning the feature key portion.
pub fn feature_key_from_dirname(dirname: &str) -> Option<FeatureKey> {
    static DIR_PATTERN: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"^(E\d{2}-F\d{2})-[a-z0-9-]+$").unwrap());
    let caps = DIR_PATTERN.captures(dirname)?;
    FeatureKey::parse(&caps[1]).ok()
}

/// Matches an epic directory name against `E\d{2}-[a-z0-9-]+` or a reserved
/// literal directory name, returning the epic key portion.
pub fn epic_key_from_dirname(dirname: &str) -> Option<EpicKey> {
    static DIR_PATTERN: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"^(E\d{2})-[a-z0-9-]+$").unwrap());
    if let Some(caps) = DIR_PATTERN.captures(dirname) {
        return EpicKey::parse(&caps[1]).ok();
    }
    if RESERVED_EPIC_KEYS.contains(&dirname) {
        return EpicKey::parse(dirname).ok();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epic_key_accepts_numbered_and_reserved() {
        assert!(EpicKey::parse("E01").is_ok());
        assert!(EpicKey::parse("E99").is_ok());
        assert!(EpicKey::parse("tech-debt").is_ok());
        assert!(EpicKey::parse("bugs").is_ok());
        assert!(EpicKey::parse("change-cards").is_ok());
        assert!(EpicKey::parse("E1").is_err());
        assert!(EpicKey::parse("e01").is_err());
        assert!(EpicKey::parse("random").is_err());
    }

    #[test]
    fn feature_key_derives_epic() {
        let f = FeatureKey::parse("E02-F01").unwrap();
        assert_eq!(f.epic_key().as_str(), "E02");
        assert!(FeatureKey::parse("E02-F1").is_err());
        assert!(FeatureKey::parse("F01").is_err());
    }

    #[test]
    fn task_key_derives_feature_and_epic() {
        let t = TaskKey::parse("T-E02-F01-007").unwrap();
        assert_eq!(t.feature_key().as_str(), "E02-F01");
        assert_eq!(t.epic_key().as_str(), "E02");
        assert!(TaskKey::parse("T-E02-F01-07").is_err());
    }

    #[test]
    fn task_key_from_filename_strips_extension() {
        assert_eq!(
            task_key_from_filename("T-E01-F01-001.md").unwrap().as_str(),
            "T-E01-F01-001"
        );
        assert!(task_key_from_filename("T-E01-F01-001.txt").is_none());
        assert!(task_key_from_filename("notes.md").is_none());
    }

    #[test]
    fn feature_and_epic_dirname_extraction() {
        assert_eq!(
            feature_key_from_dirname("E01-F01-login").unwrap().as_str(),
            "E01-F01"
        );
        assert_eq!(epic_key_from_dirname("E01-auth").unwrap().as_str(), "E01");
        assert_eq!(epic_key_from_dirname("tech-debt").unwrap().as_str(), "tech-debt");
        assert!(epic_key_from_dirname("auth").is_none());
    }
}
