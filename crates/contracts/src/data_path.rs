//! DataPath - Cheap-to-clone, slash-delimited data unit path
//!
//! Uses Arc<str> internally for O(1) clone operations.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Borrow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::Arc;

use crate::TelemetryError;

/// Path separator between group segments and the unit name.
pub const PATH_SEPARATOR: char = '/';

/// Full path of a data unit, e.g. `power/battery_voltage`.
///
/// The last segment is the unit name, all leading segments name the groups
/// the unit hangs under. A normalized path has no empty segments and no
/// surrounding whitespace.
///
/// # Examples
/// ```
/// use contracts::DataPath;
///
/// let path = DataPath::parse(" airstate/angles/roll ").unwrap();
/// assert_eq!(path.as_str(), "airstate/angles/roll");
/// assert_eq!(path.basename(), "roll");
/// assert_eq!(path.group_path(), Some("airstate/angles"));
/// ```
#[derive(Clone, Default)]
pub struct DataPath(Arc<str>);

impl DataPath {
    /// Normalize and validate a path.
    ///
    /// A unit must live inside at least one group, so a path needs two or more
    /// non-empty segments.
    pub fn parse(raw: &str) -> Result<Self, TelemetryError> {
        let trimmed = raw.trim();
        let segments: Vec<&str> = trimmed.split(PATH_SEPARATOR).map(str::trim).collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(TelemetryError::invalid_path(raw, "empty path segment"));
        }
        if segments.len() < 2 {
            return Err(TelemetryError::invalid_path(
                raw,
                "a data unit needs at least one enclosing group",
            ));
        }
        Ok(Self(Arc::from(segments.join("/"))))
    }

    /// Join a group path and a unit name.
    pub fn join(group: &str, name: &str) -> Result<Self, TelemetryError> {
        Self::parse(&format!("{group}{PATH_SEPARATOR}{name}"))
    }

    /// Get the underlying string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Iterate the path segments, groups first.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split(PATH_SEPARATOR)
    }

    /// Unit name (last segment).
    pub fn basename(&self) -> &str {
        self.0
            .rsplit_once(PATH_SEPARATOR)
            .map(|(_, name)| name)
            .unwrap_or(&self.0)
    }

    /// Path of the enclosing group.
    pub fn group_path(&self) -> Option<&str> {
        self.0.rsplit_once(PATH_SEPARATOR).map(|(group, _)| group)
    }

    /// Same group, different unit name.
    pub fn with_basename(&self, name: &str) -> Result<Self, TelemetryError> {
        match self.group_path() {
            Some(group) => Self::join(group, name),
            None => Err(TelemetryError::invalid_path(self.as_str(), "path has no group")),
        }
    }
}

impl Deref for DataPath {
    type Target = str;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for DataPath {
    #[inline]
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for DataPath {
    #[inline]
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DataPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for DataPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DataPath({:?})", self.0)
    }
}

impl PartialEq for DataPath {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0 == other.0
    }
}

impl Eq for DataPath {}

impl PartialEq<str> for DataPath {
    #[inline]
    fn eq(&self, other: &str) -> bool {
        self.0.as_ref() == other
    }
}

impl PartialEq<&str> for DataPath {
    #[inline]
    fn eq(&self, other: &&str) -> bool {
        self.0.as_ref() == *other
    }
}

// Ordering follows the string so a BTreeMap<DataPath, _> iterates in sorted-path order.
impl PartialOrd for DataPath {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DataPath {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.as_ref().cmp(other.0.as_ref())
    }
}

// Hash - same as str hash for map lookups by &str
impl Hash for DataPath {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state)
    }
}

impl Serialize for DataPath {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for DataPath {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
