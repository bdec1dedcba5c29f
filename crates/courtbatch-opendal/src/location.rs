//! Local and remote storage locations.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{StorageError, StorageResult};

/// URI scheme marking a location as remote.
pub const REMOTE_SCHEME: &str = "s3://";

/// A place in storage: a key in a remote bucket or a local path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Location {
    /// `s3://bucket/key`.
    Remote { bucket: String, key: String },
    /// Anything without the remote scheme.
    Local { path: String },
}

impl Location {
    /// Parses a location string.
    ///
    /// Strings starting with `s3://` are remote and must name a bucket. The
    /// key may be empty, meaning the bucket root.
    pub fn parse(input: &str) -> StorageResult<Self> {
        let Some(rest) = input.strip_prefix(REMOTE_SCHEME) else {
            if input.is_empty() {
                return Err(StorageError::invalid_path("empty location"));
            }
            return Ok(Self::Local {
                path: input.to_owned(),
            });
        };

        let (bucket, key) = rest.split_once('/').unwrap_or((rest, ""));
        if bucket.is_empty() {
            return Err(StorageError::invalid_path(format!(
                "missing bucket in '{input}'"
            )));
        }

        Ok(Self::Remote {
            bucket: bucket.to_owned(),
            key: key.trim_matches('/').to_owned(),
        })
    }

    /// Creates a local location.
    pub fn local(path: impl Into<String>) -> Self {
        Self::Local { path: path.into() }
    }

    /// Creates a remote location.
    pub fn remote(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self::Remote {
            bucket: bucket.into(),
            key: key.into().trim_matches('/').to_owned(),
        }
    }

    /// Returns `true` for `s3://` locations.
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote { .. })
    }

    /// The key or path part of the location.
    pub fn path(&self) -> &str {
        match self {
            Self::Remote { key, .. } => key,
            Self::Local { path } => path,
        }
    }

    /// Returns the location with `child` appended to its path.
    pub fn join(&self, child: &str) -> Self {
        let child = child.trim_start_matches('/');
        let join = |base: &str| {
            let base = base.trim_end_matches('/');
            if base.is_empty() {
                child.to_owned()
            } else {
                format!("{base}/{child}")
            }
        };

        match self {
            Self::Remote { bucket, key } => Self::Remote {
                bucket: bucket.clone(),
                key: join(key),
            },
            Self::Local { path } => Self::Local { path: join(path) },
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Remote { bucket, key } if key.is_empty() => write!(f, "{REMOTE_SCHEME}{bucket}"),
            Self::Remote { bucket, key } => write!(f, "{REMOTE_SCHEME}{bucket}/{key}"),
            Self::Local { path } => f.write_str(path),
        }
    }
}

impl FromStr for Location {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Location {
    type Error = StorageError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Location> for String {
    fn from(location: Location) -> Self {
        location.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_remote() {
        let location = Location::parse("s3://courts/inputs/pa.csv").unwrap();
        assert_eq!(location, Location::remote("courts", "inputs/pa.csv"));
        assert!(location.is_remote());
        assert_eq!(location.path(), "inputs/pa.csv");
    }

    #[test]
    fn parses_bucket_root() {
        let location = Location::parse("s3://courts").unwrap();
        assert_eq!(location, Location::remote("courts", ""));
        assert_eq!(location.to_string(), "s3://courts");
    }

    #[test]
    fn parses_local() {
        let location = Location::parse("data/inputs/pa.csv").unwrap();
        assert_eq!(location, Location::local("data/inputs/pa.csv"));
        assert!(!location.is_remote());
    }

    #[test]
    fn rejects_missing_bucket_and_empty_input() {
        assert!(matches!(
            Location::parse("s3:///key"),
            Err(StorageError::InvalidPath(_))
        ));
        assert!(Location::parse("").is_err());
    }

    #[test]
    fn display_round_trips() {
        for raw in ["s3://courts/results/pa/2024-01-01", "results/pa"] {
            assert_eq!(Location::parse(raw).unwrap().to_string(), raw);
        }
    }

    #[test]
    fn join_appends_segments() {
        let base = Location::parse("s3://courts/results/pa/").unwrap();
        assert_eq!(
            base.join("chunks").to_string(),
            "s3://courts/results/pa/chunks"
        );
        assert_eq!(
            Location::remote("courts", "").join("x.json").to_string(),
            "s3://courts/x.json"
        );
    }
}
