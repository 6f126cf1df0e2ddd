use std::cmp::Ordering;
use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A dotted numeric version such as `0.7` or `1.1.3`.
///
/// Two to four components (`major.minor[.build[.revision]]`) are accepted.
/// Versions order component by component, and a missing component sorts
/// before any present one, so `1.0 < 1.0.0 < 1.0.1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SoftwareVersion {
    pub major: u32,
    pub minor: u32,
    pub build: Option<u32>,
    pub revision: Option<u32>,
}

impl SoftwareVersion {
    pub const fn new(major: u32, minor: u32) -> Self {
        Self {
            major,
            minor,
            build: None,
            revision: None,
        }
    }

    pub const fn with_build(major: u32, minor: u32, build: u32) -> Self {
        Self {
            major,
            minor,
            build: Some(build),
            revision: None,
        }
    }
}

impl Ord for SoftwareVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.major
            .cmp(&other.major)
            .then(self.minor.cmp(&other.minor))
            .then(self.build.cmp(&other.build))
            .then(self.revision.cmp(&other.revision))
    }
}

impl PartialOrd for SoftwareVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Display for SoftwareVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)?;
        if let Some(build) = self.build {
            write!(f, ".{}", build)?;
            if let Some(revision) = self.revision {
                write!(f, ".{}", revision)?;
            }
        }
        Ok(())
    }
}

impl FromStr for SoftwareVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = s
            .trim()
            .split('.')
            .map(|p| p.parse::<u32>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| format!("Invalid version: {}", s))?;

        match parts.as_slice() {
            [major, minor] => Ok(Self::new(*major, *minor)),
            [major, minor, build] => Ok(Self::with_build(*major, *minor, *build)),
            [major, minor, build, revision] => Ok(Self {
                major: *major,
                minor: *minor,
                build: Some(*build),
                revision: Some(*revision),
            }),
            _ => Err(format!("Invalid version: {}", s)),
        }
    }
}

impl TryFrom<String> for SoftwareVersion {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SoftwareVersion> for String {
    fn from(value: SoftwareVersion) -> Self {
        value.to_string()
    }
}

/// Versions reported by the backend's software endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerVersions {
    /// Minimum client version the backend considers current.
    pub client_version: SoftwareVersion,
    /// Major version of the backend API.
    pub backend_major_version: u32,
}

impl ServerVersions {
    /// Stand-in for servers that predate the versions endpoint.
    ///
    /// Those servers answer `404`. Their behaviour matches client `0.7` and
    /// backend major version `1`; these values are a fixed compatibility
    /// contract and must not change.
    pub const LEGACY: ServerVersions = ServerVersions {
        client_version: SoftwareVersion::new(0, 7),
        backend_major_version: 1,
    };
}

/// The versions this build of the client was made for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalVersions {
    pub client_version: SoftwareVersion,
    pub backend_major_version: u32,
}

impl Default for LocalVersions {
    fn default() -> Self {
        Self {
            client_version: crate::CLIENT_VERSION,
            backend_major_version: crate::BACKEND_MAJOR_VERSION,
        }
    }
}

/// The four possible outcomes of a compatibility check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Compatibility {
    Compatible,
    CompatibleOutdated,
    Incompatible,
    IncompatibleOutdated,
}

impl Display for Compatibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Compatibility::Compatible => write!(f, "Compatible"),
            Compatibility::CompatibleOutdated => write!(f, "Compatible, client update available"),
            Compatibility::Incompatible => write!(f, "Incompatible backend"),
            Compatibility::IncompatibleOutdated => write!(f, "Incompatible backend, client update available"),
        }
    }
}

/// Result of comparing local and reported versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompatibilityReport {
    /// Local and reported backend major versions are equal.
    pub backend_compatible: bool,
    /// Local client version is at least the reported client version.
    pub client_up_to_date: bool,
}

impl CompatibilityReport {
    /// Compares `local` against `reported`.
    ///
    /// Major versions must match exactly; any bump is treated as breaking.
    pub fn evaluate(local: &LocalVersions, reported: &ServerVersions) -> Self {
        Self {
            backend_compatible: local.backend_major_version == reported.backend_major_version,
            client_up_to_date: local.client_version >= reported.client_version,
        }
    }

    pub fn compatibility(&self) -> Compatibility {
        match (self.backend_compatible, self.client_up_to_date) {
            (true, true) => Compatibility::Compatible,
            (true, false) => Compatibility::CompatibleOutdated,
            (false, true) => Compatibility::Incompatible,
            (false, false) => Compatibility::IncompatibleOutdated,
        }
    }

    pub fn is_fully_compatible(&self) -> bool {
        self.compatibility() == Compatibility::Compatible
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> SoftwareVersion {
        s.parse().unwrap()
    }

    #[test]
    fn parses_two_to_four_components() {
        assert_eq!(v("0.7"), SoftwareVersion::new(0, 7));
        assert_eq!(v("1.1.3"), SoftwareVersion::with_build(1, 1, 3));
        assert_eq!(v("1.2.3.4").revision, Some(4));
        assert!("1".parse::<SoftwareVersion>().is_err());
        assert!("1.2.3.4.5".parse::<SoftwareVersion>().is_err());
        assert!("1.x".parse::<SoftwareVersion>().is_err());
        assert!("".parse::<SoftwareVersion>().is_err());
    }

    #[test]
    fn orders_numerically_not_lexically() {
        assert!(v("1.10") > v("1.9"));
        assert!(v("0.10") > v("0.7"));
        assert!(v("2.0") > v("1.99.99"));
        assert!(v("1.0") < v("1.0.0"));
        assert!(v("1.0.0") < v("1.0.1"));
    }

    #[test]
    fn display_round_trips_parse() {
        for s in ["0.7", "1.1.3", "1.2.3.4"] {
            assert_eq!(v(s).to_string(), s);
        }
    }

    #[test]
    fn legacy_versions_are_fixed() {
        assert_eq!(ServerVersions::LEGACY.client_version.to_string(), "0.7");
        assert_eq!(ServerVersions::LEGACY.backend_major_version, 1);
    }

    #[test]
    fn client_up_to_date_truth_table() {
        let local = LocalVersions {
            client_version: v("1.0"),
            backend_major_version: 2,
        };
        let same = ServerVersions {
            client_version: v("1.0"),
            backend_major_version: 2,
        };
        let newer = ServerVersions {
            client_version: v("1.1"),
            ..same
        };

        assert!(CompatibilityReport::evaluate(&local, &same).client_up_to_date);
        assert!(!CompatibilityReport::evaluate(&local, &newer).client_up_to_date);
    }

    #[test]
    fn backend_compatible_requires_exact_major() {
        let local = LocalVersions {
            client_version: v("1.0"),
            backend_major_version: 2,
        };
        let same = ServerVersions {
            client_version: v("1.0"),
            backend_major_version: 2,
        };
        let bumped = ServerVersions {
            backend_major_version: 3,
            ..same
        };
        let older = ServerVersions {
            backend_major_version: 1,
            ..same
        };

        assert!(CompatibilityReport::evaluate(&local, &same).backend_compatible);
        assert!(!CompatibilityReport::evaluate(&local, &bumped).backend_compatible);
        assert!(!CompatibilityReport::evaluate(&local, &older).backend_compatible);
    }

    #[test]
    fn compatibility_covers_all_four_states() {
        let report = |backend_compatible, client_up_to_date| CompatibilityReport {
            backend_compatible,
            client_up_to_date,
        };

        assert_eq!(report(true, true).compatibility(), Compatibility::Compatible);
        assert_eq!(report(true, false).compatibility(), Compatibility::CompatibleOutdated);
        assert_eq!(report(false, true).compatibility(), Compatibility::Incompatible);
        assert_eq!(report(false, false).compatibility(), Compatibility::IncompatibleOutdated);
        assert!(report(true, true).is_fully_compatible());
        assert!(!report(true, false).is_fully_compatible());
    }
}
