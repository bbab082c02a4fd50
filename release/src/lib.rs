//! santoku-release - 发布工具
//!
//! Version arithmetic used by the release pipeline.

use std::fmt;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum VersionError {
    #[error("Version '{0}' must have at least two dot-separated components")]
    TooFewComponents(String),

    #[error("Version component '{component}' of '{version}' is not a number")]
    NonNumeric { version: String, component: String },

    #[error("Version '{0}' cannot be bumped: the component is already at its maximum")]
    Overflow(String),
}

/// Which component a release increments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseType {
    /// `M`: the first component.
    Major,
    /// Anything else: the second component.
    Minor,
}

impl From<&str> for ReleaseType {
    fn from(flag: &str) -> Self {
        if flag == "M" { Self::Major } else { Self::Minor }
    }
}

impl fmt::Display for ReleaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Major => f.write_str("major"),
            Self::Minor => f.write_str("minor"),
        }
    }
}

/// Bump a dotted version. Components other than the bumped one are kept as they are.
pub fn bump(version: &str, release_type: impl Into<ReleaseType>) -> Result<String, VersionError> {
    let mut components = version
        .split('.')
        .map(|component| {
            component.parse::<u64>().map_err(|_| VersionError::NonNumeric {
                version: version.to_string(),
                component: component.to_string(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    if components.len() < 2 {
        return Err(VersionError::TooFewComponents(version.to_string()));
    }

    let index = match release_type.into() {
        ReleaseType::Major => 0,
        ReleaseType::Minor => 1,
    };
    components[index] = components[index]
        .checked_add(1)
        .ok_or_else(|| VersionError::Overflow(version.to_string()))?;

    Ok(components
        .iter()
        .map(u64::to_string)
        .collect::<Vec<_>>()
        .join("."))
}
