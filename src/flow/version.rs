use super::definition::{FlowDefinition, Stage};
use crate::error::VersionError;
use crate::validator;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// A parsed `major.minor.patch` version string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SemVer {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl SemVer {
    pub fn bump_patch(self) -> Self {
        Self {
            patch: self.patch + 1,
            ..self
        }
    }

    pub fn bump_minor(self) -> Self {
        Self {
            minor: self.minor + 1,
            patch: 0,
            ..self
        }
    }

    pub fn bump_major(self) -> Self {
        Self {
            major: self.major + 1,
            minor: 0,
            patch: 0,
        }
    }
}

impl FromStr for SemVer {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || VersionError::InvalidVersion(s.to_string());
        let mut parts = s.split('.');
        let mut next = || -> Result<u64, VersionError> {
            let part = parts.next().ok_or_else(invalid)?;
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            part.parse().map_err(|_| invalid())
        };
        let version = SemVer {
            major: next()?,
            minor: next()?,
            patch: next()?,
        };
        if parts.next().is_some() {
            return Err(invalid());
        }
        Ok(version)
    }
}

impl fmt::Display for SemVer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// An immutable snapshot of a flow definition's fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowVersion {
    pub id: String,
    pub flow_id: String,
    pub version: String,
    pub name: String,
    pub description: String,
    pub stages: Vec<Stage>,
    pub created_at: DateTime<Utc>,
    pub is_active: bool,
}

impl FlowVersion {
    fn snapshot(definition: &FlowDefinition, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            flow_id: definition.id.clone(),
            version: definition.version.clone(),
            name: definition.name.clone(),
            description: definition.description.clone(),
            stages: definition.stages.clone(),
            created_at,
            is_active: false,
        }
    }

    /// Rebuilds the definition this snapshot was taken from.
    pub fn to_definition(&self) -> FlowDefinition {
        FlowDefinition {
            id: self.flow_id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            version: self.version.clone(),
            stages: self.stages.clone(),
        }
    }
}

/// A live flow definition together with its version history.
///
/// Exactly one version is active once anything has been published. Both
/// `publish` and `restore` flip the active flag through a single `&mut self`
/// call, so no caller can observe two active versions (or none) in between.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionedFlow {
    pub definition: FlowDefinition,
    pub versions: Vec<FlowVersion>,
    pub active_version_id: Option<String>,
}

impl VersionedFlow {
    /// Validates `definition` and publishes it as the first, active version.
    pub fn create(definition: FlowDefinition) -> Result<Self, VersionError> {
        let mut flow = Self {
            definition: definition.clone(),
            versions: Vec::new(),
            active_version_id: None,
        };
        flow.publish(definition)?;
        Ok(flow)
    }

    /// Replaces the live definition and records a new active snapshot of it.
    pub fn publish(&mut self, definition: FlowDefinition) -> Result<&FlowVersion, VersionError> {
        self.publish_at(definition, Utc::now())
    }

    pub fn publish_at(
        &mut self,
        definition: FlowDefinition,
        at: DateTime<Utc>,
    ) -> Result<&FlowVersion, VersionError> {
        validator::check(&definition)?;

        let mut version = FlowVersion::snapshot(&definition, at);
        version.is_active = true;
        let id = version.id.clone();

        for existing in &mut self.versions {
            existing.is_active = false;
        }
        self.definition = definition;
        self.active_version_id = Some(id.clone());
        self.versions.push(version);

        tracing::debug!(flow_id = %self.definition.id, version_id = %id, "published flow version");
        self.version(&id).ok_or(VersionError::VersionNotFound(id))
    }

    /// Copies the fields of `version_id` back onto the live definition and marks it
    /// active. Restoring the version that is already active changes nothing.
    pub fn restore(&mut self, version_id: &str) -> Result<&FlowDefinition, VersionError> {
        let snapshot = self
            .version(version_id)
            .ok_or_else(|| VersionError::VersionNotFound(version_id.to_string()))?
            .to_definition();

        for version in &mut self.versions {
            version.is_active = version.id == version_id;
        }
        self.definition = snapshot;
        self.active_version_id = Some(version_id.to_string());

        tracing::debug!(flow_id = %self.definition.id, version_id, "restored flow version");
        Ok(&self.definition)
    }

    pub fn version(&self, version_id: &str) -> Option<&FlowVersion> {
        self.versions.iter().find(|v| v.id == version_id)
    }

    pub fn active_version(&self) -> Option<&FlowVersion> {
        self.active_version_id
            .as_deref()
            .and_then(|id| self.version(id))
    }

    /// The highest semantic version published so far.
    pub fn latest_semver(&self) -> Option<SemVer> {
        self.versions
            .iter()
            .filter_map(|v| v.version.parse::<SemVer>().ok())
            .max()
    }
}
