use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::models::resume::{Resume, Section};

/// A named, frozen copy of a resume kept outside the undo history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedVersion {
    pub id: Uuid,
    pub name: String,
    pub timestamp: DateTime<Utc>,
    pub data: Resume,
}

/// What a version list shows without shipping whole documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionPreview {
    pub name: String,
    pub skills: usize,
    pub experience: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionSummary {
    pub id: Uuid,
    pub name: String,
    pub timestamp: DateTime<Utc>,
    pub preview: VersionPreview,
}

impl From<&SavedVersion> for VersionSummary {
    fn from(version: &SavedVersion) -> Self {
        let full_name = version.data.personal_info.full_name.trim();
        VersionSummary {
            id: version.id,
            name: version.name.clone(),
            timestamp: version.timestamp,
            preview: VersionPreview {
                name: if full_name.is_empty() {
                    "Unnamed".to_string()
                } else {
                    full_name.to_string()
                },
                skills: version.data.skills.len(),
                experience: version.data.experience.len(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    pub old: Option<Value>,
    pub new: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillChanges {
    pub added: Vec<String>,
    pub removed: Vec<String>,
}

/// Net growth or shrinkage of a list section; at most one side is non-zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountDelta {
    pub added: usize,
    pub removed: usize,
}

impl CountDelta {
    pub fn between(before: usize, after: usize) -> Self {
        CountDelta {
            added: after.saturating_sub(before),
            removed: before.saturating_sub(after),
        }
    }
}

/// Differences between two saved versions, computed on demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionComparison {
    pub personal_info: BTreeMap<String, FieldChange>,
    pub skills: SkillChanges,
    pub sections: BTreeMap<Section, CountDelta>,
}
