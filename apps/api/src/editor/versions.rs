use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use crate::editor::export::{version_file_name, ExportArtifact, ExportError};
use crate::models::resume::{PersonalInfo, Resume, Section};
use crate::models::version::{
    CountDelta, FieldChange, SavedVersion, SkillChanges, VersionComparison, VersionSummary,
};
use crate::persistence::{KeyValueStore, StorageError, VERSIONS_KEY};

/// Named snapshots of the resume, kept apart from the undo history.
///
/// Versions are frozen copies: saving clones the document, loading hands
/// back a clone, and only rename or delete ever touch a stored version.
/// Lookups by an unknown id change nothing and report `None` / `false`.
#[derive(Debug, Default)]
pub struct SnapshotStore {
    versions: Vec<SavedVersion>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restores the collection from persistence. A missing or unreadable
    /// payload yields an empty store; otherwise entries are restored one by
    /// one and only the unusable ones are skipped.
    pub async fn load(kv: &dyn KeyValueStore) -> Result<Self, StorageError> {
        let entries = match kv.get(VERSIONS_KEY).await? {
            None => Vec::new(),
            Some(raw) => match serde_json::from_str::<Value>(&raw) {
                Ok(Value::Array(entries)) => entries,
                Ok(other) => {
                    warn!("Saved versions are not a list, starting empty: {other}");
                    Vec::new()
                }
                Err(e) => {
                    warn!("Saved versions are unreadable, starting empty: {e}");
                    Vec::new()
                }
            },
        };

        let mut versions: Vec<SavedVersion> = Vec::with_capacity(entries.len());
        for (position, entry) in entries.into_iter().enumerate() {
            if let Some(version) = restore_entry(position, entry) {
                versions.push(version);
            }
        }
        info!("Loaded {} saved versions", versions.len());
        Ok(Self { versions })
    }

    pub async fn persist(&self, kv: &dyn KeyValueStore) -> Result<(), StorageError> {
        kv.set(VERSIONS_KEY, serde_json::to_string(&self.versions)?)
            .await
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    /// Stores a copy of `document`. A blank or absent name becomes
    /// `"Version N"`, N being the new size of the collection.
    pub fn save_version(&mut self, document: &Resume, name: Option<&str>) -> Uuid {
        let name = match name.map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!("Version {}", self.versions.len() + 1),
        };
        let version = SavedVersion {
            id: Uuid::new_v4(),
            name,
            timestamp: Utc::now(),
            data: document.clone(),
        };
        let id = version.id;
        info!("Saved version {id} ({})", version.name);
        self.versions.push(version);
        id
    }

    pub fn get(&self, id: Uuid) -> Option<&SavedVersion> {
        self.versions.iter().find(|v| v.id == id)
    }

    pub fn load_version(&self, id: Uuid) -> Option<Resume> {
        self.get(id).map(|v| v.data.clone())
    }

    pub fn delete_version(&mut self, id: Uuid) -> bool {
        let before = self.versions.len();
        self.versions.retain(|v| v.id != id);
        before != self.versions.len()
    }

    pub fn rename_version(&mut self, id: Uuid, name: &str) -> bool {
        match self.versions.iter_mut().find(|v| v.id == id) {
            Some(version) => {
                version.name = name.to_string();
                true
            }
            None => false,
        }
    }

    pub fn export_version(&self, id: Uuid) -> Option<Result<ExportArtifact, ExportError>> {
        self.get(id)
            .map(|v| ExportArtifact::json(version_file_name(&v.name), &v.data))
    }

    pub fn list(&self) -> Vec<VersionSummary> {
        self.versions.iter().map(VersionSummary::from).collect()
    }

    /// Field-level differences going from version `from` to version `to`.
    pub fn compare_versions(&self, from: Uuid, to: Uuid) -> Option<VersionComparison> {
        let a = &self.get(from)?.data;
        let b = &self.get(to)?.data;

        let sections = Section::ALL
            .into_iter()
            .map(|s| (s, CountDelta::between(a.section_len(s), b.section_len(s))))
            .collect();

        Some(VersionComparison {
            personal_info: personal_info_changes(&a.personal_info, &b.personal_info),
            skills: skill_changes(&a.skills, &b.skills),
            sections,
        })
    }
}

/// Rebuilds one stored version. The document goes through
/// `merge_with_defaults`; ids that are not UUIDs (older clients stored
/// millisecond timestamps) are replaced, and a bad timestamp becomes now.
fn restore_entry(position: usize, entry: Value) -> Option<SavedVersion> {
    let Value::Object(mut fields) = entry else {
        warn!("Skipping saved version #{position}: not an object");
        return None;
    };
    let data = match fields.remove("data").map(Resume::merge_with_defaults) {
        Some(Ok(data)) => data,
        Some(Err(e)) => {
            warn!("Skipping saved version #{position}: {e}");
            return None;
        }
        None => {
            warn!("Skipping saved version #{position}: no resume data");
            return None;
        }
    };

    let id = fields
        .get("id")
        .and_then(Value::as_str)
        .and_then(|raw| Uuid::parse_str(raw).ok())
        .unwrap_or_else(|| {
            let id = Uuid::new_v4();
            warn!("Saved version #{position} had no usable id, reassigned {id}");
            id
        });
    let name = match fields.get("name").and_then(Value::as_str).map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => format!("Version {}", position + 1),
    };
    let timestamp = fields
        .get("timestamp")
        .and_then(Value::as_str)
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_else(Utc::now);

    Some(SavedVersion {
        id,
        name,
        timestamp,
        data,
    })
}

fn personal_info_changes(a: &PersonalInfo, b: &PersonalInfo) -> BTreeMap<String, FieldChange> {
    let fields = PersonalInfo::FIELDS
        .iter()
        .map(|f| f.to_string())
        .chain(a.extra.keys().cloned())
        .chain(b.extra.keys().cloned());

    let mut changes = BTreeMap::new();
    for field in fields {
        let old = a.get(&field);
        let new = b.get(&field);
        if old != new {
            changes.insert(field, FieldChange { old, new });
        }
    }
    changes
}

fn skill_changes(a: &[String], b: &[String]) -> SkillChanges {
    let before: HashSet<&String> = a.iter().collect();
    let after: HashSet<&String> = b.iter().collect();
    SkillChanges {
        added: b.iter().filter(|s| !before.contains(s)).cloned().collect(),
        removed: a.iter().filter(|s| !after.contains(s)).cloned().collect(),
    }
}
