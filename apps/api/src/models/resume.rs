use std::collections::HashSet;
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

/// Template selectors understood by the renderer.
pub const TEMPLATE_IDS: RangeInclusive<u32> = 1..=6;

/// Top-level keys of which at least one must be present for an import to be
/// recognised as a resume.
const RECOGNISED_ROOTS: &[&str] = &["personalInfo", "skills", "experience", "education"];

#[derive(Debug, Error, PartialEq)]
pub enum ImportError {
    #[error("Resume data must be a JSON object")]
    NotAnObject,

    #[error("Invalid resume format: expected at least one of personalInfo, skills, experience, education")]
    MissingSections,
}

/// Opaque identity of a list item. Generated ids are UUIDs; documents written
/// by older clients carry millisecond timestamps, which are kept as numbers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemId {
    Number(u64),
    Text(String),
}

impl ItemId {
    pub fn generate() -> Self {
        ItemId::Text(Uuid::new_v4().to_string())
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemId::Number(n) => write!(f, "{n}"),
            ItemId::Text(s) => f.write_str(s),
        }
    }
}

/// The list sections of a resume whose items carry an [`ItemId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Experience,
    Education,
    Projects,
    Languages,
    Certifications,
    Awards,
    References,
}

impl Section {
    pub const ALL: [Section; 7] = [
        Section::Experience,
        Section::Education,
        Section::Projects,
        Section::Languages,
        Section::Certifications,
        Section::Awards,
        Section::References,
    ];

    /// JSON key of the section inside a resume document.
    pub fn key(&self) -> &'static str {
        match self {
            Section::Experience => "experience",
            Section::Education => "education",
            Section::Projects => "projects",
            Section::Languages => "languages",
            Section::Certifications => "certifications",
            Section::Awards => "awards",
            Section::References => "references",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Section {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Section::ALL
            .into_iter()
            .find(|section| section.key().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unknown resume section '{s}'"))
    }
}

/// Common behaviour of the item records stored in list sections.
///
/// `Default` produces a blank item with a freshly generated id.
pub trait SectionItem: Clone + fmt::Debug + PartialEq + Default {
    fn id(&self) -> &ItemId;

    fn reassign_id(&mut self, id: ItemId);

    /// Sets one named field. The `id` field is never writable; names the
    /// record does not know are kept in its extra map.
    fn set_field(&mut self, field: &str, value: Value);

    /// Builds an item from an untyped JSON object, field by field.
    fn from_value(value: Value) -> Option<Self> {
        let Value::Object(fields) = value else {
            return None;
        };
        let mut item = Self::default();
        for (field, value) in fields {
            if field == "id" {
                if let Ok(id) = serde_json::from_value::<ItemId>(value) {
                    item.reassign_id(id);
                }
            } else {
                item.set_field(&field, value);
            }
        }
        Some(item)
    }
}

fn text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn flag(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersonalInfo {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub location: String,
    pub summary: String,
    pub website: String,
    pub linkedin: String,
    pub github: String,
    pub twitter: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PersonalInfo {
    pub const FIELDS: [&'static str; 9] = [
        "fullName", "email", "phone", "location", "summary", "website", "linkedin", "github",
        "twitter",
    ];

    pub fn set_field(&mut self, field: &str, value: Value) {
        match field {
            "fullName" => self.full_name = text(value),
            "email" => self.email = text(value),
            "phone" => self.phone = text(value),
            "location" => self.location = text(value),
            "summary" => self.summary = text(value),
            "website" => self.website = text(value),
            "linkedin" => self.linkedin = text(value),
            "github" => self.github = text(value),
            "twitter" => self.twitter = text(value),
            _ => {
                self.extra.insert(field.to_string(), value);
            }
        }
    }

    pub fn get(&self, field: &str) -> Option<Value> {
        let known = match field {
            "fullName" => &self.full_name,
            "email" => &self.email,
            "phone" => &self.phone,
            "location" => &self.location,
            "summary" => &self.summary,
            "website" => &self.website,
            "linkedin" => &self.linkedin,
            "github" => &self.github,
            "twitter" => &self.twitter,
            _ => return self.extra.get(field).cloned(),
        };
        Some(Value::String(known.clone()))
    }

    fn merged(value: Value) -> Self {
        let mut info = PersonalInfo::default();
        match value {
            Value::Object(fields) => {
                for (field, value) in fields {
                    info.set_field(&field, value);
                }
            }
            Value::Null => {}
            other => warn!("Ignoring malformed personalInfo section: {other}"),
        }
        info
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExperienceEntry {
    pub id: ItemId,
    pub company: String,
    pub role: String,
    pub start_date: String,
    pub end_date: String,
    pub current: bool,
    pub description: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for ExperienceEntry {
    fn default() -> Self {
        Self {
            id: ItemId::generate(),
            company: String::new(),
            role: String::new(),
            start_date: String::new(),
            end_date: String::new(),
            current: false,
            description: String::new(),
            extra: Map::new(),
        }
    }
}

impl SectionItem for ExperienceEntry {
    fn id(&self) -> &ItemId {
        &self.id
    }

    fn reassign_id(&mut self, id: ItemId) {
        self.id = id;
    }

    fn set_field(&mut self, field: &str, value: Value) {
        match field {
            "id" => {}
            "company" => self.company = text(value),
            "role" => self.role = text(value),
            "startDate" => self.start_date = text(value),
            "endDate" => self.end_date = text(value),
            "description" => self.description = text(value),
            "current" => {
                if let Some(current) = flag(&value) {
                    self.current = current;
                }
            }
            _ => {
                self.extra.insert(field.to_string(), value);
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EducationEntry {
    pub id: ItemId,
    pub degree: String,
    pub institute: String,
    pub year: String,
    pub gpa: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for EducationEntry {
    fn default() -> Self {
        Self {
            id: ItemId::generate(),
            degree: String::new(),
            institute: String::new(),
            year: String::new(),
            gpa: String::new(),
            extra: Map::new(),
        }
    }
}

impl SectionItem for EducationEntry {
    fn id(&self) -> &ItemId {
        &self.id
    }

    fn reassign_id(&mut self, id: ItemId) {
        self.id = id;
    }

    fn set_field(&mut self, field: &str, value: Value) {
        match field {
            "id" => {}
            "degree" => self.degree = text(value),
            "institute" => self.institute = text(value),
            "year" => self.year = text(value),
            "gpa" => self.gpa = text(value),
            _ => {
                self.extra.insert(field.to_string(), value);
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectEntry {
    pub id: ItemId,
    pub title: String,
    pub description: String,
    pub tech_stack: String,
    pub link: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for ProjectEntry {
    fn default() -> Self {
        Self {
            id: ItemId::generate(),
            title: String::new(),
            description: String::new(),
            tech_stack: String::new(),
            link: String::new(),
            extra: Map::new(),
        }
    }
}

impl SectionItem for ProjectEntry {
    fn id(&self) -> &ItemId {
        &self.id
    }

    fn reassign_id(&mut self, id: ItemId) {
        self.id = id;
    }

    fn set_field(&mut self, field: &str, value: Value) {
        match field {
            "id" => {}
            "title" => self.title = text(value),
            "description" => self.description = text(value),
            "techStack" => self.tech_stack = text(value),
            "link" => self.link = text(value),
            _ => {
                self.extra.insert(field.to_string(), value);
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LanguageEntry {
    pub id: ItemId,
    pub name: String,
    pub proficiency: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for LanguageEntry {
    fn default() -> Self {
        Self {
            id: ItemId::generate(),
            name: String::new(),
            proficiency: "Native".to_string(),
            extra: Map::new(),
        }
    }
}

impl SectionItem for LanguageEntry {
    fn id(&self) -> &ItemId {
        &self.id
    }

    fn reassign_id(&mut self, id: ItemId) {
        self.id = id;
    }

    fn set_field(&mut self, field: &str, value: Value) {
        match field {
            "id" => {}
            "name" => self.name = text(value),
            "proficiency" => self.proficiency = text(value),
            _ => {
                self.extra.insert(field.to_string(), value);
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CertificationEntry {
    pub id: ItemId,
    pub name: String,
    pub issuer: String,
    pub date: String,
    pub link: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for CertificationEntry {
    fn default() -> Self {
        Self {
            id: ItemId::generate(),
            name: String::new(),
            issuer: String::new(),
            date: String::new(),
            link: String::new(),
            extra: Map::new(),
        }
    }
}

impl SectionItem for CertificationEntry {
    fn id(&self) -> &ItemId {
        &self.id
    }

    fn reassign_id(&mut self, id: ItemId) {
        self.id = id;
    }

    fn set_field(&mut self, field: &str, value: Value) {
        match field {
            "id" => {}
            "name" => self.name = text(value),
            "issuer" => self.issuer = text(value),
            "date" => self.date = text(value),
            "link" => self.link = text(value),
            _ => {
                self.extra.insert(field.to_string(), value);
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AwardEntry {
    pub id: ItemId,
    pub title: String,
    pub issuer: String,
    pub date: String,
    pub description: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for AwardEntry {
    fn default() -> Self {
        Self {
            id: ItemId::generate(),
            title: String::new(),
            issuer: String::new(),
            date: String::new(),
            description: String::new(),
            extra: Map::new(),
        }
    }
}

impl SectionItem for AwardEntry {
    fn id(&self) -> &ItemId {
        &self.id
    }

    fn reassign_id(&mut self, id: ItemId) {
        self.id = id;
    }

    fn set_field(&mut self, field: &str, value: Value) {
        match field {
            "id" => {}
            "title" => self.title = text(value),
            "issuer" => self.issuer = text(value),
            "date" => self.date = text(value),
            "description" => self.description = text(value),
            _ => {
                self.extra.insert(field.to_string(), value);
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReferenceEntry {
    pub id: ItemId,
    pub name: String,
    pub position: String,
    pub company: String,
    pub email: String,
    pub phone: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for ReferenceEntry {
    fn default() -> Self {
        Self {
            id: ItemId::generate(),
            name: String::new(),
            position: String::new(),
            company: String::new(),
            email: String::new(),
            phone: String::new(),
            extra: Map::new(),
        }
    }
}

impl SectionItem for ReferenceEntry {
    fn id(&self) -> &ItemId {
        &self.id
    }

    fn reassign_id(&mut self, id: ItemId) {
        self.id = id;
    }

    fn set_field(&mut self, field: &str, value: Value) {
        match field {
            "id" => {}
            "name" => self.name = text(value),
            "position" => self.position = text(value),
            "company" => self.company = text(value),
            "email" => self.email = text(value),
            "phone" => self.phone = text(value),
            _ => {
                self.extra.insert(field.to_string(), value);
            }
        }
    }
}

/// The resume aggregate. Serialized in the camelCase layout the browser
/// client has always persisted, so stored documents stay readable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Resume {
    pub personal_info: PersonalInfo,
    pub skills: Vec<String>,
    pub experience: Vec<ExperienceEntry>,
    pub education: Vec<EducationEntry>,
    pub projects: Vec<ProjectEntry>,
    pub languages: Vec<LanguageEntry>,
    pub certifications: Vec<CertificationEntry>,
    pub awards: Vec<AwardEntry>,
    pub references: Vec<ReferenceEntry>,
    pub selected_template: u32,
    /// Top-level fields this schema does not know about, kept verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for Resume {
    fn default() -> Self {
        Self {
            personal_info: PersonalInfo::default(),
            skills: Vec::new(),
            experience: Vec::new(),
            education: Vec::new(),
            projects: Vec::new(),
            languages: Vec::new(),
            certifications: Vec::new(),
            awards: Vec::new(),
            references: Vec::new(),
            selected_template: *TEMPLATE_IDS.start(),
            extra: Map::new(),
        }
    }
}

impl Resume {
    /// A fresh document: the canonical empty shape with one blank
    /// experience, education and project entry ready to be filled in.
    pub fn starter() -> Self {
        Self {
            experience: vec![ExperienceEntry::default()],
            education: vec![EducationEntry::default()],
            projects: vec![ProjectEntry::default()],
            ..Self::default()
        }
    }

    pub fn section_len(&self, section: Section) -> usize {
        match section {
            Section::Experience => self.experience.len(),
            Section::Education => self.education.len(),
            Section::Projects => self.projects.len(),
            Section::Languages => self.languages.len(),
            Section::Certifications => self.certifications.len(),
            Section::Awards => self.awards.len(),
            Section::References => self.references.len(),
        }
    }

    /// Turns an untyped candidate document (an import, or whatever the
    /// persistence layer handed back) into a complete resume.
    ///
    /// Every known section is taken explicitly: a missing section gets its
    /// empty default, a malformed one is dropped with a warning,
    /// `personalInfo` is merged field by field, and unknown top-level keys
    /// survive in [`Resume::extra`]. Item ids that are missing or repeated
    /// within a section are replaced with fresh ones.
    pub fn merge_with_defaults(raw: Value) -> Result<Resume, ImportError> {
        let Value::Object(mut fields) = raw else {
            return Err(ImportError::NotAnObject);
        };
        let recognised = RECOGNISED_ROOTS
            .iter()
            .any(|key| fields.get(*key).is_some_and(|v| !v.is_null()));
        if !recognised {
            return Err(ImportError::MissingSections);
        }

        let mut resume = Resume::default();
        if let Some(info) = fields.remove("personalInfo") {
            resume.personal_info = PersonalInfo::merged(info);
        }
        resume.skills = take_skills(&mut fields);
        resume.experience = take_items(&mut fields, Section::Experience);
        resume.education = take_items(&mut fields, Section::Education);
        resume.projects = take_items(&mut fields, Section::Projects);
        resume.languages = take_items(&mut fields, Section::Languages);
        resume.certifications = take_items(&mut fields, Section::Certifications);
        resume.awards = take_items(&mut fields, Section::Awards);
        resume.references = take_items(&mut fields, Section::References);

        match fields.remove("selectedTemplate") {
            None | Some(Value::Null) => {}
            Some(value) => match value.as_u64().and_then(|t| u32::try_from(t).ok()) {
                Some(template) if TEMPLATE_IDS.contains(&template) => {
                    resume.selected_template = template
                }
                _ => warn!("Ignoring unknown selectedTemplate {value}"),
            },
        }

        resume.extra = fields;
        Ok(resume)
    }
}

fn take_skills(fields: &mut Map<String, Value>) -> Vec<String> {
    let mut skills: Vec<String> = Vec::new();
    match fields.remove("skills") {
        None | Some(Value::Null) => {}
        Some(Value::Array(values)) => {
            for value in values {
                let Value::String(skill) = value else {
                    warn!("Ignoring non-text skill {value}");
                    continue;
                };
                let skill = skill.trim();
                if !skill.is_empty() && !skills.iter().any(|s| s == skill) {
                    skills.push(skill.to_string());
                }
            }
        }
        Some(other) => warn!("Ignoring malformed skills section: {other}"),
    }
    skills
}

fn take_items<T: SectionItem>(fields: &mut Map<String, Value>, section: Section) -> Vec<T> {
    let values = match fields.remove(section.key()) {
        None | Some(Value::Null) => return Vec::new(),
        Some(Value::Array(values)) => values,
        Some(other) => {
            warn!(%section, "Ignoring malformed section: {other}");
            return Vec::new();
        }
    };

    let mut seen = HashSet::new();
    let mut items = Vec::with_capacity(values.len());
    for value in values {
        let Some(mut item) = T::from_value(value) else {
            warn!(%section, "Skipping non-object item");
            continue;
        };
        if !seen.insert(item.id().clone()) {
            let fresh = ItemId::generate();
            seen.insert(fresh.clone());
            item.reassign_id(fresh);
        }
        items.push(item);
    }
    items
}
