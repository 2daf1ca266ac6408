use serde_json::Value;
use tracing::debug;

use crate::editor::notifier::{ChangeNotifier, ChangeReceiver};
use crate::models::resume::{ItemId, Resume, Section, SectionItem, TEMPLATE_IDS};

/// Owns the live resume and is the only place it is mutated.
///
/// Every effective mutation emits exactly one change event. Operations
/// addressing an item by position are checked against the list at call time;
/// an out-of-range index leaves the document untouched and emits nothing.
#[derive(Debug)]
pub struct DocumentStore {
    current: Resume,
    notifier: ChangeNotifier,
}

impl DocumentStore {
    pub fn new(initial: Resume) -> Self {
        Self {
            current: initial,
            notifier: ChangeNotifier::new(),
        }
    }

    pub fn subscribe(&mut self) -> ChangeReceiver {
        self.notifier.subscribe()
    }

    pub fn current(&self) -> &Resume {
        &self.current
    }

    /// Deep copy of the live document.
    pub fn snapshot(&self) -> Resume {
        self.current.clone()
    }

    pub fn revision(&self) -> u64 {
        self.notifier.revision()
    }

    /// Re-announces the current value without changing it.
    pub fn announce(&mut self) {
        self.notifier.emit(&self.current);
    }

    /// Substitutes the whole document. Always announced, even when the new
    /// value equals the old one.
    pub fn replace(&mut self, document: Resume) {
        self.commit(document);
    }

    pub fn clear(&mut self) {
        self.commit(Resume::default());
    }

    pub fn update_personal_info(&mut self, field: &str, value: Value) {
        let mut next = self.current.clone();
        next.personal_info.set_field(field, value);
        self.commit(next);
    }

    /// Appends a trimmed skill. Blank and already-listed skills are ignored.
    pub fn add_skill(&mut self, skill: &str) -> bool {
        let skill = skill.trim();
        if skill.is_empty() || self.current.skills.iter().any(|s| s == skill) {
            return false;
        }
        let mut next = self.current.clone();
        next.skills.push(skill.to_string());
        self.commit(next);
        true
    }

    pub fn remove_skill(&mut self, index: usize) -> bool {
        if index >= self.current.skills.len() {
            return false;
        }
        let mut next = self.current.clone();
        next.skills.remove(index);
        self.commit(next);
        true
    }

    /// Accepts only known template selectors.
    pub fn set_template(&mut self, template: u32) -> bool {
        if !TEMPLATE_IDS.contains(&template) {
            return false;
        }
        let mut next = self.current.clone();
        next.selected_template = template;
        self.commit(next);
        true
    }

    /// Appends a blank item to `section` and returns its fresh id.
    pub fn add_item(&mut self, section: Section) -> ItemId {
        let mut next = self.current.clone();
        let id = match section {
            Section::Experience => push_blank(&mut next.experience),
            Section::Education => push_blank(&mut next.education),
            Section::Projects => push_blank(&mut next.projects),
            Section::Languages => push_blank(&mut next.languages),
            Section::Certifications => push_blank(&mut next.certifications),
            Section::Awards => push_blank(&mut next.awards),
            Section::References => push_blank(&mut next.references),
        };
        self.commit(next);
        id
    }

    pub fn update_item(&mut self, section: Section, index: usize, field: &str, value: Value) -> bool {
        if index >= self.current.section_len(section) {
            return false;
        }
        let mut next = self.current.clone();
        match section {
            Section::Experience => next.experience[index].set_field(field, value),
            Section::Education => next.education[index].set_field(field, value),
            Section::Projects => next.projects[index].set_field(field, value),
            Section::Languages => next.languages[index].set_field(field, value),
            Section::Certifications => next.certifications[index].set_field(field, value),
            Section::Awards => next.awards[index].set_field(field, value),
            Section::References => next.references[index].set_field(field, value),
        }
        self.commit(next);
        true
    }

    pub fn remove_item(&mut self, section: Section, index: usize) -> bool {
        if index >= self.current.section_len(section) {
            return false;
        }
        let mut next = self.current.clone();
        match section {
            Section::Experience => drop(next.experience.remove(index)),
            Section::Education => drop(next.education.remove(index)),
            Section::Projects => drop(next.projects.remove(index)),
            Section::Languages => drop(next.languages.remove(index)),
            Section::Certifications => drop(next.certifications.remove(index)),
            Section::Awards => drop(next.awards.remove(index)),
            Section::References => drop(next.references.remove(index)),
        }
        self.commit(next);
        true
    }

    fn commit(&mut self, next: Resume) {
        self.current = next;
        self.notifier.emit(&self.current);
        debug!(revision = self.notifier.revision(), "Document changed");
    }
}

fn push_blank<T: SectionItem>(items: &mut Vec<T>) -> ItemId {
    let item = T::default();
    let id = item.id().clone();
    items.push(item);
    id
}
