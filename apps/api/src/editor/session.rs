use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::editor::document::DocumentStore;
use crate::editor::history::{HistoryEngine, VersionInfo};
use crate::models::resume::{ImportError, Resume};

/// The two history triggers a keyboard (or any other input) can raise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryCommand {
    Undo,
    Redo,
}

impl HistoryCommand {
    /// Maps shortcuts like `Ctrl+Z`, `Ctrl+Y`, `Ctrl+Shift+Z` or `Cmd+Z`
    /// onto a command. Modifier order and case do not matter.
    pub fn from_shortcut(keys: &str) -> Option<Self> {
        let mut primary = false;
        let mut shift = false;
        let mut key = None;
        for part in keys.split('+').map(str::trim).filter(|p| !p.is_empty()) {
            match part.to_ascii_lowercase().as_str() {
                "ctrl" | "control" | "cmd" | "command" | "meta" => primary = true,
                "shift" => shift = true,
                other if key.is_none() => key = Some(other.to_string()),
                _ => return None,
            }
        }

        match (primary, shift, key.as_deref()) {
            (true, false, Some("z")) => Some(HistoryCommand::Undo),
            (true, false, Some("y")) | (true, true, Some("z")) => Some(HistoryCommand::Redo),
            _ => None,
        }
    }
}

/// Snapshot of the session handed to callers after every operation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub document: Resume,
    pub can_undo: bool,
    pub can_redo: bool,
    pub history_length: usize,
    pub cursor: Option<usize>,
}

/// One editing session: the live document with undo/redo wired to it.
///
/// Every entry point runs its document mutation first and then lets the
/// history drain the resulting change events, so recording and suppression
/// happen before control returns to the caller.
#[derive(Debug)]
pub struct EditorSession {
    document: DocumentStore,
    history: HistoryEngine,
}

impl EditorSession {
    pub fn new(initial: Resume, max_history: usize) -> Self {
        let mut document = DocumentStore::new(initial);
        let mut history = HistoryEngine::new(max_history);
        history.attach(&mut document);
        // The opening document is the first history entry.
        document.announce();
        history.sync();
        info!(max_history = history.max_history(), "Editor session started");
        Self { document, history }
    }

    pub fn document(&self) -> &Resume {
        self.document.current()
    }

    pub fn history(&self) -> &HistoryEngine {
        &self.history
    }

    /// Runs any document mutation and records its outcome.
    pub fn edit<R>(&mut self, f: impl FnOnce(&mut DocumentStore) -> R) -> R {
        let result = f(&mut self.document);
        self.history.sync();
        result
    }

    pub fn undo(&mut self) -> bool {
        let restored = self.history.undo(&mut self.document);
        self.history.sync();
        restored
    }

    pub fn redo(&mut self) -> bool {
        let restored = self.history.redo(&mut self.document);
        self.history.sync();
        restored
    }

    pub fn restore(&mut self, index: usize) -> bool {
        let restored = self.history.restore_version(index, &mut self.document);
        self.history.sync();
        restored
    }

    pub fn apply(&mut self, command: HistoryCommand) -> bool {
        match command {
            HistoryCommand::Undo => self.undo(),
            HistoryCommand::Redo => self.redo(),
        }
    }

    pub fn clear_history(&mut self) {
        self.history.sync();
        let current = self.document.snapshot();
        self.history.clear(&current);
    }

    /// Loads a saved version as a regular edit, so it can be undone.
    pub fn load(&mut self, document: Resume) {
        self.edit(|store| store.replace(document));
    }

    /// Merges a raw candidate document with the canonical defaults and makes
    /// it the live document.
    pub fn import(&mut self, raw: Value) -> Result<(), ImportError> {
        let document = Resume::merge_with_defaults(raw)?;
        self.load(document);
        Ok(())
    }

    pub fn version_info(&self) -> VersionInfo {
        self.history.version_info()
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            document: self.document.snapshot(),
            can_undo: self.history.can_undo(),
            can_redo: self.history.can_redo(),
            history_length: self.history.len(),
            cursor: self.history.cursor(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::resume::Section;
    use serde_json::json;

    fn skills(session: &EditorSession) -> Vec<&str> {
        session.document().skills.iter().map(String::as_str).collect()
    }

    #[test]
    fn test_skills_scenario() {
        let mut session = EditorSession::new(Resume::default(), 50);
        assert_eq!(session.history().len(), 1);

        session.edit(|doc| doc.add_skill("Python"));
        session.edit(|doc| doc.add_skill("Go"));
        assert_eq!(session.history().len(), 3);

        assert!(session.undo());
        assert_eq!(skills(&session), vec!["Python"]);
        assert!(session.view().can_redo);

        session.edit(|doc| doc.add_skill("Rust"));
        assert_eq!(skills(&session), vec!["Python", "Rust"]);

        let history = session.history();
        let recorded: Vec<Vec<String>> = (0..history.len())
            .map(|i| history.entry(i).unwrap().skills.clone())
            .collect();
        assert_eq!(
            recorded,
            vec![
                vec![],
                vec!["Python".to_string()],
                vec!["Python".to_string(), "Rust".to_string()],
            ]
        );
        assert!(!session.view().can_redo);
    }

    #[test]
    fn test_noop_edits_do_not_grow_history() {
        let mut session = EditorSession::new(Resume::default(), 50);
        session.edit(|doc| doc.add_skill("Go"));
        session.edit(|doc| doc.add_skill("Go"));
        session.edit(|doc| doc.remove_item(Section::Awards, 3));
        session.edit(|doc| doc.update_personal_info("fullName", json!("")));

        assert_eq!(session.history().len(), 2);
    }

    #[test]
    fn test_loading_a_version_is_undoable() {
        let mut session = EditorSession::new(Resume::default(), 50);
        session.edit(|doc| doc.add_skill("Go"));
        let before = session.document().clone();

        let mut saved = Resume::default();
        saved.personal_info.full_name = "Saved".to_string();
        session.load(saved.clone());
        assert_eq!(session.document(), &saved);
        assert_eq!(session.history().len(), 3);

        assert!(session.undo());
        assert_eq!(session.document(), &before);
    }

    #[test]
    fn test_import_goes_through_merge() {
        let mut session = EditorSession::new(Resume::starter(), 50);
        session
            .import(json!({ "skills": ["Rust"], "customSection": [1] }))
            .unwrap();

        assert_eq!(skills(&session), vec!["Rust"]);
        assert!(session.document().experience.is_empty());
        assert!(session.document().extra.contains_key("customSection"));
        assert!(session.view().can_undo);

        assert_eq!(
            session.import(json!("not a resume")),
            Err(ImportError::NotAnObject)
        );
    }

    #[test]
    fn test_clear_history_pins_current_document() {
        let mut session = EditorSession::new(Resume::default(), 50);
        session.edit(|doc| doc.add_skill("Go"));
        session.edit(|doc| doc.add_skill("Zig"));
        session.undo();
        session.clear_history();

        let view = session.view();
        assert_eq!(view.history_length, 1);
        assert!(!view.can_undo);
        assert!(!view.can_redo);
        assert_eq!(view.document.skills, vec!["Go"]);
    }

    #[test]
    fn test_shortcuts_drive_history() {
        let mut session = EditorSession::new(Resume::default(), 50);
        session.edit(|doc| doc.add_skill("Go"));

        let undo = HistoryCommand::from_shortcut("Ctrl+Z").unwrap();
        assert!(session.apply(undo));
        assert!(!session.apply(undo));

        let redo = HistoryCommand::from_shortcut("ctrl + shift + z").unwrap();
        assert!(session.apply(redo));
        assert_eq!(skills(&session), vec!["Go"]);
    }

    #[test]
    fn test_shortcut_parsing() {
        assert_eq!(
            HistoryCommand::from_shortcut("Cmd+Z"),
            Some(HistoryCommand::Undo)
        );
        assert_eq!(
            HistoryCommand::from_shortcut("Ctrl+Y"),
            Some(HistoryCommand::Redo)
        );
        assert_eq!(HistoryCommand::from_shortcut("Z"), None);
        assert_eq!(HistoryCommand::from_shortcut("Ctrl+Shift+Y"), None);
        assert_eq!(HistoryCommand::from_shortcut("Ctrl+Z+Y"), None);
    }
}
