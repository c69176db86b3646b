//! Accumulates the results of one modification batch.
//!
//! `BatchState` owns a working copy of the file map seeded from the
//! pre-batch snapshot. In-flight operations apply their results to the
//! copy; the live map is replaced wholesale only after the whole batch has
//! settled, so no reader ever observes a half-merged project. Application
//! of individual instructions is last-writer-wins and is not rolled back
//! on later failures.

use crate::project::{FileData, ProjectFiles};
use crate::protocol::{ModificationInstruction, Operation};
use std::sync::{Mutex, MutexGuard};

const FALLBACK_MIME: &str = "text/plain";

/// Working state of a single batch: the mutable file-map copy, an error
/// flag, the applied-instruction counter, and human-readable notes.
#[derive(Debug, Clone, Default)]
pub struct BatchState {
    files: ProjectFiles,
    had_errors: bool,
    applied: usize,
    notes: Vec<String>,
}

impl BatchState {
    /// Seeds the working copy from the pre-batch snapshot.
    pub fn new(snapshot: ProjectFiles) -> Self {
        Self {
            files: snapshot,
            ..Default::default()
        }
    }

    /// Applies one completed instruction.
    ///
    /// `parsed` is the level 2 content, or `None` when the call for this
    /// file failed. DELETE removes the path unconditionally; an empty
    /// string from a non-CREATE operation also removes it (an update that
    /// empties a file is treated as deletion); `None` for a non-DELETE
    /// operation leaves the entry untouched and marks the batch as having
    /// had errors. Re-applying the same result is idempotent.
    pub fn apply(&mut self, instruction: &ModificationInstruction, parsed: Option<String>) {
        if instruction.operation == Operation::Delete {
            self.files.remove(&instruction.file_path);
            self.applied += 1;
            self.notes.push(format!("deleted {}", instruction.file_path));
            return;
        }

        let Some(content) = parsed else {
            self.had_errors = true;
            self.notes.push(format!(
                "no usable content returned for {}; file left untouched",
                instruction.file_path
            ));
            return;
        };

        if content.is_empty() && instruction.operation != Operation::Create {
            self.files.remove(&instruction.file_path);
            self.applied += 1;
            self.notes.push(format!(
                "deleted {} (update produced empty content)",
                instruction.file_path
            ));
            return;
        }

        let mime_type = if instruction.operation == Operation::Create {
            FALLBACK_MIME.to_string()
        } else {
            self.files
                .get(&instruction.file_path)
                .map(|data| data.mime_type.clone())
                .unwrap_or_else(|| FALLBACK_MIME.to_string())
        };
        let verb = match instruction.operation {
            Operation::Create => "created",
            _ => "updated",
        };
        self.files
            .insert(instruction.file_path.clone(), FileData { content, mime_type });
        self.applied += 1;
        self.notes.push(format!("{} {}", verb, instruction.file_path));
    }

    /// Records a per-file failure that produced no content at all.
    pub fn flag_error(&mut self, note: impl Into<String>) {
        self.had_errors = true;
        self.notes.push(note.into());
    }

    pub fn files(&self) -> &ProjectFiles {
        &self.files
    }

    pub fn had_errors(&self) -> bool {
        self.had_errors
    }

    pub fn applied(&self) -> usize {
        self.applied
    }

    pub fn notes(&self) -> &[String] {
        &self.notes
    }
}

/// Locks the shared batch state, recovering from poisoning.
///
/// A worker that panicked mid-batch must not discard the progress the
/// other workers already merged; the partially updated copy is still the
/// value to publish.
pub fn lock_state(state: &Mutex<BatchState>) -> MutexGuard<'_, BatchState> {
    match state.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> ProjectFiles {
        let mut files = ProjectFiles::new();
        files.insert(
            "proj/a.ts".to_string(),
            FileData {
                content: "alpha".to_string(),
                mime_type: "text/x-typescript".to_string(),
            },
        );
        files
    }

    fn instruction(path: &str, operation: Operation) -> ModificationInstruction {
        ModificationInstruction {
            file_path: path.to_string(),
            operation,
            description: String::new(),
            modification_details: String::new(),
            original_content: None,
        }
    }

    #[test]
    fn update_overwrites_and_inherits_mime_type() {
        let mut state = BatchState::new(snapshot());
        state.apply(
            &instruction("proj/a.ts", Operation::Update),
            Some("beta".to_string()),
        );
        let data = &state.files()["proj/a.ts"];
        assert_eq!(data.content, "beta");
        assert_eq!(data.mime_type, "text/x-typescript");
        assert_eq!(state.applied(), 1);
        assert!(!state.had_errors());
    }

    #[test]
    fn create_uses_plain_text_mime_type() {
        let mut state = BatchState::new(snapshot());
        state.apply(
            &instruction("proj/new.ts", Operation::Create),
            Some("fresh".to_string()),
        );
        assert_eq!(state.files()["proj/new.ts"].mime_type, "text/plain");
    }

    #[test]
    fn create_is_idempotent() {
        let mut state = BatchState::new(snapshot());
        let create = instruction("proj/new.ts", Operation::Create);
        state.apply(&create, Some("fresh".to_string()));
        let after_once = state.files().clone();
        state.apply(&create, Some("fresh".to_string()));
        assert_eq!(state.files(), &after_once);
    }

    #[test]
    fn delete_removes_the_path_even_without_content() {
        let mut state = BatchState::new(snapshot());
        state.apply(&instruction("proj/a.ts", Operation::Delete), None);
        assert!(!state.files().contains_key("proj/a.ts"));
        assert!(!state.had_errors());
    }

    #[test]
    fn empty_update_content_deletes_the_file() {
        let mut state = BatchState::new(snapshot());
        state.apply(
            &instruction("proj/a.ts", Operation::Update),
            Some(String::new()),
        );
        assert!(!state.files().contains_key("proj/a.ts"));
    }

    #[test]
    fn empty_create_content_still_creates() {
        let mut state = BatchState::new(snapshot());
        state.apply(
            &instruction("proj/empty.ts", Operation::Create),
            Some(String::new()),
        );
        assert_eq!(state.files()["proj/empty.ts"].content, "");
    }

    #[test]
    fn missing_content_flags_errors_and_leaves_entry() {
        let mut state = BatchState::new(snapshot());
        state.apply(&instruction("proj/a.ts", Operation::Update), None);
        assert_eq!(state.files()["proj/a.ts"].content, "alpha");
        assert!(state.had_errors());
        assert_eq!(state.applied(), 0);
    }
}
