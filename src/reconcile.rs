//! Reconciles planner-supplied file paths against the real uploaded set.
//!
//! The planner sees the project listing but still routinely drops the
//! leading project folder from paths, or targets folders the user asked to
//! ignore. Reconciliation corrects what it can, drops what it can't, and
//! records a warning for every instruction it touches so nothing vanishes
//! silently.

use crate::project::ProjectFiles;
use crate::protocol::{ModificationInstruction, Operation};

/// The filtered, corrected instruction list plus the warnings recorded
/// along the way. Instruction order is preserved.
#[derive(Debug, Default)]
pub struct ReconcileOutcome {
    pub instructions: Vec<ModificationInstruction>,
    pub warnings: Vec<String>,
}

/// The single shared top-level folder name, when the uploaded set has one.
///
/// Every key must start with the same first segment and at least that one
/// key must have a second segment; otherwise there is no usable prefix.
pub fn common_root_prefix(files: &ProjectFiles) -> Option<String> {
    let first = files.keys().next()?;
    let (prefix, _) = first.split_once('/')?;
    let want = format!("{}/", prefix);
    if files.keys().all(|key| key.starts_with(&want)) {
        Some(prefix.to_string())
    } else {
        None
    }
}

/// True when any path segment before the file name matches an ignored
/// folder name.
pub fn path_has_ignored_segment(path: &str, ignored: &[String]) -> bool {
    let parts: Vec<&str> = path.split('/').collect();
    if parts.len() < 2 {
        return false;
    }
    parts[..parts.len() - 1]
        .iter()
        .any(|part| ignored.iter().any(|name| name == part))
}

/// Corrects paths against the uploaded key set and attaches original
/// content.
///
/// Per instruction: ignore filtering first (checking both the raw path and
/// its root-prefixed interpretation, so a hidden common prefix can't mask
/// an ignored segment), then exact-match lookup, then the root-prefix
/// retry for UPDATE/DELETE. UPDATE/DELETE instructions whose original
/// content can't be resolved are dropped; CREATE is exempt from matching.
pub fn reconcile(
    instructions: Vec<ModificationInstruction>,
    files: &ProjectFiles,
    ignored: &[String],
) -> ReconcileOutcome {
    let root = common_root_prefix(files);
    let mut outcome = ReconcileOutcome::default();

    for mut instruction in instructions {
        if is_ignored_target(&instruction.file_path, root.as_deref(), ignored) {
            outcome.warnings.push(format!(
                "skipping {} for {}: path is inside an ignored folder",
                instruction.operation, instruction.file_path
            ));
            continue;
        }

        if instruction.operation != Operation::Create {
            match files.get(&instruction.file_path) {
                Some(data) => {
                    instruction.original_content = Some(data.content.clone());
                }
                None => match correct_with_root(&instruction.file_path, root.as_deref(), files) {
                    Some((full_path, content)) => {
                        outcome.warnings.push(format!(
                            "path auto-corrected: '{}' matched '{}' by prepending the project root",
                            instruction.file_path, full_path
                        ));
                        instruction.file_path = full_path;
                        instruction.original_content = Some(content);
                    }
                    None => {
                        outcome.warnings.push(format!(
                            "skipping {} for {}: file not found in the uploaded set",
                            instruction.operation, instruction.file_path
                        ));
                        continue;
                    }
                },
            }
        }

        outcome.instructions.push(instruction);
    }

    outcome
}

fn is_ignored_target(path: &str, root: Option<&str>, ignored: &[String]) -> bool {
    if path_has_ignored_segment(path, ignored) {
        return true;
    }
    if let Some(root) = root {
        if !starts_with_root(path, root)
            && path_has_ignored_segment(&format!("{}/{}", root, path), ignored)
        {
            return true;
        }
    }
    false
}

fn correct_with_root(
    path: &str,
    root: Option<&str>,
    files: &ProjectFiles,
) -> Option<(String, String)> {
    let root = root?;
    if starts_with_root(path, root) {
        return None;
    }
    let full = format!("{}/{}", root, path);
    files.get(&full).map(|data| (full, data.content.clone()))
}

fn starts_with_root(path: &str, root: &str) -> bool {
    path.strip_prefix(root)
        .is_some_and(|rest| rest.starts_with('/'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::FileData;

    fn files(keys: &[(&str, &str)]) -> ProjectFiles {
        keys.iter()
            .map(|(key, content)| {
                (
                    key.to_string(),
                    FileData {
                        content: content.to_string(),
                        mime_type: "text/plain".to_string(),
                    },
                )
            })
            .collect()
    }

    fn instruction(path: &str, operation: Operation) -> ModificationInstruction {
        ModificationInstruction {
            file_path: path.to_string(),
            operation,
            description: "change".to_string(),
            modification_details: "details".to_string(),
            original_content: None,
        }
    }

    fn ignored() -> Vec<String> {
        vec!["node_modules".to_string(), ".git".to_string()]
    }

    #[test]
    fn detects_common_root_prefix() {
        let set = files(&[("proj/a.ts", "a"), ("proj/src/b.ts", "b")]);
        assert_eq!(common_root_prefix(&set), Some("proj".to_string()));

        let split = files(&[("proj/a.ts", "a"), ("other/b.ts", "b")]);
        assert_eq!(common_root_prefix(&split), None);

        let flat = files(&[("a.ts", "a")]);
        assert_eq!(common_root_prefix(&flat), None);
    }

    #[test]
    fn exact_match_attaches_original_content() {
        let set = files(&[("proj/a.ts", "alpha")]);
        let outcome = reconcile(vec![instruction("proj/a.ts", Operation::Update)], &set, &[]);
        assert_eq!(outcome.instructions.len(), 1);
        assert_eq!(
            outcome.instructions[0].original_content.as_deref(),
            Some("alpha")
        );
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn rootless_path_is_corrected_and_content_attached() {
        let set = files(&[("proj/a.ts", "alpha"), ("proj/b.ts", "beta")]);
        let outcome = reconcile(vec![instruction("a.ts", Operation::Update)], &set, &[]);
        assert_eq!(outcome.instructions.len(), 1);
        assert_eq!(outcome.instructions[0].file_path, "proj/a.ts");
        assert_eq!(
            outcome.instructions[0].original_content.as_deref(),
            Some("alpha")
        );
        assert_eq!(outcome.warnings.len(), 1);
        assert!(outcome.warnings[0].contains("auto-corrected"));
    }

    #[test]
    fn create_is_exempt_from_matching() {
        let set = files(&[("proj/a.ts", "alpha")]);
        let outcome = reconcile(vec![instruction("src/new.ts", Operation::Create)], &set, &[]);
        assert_eq!(outcome.instructions.len(), 1);
        assert_eq!(outcome.instructions[0].file_path, "src/new.ts");
        assert!(outcome.instructions[0].original_content.is_none());
    }

    #[test]
    fn ignored_folder_drops_instruction_with_and_without_root() {
        let set = files(&[
            ("proj/a.ts", "alpha"),
            ("proj/node_modules/x.js", "x"),
        ]);
        // Fully qualified path.
        let outcome = reconcile(
            vec![instruction("proj/node_modules/x.js", Operation::Update)],
            &set,
            &ignored(),
        );
        assert!(outcome.instructions.is_empty());
        assert_eq!(outcome.warnings.len(), 1);

        // Root omitted by the planner; the prefixed interpretation still
        // hits the ignored segment.
        let outcome = reconcile(
            vec![instruction("node_modules/x.js", Operation::Update)],
            &set,
            &ignored(),
        );
        assert!(outcome.instructions.is_empty());
        assert_eq!(outcome.warnings.len(), 1);
    }

    #[test]
    fn unresolved_update_is_dropped_with_warning() {
        let set = files(&[("proj/a.ts", "alpha")]);
        let outcome = reconcile(vec![instruction("missing.ts", Operation::Delete)], &set, &[]);
        assert!(outcome.instructions.is_empty());
        assert_eq!(outcome.warnings.len(), 1);
        assert!(outcome.warnings[0].contains("not found"));
    }

    #[test]
    fn order_is_preserved() {
        let set = files(&[("proj/a.ts", "alpha"), ("proj/b.ts", "beta")]);
        let outcome = reconcile(
            vec![
                instruction("b.ts", Operation::Update),
                instruction("a.ts", Operation::Update),
            ],
            &set,
            &[],
        );
        let paths: Vec<&str> = outcome
            .instructions
            .iter()
            .map(|i| i.file_path.as_str())
            .collect();
        assert_eq!(paths, vec!["proj/b.ts", "proj/a.ts"]);
    }

    #[test]
    fn ignore_check_spares_a_file_named_like_an_ignored_folder() {
        let set = files(&[("proj/node_modules", "just a file")]);
        let outcome = reconcile(
            vec![instruction("proj/node_modules", Operation::Update)],
            &set,
            &ignored(),
        );
        // The final segment is the file name and is not folder-filtered.
        assert_eq!(outcome.instructions.len(), 1);
    }
}
