//! Prompt construction for both model stages.
//!
//! The level 1 prompt carries the whole project picture (structure
//! listing, file list, user requirements) and spells out the response
//! contract the parser expects. The level 2 prompt carries a single
//! instruction with the file's original content and demands the
//! MODIFIED_FILE_START/END framing. Sections are wrapped in
//! `=====X===== ... =====END-X=====` delimiters so they survive
//! round-tripping through a model.

use crate::project::{FileTreeNode, NodeType, ProjectFiles};
use crate::protocol::{ModificationInstruction, Operation};
use crate::reconcile::path_has_ignored_segment;

const LEVEL1_PROMPT_TEMPLATE: &str = r#"You are a senior software architect. Analyze the project below and produce a precise modification plan.

=====PROJECT-STRUCTURE=====
{project_structure}
=====END-PROJECT-STRUCTURE=====

=====UPLOADED-FILES=====
{uploaded_files}
=====END-UPLOADED-FILES=====

=====REQUIREMENTS=====
{requirements}
=====END-REQUIREMENTS=====

=====OUTPUT-FORMAT=====
Respond strictly in the following format and mark every file modification explicitly:

THREAD_COUNT: {suggested number of concurrent workers}

FILE_MODIFICATIONS_START

FILE: {file path}
OPERATION: {CREATE|UPDATE|DELETE}
DESCRIPTION: {summary of the change}
CONTEXT_MODIFICATIONS_START
{context-anchored modification fragments}
CONTEXT_MODIFICATIONS_END
FILE_END

{repeat the block above for every file that needs changes}

FILE_MODIFICATIONS_END
=====END-OUTPUT-FORMAT=====

Rules:
1. Analyze file dependencies carefully and keep the modifications consistent.
2. Suggest a sensible number of concurrent workers (usually 4 to 8).
3. Follow the output format exactly; it is parsed mechanically.
4. The {file path} in each "FILE:" line MUST exactly match a path from the UPLOADED-FILES section or be derivable from PROJECT-STRUCTURE, including any leading project folder name (for example "my-project/src/file.js", not "src/file.js").
5. Anchor every modification fragment in enough surrounding original code that the location is unambiguous.
"#;

const LEVEL2_PROMPT_HEADER: &str = r#"Apply the modification fragments below to the file and output the complete modified file content.

=====FILE-INFO=====
File path: {file_path}
Operation: {operation}
Description: {description}
=====END-FILE-INFO=====
"#;

const LEVEL2_ORIGINAL_CONTENT_SECTION: &str = r#"
=====ORIGINAL-CONTENT=====
{original_content}
=====END-ORIGINAL-CONTENT=====
"#;

const LEVEL2_MODIFICATION_DETAILS_SECTION: &str = r#"
=====MODIFICATION-DETAILS=====
{modification_details}
=====END-MODIFICATION-DETAILS=====
"#;

const LEVEL2_PROMPT_FOOTER: &str = r#"
=====OUTPUT-FORMAT=====
Output the complete modified file content in the following format:

MODIFIED_FILE_START
{complete modified file content}
MODIFIED_FILE_END
=====END-OUTPUT-FORMAT=====

Notes:
1. Apply exactly the specified changes and nothing else.
2. Keep formatting and indentation consistent with the original.
3. Output the whole file; do not elide any part of it.
"#;

const NEW_FILE_PLACEHOLDER: &str = "// This is a new file to be created.";

/// Renders the indented structure listing. Ignored directories are pruned
/// together with their whole subtree.
pub fn render_project_structure(tree: &[FileTreeNode], ignored: &[String]) -> String {
    let lines: Vec<String> = tree
        .iter()
        .filter_map(|node| print_node(node, "", ignored))
        .collect();
    lines.join("\n")
}

fn print_node(node: &FileTreeNode, indent: &str, ignored: &[String]) -> Option<String> {
    if node.node_type == NodeType::Directory && ignored.iter().any(|name| name == &node.name) {
        return None;
    }
    let marker = match node.node_type {
        NodeType::Directory => "📁",
        NodeType::File => "📄",
    };
    let mut out = format!("{}{} {}", indent, marker, node.name);
    let child_indent = format!("{}  ", indent);
    let children: Vec<String> = node
        .children
        .iter()
        .filter_map(|child| print_node(child, &child_indent, ignored))
        .collect();
    if !children.is_empty() {
        out.push('\n');
        out.push_str(&children.join("\n"));
    }
    Some(out)
}

/// Renders the sorted newline-separated file list, excluding paths inside
/// ignored folders.
pub fn render_file_list(files: &ProjectFiles, ignored: &[String]) -> String {
    let mut keys: Vec<&str> = files
        .keys()
        .map(|key| key.as_str())
        .filter(|key| !path_has_ignored_segment(key, ignored))
        .collect();
    keys.sort();
    keys.join("\n")
}

/// Renders the full level 1 planning prompt.
pub fn render_level1_prompt(structure: &str, file_list: &str, requirements: &str) -> String {
    LEVEL1_PROMPT_TEMPLATE
        .replace("{project_structure}", structure)
        .replace("{uploaded_files}", file_list)
        .replace("{requirements}", requirements)
}

/// Renders the level 2 prompt for one instruction.
pub fn render_level2_prompt(instruction: &ModificationInstruction) -> String {
    let mut prompt = LEVEL2_PROMPT_HEADER
        .replace("{file_path}", &instruction.file_path)
        .replace("{operation}", &instruction.operation.to_string())
        .replace("{description}", &instruction.description);

    match (instruction.operation, instruction.original_content.as_deref()) {
        (Operation::Update | Operation::Delete, Some(original)) => {
            prompt.push_str(&LEVEL2_ORIGINAL_CONTENT_SECTION.replace("{original_content}", original));
        }
        (Operation::Create, _) => {
            prompt.push_str(
                &LEVEL2_ORIGINAL_CONTENT_SECTION.replace("{original_content}", NEW_FILE_PLACEHOLDER),
            );
        }
        _ => {}
    }

    prompt.push_str(
        &LEVEL2_MODIFICATION_DETAILS_SECTION
            .replace("{modification_details}", &instruction.modification_details),
    );
    prompt.push_str(LEVEL2_PROMPT_FOOTER);
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::{FileData, build_file_tree};

    fn files() -> ProjectFiles {
        let data = |content: &str| FileData {
            content: content.to_string(),
            mime_type: "text/plain".to_string(),
        };
        let mut files = ProjectFiles::new();
        files.insert("proj/src/main.rs".to_string(), data("fn main() {}"));
        files.insert("proj/node_modules/x.js".to_string(), data("x"));
        files.insert("proj/README.md".to_string(), data("# proj"));
        files
    }

    fn ignored() -> Vec<String> {
        vec!["node_modules".to_string()]
    }

    #[test]
    fn structure_listing_prunes_ignored_directories() {
        let tree = build_file_tree(&files());
        let listing = render_project_structure(&tree, &ignored());
        assert!(listing.contains("📁 proj"));
        assert!(listing.contains("  📁 src"));
        assert!(listing.contains("    📄 main.rs"));
        assert!(!listing.contains("node_modules"));
        assert!(!listing.contains("x.js"));
    }

    #[test]
    fn file_list_is_sorted_and_filtered() {
        let listing = render_file_list(&files(), &ignored());
        assert_eq!(listing, "proj/README.md\nproj/src/main.rs");
    }

    #[test]
    fn level1_prompt_wraps_sections_in_delimiters() {
        let prompt = render_level1_prompt("📁 proj", "proj/a.ts", "make it faster");
        assert!(prompt.contains("=====PROJECT-STRUCTURE=====\n📁 proj\n=====END-PROJECT-STRUCTURE====="));
        assert!(prompt.contains("=====UPLOADED-FILES=====\nproj/a.ts\n=====END-UPLOADED-FILES====="));
        assert!(prompt.contains("=====REQUIREMENTS=====\nmake it faster\n=====END-REQUIREMENTS====="));
        assert!(prompt.contains("FILE_MODIFICATIONS_START"));
        assert!(prompt.contains("THREAD_COUNT:"));
    }

    #[test]
    fn level2_prompt_for_update_includes_original_content() {
        let instruction = ModificationInstruction {
            file_path: "proj/a.ts".to_string(),
            operation: Operation::Update,
            description: "rename foo".to_string(),
            modification_details: "foo -> bar".to_string(),
            original_content: Some("let foo = 1;".to_string()),
        };
        let prompt = render_level2_prompt(&instruction);
        assert!(prompt.contains("File path: proj/a.ts"));
        assert!(prompt.contains("Operation: UPDATE"));
        assert!(prompt.contains("=====ORIGINAL-CONTENT=====\nlet foo = 1;\n=====END-ORIGINAL-CONTENT====="));
        assert!(prompt.contains("=====MODIFICATION-DETAILS=====\nfoo -> bar\n=====END-MODIFICATION-DETAILS====="));
        assert!(prompt.contains("MODIFIED_FILE_START"));
    }

    #[test]
    fn level2_prompt_for_create_uses_placeholder() {
        let instruction = ModificationInstruction {
            file_path: "proj/new.ts".to_string(),
            operation: Operation::Create,
            description: "new module".to_string(),
            modification_details: "add helper".to_string(),
            original_content: None,
        };
        let prompt = render_level2_prompt(&instruction);
        assert!(prompt.contains("// This is a new file to be created."));
    }
}
