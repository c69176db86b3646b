//! Parsers for the two text contracts spoken by the planning model
//! (level 1) and the per-file modification model (level 2).
//!
//! Level 1 responses carry a THREAD_COUNT marker and a
//! FILE_MODIFICATIONS_START/END block of per-file sub-blocks. Level 2
//! responses frame the full modified file content between
//! MODIFIED_FILE_START/END markers. Both formats come from a model, so
//! parsing is deliberately tolerant: malformed sub-blocks are skipped and
//! a missing level 2 frame falls back to treating the whole response as
//! content.

use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

/// Concurrency used when the planner omits or garbles the THREAD_COUNT
/// marker.
pub const DEFAULT_THREAD_COUNT: usize = 4;

/// The kind of change a single instruction asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Update,
    Delete,
}

impl Operation {
    fn parse(keyword: &str) -> Option<Self> {
        match keyword {
            "CREATE" => Some(Operation::Create),
            "UPDATE" => Some(Operation::Update),
            "DELETE" => Some(Operation::Delete),
            _ => None,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Operation::Create => write!(f, "CREATE"),
            Operation::Update => write!(f, "UPDATE"),
            Operation::Delete => write!(f, "DELETE"),
        }
    }
}

/// A single file-scoped change directive extracted from the planner
/// response. `original_content` is attached later by the reconciler; it
/// must be present for UPDATE and DELETE before dispatch and is never set
/// for CREATE.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModificationInstruction {
    pub file_path: String,
    pub operation: Operation,
    pub description: String,
    pub modification_details: String,
    pub original_content: Option<String>,
}

/// The parsed planner response: requested concurrency plus the
/// instructions in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Level1Output {
    pub thread_count: usize,
    pub modifications: Vec<ModificationInstruction>,
}

/// Errors from level 1 parsing. Everything else is recovered locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    /// The response carries neither a modifications block nor a
    /// THREAD_COUNT marker, so nothing can be salvaged from it.
    MissingModificationsBlock,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ParseError::MissingModificationsBlock => write!(
                f,
                "no FILE_MODIFICATIONS block or THREAD_COUNT marker found in planner output"
            ),
        }
    }
}

impl std::error::Error for ParseError {}

fn thread_count_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"THREAD_COUNT:\s*(\d+)").expect("valid regex"))
}

fn modifications_block_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)FILE_MODIFICATIONS_START(.*?)FILE_MODIFICATIONS_END").expect("valid regex")
    })
}

fn file_block_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?s)FILE:\s*([^\r\n]+?)\s*OPERATION:\s*(CREATE|UPDATE|DELETE)\s*DESCRIPTION:\s*(.*?)\s*CONTEXT_MODIFICATIONS_START(.*?)CONTEXT_MODIFICATIONS_END\s*FILE_END",
        )
        .expect("valid regex")
    })
}

fn modified_file_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)MODIFIED_FILE_START(.*?)MODIFIED_FILE_END").expect("valid regex")
    })
}

/// Parses a level 1 planner response into typed instructions.
///
/// The thread count defaults to [`DEFAULT_THREAD_COUNT`] when the marker
/// is missing, non-numeric, or below one. A response without a
/// modifications block is still valid when the thread-count marker is
/// present (the planner legitimately reported "no changes"). Sub-blocks
/// that don't match the contract are skipped; instruction order matches
/// their order of appearance.
pub fn parse_level1_output(text: &str) -> Result<Level1Output, ParseError> {
    let thread_count_marker = thread_count_re().captures(text);
    let thread_count = thread_count_marker
        .as_ref()
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<usize>().ok())
        .filter(|&n| n >= 1)
        .unwrap_or(DEFAULT_THREAD_COUNT);

    let Some(block) = modifications_block_re()
        .captures(text)
        .and_then(|caps| caps.get(1))
    else {
        if thread_count_marker.is_some() {
            return Ok(Level1Output {
                thread_count,
                modifications: Vec::new(),
            });
        }
        return Err(ParseError::MissingModificationsBlock);
    };
    let block = block.as_str();

    let mut modifications = Vec::new();
    for caps in file_block_re().captures_iter(block) {
        let Some(operation) = caps.get(2).and_then(|m| Operation::parse(m.as_str())) else {
            continue;
        };
        let field = |idx: usize| {
            caps.get(idx)
                .map(|m| m.as_str().trim().to_string())
                .unwrap_or_default()
        };
        modifications.push(ModificationInstruction {
            file_path: field(1),
            operation,
            description: field(3),
            modification_details: field(4),
            original_content: None,
        });
    }

    if modifications.is_empty() && !block.trim().is_empty() {
        eprintln!(
            "warning: a modifications block was present but no FILE sub-blocks could be parsed"
        );
    }

    Ok(Level1Output {
        thread_count,
        modifications,
    })
}

/// Extracts the file content from a level 2 response.
///
/// With MODIFIED_FILE_START/END markers present, the interior is returned
/// with exactly one leading and one trailing newline stripped (the markers
/// sit on their own lines); an interior that is only a newline pair yields
/// the empty string, which is meaningful "file becomes empty" content.
/// Without markers the whole trimmed response is returned, so a model that
/// forgets the framing but still produces the file is recovered.
pub fn parse_level2_output(text: &str) -> String {
    if let Some(caps) = modified_file_re().captures(text) {
        let interior = caps.get(1).map(|m| m.as_str()).unwrap_or("");
        return strip_marker_newlines(interior).to_string();
    }
    text.trim().to_string()
}

fn strip_marker_newlines(interior: &str) -> &str {
    let interior = interior
        .strip_prefix("\r\n")
        .or_else(|| interior.strip_prefix('\n'))
        .unwrap_or(interior);
    interior
        .strip_suffix("\r\n")
        .or_else(|| interior.strip_suffix('\n'))
        .unwrap_or(interior)
}
