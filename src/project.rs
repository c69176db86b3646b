//! The in-memory project model: a flat map of uploaded file paths to
//! contents, and the derived directory tree.
//!
//! The map is the single source of truth. The tree is rebuilt from it on
//! every change and never mutated directly. Text files hold their content
//! verbatim; binary and image files hold a base64 data URL so the whole
//! project round-trips through plain strings.

use anyhow::{Context, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Content and mime type of a single uploaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileData {
    pub content: String,
    pub mime_type: String,
}

/// The flat project state, keyed by `/`-separated POSIX-style path. Keys
/// usually start with the project's own directory name, mirroring a
/// browser folder upload.
pub type ProjectFiles = HashMap<String, FileData>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    File,
    Directory,
}

/// A node of the derived tree. `path` is the `/`-joined sequence of
/// ancestor names and doubles as the node's identifier. Directory nodes
/// have children and never content; file nodes have empty children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTreeNode {
    pub name: String,
    pub path: String,
    pub node_type: NodeType,
    pub children: Vec<FileTreeNode>,
    pub content: Option<String>,
    pub mime_type: Option<String>,
}

/// Builds the directory forest from the flat map.
///
/// Paths are processed in lexicographic order, so the result is
/// deterministic regardless of map iteration order. A directory created
/// for one path is reused by every later path sharing the prefix.
pub fn build_file_tree(files: &ProjectFiles) -> Vec<FileTreeNode> {
    let mut entries: Vec<(&str, &FileData)> =
        files.iter().map(|(k, v)| (k.as_str(), v)).collect();
    entries.sort_by_key(|(path, _)| *path);

    let mut roots = Vec::new();
    for (path, data) in entries {
        let segments: Vec<&str> = path.split('/').collect();
        insert_path(&mut roots, "", &segments, data);
    }
    roots
}

fn insert_path(nodes: &mut Vec<FileTreeNode>, parent_path: &str, segments: &[&str], data: &FileData) {
    let Some((name, rest)) = segments.split_first() else {
        return;
    };
    let path = if parent_path.is_empty() {
        (*name).to_string()
    } else {
        format!("{}/{}", parent_path, name)
    };

    if rest.is_empty() {
        nodes.push(FileTreeNode {
            name: (*name).to_string(),
            path,
            node_type: NodeType::File,
            children: Vec::new(),
            content: Some(data.content.clone()),
            mime_type: Some(data.mime_type.clone()),
        });
        return;
    }

    let idx = match nodes
        .iter()
        .position(|n| n.node_type == NodeType::Directory && n.name == *name)
    {
        Some(idx) => idx,
        None => {
            nodes.push(FileTreeNode {
                name: (*name).to_string(),
                path: path.clone(),
                node_type: NodeType::Directory,
                children: Vec::new(),
                content: None,
                mime_type: None,
            });
            nodes.len() - 1
        }
    };
    insert_path(&mut nodes[idx].children, &path, rest, data);
}

/// Reads a directory into the flat map. Keys are rooted at the
/// directory's own name, so the loaded set has a single top-level segment
/// exactly like a browser folder upload.
pub fn load_project_dir(dir: &Path) -> Result<ProjectFiles> {
    let root_name = project_root_name(dir)?;
    let mut files = ProjectFiles::new();
    visit_dir(dir, &root_name, &mut files)?;
    Ok(files)
}

/// The project's top-level segment, taken from the directory name.
pub fn project_root_name(dir: &Path) -> Result<String> {
    dir.file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.to_string())
        .with_context(|| format!("Project directory has no usable name: {}", dir.display()))
}

fn visit_dir(dir: &Path, prefix: &str, files: &mut ProjectFiles) -> Result<()> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory: {}", dir.display()))?;
    let mut entries: Vec<_> = entries
        .collect::<std::io::Result<Vec<_>>>()
        .with_context(|| format!("Failed to read directory entry in {}", dir.display()))?;
    entries.sort_by_key(|entry| entry.file_name());

    for entry in entries {
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().to_string();
        let key = format!("{}/{}", prefix, name);
        if path.is_dir() {
            visit_dir(&path, &key, files)?;
        } else {
            files.insert(key, read_file_data(&path)?);
        }
    }
    Ok(())
}

/// Reads one file. Images and non-UTF-8 binaries become base64 data URLs;
/// everything else is kept as text.
pub fn read_file_data(path: &Path) -> Result<FileData> {
    let mime_type = mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string();
    let bytes =
        fs::read(path).with_context(|| format!("Failed to read file: {}", path.display()))?;

    if mime_type.starts_with("image/") {
        let content = to_data_url(&mime_type, &bytes);
        return Ok(FileData { content, mime_type });
    }
    match String::from_utf8(bytes) {
        Ok(content) => Ok(FileData { content, mime_type }),
        Err(err) => {
            let content = to_data_url(&mime_type, err.as_bytes());
            Ok(FileData { content, mime_type })
        }
    }
}

fn to_data_url(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime_type, BASE64.encode(bytes))
}

fn decode_data_url(content: &str) -> Option<Vec<u8>> {
    let rest = content.strip_prefix("data:")?;
    let (_, payload) = rest.split_once(";base64,")?;
    BASE64.decode(payload).ok()
}

/// Writes the map under `dir`, stripping the leading `root` segment from
/// keys that carry it, then removes the `removed` paths (files deleted by
/// the batch) from disk. Suspicious keys that would escape `dir` are
/// skipped with a warning rather than written.
pub fn write_project_dir(
    files: &ProjectFiles,
    dir: &Path,
    root: &str,
    removed: &[String],
) -> Result<()> {
    let mut keys: Vec<&String> = files.keys().collect();
    keys.sort();

    for key in keys {
        let Some(target) = dest_path(dir, root, key) else {
            eprintln!("warning: refusing to write suspicious path: {}", key);
            continue;
        };
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        let data = &files[key];
        let result = match decode_data_url(&data.content) {
            Some(bytes) => fs::write(&target, bytes),
            None => fs::write(&target, &data.content),
        };
        result.with_context(|| format!("Failed to write file: {}", target.display()))?;
    }

    for key in removed {
        let Some(target) = dest_path(dir, root, key) else {
            continue;
        };
        match fs::remove_file(&target) {
            Ok(()) => {}
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("Failed to remove file: {}", target.display()));
            }
        }
    }
    Ok(())
}

fn dest_path(dir: &Path, root: &str, key: &str) -> Option<PathBuf> {
    let rel = key
        .strip_prefix(root)
        .and_then(|rest| rest.strip_prefix('/'))
        .unwrap_or(key);
    if rel.is_empty() || rel.split('/').any(|seg| seg.is_empty() || seg == "..") {
        return None;
    }
    Some(dir.join(rel))
}
