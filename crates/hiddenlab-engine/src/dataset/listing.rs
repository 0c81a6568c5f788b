use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use hiddenlab_core::config::ReviewConfig;
use hiddenlab_core::path::{relative_scope, segments};
use serde::Serialize;
use tracing::warn;

/// A file found by a recursive listing, with its raw content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    pub file_path: String,
    pub content: String,
}

/// An image inside an instance directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageEntry {
    pub name: String,
    pub path: String,
}

/// Instances whose `path.txt` content and screen agree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PathGroup {
    pub content: String,
    pub screen: String,
    pub file_paths: Vec<String>,
}

pub(crate) fn resolve(root: &Path, scope: &str) -> Result<PathBuf> {
    let rel = relative_scope(scope)?;
    Ok(root.join(rel))
}

pub(crate) fn join_rel(base: &str, name: &str) -> String {
    let mut parts = segments(base);
    parts.push(name);
    parts.join("/")
}

/// Compare names so that embedded numbers order by value (`2` before `10`).
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut a_chars = a.chars().peekable();
    let mut b_chars = b.chars().peekable();

    loop {
        match (a_chars.peek().copied(), b_chars.peek().copied()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) if x.is_ascii_digit() && y.is_ascii_digit() => {
                let left = take_number(&mut a_chars);
                let right = take_number(&mut b_chars);
                let left_trim = left.trim_start_matches('0');
                let right_trim = right.trim_start_matches('0');
                let ord = left_trim
                    .len()
                    .cmp(&right_trim.len())
                    .then_with(|| left_trim.cmp(right_trim));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            (Some(x), Some(y)) => {
                let ord = x.to_ascii_lowercase().cmp(&y.to_ascii_lowercase());
                if ord != Ordering::Equal {
                    return ord;
                }
                a_chars.next();
                b_chars.next();
            }
        }
    }
}

fn take_number(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut digits = String::new();
    while let Some(c) = chars.peek().copied().filter(char::is_ascii_digit) {
        digits.push(c);
        chars.next();
    }
    digits
}

/// Sub-directory names of `scope`, naturally sorted.
pub fn list_folders(root: &Path, scope: &str) -> Result<Vec<String>> {
    let dir = resolve(root, scope)?;
    let entries =
        std::fs::read_dir(&dir).with_context(|| format!("cannot read folder {}", dir.display()))?;

    let mut folders: Vec<String> = entries
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_ok_and(|t| t.is_dir()))
        .map(|e| e.file_name().to_string_lossy().to_string())
        .collect();
    folders.sort_by(|a, b| natural_cmp(a, b));
    Ok(folders)
}

/// Images of an instance in review order.
///
/// `before_annotated.png` is hidden when the richer
/// `before_annotated_with_children.png` is present.
pub fn list_images(root: &Path, scope: &str, config: &ReviewConfig) -> Result<Vec<ImageEntry>> {
    const ANNOTATED: &str = "before_annotated.png";
    const ANNOTATED_CHILDREN: &str = "before_annotated_with_children.png";

    let dir = resolve(root, scope)?;
    let entries =
        std::fs::read_dir(&dir).with_context(|| format!("cannot read images in {}", dir.display()))?;

    let names: Vec<String> = entries
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_ok_and(|t| t.is_file()))
        .map(|e| e.file_name().to_string_lossy().to_string())
        .filter(|name| config.is_image(name))
        .collect();

    let has_children = names.iter().any(|n| n == ANNOTATED_CHILDREN);
    let mut images: Vec<ImageEntry> = names
        .into_iter()
        .filter(|n| !(has_children && n == ANNOTATED))
        .map(|name| ImageEntry {
            path: join_rel(scope, &name),
            name,
        })
        .collect();

    images.sort_by(|a, b| {
        config
            .frame_rank(&a.name)
            .cmp(&config.frame_rank(&b.name))
            .then_with(|| natural_cmp(&a.name, &b.name))
    });
    Ok(images)
}

/// Every file called `file_name` under `scope`, with its content.
///
/// Unreadable sub-directories and files are logged and skipped; only an
/// unreadable scope directory is an error.
pub fn list_files_named(root: &Path, scope: &str, file_name: &str) -> Result<Vec<FileEntry>> {
    let dir = resolve(root, scope)?;
    let entries =
        std::fs::read_dir(&dir).with_context(|| format!("cannot read folder {}", dir.display()))?;

    let mut found = Vec::new();
    collect_named(entries, &segments(scope).join("/"), file_name, &mut found);
    found.sort_by(|a, b| natural_cmp(&a.file_path, &b.file_path));
    Ok(found)
}

fn collect_named(
    entries: std::fs::ReadDir,
    rel: &str,
    file_name: &str,
    found: &mut Vec<FileEntry>,
) {
    for entry in entries.filter_map(|e| e.ok()) {
        let name = entry.file_name().to_string_lossy().to_string();
        let sub_rel = join_rel(rel, &name);
        let Ok(file_type) = entry.file_type() else {
            continue;
        };

        if file_type.is_dir() {
            match std::fs::read_dir(entry.path()) {
                Ok(sub) => collect_named(sub, &sub_rel, file_name, found),
                Err(e) => warn!(path = %sub_rel, error = %e, "skipping unreadable folder"),
            }
        } else if file_type.is_file() && name == file_name {
            match std::fs::read_to_string(entry.path()) {
                Ok(content) => found.push(FileEntry {
                    file_path: sub_rel,
                    content,
                }),
                Err(e) => warn!(path = %sub_rel, error = %e, "skipping unreadable file"),
            }
        }
    }
}

/// Group `path.txt` listings by content and screen, keeping first-seen order.
///
/// The screen is the fourth segment from the end of an entry that ends in
/// `path_file` (`.../screen/gesture/number/path.txt`), else `unknown`.
pub fn group_paths(entries: &[FileEntry], path_file: &str) -> Vec<PathGroup> {
    let mut groups: Vec<PathGroup> = Vec::new();

    for entry in entries {
        let parts = segments(&entry.file_path);
        let screen = match parts.as_slice() {
            [.., screen, _, _, last] if *last == path_file => screen.to_string(),
            _ => "unknown".to_string(),
        };

        match groups
            .iter_mut()
            .find(|g| g.content == entry.content && g.screen == screen)
        {
            Some(group) => group.file_paths.push(entry.file_path.clone()),
            None => groups.push(PathGroup {
                content: entry.content.clone(),
                screen,
                file_paths: vec![entry.file_path.clone()],
            }),
        }
    }
    groups
}
