//! Nested folder tree built from a flat folder list.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::Serialize;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use super::Folder;

/// A node of the folder tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FolderNode {
    /// Folder ID; `None` for the synthetic root.
    pub id: Option<i64>,
    /// Folder name; `/` for the synthetic root.
    pub name: String,
    /// Materialized path; empty for the synthetic root.
    pub path: String,
    /// Child folders, ordered by name.
    pub children: Vec<FolderNode>,
}

impl FolderNode {
    fn root() -> Self {
        Self {
            id: None,
            name: "/".to_string(),
            path: String::new(),
            children: Vec::new(),
        }
    }

    /// Total number of folders below this node.
    pub fn descendant_count(&self) -> usize {
        self.children
            .iter()
            .map(|c| 1 + c.descendant_count())
            .sum()
    }
}

/// Build the folder tree under a synthetic root.
///
/// Siblings are ordered by a case- and accent-insensitive key, with the raw
/// name as tie-breaker. Folders whose parent is missing from the list are
/// dropped.
pub fn build_tree(folders: &[Folder]) -> FolderNode {
    let mut by_parent: HashMap<Option<i64>, Vec<&Folder>> = HashMap::new();
    for folder in folders {
        by_parent.entry(folder.parent_id).or_default().push(folder);
    }

    let mut root = FolderNode::root();
    root.children = children_of(None, &by_parent);
    root
}

fn children_of(
    parent: Option<i64>,
    by_parent: &HashMap<Option<i64>, Vec<&Folder>>,
) -> Vec<FolderNode> {
    let Some(folders) = by_parent.get(&parent) else {
        return Vec::new();
    };

    let mut keyed: Vec<(String, &Folder)> = folders
        .iter()
        .map(|f| (collation_key(&f.name), *f))
        .collect();
    keyed.sort_by(|(ka, a), (kb, b)| compare_names(ka, &a.name, kb, &b.name));

    keyed
        .into_iter()
        .map(|(_, folder)| FolderNode {
            id: Some(folder.id),
            name: folder.name.clone(),
            path: folder.path.clone(),
            children: children_of(Some(folder.id), by_parent),
        })
        .collect()
}

fn compare_names(key_a: &str, a: &str, key_b: &str, b: &str) -> Ordering {
    key_a.cmp(key_b).then_with(|| a.cmp(b))
}

/// Sort key approximating locale ordering: compatibility-decomposed, combining
/// marks stripped, lowercased.
fn collation_key(name: &str) -> String {
    name.nfkd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}
