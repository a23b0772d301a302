use crate::models::FileEntry;

/// A directory of the indexed tree with the files it directly contains.
///
/// Children are owned by value; the tree is immutable once built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub name: String,
    pub files: Vec<FileEntry>,
    pub children: Vec<DirectoryEntry>,
}

impl DirectoryEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            files: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Resolves a slash separated path relative to this directory.
    ///
    /// Leading and trailing slashes are ignored and an empty path resolves to
    /// `self`. Segments must match child names exactly.
    pub fn lookup(&self, path: &str) -> Option<&DirectoryEntry> {
        let path = path.trim_matches('/');
        if path.is_empty() {
            return Some(self);
        }
        let (head, rest) = path.split_once('/').unwrap_or((path, ""));
        self.child(head)?.lookup(rest)
    }

    pub fn child(&self, name: &str) -> Option<&DirectoryEntry> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Image and video files in index order; `Other` files are skipped.
    pub fn media_files(&self) -> Vec<&FileEntry> {
        self.files.iter().filter(|f| f.kind.is_media()).collect()
    }

    /// Total number of files in this directory and all descendants.
    pub fn total_files(&self) -> usize {
        self.files.len() + self.children.iter().map(Self::total_files).sum::<usize>()
    }
}
