//! Slide navigation over the ordered media files of one directory.
//!
//! Everything here is a pure function of the file list. Callers pass the
//! directory's media files only (see `DirectoryEntry::media_files`), so
//! `Other` files never show up as a neighbour.

use std::borrow::Borrow;

use crate::models::{FileEntry, FileId};

/// Directories with at most this many files show the whole list as the strip.
pub const FULL_STRIP_LIMIT: usize = 11;

/// Number of files in a windowed thumbnail strip.
pub const WINDOW_SIZE: usize = 10;

/// Files shown before the current one in a windowed strip.
pub const WINDOW_LEADING: usize = 5;

/// Position of the file with `id`, if present.
pub fn index_of<F: Borrow<FileEntry>>(files: &[F], id: FileId) -> Option<usize> {
    files.iter().position(|f| f.borrow().id == id)
}

/// The file after position `i`, wrapping from the last file to the first.
pub fn next<F>(files: &[F], i: usize) -> Option<&F> {
    if files.is_empty() {
        return None;
    }
    files.get(i + 1).or_else(|| files.first())
}

/// The file before position `i`, wrapping from the first file to the last.
pub fn prev<F>(files: &[F], i: usize) -> Option<&F> {
    match i.checked_sub(1) {
        Some(before) => files.get(before).or_else(|| files.last()),
        None => files.last(),
    }
}

/// The files shown in the thumbnail strip around position `index`.
///
/// Short lists are returned whole. Longer lists yield `WINDOW_SIZE` files
/// starting `WINDOW_LEADING` files before `index`. The window never wraps: it
/// is shifted forward at the start of the list and backward at the end.
pub fn neighborhood<F>(files: &[F], index: usize) -> &[F] {
    if files.len() <= FULL_STRIP_LIMIT {
        return files;
    }
    // files.len() > FULL_STRIP_LIMIT >= WINDOW_SIZE here.
    let start = index
        .saturating_sub(WINDOW_LEADING)
        .min(files.len() - WINDOW_SIZE);
    &files[start..start + WINDOW_SIZE]
}

/// The current file of a slide and its wraparound neighbours.
#[derive(Debug, Clone, Copy)]
pub struct Siblings<'a> {
    pub index: usize,
    pub current: &'a FileEntry,
    pub prev: &'a FileEntry,
    pub next: &'a FileEntry,
}

/// Locates `id` in `files` and resolves its previous and next files.
pub fn siblings<'a>(files: &[&'a FileEntry], id: FileId) -> Option<Siblings<'a>> {
    let index = index_of(files, id)?;
    Some(Siblings {
        index,
        current: files[index],
        prev: *prev(files, index)?,
        next: *next(files, index)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FileKind;

    fn files(count: usize) -> Vec<FileEntry> {
        (0..count)
            .map(|i| FileEntry {
                name: format!("img{i:03}.jpg"),
                id: FileId::new(100 + i),
                kind: FileKind::Image,
            })
            .collect()
    }

    #[test]
    fn test_index_of() {
        let files = files(4);
        assert_eq!(index_of(&files, FileId::new(102)), Some(2));
        assert_eq!(index_of(&files, FileId::new(7)), None);

        let refs: Vec<&FileEntry> = files.iter().collect();
        assert_eq!(index_of(&refs, FileId::new(100)), Some(0));
    }

    #[test]
    fn test_next_prev_wrap() {
        let files = files(4);
        assert_eq!(next(&files, 3), Some(&files[0]));
        assert_eq!(prev(&files, 0), Some(&files[3]));
        assert_eq!(next(&files, 1), Some(&files[2]));
        assert_eq!(prev(&files, 2), Some(&files[1]));
    }

    #[test]
    fn test_single_file_is_its_own_neighbour() {
        let files = files(1);
        assert_eq!(next(&files, 0), Some(&files[0]));
        assert_eq!(prev(&files, 0), Some(&files[0]));
    }

    #[test]
    fn test_empty_list_has_no_neighbours() {
        let files: Vec<FileEntry> = Vec::new();
        assert_eq!(next(&files, 0), None);
        assert_eq!(prev(&files, 0), None);
        assert!(neighborhood(&files, 0).is_empty());
    }

    #[test]
    fn test_neighborhood_short_list_is_whole() {
        for len in [1, 5, 11] {
            let files = files(len);
            for i in 0..len {
                assert_eq!(neighborhood(&files, i).len(), len);
            }
        }
    }

    #[test]
    fn test_neighborhood_window_contains_current() {
        let files = files(30);
        for i in 0..files.len() {
            let window = neighborhood(&files, i);
            assert_eq!(window.len(), WINDOW_SIZE);
            assert!(window.iter().any(|f| f.id == files[i].id), "index {i}");
        }
    }

    #[test]
    fn test_neighborhood_centered() {
        let files = files(30);
        let window = neighborhood(&files, 12);
        assert_eq!(window.len(), 10);
        assert_eq!(window[0].id, files[7].id);
        assert_eq!(window[9].id, files[16].id);
    }

    #[test]
    fn test_neighborhood_start_is_clamped_not_wrapped() {
        let files = files(12);
        let window = neighborhood(&files, 2);
        assert_eq!(window.len(), 10);
        assert_eq!(window[0].id, files[0].id);
        assert_eq!(window[9].id, files[9].id);
    }

    #[test]
    fn test_neighborhood_end_is_shifted_back() {
        let files = files(12);
        for i in 8..12 {
            let window = neighborhood(&files, i);
            assert_eq!(window.len(), 10, "index {i}");
            assert!(window.iter().any(|f| f.id == files[i].id));
        }
        let window = neighborhood(&files, 11);
        assert_eq!(window[0].id, files[2].id);
        assert_eq!(window[9].id, files[11].id);

        let files = self::files(30);
        let window = neighborhood(&files, 29);
        assert_eq!(window.len(), 10);
        assert_eq!(window[0].id, files[20].id);
    }

    #[test]
    fn test_siblings_two_files() {
        let files = files(2);
        let refs: Vec<&FileEntry> = files.iter().collect();
        let s = siblings(&refs, FileId::new(101)).unwrap();
        assert_eq!(s.index, 1);
        assert_eq!(s.prev.id, FileId::new(100));
        assert_eq!(s.next.id, FileId::new(100));
        assert!(siblings(&refs, FileId::new(5)).is_none());
    }
}
