//! Path checks for archive entries

use depot_errors::ArchiveError;
use std::collections::VecDeque;
use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

/// Symlinks followed before a path is treated as a loop
const MAX_LINK_HOPS: usize = 40;

/// Collapse `.` and `..` without touching the filesystem
///
/// Root and prefix components are dropped, so absolute names land under the
/// destination. Returns `None` when a `..` would climb above the start.
fn normalize(path: &Path) -> Option<PathBuf> {
    let mut result = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => result.push(part),
            Component::ParentDir => {
                if !result.pop() {
                    return None;
                }
            }
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
        }
    }
    Some(result)
}

/// Resolve an entry name to a path relative to the destination directory
///
/// # Errors
///
/// Returns `ArchiveError::PathTraversal` when the cleaned name is `..` or
/// starts with a parent-directory segment.
pub(crate) fn sanitize_entry_path(name: &Path) -> Result<PathBuf, ArchiveError> {
    normalize(name).ok_or_else(|| ArchiveError::PathTraversal {
        entry: name.display().to_string(),
    })
}

/// Check a symlink target, resolved from the link's own directory
///
/// `entry` is the already sanitized location of the link. Links extracted
/// earlier below `dest` are followed, so a target cannot climb out through
/// them. Returns the target's location relative to the destination.
pub(crate) fn sanitize_symlink_target(
    dest: &Path,
    entry: &Path,
    target: &Path,
) -> Result<PathBuf, ArchiveError> {
    if target.has_root() {
        return Err(unsafe_link(entry, target));
    }
    let base = entry.parent().unwrap_or_else(|| Path::new(""));
    resolve_in_dest(dest, &base.join(target)).ok_or_else(|| unsafe_link(entry, target))
}

/// Check a hard-link target, which tar records relative to the archive root
///
/// The result has every symlink below `dest` resolved, so linking to it
/// never reaches a file outside the destination.
pub(crate) fn sanitize_hardlink_target(
    dest: &Path,
    entry: &Path,
    target: &Path,
) -> Result<PathBuf, ArchiveError> {
    if target.has_root() {
        return Err(unsafe_link(entry, target));
    }
    match resolve_in_dest(dest, target) {
        Some(resolved) if !resolved.as_os_str().is_empty() => Ok(resolved),
        _ => Err(unsafe_link(entry, target)),
    }
}

fn unsafe_link(entry: &Path, target: &Path) -> ArchiveError {
    ArchiveError::UnsafeLinkTarget {
        entry: entry.display().to_string(),
        target: target.display().to_string(),
    }
}

/// Resolve `relative` below `dest`, following symlinks already on disk
///
/// `dest` acts as the root: an absolute link target, or a `..` that would
/// climb above `dest`, yields `None`. Components that do not exist yet are
/// taken literally.
fn resolve_in_dest(dest: &Path, relative: &Path) -> Option<PathBuf> {
    let mut pending = VecDeque::new();
    queue_front(&mut pending, relative)?;

    let mut resolved = PathBuf::new();
    let mut hops = 0;
    while let Some(part) = pending.pop_front() {
        if part == ".." {
            if !resolved.pop() {
                return None;
            }
            continue;
        }
        resolved.push(&part);

        let on_disk = dest.join(&resolved);
        let is_link = std::fs::symlink_metadata(&on_disk)
            .is_ok_and(|meta| meta.file_type().is_symlink());
        if is_link {
            hops += 1;
            if hops > MAX_LINK_HOPS {
                return None;
            }
            let link = std::fs::read_link(&on_disk).ok()?;
            resolved.pop();
            queue_front(&mut pending, &link)?;
        }
    }
    Some(resolved)
}

/// Put the components of `path` ahead of whatever is still pending
fn queue_front(pending: &mut VecDeque<OsString>, path: &Path) -> Option<()> {
    for component in path.components().rev() {
        match component {
            Component::Normal(part) => pending.push_front(part.to_os_string()),
            Component::ParentDir => pending.push_front(OsString::from("..")),
            Component::CurDir => {}
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(())
}

/// Whether an entry path answers to `wanted`, by cleaned path or base name
pub(crate) fn matches_entry_name(path: &Path, wanted: &str) -> bool {
    let wanted = Path::new(wanted);
    if let Some(cleaned) = normalize(wanted) {
        if !cleaned.as_os_str().is_empty() && normalize(path).as_deref() == Some(cleaned.as_path()) {
            return true;
        }
    }
    matches_base_name(path, wanted)
}

/// Whether the last component of `path` equals `wanted`
pub(crate) fn matches_base_name(path: &Path, wanted: &Path) -> bool {
    path.file_name()
        .is_some_and(|name| Some(name) == wanted.file_name() && wanted.components().count() == 1)
}

/// Return the first component between `dest` and `relative` that is a symlink
///
/// Writing beneath a link created by an earlier entry would bypass the
/// checks above.
pub(crate) fn symlinked_ancestor(dest: &Path, relative: &Path) -> Option<PathBuf> {
    let mut current = dest.to_path_buf();
    let parent = relative.parent()?;
    for component in parent.components() {
        current.push(component);
        match std::fs::symlink_metadata(&current) {
            Ok(meta) if meta.file_type().is_symlink() => return Some(current),
            Ok(_) => {}
            Err(_) => return None,
        }
    }
    None
}
