// VFS router (part of C10): maps virtual paths inside a capture to the
// handler that produces their bytes. `vfs_ls` answers with node kind and,
// for leaves, the canonical handler path; binary delivery is always a
// second round trip against that handler (§4.10).
//
// The exact path grammar beyond the three prefixes spec.md names is left
// open (§9 open question (b)); we refuse unknown roots with a clear error
// rather than guessing at a grammar the source doesn't specify.

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VfsNodeKind {
    Dir,
    LeafText,
    LeafBin,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct VfsNode {
    pub kind: VfsNodeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handler_path: Option<String>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum VfsError {
    #[error("unknown vfs root in path `{0}`")]
    UnknownRoot(String),
}

/// Classify a VFS path into a node. Recognizes the three root prefixes
/// named in spec §4.10: `/textures/<id>/image.png`,
/// `/draws/<eid>/targets/color<k>.png`, `/buffers/<id>/data`.
pub fn ls(path: &str) -> Result<VfsNode, VfsError> {
    let trimmed = path.trim_start_matches('/');
    let mut segments = trimmed.split('/');

    match segments.next() {
        Some("textures") => classify_textures(&mut segments, path),
        Some("draws") => classify_draws(&mut segments, path),
        Some("buffers") => classify_buffers(&mut segments, path),
        Some("") | None => Ok(VfsNode { kind: VfsNodeKind::Dir, handler_path: None }),
        _ => Err(VfsError::UnknownRoot(path.to_string())),
    }
}

fn classify_textures(
    segments: &mut std::str::Split<'_, char>,
    path: &str,
) -> Result<VfsNode, VfsError> {
    match (segments.next(), segments.next()) {
        (Some(_id), Some(leaf)) if leaf == "image.png" => {
            Ok(VfsNode { kind: VfsNodeKind::LeafBin, handler_path: Some(path.to_string()) })
        }
        (Some(_id), None) => Ok(VfsNode { kind: VfsNodeKind::Dir, handler_path: None }),
        _ => Err(VfsError::UnknownRoot(path.to_string())),
    }
}

fn classify_draws(
    segments: &mut std::str::Split<'_, char>,
    path: &str,
) -> Result<VfsNode, VfsError> {
    let eid = segments.next();
    match (eid, segments.next(), segments.next()) {
        (Some(_eid), Some("targets"), Some(leaf)) if leaf.starts_with("color") => {
            Ok(VfsNode { kind: VfsNodeKind::LeafBin, handler_path: Some(path.to_string()) })
        }
        (Some(_eid), Some("targets"), None) => {
            Ok(VfsNode { kind: VfsNodeKind::Dir, handler_path: None })
        }
        (Some(_eid), None, None) => Ok(VfsNode { kind: VfsNodeKind::Dir, handler_path: None }),
        _ => Err(VfsError::UnknownRoot(path.to_string())),
    }
}

fn classify_buffers(
    segments: &mut std::str::Split<'_, char>,
    path: &str,
) -> Result<VfsNode, VfsError> {
    match (segments.next(), segments.next()) {
        (Some(_id), Some("data")) => {
            Ok(VfsNode { kind: VfsNodeKind::LeafBin, handler_path: Some(path.to_string()) })
        }
        (Some(_id), None) => Ok(VfsNode { kind: VfsNodeKind::Dir, handler_path: None }),
        _ => Err(VfsError::UnknownRoot(path.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn texture_image_is_a_binary_leaf() {
        let node = ls("/textures/7/image.png").unwrap();
        assert_eq!(node.kind, VfsNodeKind::LeafBin);
        assert_eq!(node.handler_path.as_deref(), Some("/textures/7/image.png"));
    }

    #[test]
    fn draw_color_target_is_a_binary_leaf() {
        let node = ls("/draws/42/targets/color0.png").unwrap();
        assert_eq!(node.kind, VfsNodeKind::LeafBin);
    }

    #[test]
    fn buffer_data_is_a_binary_leaf() {
        let node = ls("/buffers/3/data").unwrap();
        assert_eq!(node.kind, VfsNodeKind::LeafBin);
    }

    #[test]
    fn texture_directory_without_leaf_is_a_dir() {
        let node = ls("/textures/7").unwrap();
        assert_eq!(node.kind, VfsNodeKind::Dir);
        assert!(node.handler_path.is_none());
    }

    #[test]
    fn unknown_root_is_refused_not_guessed() {
        let err = ls("/shaders/1/source").unwrap_err();
        assert_eq!(err, VfsError::UnknownRoot("/shaders/1/source".to_string()));
    }

    #[test]
    fn root_path_is_a_dir() {
        let node = ls("/").unwrap();
        assert_eq!(node.kind, VfsNodeKind::Dir);
    }
}
