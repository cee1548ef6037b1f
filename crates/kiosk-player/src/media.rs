use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::config::MediaConfig;

/// Identifier of a video slot (button 1 maps to slot 1, and so on).
pub type SlotId = u8;

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif"];
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "avi", "mkv"];

fn has_extension_in(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let e = e.to_ascii_lowercase();
            extensions.iter().any(|x| *x == e)
        })
        .unwrap_or(false)
}

pub fn is_image_file(path: &Path) -> bool {
    has_extension_in(path, IMAGE_EXTENSIONS)
}

pub fn is_video_file(path: &Path) -> bool {
    has_extension_in(path, VIDEO_EXTENSIONS)
}

/// Union of image and video types; the upload gateway uses this to filter
/// incoming files.
pub fn is_allowed_file(path: &Path) -> bool {
    is_image_file(path) || is_video_file(path)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaEntry {
    pub name: String,
    pub path: PathBuf,
}

impl MediaEntry {
    fn from_path(path: PathBuf) -> Self {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("<unnamed>")
            .to_string();
        Self { name, path }
    }
}

/// Everything the kiosk can currently point a slot at: defaults that exist
/// on disk plus classified files under the uploads directory.
#[derive(Debug, Default, Clone)]
pub struct Library {
    pub images: Vec<MediaEntry>,
    pub videos: Vec<MediaEntry>,
}

pub fn scan(cfg: &MediaConfig) -> Library {
    let mut lib = Library::default();

    let image = cfg.image_path();
    if image.exists() {
        lib.images.push(MediaEntry::from_path(image));
    }
    for (_, video) in cfg.slot_paths() {
        if video.exists() {
            lib.videos.push(MediaEntry::from_path(video));
        }
    }

    for entry in WalkDir::new(cfg.uploads_path())
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.into_path();
        if is_image_file(&path) {
            lib.images.push(MediaEntry::from_path(path));
        } else if is_video_file(&path) {
            lib.videos.push(MediaEntry::from_path(path));
        }
    }

    lib
}
