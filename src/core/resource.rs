use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

use crate::file::FileFormat;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    LocalUpload,
    RemoteVideo,
    CoursePost,
    DirectUrl,
}

impl SourceKind {
    pub fn label(&self) -> &'static str {
        match self {
            SourceKind::LocalUpload => "upload",
            SourceKind::RemoteVideo => "video",
            SourceKind::CoursePost => "course post",
            SourceKind::DirectUrl => "url",
        }
    }
}

/// One ingested artifact. `name` is for display only and may repeat; `id` is unique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: Uuid,
    pub name: String,
    pub path: PathBuf,
    pub size_mb: f64,
    pub source: SourceKind,
    pub format: Option<FileFormat>,
}

impl Resource {
    pub fn new(name: impl Into<String>, path: PathBuf, size_mb: f64, source: SourceKind) -> Self {
        let format = FileFormat::from_path(&path);
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            path,
            size_mb,
            source,
            format,
        }
    }

    pub fn extracts_text(&self) -> bool {
        self.format.map(|f| f.extracts_text()).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_assigns_unique_ids() {
        let a = Resource::new("notes.txt", PathBuf::from("r/notes.txt"), 0.1, SourceKind::LocalUpload);
        let b = Resource::new("notes.txt", PathBuf::from("r/notes.txt"), 0.1, SourceKind::LocalUpload);
        assert_ne!(a.id, b.id);
        assert_eq!(a.format, Some(FileFormat::Txt));
        assert!(a.extracts_text());
    }

    #[test]
    fn test_format_from_stored_path() {
        let video = Resource::new("Lecture 1", PathBuf::from("r/Lecture 1.webm"), 0.0, SourceKind::RemoteVideo);
        assert_eq!(video.format, None);
        assert!(!video.extracts_text());

        let audio = Resource::new("talk", PathBuf::from("r/talk.MP3"), 3.2, SourceKind::DirectUrl);
        assert_eq!(audio.format, Some(FileFormat::Mp3));
        assert!(!audio.extracts_text());
    }

    #[test]
    fn test_source_kind_serializes_snake_case() {
        assert_eq!(serde_json::to_string(&SourceKind::CoursePost).unwrap(), "\"course_post\"");
        assert_eq!(SourceKind::DirectUrl.label(), "url");
    }
}
