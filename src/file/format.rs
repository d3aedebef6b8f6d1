use serde::{Deserialize, Serialize};
use std::path::Path;

/// Upload formats accepted by the resource store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    Pdf,
    Txt,
    Docx,
    Mp3,
    Wav,
    Mp4,
}

impl FileFormat {
    pub const ALL: [FileFormat; 6] = [
        FileFormat::Pdf,
        FileFormat::Txt,
        FileFormat::Docx,
        FileFormat::Mp3,
        FileFormat::Wav,
        FileFormat::Mp4,
    ];

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "pdf" => Some(FileFormat::Pdf),
            "txt" => Some(FileFormat::Txt),
            "docx" => Some(FileFormat::Docx),
            "mp3" => Some(FileFormat::Mp3),
            "wav" => Some(FileFormat::Wav),
            "mp4" => Some(FileFormat::Mp4),
            _ => None,
        }
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Self> {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    pub fn extension(&self) -> &'static str {
        match self {
            FileFormat::Pdf => "pdf",
            FileFormat::Txt => "txt",
            FileFormat::Docx => "docx",
            FileFormat::Mp3 => "mp3",
            FileFormat::Wav => "wav",
            FileFormat::Mp4 => "mp4",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            FileFormat::Pdf => "application/pdf",
            FileFormat::Txt => "text/plain",
            FileFormat::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            FileFormat::Mp3 => "audio/mpeg",
            FileFormat::Wav => "audio/wav",
            FileFormat::Mp4 => "video/mp4",
        }
    }

    /// Docx and media files are stored but never converted to text.
    pub fn extracts_text(&self) -> bool {
        matches!(self, FileFormat::Pdf | FileFormat::Txt)
    }
}

impl std::fmt::Display for FileFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}
