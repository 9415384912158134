use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Codec value the backend uses to mark a missing stream.
pub const NO_CODEC: &str = "none";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MediaKind {
    #[serde(rename = "audio")]
    Audio,
    #[serde(rename = "video")]
    Video,
    #[serde(rename = "video+audio")]
    AudioVideo,
}

impl MediaKind {
    /// Derives the kind of an encoding from its codecs. An absent codec is
    /// presumed present; only the explicit `"none"` marker removes a stream.
    pub fn classify(video_codec: Option<&str>, audio_codec: Option<&str>) -> Self {
        if video_codec == Some(NO_CODEC) {
            MediaKind::Audio
        } else if audio_codec == Some(NO_CODEC) {
            MediaKind::Video
        } else {
            MediaKind::AudioVideo
        }
    }
}

/// One selectable encoding, serialized in the shape returned by the analyze endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct FormatDescriptor {
    pub format_id: String,
    #[serde(rename = "ext")]
    pub extension: Option<String>,
    #[serde(rename = "resolution")]
    pub resolution_label: String,
    #[serde(rename = "filesize")]
    pub size_bytes: Option<u64>,
    #[serde(rename = "fps")]
    pub frame_rate: Option<f64>,
    #[serde(rename = "tbr")]
    pub bitrate: Option<f64>,
    #[serde(rename = "vcodec")]
    pub video_codec: Option<String>,
    #[serde(rename = "acodec")]
    pub audio_codec: Option<String>,
    #[serde(rename = "type")]
    pub kind: MediaKind,
}

#[derive(Debug, Clone, Serialize)]
pub struct MediaInfo {
    pub id: String,
    pub title: String,
    #[serde(rename = "thumbnail")]
    pub thumbnail_url: Option<String>,
    #[serde(rename = "duration")]
    pub duration_seconds: Option<f64>,
    pub uploader: Option<String>,
    pub channel: Option<String>,
    #[serde(rename = "webpage_url")]
    pub canonical_url: String,
    pub formats: Vec<FormatDescriptor>,
}

/// Backend output for a single source. Every field is optional since extractors
/// report wildly different subsets.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawInfo {
    pub id: Option<String>,
    pub title: Option<String>,
    pub thumbnail: Option<String>,
    pub duration: Option<f64>,
    pub uploader: Option<String>,
    pub channel: Option<String>,
    pub webpage_url: Option<String>,
    #[serde(default)]
    pub formats: Vec<RawFormat>,
    #[serde(default)]
    pub requested_downloads: Vec<RawDownload>,
    pub filepath: Option<String>,
    #[serde(rename = "_filename")]
    pub prepared_filename: Option<String>,
    pub filename: Option<String>,
}

impl RawInfo {
    /// Path the backend claims to have written after a materialize call.
    pub fn reported_path(&self) -> Option<PathBuf> {
        self.requested_downloads
            .iter()
            .find_map(|download| download.filepath.as_deref())
            .or(self.filepath.as_deref())
            .or(self.prepared_filename.as_deref())
            .or(self.filename.as_deref())
            .filter(|path| !path.is_empty())
            .map(PathBuf::from)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawFormat {
    pub format_id: Option<String>,
    pub url: Option<String>,
    pub ext: Option<String>,
    pub format_note: Option<String>,
    pub width: Option<u64>,
    pub height: Option<u64>,
    pub filesize: Option<u64>,
    pub filesize_approx: Option<f64>,
    pub fps: Option<f64>,
    pub tbr: Option<f64>,
    pub vcodec: Option<String>,
    pub acodec: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawDownload {
    pub filepath: Option<String>,
}
