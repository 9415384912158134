use super::types::{FormatDescriptor, MediaInfo, MediaKind, RawFormat, RawInfo};
use tracing::debug;
use url::Url;

/// Turns raw backend metadata into the canonical `MediaInfo`.
pub fn media_info(raw: RawInfo, source: &Url) -> MediaInfo {
    let formats = raw
        .formats
        .into_iter()
        .filter_map(format_descriptor)
        .collect();

    MediaInfo {
        id: raw.id.unwrap_or_default(),
        title: raw.title.unwrap_or_default(),
        thumbnail_url: raw.thumbnail,
        duration_seconds: raw.duration,
        uploader: raw.uploader,
        channel: raw.channel,
        canonical_url: raw
            .webpage_url
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| source.to_string()),
        formats,
    }
}

/// Returns `None` for records that cannot be requested directly: no media
/// locator (usually a manifest) or no format id.
fn format_descriptor(raw: RawFormat) -> Option<FormatDescriptor> {
    if raw.url.as_deref().is_none_or(str::is_empty) {
        debug!("Skipping format {:?} without a media URL", raw.format_id);
        return None;
    }

    let Some(format_id) = raw.format_id.filter(|id| !id.is_empty()) else {
        debug!("Skipping format without an id");
        return None;
    };

    let resolution_label = match raw.format_note.filter(|note| !note.is_empty()) {
        Some(note) => note,
        None => format!(
            "{}x{}",
            raw.width.map(|w| w.to_string()).unwrap_or_default(),
            raw.height.map(|h| h.to_string()).unwrap_or_default()
        ),
    };

    let size_bytes = raw
        .filesize
        .or_else(|| raw.filesize_approx.map(|approx| approx.round() as u64));

    let kind = MediaKind::classify(raw.vcodec.as_deref(), raw.acodec.as_deref());

    Some(FormatDescriptor {
        format_id,
        extension: raw.ext,
        resolution_label,
        size_bytes,
        frame_rate: raw.fps,
        bitrate: raw.tbr,
        video_codec: raw.vcodec,
        audio_codec: raw.acodec,
        kind,
    })
}
