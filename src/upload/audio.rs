//! Accept-list for uploaded files.

use std::path::Path;

const AUDIO_EXTENSIONS: &[(&str, &str)] = &[
    ("mp3", "audio/mpeg"),
    ("wav", "audio/wav"),
    ("m4a", "audio/mp4"),
    ("aac", "audio/aac"),
    ("ogg", "audio/ogg"),
    ("oga", "audio/ogg"),
    ("opus", "audio/opus"),
    ("flac", "audio/flac"),
    ("webm", "audio/webm"),
    ("aiff", "audio/aiff"),
    ("wma", "audio/x-ms-wma"),
];

fn extension(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}

fn mime_for_extension(file_name: &str) -> Option<&'static str> {
    let ext = extension(file_name)?;
    AUDIO_EXTENSIONS
        .iter()
        .find(|(known, _)| *known == ext)
        .map(|(_, mime)| *mime)
}

/// Content type to forward for an accepted file, or `None` if it is not audio.
///
/// A declared `audio/*` type wins. Without one (or with the generic
/// `application/octet-stream`), the file extension decides.
pub fn audio_content_type(file_name: &str, declared: Option<&str>) -> Option<String> {
    let declared = declared
        .map(str::trim)
        .filter(|t| !t.is_empty() && *t != "application/octet-stream");

    match declared {
        Some(t) if t.to_ascii_lowercase().starts_with("audio/") => Some(t.to_string()),
        Some(_) => None,
        None => mime_for_extension(file_name).map(str::to_string),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declared_audio_type() {
        assert_eq!(
            audio_content_type("recording", Some("audio/webm")).as_deref(),
            Some("audio/webm")
        );
    }

    #[test]
    fn test_non_audio_type_rejected_even_with_audio_extension() {
        assert_eq!(audio_content_type("notes.mp3", Some("text/plain")), None);
        assert_eq!(audio_content_type("clip.mp4", Some("video/mp4")), None);
    }

    #[test]
    fn test_extension_fallback() {
        assert_eq!(
            audio_content_type("Standup.MP3", None).as_deref(),
            Some("audio/mpeg")
        );
        assert_eq!(
            audio_content_type("call.m4a", Some("application/octet-stream")).as_deref(),
            Some("audio/mp4")
        );
        assert_eq!(audio_content_type("slides.pdf", None), None);
        assert_eq!(audio_content_type("noextension", Some("")), None);
    }
}
