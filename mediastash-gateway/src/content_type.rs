//! Format-to-MIME resolution

/// Resolve a media format string to a MIME content type
///
/// Pure and total: matching is case-insensitive, and unknown formats fall
/// back to `application/octet-stream` instead of failing.
pub fn resolve_content_type(format: &str) -> &'static str {
    match format.to_ascii_lowercase().as_str() {
        // Video containers
        "mp4" => "video/mp4",
        "m4v" => "video/x-m4v",
        "webm" => "video/webm",
        "mkv" => "video/x-matroska",
        "avi" => "video/x-msvideo",
        "mov" => "video/quicktime",
        "flv" => "video/x-flv",
        "wmv" => "video/x-ms-wmv",
        "3gp" => "video/3gpp",
        "ts" => "video/mp2t",
        // Audio containers and codecs
        "mp3" => "audio/mpeg",
        "m4a" => "audio/mp4",
        "aac" => "audio/aac",
        "ogg" => "audio/ogg",
        "opus" => "audio/opus",
        "wav" => "audio/wav",
        "flac" => "audio/flac",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_insensitive() {
        assert_eq!(resolve_content_type("MP4"), "video/mp4");
        assert_eq!(resolve_content_type("mp4"), "video/mp4");
        assert_eq!(resolve_content_type("Mp4"), "video/mp4");
    }

    #[test]
    fn test_video_formats() {
        assert_eq!(resolve_content_type("webm"), "video/webm");
        assert_eq!(resolve_content_type("mkv"), "video/x-matroska");
        assert_eq!(resolve_content_type("mov"), "video/quicktime");
        assert_eq!(resolve_content_type("ts"), "video/mp2t");
    }

    #[test]
    fn test_audio_formats() {
        assert_eq!(resolve_content_type("mp3"), "audio/mpeg");
        assert_eq!(resolve_content_type("m4a"), "audio/mp4");
        assert_eq!(resolve_content_type("opus"), "audio/opus");
        assert_eq!(resolve_content_type("flac"), "audio/flac");
    }

    #[test]
    fn test_unknown_falls_back_to_octet_stream() {
        assert_eq!(resolve_content_type("xyz"), "application/octet-stream");
        assert_eq!(resolve_content_type(""), "application/octet-stream");
        assert_eq!(resolve_content_type("tar.gz"), "application/octet-stream");
    }
}
