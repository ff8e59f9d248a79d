//! MIME detection for media attachments

const FALLBACK_MIME: &str = "application/octet-stream";

/// Detect the MIME type of an attachment.
///
/// Magic numbers in `bytes` win; the extension of `origin` (a file path or
/// URL) is consulted next. Unknown content is reported as
/// `application/octet-stream`.
pub fn guess_mime(bytes: Option<&[u8]>, origin: Option<&str>) -> String {
    bytes
        .and_then(sniff)
        .or_else(|| origin.and_then(from_extension))
        .unwrap_or_else(|| FALLBACK_MIME.to_string())
}

fn sniff(bytes: &[u8]) -> Option<String> {
    infer::get(bytes).map(|kind| kind.mime_type().to_string())
}

fn from_extension(origin: &str) -> Option<String> {
    // Query strings would hide the extension of a URL.
    let trimmed = origin.split(['?', '#']).next().unwrap_or(origin);
    mime_guess::from_path(trimmed)
        .first_raw()
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_HEADER: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

    #[test]
    fn bytes_win_over_extension() {
        assert_eq!(guess_mime(Some(PNG_HEADER), Some("photo.jpg")), "image/png");
    }

    #[test]
    fn extension_is_the_fallback() {
        assert_eq!(guess_mime(Some(b"not magic"), Some("photo.jpg")), "image/jpeg");
        assert_eq!(
            guess_mime(None, Some("https://example.com/cat.png?size=large")),
            "image/png"
        );
        assert_eq!(guess_mime(None, None), "application/octet-stream");
    }
}
