//! Gatekeeping for the high-resolution image swap.

/// Extensions a full-resolution URL must end with to be loaded.
pub const ALLOWED_EXTENSIONS: [&str; 5] = ["gif", "jpg", "jpeg", "tiff", "png"];

/// Attributes that would override an explicitly assigned `src`.
pub const RESPONSIVE_ATTRIBUTES: [&str; 2] = ["srcset", "sizes"];

/// Whether `url` ends in an allowed image extension (case-insensitive).
///
/// The whole string is inspected, so a trailing query or fragment makes the
/// URL ineligible.
pub fn has_allowed_extension(url: &str) -> bool {
    match url.rsplit_once('.') {
        Some((_, extension)) => ALLOWED_EXTENSIONS
            .iter()
            .any(|allowed| extension.eq_ignore_ascii_case(allowed)),
        None => false,
    }
}
