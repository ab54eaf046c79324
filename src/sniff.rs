//! Content type detection from leading payload bytes.
//!
//! Image servers do not reliably report what they send back, so the
//! downloader looks at the magic number at the start of each page instead of
//! trusting the `Content-Type` header.
//!
//! # Example
//!
//! ```
//! use cookbooker_core::sniff::{ContentType, sniff};
//!
//! let png = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0];
//! assert_eq!(sniff(&png), ContentType::Png);
//! assert_eq!(sniff(&[0u8; 16]), ContentType::Unknown);
//! ```

use std::fmt;

/// Number of leading bytes inspected by [`sniff`].
pub const SNIFF_LEN: usize = 16;

/// Image formats recognised by [`sniff`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentType {
    /// GIF87a / GIF89a.
    Gif,
    /// PNG.
    Png,
    /// JPEG (raw or JFIF).
    Jpg,
    /// No signature matched.
    Unknown,
}

/// Signature table, checked in order; first match wins.
const SIGNATURES: &[(ContentType, &[u8])] = &[
    (ContentType::Gif, b"GIF87a"),
    (ContentType::Gif, b"GIF89a"),
    (
        ContentType::Png,
        &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A],
    ),
    (ContentType::Jpg, &[0xFF, 0xD8, 0xFF, 0xDB]),
    (
        ContentType::Jpg,
        &[
            0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46, 0x49, 0x46, 0x00, 0x01,
        ],
    ),
];

impl ContentType {
    /// File extension including the leading dot, or `""` for [`ContentType::Unknown`].
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Gif => ".gif",
            Self::Png => ".png",
            Self::Jpg => ".jpg",
            Self::Unknown => "",
        }
    }

    /// Maps a bare extension (no dot) back to a known image type.
    ///
    /// Matching is exact: the page store only ever writes lowercase names.
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "gif" => Some(Self::Gif),
            "png" => Some(Self::Png),
            "jpg" => Some(Self::Jpg),
            _ => None,
        }
    }

    /// Returns true for every variant except [`ContentType::Unknown`].
    #[must_use]
    pub fn is_known(self) -> bool {
        self != Self::Unknown
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Gif => "gif",
            Self::Png => "png",
            Self::Jpg => "jpg",
            Self::Unknown => "unknown",
        };
        f.write_str(label)
    }
}

/// Detects the content type of `payload` from at most its first [`SNIFF_LEN`] bytes.
///
/// Total and pure: never fails, never reads past the sniff window, and a
/// payload shorter than a signature cannot match that signature.
#[must_use]
pub fn sniff(payload: &[u8]) -> ContentType {
    let head = &payload[..payload.len().min(SNIFF_LEN)];
    SIGNATURES
        .iter()
        .find(|(_, signature)| head.starts_with(signature))
        .map_or(ContentType::Unknown, |(content_type, _)| *content_type)
}

/// Lowercase hex of the sniff window, used in unknown-type warnings.
#[must_use]
pub fn leading_hex(payload: &[u8]) -> String {
    use fmt::Write;

    payload
        .iter()
        .take(SNIFF_LEN)
        .fold(String::with_capacity(SNIFF_LEN * 2), |mut out, byte| {
            let _ = write!(out, "{byte:02x}");
            out
        })
}
