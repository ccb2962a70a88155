//! Byte-level helpers shared by the extractor and exporter.

use chrono::{DateTime, TimeZone, Utc};

use crate::model::ImageFormat;

// ============================================================================
// Image Format Detection
// ============================================================================

const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";
const JPEG_MAGIC: &[u8] = b"\xff\xd8\xff";
const GIF87_MAGIC: &[u8] = b"GIF87a";
const GIF89_MAGIC: &[u8] = b"GIF89a";
const BMP_MAGIC: &[u8] = b"BM";

/// Detect an image format from its leading magic bytes.
///
/// Only the signature is inspected; file names are never consulted.
///
/// # Examples
///
/// ```
/// use onenote_md::model::ImageFormat;
/// use onenote_md::util::detect_image_format;
///
/// assert_eq!(detect_image_format(b"GIF89a\x01\x00"), ImageFormat::Gif);
/// assert_eq!(detect_image_format(b"hello"), ImageFormat::Unknown);
/// ```
pub fn detect_image_format(data: &[u8]) -> ImageFormat {
    if data.starts_with(PNG_MAGIC) {
        ImageFormat::Png
    } else if data.starts_with(JPEG_MAGIC) {
        ImageFormat::Jpeg
    } else if data.starts_with(GIF87_MAGIC) || data.starts_with(GIF89_MAGIC) {
        ImageFormat::Gif
    } else if data.len() >= 12 && &data[..4] == b"RIFF" && &data[8..12] == b"WEBP" {
        ImageFormat::WebP
    } else if data.starts_with(BMP_MAGIC) {
        ImageFormat::Bmp
    } else {
        ImageFormat::Unknown
    }
}

// ============================================================================
// Image Dimension Extraction
// ============================================================================

/// Extract image dimensions from raw image data.
///
/// Supports PNG, JPEG, GIF and BMP headers. Returns `(width, height)` or
/// `None` if the header is unrecognised or truncated.
pub fn extract_image_dimensions(data: &[u8]) -> Option<(u32, u32)> {
    match detect_image_format(data) {
        // PNG: width/height at bytes 16-23 in the IHDR chunk
        ImageFormat::Png if data.len() >= 24 => {
            let width = u32::from_be_bytes([data[16], data[17], data[18], data[19]]);
            let height = u32::from_be_bytes([data[20], data[21], data[22], data[23]]);
            Some((width, height))
        }
        ImageFormat::Jpeg => extract_jpeg_dimensions(data),
        // GIF: logical screen size at bytes 6-9 (little-endian)
        ImageFormat::Gif if data.len() >= 10 => {
            let width = u16::from_le_bytes([data[6], data[7]]) as u32;
            let height = u16::from_le_bytes([data[8], data[9]]) as u32;
            Some((width, height))
        }
        // BMP: BITMAPINFOHEADER width/height at bytes 18-25; height is
        // negative for top-down bitmaps
        ImageFormat::Bmp if data.len() >= 26 => {
            let width = i32::from_le_bytes([data[18], data[19], data[20], data[21]]);
            let height = i32::from_le_bytes([data[22], data[23], data[24], data[25]]);
            Some((width.unsigned_abs(), height.unsigned_abs()))
        }
        _ => None,
    }
}

/// Extract dimensions from JPEG data by parsing SOF markers.
fn extract_jpeg_dimensions(data: &[u8]) -> Option<(u32, u32)> {
    let mut i = 2;
    while i + 4 < data.len() {
        if data[i] != 0xFF {
            i += 1;
            continue;
        }

        let marker = data[i + 1];

        // SOF markers (Start of Frame), excluding DHT/JPG/DAC
        if matches!(marker, 0xC0..=0xCF)
            && !matches!(marker, 0xC4 | 0xC8 | 0xCC)
            && i + 9 < data.len()
        {
            let height = u16::from_be_bytes([data[i + 5], data[i + 6]]) as u32;
            let width = u16::from_be_bytes([data[i + 7], data[i + 8]]) as u32;
            return Some((width, height));
        }

        let length = u16::from_be_bytes([data[i + 2], data[i + 3]]) as usize;
        i += 2 + length;
    }
    None
}

// ============================================================================
// Timestamps
// ============================================================================

/// Seconds between 1970-01-01 and 1980-01-01.
const TIME32_EPOCH_OFFSET: i64 = 315_532_800;

/// Seconds between 1601-01-01 and 1970-01-01.
const FILETIME_EPOCH_OFFSET: i64 = 11_644_473_600;

/// Convert a OneNote Time32 (seconds since 1980-01-01 UTC).
pub fn time32_to_datetime(seconds: u32) -> Option<DateTime<Utc>> {
    Utc.timestamp_opt(TIME32_EPOCH_OFFSET + i64::from(seconds), 0)
        .single()
}

/// Convert a Windows FILETIME (100 ns ticks since 1601-01-01 UTC).
///
/// Zero means "not set" and yields `None`.
pub fn filetime_to_datetime(ticks: u64) -> Option<DateTime<Utc>> {
    if ticks == 0 {
        return None;
    }
    let secs = i64::try_from(ticks / 10_000_000).ok()? - FILETIME_EPOCH_OFFSET;
    let nanos = ((ticks % 10_000_000) * 100) as u32;
    Utc.timestamp_opt(secs, nanos).single()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn test_detect_all_signatures() {
        assert_eq!(
            detect_image_format(b"\x89PNG\r\n\x1a\n\x00\x00"),
            ImageFormat::Png
        );
        assert_eq!(detect_image_format(&[0xFF, 0xD8, 0xFF, 0xE0]), ImageFormat::Jpeg);
        assert_eq!(detect_image_format(b"GIF87a"), ImageFormat::Gif);
        assert_eq!(detect_image_format(b"GIF89a...."), ImageFormat::Gif);
        assert_eq!(detect_image_format(b"BM\x00\x00"), ImageFormat::Bmp);
        assert_eq!(
            detect_image_format(b"RIFF\x10\x00\x00\x00WEBPVP8 "),
            ImageFormat::WebP
        );
    }

    #[test]
    fn test_detect_unknown() {
        assert_eq!(detect_image_format(b""), ImageFormat::Unknown);
        assert_eq!(detect_image_format(b"%PDF-1.7"), ImageFormat::Unknown);
        // RIFF container that is not WebP (e.g. WAV)
        assert_eq!(
            detect_image_format(b"RIFF\x10\x00\x00\x00WAVEfmt "),
            ImageFormat::Unknown
        );
        // Truncated PNG signature
        assert_eq!(detect_image_format(b"\x89PNG"), ImageFormat::Unknown);
    }

    #[test]
    fn test_png_dimensions() {
        let mut png = PNG_MAGIC.to_vec();
        png.extend_from_slice(&[0, 0, 0, 13]);
        png.extend_from_slice(b"IHDR");
        png.extend_from_slice(&640u32.to_be_bytes());
        png.extend_from_slice(&480u32.to_be_bytes());
        assert_eq!(extract_image_dimensions(&png), Some((640, 480)));
    }

    #[test]
    fn test_gif_dimensions() {
        let gif = b"GIF89a\x20\x00\x10\x00";
        assert_eq!(extract_image_dimensions(gif), Some((32, 16)));
    }

    #[test]
    fn test_bmp_top_down_dimensions() {
        let mut bmp = vec![0u8; 26];
        bmp[..2].copy_from_slice(b"BM");
        bmp[18..22].copy_from_slice(&100i32.to_le_bytes());
        bmp[22..26].copy_from_slice(&(-50i32).to_le_bytes());
        assert_eq!(extract_image_dimensions(&bmp), Some((100, 50)));
    }

    #[test]
    fn test_truncated_headers() {
        assert_eq!(extract_image_dimensions(PNG_MAGIC), None);
        assert_eq!(extract_image_dimensions(&[0xFF, 0xD8, 0xFF]), None);
    }

    #[test]
    fn test_time32() {
        let dt = time32_to_datetime(0).unwrap();
        assert_eq!((dt.year(), dt.month(), dt.day()), (1980, 1, 1));
    }

    #[test]
    fn test_filetime() {
        // 2024-01-01T00:00:00Z
        let ticks = (1_704_067_200 + FILETIME_EPOCH_OFFSET) as u64 * 10_000_000;
        let dt = filetime_to_datetime(ticks).unwrap();
        assert_eq!((dt.year(), dt.month(), dt.day()), (2024, 1, 1));
        assert_eq!(filetime_to_datetime(0), None);
    }
}
