//! Complaint image rules and variant processing.
//!
//! An accepted upload is turned into three WebP variants:
//!
//! | Variant    | Geometry                                   | Key suffix       |
//! |------------|--------------------------------------------|------------------|
//! | original   | fit inside 1920x1080, never upscaled       | `_original.webp` |
//! | medium     | fit inside 1024x768 (from the original)    | `_medium.webp`   |
//! | thumbnail  | exactly 320x320, cover + centre crop       | `_thumb.webp`    |
//!
//! Every variant is lossy WebP at quality 80. The untouched upload bytes
//! are never kept.

use std::io::Cursor;

use image::imageops::FilterType;
use image::metadata::Orientation;
use image::{DynamicImage, ImageDecoder, ImageReader};
use uuid::Uuid;

use crate::error::CoreError;
use crate::types::DbId;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Maximum number of files accepted in one upload request.
pub const MAX_FILES_PER_UPLOAD: usize = 3;

/// Maximum size of a single uploaded file (4 MiB).
pub const MAX_FILE_BYTES: usize = 4 * 1024 * 1024;

/// Declared content types accepted for upload.
pub const ACCEPTED_MIME_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp"];

/// Content type of every stored variant.
pub const OUTPUT_MIME_TYPE: &str = "image/webp";

/// File extension of every stored variant.
pub const OUTPUT_EXTENSION: &str = "webp";

/// Bounding box of the "original" variant.
pub const ORIGINAL_BOUNDS: (u32, u32) = (1920, 1080);

/// Bounding box of the "medium" variant.
pub const MEDIUM_BOUNDS: (u32, u32) = (1024, 768);

/// Edge length of the square thumbnail.
pub const THUMB_EDGE: u32 = 320;

/// Lossy WebP quality used for every variant (0-100).
pub const WEBP_QUALITY: f32 = 80.0;

const RESIZE_FILTER: FilterType = FilterType::Lanczos3;

// ---------------------------------------------------------------------------
// Upload validation
// ---------------------------------------------------------------------------

/// Validate the number of files in one upload request.
pub fn validate_file_count(count: usize) -> Result<(), CoreError> {
    if count == 0 {
        return Err(CoreError::validation("No files provided"));
    }
    if count > MAX_FILES_PER_UPLOAD {
        return Err(CoreError::Validation(format!(
            "Maximum {MAX_FILES_PER_UPLOAD} images allowed"
        )));
    }
    Ok(())
}

/// Validate one uploaded file's declared content type and size.
pub fn validate_upload(content_type: Option<&str>, len: usize) -> Result<(), CoreError> {
    let accepted = content_type.is_some_and(|ct| ACCEPTED_MIME_TYPES.contains(&ct));
    if !accepted {
        return Err(CoreError::Validation(format!(
            "Unsupported image type '{}'. Must be one of: {ACCEPTED_MIME_TYPES:?}",
            content_type.unwrap_or("unknown")
        )));
    }
    if len > MAX_FILE_BYTES {
        return Err(CoreError::validation("Image too large (max 4MB)"));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Storage keys
// ---------------------------------------------------------------------------

/// The three variants stored per uploaded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    Original,
    Medium,
    Thumb,
}

impl Variant {
    /// Upload order: original first, thumbnail last.
    pub const ALL: [Variant; 3] = [Variant::Original, Variant::Medium, Variant::Thumb];

    /// Suffix appended to the image id in the storage key.
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Original => "original",
            Self::Medium => "medium",
            Self::Thumb => "thumb",
        }
    }
}

/// Deterministic storage keys for one image's variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantKeys {
    pub original: String,
    pub medium: String,
    pub thumb: String,
}

impl VariantKeys {
    /// Keys for `image_id` under `complaints/{complaint_id}/`.
    ///
    /// ```
    /// use civic_core::images::VariantKeys;
    /// use uuid::Uuid;
    ///
    /// let id = Uuid::nil();
    /// let keys = VariantKeys::new(7, id);
    /// assert_eq!(keys.thumb, format!("complaints/7/{id}_thumb.webp"));
    /// ```
    pub fn new(complaint_id: DbId, image_id: Uuid) -> Self {
        let key = |variant: Variant| {
            format!(
                "complaints/{complaint_id}/{image_id}_{}.{OUTPUT_EXTENSION}",
                variant.suffix()
            )
        };
        Self {
            original: key(Variant::Original),
            medium: key(Variant::Medium),
            thumb: key(Variant::Thumb),
        }
    }

    /// Key of a single variant.
    pub fn key(&self, variant: Variant) -> &str {
        match variant {
            Variant::Original => &self.original,
            Variant::Medium => &self.medium,
            Variant::Thumb => &self.thumb,
        }
    }

    /// All keys in upload order (original, medium, thumbnail).
    pub fn all(&self) -> [&str; 3] {
        [&self.original, &self.medium, &self.thumb]
    }
}

// ---------------------------------------------------------------------------
// Processing
// ---------------------------------------------------------------------------

/// One encoded variant and its pixel dimensions.
#[derive(Debug, Clone)]
pub struct EncodedVariant {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// All three encoded variants of one upload.
#[derive(Debug, Clone)]
pub struct ProcessedImage {
    pub original: EncodedVariant,
    pub medium: EncodedVariant,
    pub thumb: EncodedVariant,
}

impl ProcessedImage {
    /// Borrow a variant by kind.
    pub fn variant(&self, variant: Variant) -> &EncodedVariant {
        match variant {
            Variant::Original => &self.original,
            Variant::Medium => &self.medium,
            Variant::Thumb => &self.thumb,
        }
    }
}

/// Decode an upload, normalize its rotation and derive all three variants.
///
/// CPU-bound; callers on an async runtime should run it on the blocking pool.
pub fn process_image(bytes: &[u8]) -> Result<ProcessedImage, CoreError> {
    let decoded = decode_upright(bytes)?;

    let (max_w, max_h) = ORIGINAL_BOUNDS;
    let original = fit_inside(&decoded, max_w, max_h);

    let (med_w, med_h) = MEDIUM_BOUNDS;
    let medium = fit_inside(&original, med_w, med_h);

    let thumb = original.resize_to_fill(THUMB_EDGE, THUMB_EDGE, RESIZE_FILTER);

    Ok(ProcessedImage {
        original: encode_webp(&original)?,
        medium: encode_webp(&medium)?,
        thumb: encode_webp(&thumb)?,
    })
}

/// Decode with the EXIF orientation applied so photos display upright.
fn decode_upright(bytes: &[u8]) -> Result<DynamicImage, CoreError> {
    let decode_err = |e: image::ImageError| CoreError::Validation(format!("Could not decode image: {e}"));

    let mut decoder = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| CoreError::Validation(format!("Could not read image: {e}")))?
        .into_decoder()
        .map_err(decode_err)?;

    // Missing or unreadable orientation metadata is treated as upright.
    let orientation = decoder.orientation().unwrap_or(Orientation::NoTransforms);

    let mut image = DynamicImage::from_decoder(decoder).map_err(decode_err)?;
    image.apply_orientation(orientation);
    Ok(image)
}

/// Scale down to fit inside `max_w` x `max_h`, preserving aspect ratio.
/// Images already inside the box are returned unchanged.
fn fit_inside(image: &DynamicImage, max_w: u32, max_h: u32) -> DynamicImage {
    if image.width() <= max_w && image.height() <= max_h {
        return image.clone();
    }
    image.resize(max_w, max_h, RESIZE_FILTER)
}

fn encode_webp(image: &DynamicImage) -> Result<EncodedVariant, CoreError> {
    // The encoder only takes 8-bit RGB or RGBA buffers.
    let pixels = if image.color().has_alpha() {
        DynamicImage::ImageRgba8(image.to_rgba8())
    } else {
        DynamicImage::ImageRgb8(image.to_rgb8())
    };
    let encoder = webp::Encoder::from_image(&pixels)
        .map_err(|e| CoreError::Internal(format!("WebP encoding failed: {e}")))?;
    let bytes = encoder.encode(WEBP_QUALITY).to_vec();
    Ok(EncodedVariant {
        bytes,
        width: pixels.width(),
        height: pixels.height(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use image::codecs::webp::WebPEncoder;
    use image::{ImageBuffer, ImageFormat, Rgb};

    fn encoded(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
        let buffer = ImageBuffer::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        });
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(buffer)
            .write_to(&mut out, format)
            .expect("test image should encode");
        out.into_inner()
    }

    /// Photo-like content: a gradient with deterministic per-pixel noise.
    fn noisy(width: u32, height: u32) -> DynamicImage {
        let mut seed: u32 = 0x9E37_79B9;
        let buffer = ImageBuffer::from_fn(width, height, |x, y| {
            seed = seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            let n = (seed >> 24) as u8 / 4;
            Rgb([
                ((x * 255 / width) as u8).saturating_add(n),
                ((y * 255 / height) as u8).saturating_add(n),
                96u8.saturating_add(n),
            ])
        });
        DynamicImage::ImageRgb8(buffer)
    }

    /// Insert an EXIF APP1 segment carrying `orientation` right after SOI.
    fn with_exif_orientation(jpeg: &[u8], orientation: u16) -> Vec<u8> {
        let mut tiff = Vec::new();
        tiff.extend_from_slice(b"MM\x00\x2A");
        tiff.extend_from_slice(&8u32.to_be_bytes());
        tiff.extend_from_slice(&1u16.to_be_bytes());
        tiff.extend_from_slice(&0x0112u16.to_be_bytes());
        tiff.extend_from_slice(&3u16.to_be_bytes());
        tiff.extend_from_slice(&1u32.to_be_bytes());
        tiff.extend_from_slice(&orientation.to_be_bytes());
        tiff.extend_from_slice(&[0, 0]);
        tiff.extend_from_slice(&0u32.to_be_bytes());

        let mut payload = b"Exif\x00\x00".to_vec();
        payload.extend_from_slice(&tiff);
        let segment_len = (payload.len() + 2) as u16;

        let mut out = jpeg[..2].to_vec();
        out.extend_from_slice(&[0xFF, 0xE1]);
        out.extend_from_slice(&segment_len.to_be_bytes());
        out.extend_from_slice(&payload);
        out.extend_from_slice(&jpeg[2..]);
        out
    }

    fn dimensions(bytes: &[u8]) -> (u32, u32) {
        let image = image::load_from_memory_with_format(bytes, ImageFormat::WebP)
            .expect("variant should be valid webp");
        (image.width(), image.height())
    }

    #[test]
    fn file_count_bounds() {
        assert_matches!(validate_file_count(0), Err(CoreError::Validation(_)));
        assert!(validate_file_count(1).is_ok());
        assert!(validate_file_count(MAX_FILES_PER_UPLOAD).is_ok());
        assert_matches!(
            validate_file_count(MAX_FILES_PER_UPLOAD + 1),
            Err(CoreError::Validation(msg)) if msg.contains("Maximum 3")
        );
    }

    #[test]
    fn accepted_types_pass() {
        for ct in ACCEPTED_MIME_TYPES {
            assert!(validate_upload(Some(ct), 1024).is_ok(), "{ct} should be accepted");
        }
    }

    #[test]
    fn unsupported_or_missing_type_rejected() {
        assert_matches!(
            validate_upload(Some("image/gif"), 10),
            Err(CoreError::Validation(_))
        );
        assert_matches!(validate_upload(None, 10), Err(CoreError::Validation(_)));
    }

    #[test]
    fn size_limit_is_inclusive() {
        assert!(validate_upload(Some("image/png"), MAX_FILE_BYTES).is_ok());
        assert_matches!(
            validate_upload(Some("image/png"), MAX_FILE_BYTES + 1),
            Err(CoreError::Validation(msg)) if msg.contains("too large")
        );
    }

    #[test]
    fn keys_follow_layout() {
        let id = Uuid::new_v4();
        let keys = VariantKeys::new(42, id);
        assert_eq!(keys.original, format!("complaints/42/{id}_original.webp"));
        assert_eq!(keys.medium, format!("complaints/42/{id}_medium.webp"));
        assert_eq!(keys.thumb, format!("complaints/42/{id}_thumb.webp"));
        assert_eq!(keys.all(), [&*keys.original, &*keys.medium, &*keys.thumb]);
    }

    #[test]
    fn large_landscape_is_bounded() {
        let processed = process_image(&encoded(3000, 1500, ImageFormat::Jpeg)).unwrap();

        assert_eq!((processed.original.width, processed.original.height), (1920, 960));
        assert_eq!((processed.medium.width, processed.medium.height), (1024, 512));
        assert_eq!((processed.thumb.width, processed.thumb.height), (320, 320));

        assert_eq!(dimensions(&processed.original.bytes), (1920, 960));
        assert_eq!(dimensions(&processed.thumb.bytes), (320, 320));
    }

    #[test]
    fn tall_portrait_is_bounded_by_height() {
        let processed = process_image(&encoded(1000, 3000, ImageFormat::Png)).unwrap();
        assert_eq!((processed.original.width, processed.original.height), (360, 1080));
        assert_eq!((processed.medium.width, processed.medium.height), (256, 768));
    }

    #[test]
    fn small_image_is_not_upscaled() {
        let processed = process_image(&encoded(100, 50, ImageFormat::Png)).unwrap();
        assert_eq!((processed.original.width, processed.original.height), (100, 50));
        assert_eq!((processed.medium.width, processed.medium.height), (100, 50));
        // Cover semantics always fill the square.
        assert_eq!((processed.thumb.width, processed.thumb.height), (320, 320));
    }

    #[test]
    fn webp_input_is_accepted() {
        let processed = process_image(&encoded(64, 64, ImageFormat::WebP)).unwrap();
        assert_eq!(processed.variant(Variant::Original).width, 64);
    }

    #[test]
    fn garbage_bytes_fail_validation() {
        assert_matches!(
            process_image(b"definitely not an image"),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn exif_rotation_is_applied() {
        let jpeg = encoded(400, 200, ImageFormat::Jpeg);

        for orientation in [6u16, 8] {
            let processed = process_image(&with_exif_orientation(&jpeg, orientation)).unwrap();
            assert_eq!(
                (processed.original.width, processed.original.height),
                (200, 400),
                "orientation {orientation} should swap the axes"
            );
            assert_eq!(dimensions(&processed.original.bytes), (200, 400));
        }

        let upright = process_image(&with_exif_orientation(&jpeg, 1)).unwrap();
        assert_eq!((upright.original.width, upright.original.height), (400, 200));
    }

    #[test]
    fn variants_are_lossy_compressed() {
        let photo = noisy(1280, 720);
        let mut upload = Cursor::new(Vec::new());
        photo.write_to(&mut upload, ImageFormat::Jpeg).unwrap();

        let processed = process_image(upload.get_ref()).unwrap();

        let mut lossless = Vec::new();
        photo
            .write_with_encoder(WebPEncoder::new_lossless(&mut lossless))
            .unwrap();

        assert_eq!((processed.original.width, processed.original.height), (1280, 720));
        assert!(
            processed.original.bytes.len() < lossless.len(),
            "original variant ({}) should be smaller than lossless ({})",
            processed.original.bytes.len(),
            lossless.len()
        );
        assert!(processed.medium.bytes.len() < processed.original.bytes.len());
        assert!(processed.thumb.bytes.len() < processed.medium.bytes.len());
    }
}
