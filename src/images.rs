//! Image fetching and preparation for embedding.
//!
//! Fetching goes through the [`ImageSource`] trait so the engine never cares
//! where bytes come from. The encoding is decided from the URL extension
//! first, then the declared content type, then falls back to JPEG.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use base64::Engine;
use image::ImageDecoder;

use crate::error::Error;
use crate::model::{ColorSpace, EmbeddedImage, ImageFormat};

pub const FALLBACK_FORMAT: ImageFormat = ImageFormat::Jpeg;

/// Raw bytes plus whatever content type the source declared.
#[derive(Clone, Debug, Default)]
pub struct FetchedImage {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

/// Read-only access to already-known image URLs.
pub trait ImageSource {
    fn fetch(&self, url: &str) -> Result<FetchedImage, Error>;
}

/// Serves `data:` URLs, `file://` URLs, plain paths (relative to a base
/// directory) and, with the `http` feature, `http(s)://` URLs.
pub struct DefaultImageSource {
    base_dir: PathBuf,
    #[cfg(feature = "http")]
    client: reqwest::blocking::Client,
}

impl DefaultImageSource {
    pub fn new(base_dir: impl Into<PathBuf>) -> Result<Self, Error> {
        Ok(Self {
            base_dir: base_dir.into(),
            #[cfg(feature = "http")]
            client: reqwest::blocking::Client::builder()
                .timeout(std::time::Duration::from_secs(20))
                .build()
                .map_err(|e| Error::Fetch(format!("cannot build HTTP client: {e}")))?,
        })
    }

    fn resolve_path(&self, url: &str) -> PathBuf {
        let path = Path::new(url.strip_prefix("file://").unwrap_or(url));
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    #[cfg(feature = "http")]
    fn fetch_http(&self, url: &str) -> Result<FetchedImage, Error> {
        let response = self
            .client
            .get(url)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| Error::Fetch(format!("{url}: {e}")))?;
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response
            .bytes()
            .map_err(|e| Error::Fetch(format!("{url}: {e}")))?;
        Ok(FetchedImage {
            bytes: bytes.to_vec(),
            content_type,
        })
    }

    #[cfg(not(feature = "http"))]
    fn fetch_http(&self, url: &str) -> Result<FetchedImage, Error> {
        Err(Error::Fetch(format!("{url}: built without HTTP support")))
    }
}

impl ImageSource for DefaultImageSource {
    fn fetch(&self, url: &str) -> Result<FetchedImage, Error> {
        if url.starts_with("data:") {
            return decode_data_url(url);
        }
        if url.starts_with("http://") || url.starts_with("https://") {
            return self.fetch_http(url);
        }
        let path = self.resolve_path(url);
        let bytes = std::fs::read(&path).map_err(|e| Error::Fetch(format!("{}: {e}", path.display())))?;
        Ok(FetchedImage {
            bytes,
            content_type: None,
        })
    }
}

/// Decode `data:[<media type>][;base64],<payload>`.
pub(crate) fn decode_data_url(url: &str) -> Result<FetchedImage, Error> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| Error::Fetch("not a data URL".into()))?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| Error::Fetch("data URL has no payload".into()))?;
    let is_base64 = meta.ends_with(";base64");
    let media_type = meta.trim_end_matches(";base64");
    let bytes = if is_base64 {
        base64::engine::general_purpose::STANDARD
            .decode(payload.trim())
            .map_err(|e| Error::Fetch(format!("data URL: {e}")))?
    } else {
        payload.as_bytes().to_vec()
    };
    Ok(FetchedImage {
        bytes,
        content_type: (!media_type.is_empty()).then(|| media_type.to_string()),
    })
}

fn format_from_extension(url: &str) -> Option<ImageFormat> {
    if url.starts_with("data:") {
        return None;
    }
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let file = path.rsplit('/').next().unwrap_or(path);
    let (_, ext) = file.rsplit_once('.')?;
    match ext.to_ascii_lowercase().as_str() {
        "png" => Some(ImageFormat::Png),
        "jpg" | "jpeg" | "jpe" | "jfif" => Some(ImageFormat::Jpeg),
        _ => None,
    }
}

fn format_from_mime(content_type: &str) -> Option<ImageFormat> {
    let mime = content_type.split(';').next()?.trim().to_ascii_lowercase();
    match mime.as_str() {
        "image/png" => Some(ImageFormat::Png),
        "image/jpeg" | "image/jpg" | "image/pjpeg" => Some(ImageFormat::Jpeg),
        _ => None,
    }
}

/// URL extension, then declared content type, then the caller's hint, then
/// [`FALLBACK_FORMAT`].
pub fn detect_format(url: &str, declared: Option<&str>, hint: Option<&str>) -> ImageFormat {
    format_from_extension(url)
        .or_else(|| declared.and_then(format_from_mime))
        .or_else(|| hint.and_then(format_from_mime))
        .unwrap_or(FALLBACK_FORMAT)
}

/// Component count from the first frame header of a JPEG stream.
fn jpeg_components(bytes: &[u8]) -> Option<u8> {
    if !bytes.starts_with(&[0xFF, 0xD8]) {
        return None;
    }
    let mut i = 2;
    while i + 4 <= bytes.len() {
        if bytes[i] != 0xFF {
            return None;
        }
        let marker = bytes[i + 1];
        match marker {
            // Fill byte before a marker.
            0xFF => {
                i += 1;
                continue;
            }
            0x01 | 0xD0..=0xD7 => {
                i += 2;
                continue;
            }
            // Start of scan without a frame header.
            0xDA | 0xD9 => return None,
            _ => {}
        }
        // SOF0..SOF15, minus DHT, JPG and DAC which share the range.
        if (0xC0..=0xCF).contains(&marker) && !matches!(marker, 0xC4 | 0xC8 | 0xCC) {
            return bytes.get(i + 9).copied();
        }
        let len = u16::from_be_bytes([bytes[i + 2], bytes[i + 3]]) as usize;
        i += 2 + len;
    }
    None
}

/// The frame header's component count decides; the decoder's output type is
/// the fallback since it converts CMYK to RGB on the way out.
fn jpeg_color_space(bytes: &[u8], decoded: image::ColorType) -> ColorSpace {
    match jpeg_components(bytes) {
        Some(1) => ColorSpace::Gray,
        Some(3) => ColorSpace::Rgb,
        Some(4) => ColorSpace::Cmyk,
        _ if matches!(decoded, image::ColorType::L8 | image::ColorType::L16) => ColorSpace::Gray,
        _ => ColorSpace::Rgb,
    }
}

/// Decode enough of the image to embed it under `format`.
pub fn prepare(bytes: &[u8], format: ImageFormat) -> Result<EmbeddedImage, Error> {
    match format {
        ImageFormat::Jpeg => {
            let decoder = image::codecs::jpeg::JpegDecoder::new(Cursor::new(bytes))?;
            let (w, h) = decoder.dimensions();
            let color_space = jpeg_color_space(bytes, decoder.color_type());
            Ok(EmbeddedImage {
                data: bytes.to_vec(),
                format,
                pixel_width: w,
                pixel_height: h,
                color_space,
                alpha: None,
            })
        }
        ImageFormat::Png => {
            let reader = image::ImageReader::with_format(Cursor::new(bytes), image::ImageFormat::Png);
            let rgba = reader.decode()?.to_rgba8();
            let (w, h) = (rgba.width(), rgba.height());
            let has_alpha = rgba.pixels().any(|p| p.0[3] < 255);

            let rgb_data: Vec<u8> = rgba.pixels().flat_map(|p| [p.0[0], p.0[1], p.0[2]]).collect();
            let alpha = has_alpha.then(|| {
                let alpha_data: Vec<u8> = rgba.pixels().map(|p| p.0[3]).collect();
                miniz_oxide::deflate::compress_to_vec_zlib(&alpha_data, 6)
            });
            Ok(EmbeddedImage {
                data: miniz_oxide::deflate::compress_to_vec_zlib(&rgb_data, 6),
                format,
                pixel_width: w,
                pixel_height: h,
                color_space: ColorSpace::Rgb,
                alpha,
            })
        }
    }
}

/// Fetch `url` through `source` and prepare it for embedding.
pub fn load_image(source: &dyn ImageSource, url: &str, hint: Option<&str>) -> Result<EmbeddedImage, Error> {
    let fetched = source.fetch(url)?;
    let format = detect_format(url, fetched.content_type.as_deref(), hint);
    prepare(&fetched.bytes, format)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_bytes(alpha: u8) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(3, 2, image::Rgba([200, 10, 10, alpha]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn extension_wins_over_content_type() {
        assert_eq!(
            detect_format("https://cdn.example/photos/a.PNG?token=1", Some("image/jpeg"), None),
            ImageFormat::Png
        );
        assert_eq!(
            detect_format("https://cdn.example/p/blob", Some("image/png; charset=binary"), None),
            ImageFormat::Png
        );
        assert_eq!(detect_format("https://cdn.example/p/blob", None, Some("image/png")), ImageFormat::Png);
        assert_eq!(detect_format("https://cdn.example/p/blob", Some("application/octet-stream"), None), FALLBACK_FORMAT);
        assert_eq!(detect_format("https://cdn.example/v1.2/blob", None, None), FALLBACK_FORMAT);
    }

    #[test]
    fn data_url_media_type_is_declared() {
        let encoded = base64::engine::general_purpose::STANDARD.encode(png_bytes(255));
        let url = format!("data:image/png;base64,{encoded}");
        let fetched = decode_data_url(&url).unwrap();
        assert_eq!(fetched.content_type.as_deref(), Some("image/png"));
        assert_eq!(detect_format(&url, fetched.content_type.as_deref(), None), ImageFormat::Png);
        assert!(prepare(&fetched.bytes, ImageFormat::Png).is_ok());
    }

    #[test]
    fn png_alpha_becomes_soft_mask() {
        let opaque = prepare(&png_bytes(255), ImageFormat::Png).unwrap();
        assert!(opaque.alpha.is_none());
        assert_eq!((opaque.pixel_width, opaque.pixel_height), (3, 2));
        let translucent = prepare(&png_bytes(128), ImageFormat::Png).unwrap();
        assert!(translucent.alpha.is_some());
    }

    #[test]
    fn wrong_encoding_is_an_image_error() {
        assert!(matches!(prepare(&png_bytes(255), ImageFormat::Jpeg), Err(Error::Image(_))));
        assert!(prepare(b"not an image", ImageFormat::Png).is_err());
    }

    fn jpeg_bytes(img: image::DynamicImage) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Jpeg).unwrap();
        out.into_inner()
    }

    #[test]
    fn jpeg_color_space_follows_the_frame_header() {
        let rgb = jpeg_bytes(image::DynamicImage::ImageRgb8(image::RgbImage::new(4, 4)));
        assert_eq!(jpeg_components(&rgb), Some(3));
        assert_eq!(prepare(&rgb, ImageFormat::Jpeg).unwrap().color_space, ColorSpace::Rgb);

        let gray = jpeg_bytes(image::DynamicImage::ImageLuma8(image::GrayImage::new(4, 4)));
        assert_eq!(jpeg_components(&gray), Some(1));
        assert_eq!(prepare(&gray, ImageFormat::Jpeg).unwrap().color_space, ColorSpace::Gray);

        // SOI, an APP14 "Adobe" segment, then a baseline frame header with four components.
        let cmyk = [
            0xFF, 0xD8, 0xFF, 0xEE, 0x00, 0x0E, b'A', b'd', b'o', b'b', b'e', 0x00, 0x64, 0x00, 0x00, 0x00, 0x00,
            0x02, 0xFF, 0xC0, 0x00, 0x14, 0x08, 0x00, 0x10, 0x00, 0x10, 0x04, 0x01, 0x11, 0x00, 0x02, 0x11, 0x00,
            0x03, 0x11, 0x00, 0x04, 0x11, 0x00,
        ];
        assert_eq!(jpeg_components(&cmyk), Some(4));
        assert_eq!(jpeg_color_space(&cmyk, image::ColorType::Rgb8), ColorSpace::Cmyk);
    }

    #[test]
    fn unreadable_jpeg_header_falls_back_to_decoder_type() {
        assert_eq!(jpeg_components(b"\x89PNG"), None);
        // Scan starts before any frame header.
        let truncated = [0xFF, 0xD8, 0xFF, 0xDA, 0x00, 0x02];
        assert_eq!(jpeg_components(&truncated), None);
        assert_eq!(jpeg_color_space(&truncated, image::ColorType::L8), ColorSpace::Gray);
        assert_eq!(jpeg_color_space(&truncated, image::ColorType::Rgb8), ColorSpace::Rgb);
    }
}
