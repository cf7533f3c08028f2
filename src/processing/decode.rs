//! Bounded-memory image decoding.
//!
//! Loading happens in two phases. The header is probed first to learn the
//! native size without touching pixel data, then the file is decoded once at
//! a power-of-two reduction chosen so the result still covers the viewport.
//! JPEGs are reduced inside the decoder (DCT scaling), so full-resolution
//! pixels are never materialized for them.

use std::fs;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use image::{ImageFormat, ImageReader, RgbaImage};
use jpeg_decoder::{Decoder as JpegDecoder, PixelFormat};
use tracing::debug;

use crate::error::Error;
use crate::processing::layout::{power_of_two_floor, sample_factor};
use crate::processing::resize::resize_rgba;

/// Pixels decoded from one source file at a reduced resolution.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub path: PathBuf,
    /// Reduction applied relative to the native size.
    pub sample: u32,
    pub pixels: RgbaImage,
}

impl DecodedImage {
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }
}

/// Native dimensions and detected format, read from the header only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageBounds {
    pub width: u32,
    pub height: u32,
    pub format: Option<ImageFormat>,
}

/// Read the image header at `path` without decoding pixels.
///
/// # Errors
/// Returns [`Error::Decode`] if the file cannot be opened or its header is
/// not a recognizable image.
pub fn probe_bounds(path: &Path) -> Result<ImageBounds, Error> {
    let reader = ImageReader::open(path)
        .and_then(|r| r.with_guessed_format())
        .map_err(|err| Error::decode(path, err))?;
    let format = reader.format();
    let (width, height) = reader
        .into_dimensions()
        .map_err(|err| Error::decode(path, err))?;
    if width == 0 || height == 0 {
        return Err(Error::decode(path, "image has zero area"));
    }
    Ok(ImageBounds {
        width,
        height,
        format,
    })
}

/// Decode `path` reduced so it still covers a `target_w` x `target_h` viewport.
///
/// # Errors
/// Returns [`Error::Decode`] if the file cannot be probed or decoded.
pub fn load_scaled(path: &Path, target_w: u32, target_h: u32) -> Result<DecodedImage, Error> {
    let bounds = probe_bounds(path)?;
    let factor = sample_factor(bounds.width, bounds.height, target_w, target_h);
    let sample = power_of_two_floor(factor);
    let (want_w, want_h) = sampled_size(bounds.width, bounds.height, sample);

    let decoded = match bounds.format {
        Some(ImageFormat::Jpeg) => match decode_jpeg_scaled(path, want_w, want_h) {
            Ok(img) => img,
            Err(err) => {
                debug!(
                    path = %path.display(),
                    "scaled JPEG decode failed: {err}; falling back to full decode"
                );
                decode_full(path)?
            }
        },
        _ => decode_full(path)?,
    };

    let pixels = if decoded.width() > want_w || decoded.height() > want_h {
        resize_rgba(&decoded, want_w, want_h).map_err(|err| Error::decode(path, err))?
    } else {
        decoded
    };

    debug!(
        path = %path.display(),
        native_w = bounds.width,
        native_h = bounds.height,
        sample,
        width = pixels.width(),
        height = pixels.height(),
        "loaded bitmap"
    );
    Ok(DecodedImage {
        path: path.to_path_buf(),
        sample,
        pixels,
    })
}

/// Size of a `native_*` image reduced by `sample`, rounding up like the decoder.
pub fn sampled_size(native_w: u32, native_h: u32, sample: u32) -> (u32, u32) {
    let sample = sample.max(1);
    (
        native_w.div_ceil(sample).max(1),
        native_h.div_ceil(sample).max(1),
    )
}

fn decode_full(path: &Path) -> Result<RgbaImage, Error> {
    let img = ImageReader::open(path)
        .and_then(|r| r.with_guessed_format())
        .map_err(|err| Error::decode(path, err))?
        .decode()
        .map_err(|err| Error::decode(path, err))?;
    Ok(img.to_rgba8())
}

/// Decode a JPEG using the decoder's built-in reduction.
///
/// The decoder picks the smallest DCT scale whose output still covers the
/// request, so asking for more than 8x reduction yields an 8x image that the
/// caller finishes with a resample.
fn decode_jpeg_scaled(path: &Path, want_w: u32, want_h: u32) -> Result<RgbaImage, Error> {
    let file = fs::File::open(path).map_err(|err| Error::decode(path, err))?;
    let mut decoder = JpegDecoder::new(BufReader::new(file));
    let request_w = want_w.clamp(1, u32::from(u16::MAX)) as u16;
    let request_h = want_h.clamp(1, u32::from(u16::MAX)) as u16;
    decoder
        .scale(request_w, request_h)
        .map_err(|err| Error::decode(path, err))?;
    let pixels = decoder.decode().map_err(|err| Error::decode(path, err))?;
    let info = decoder
        .info()
        .ok_or_else(|| Error::decode(path, "missing JPEG frame info"))?;
    let rgba = expand_to_rgba(info.pixel_format, &pixels).ok_or_else(|| {
        Error::decode(path, format!("{:?} JPEGs need the full decoder", info.pixel_format))
    })?;
    RgbaImage::from_raw(u32::from(info.width), u32::from(info.height), rgba)
        .ok_or_else(|| Error::decode(path, "JPEG pixel buffer does not match its frame size"))
}

/// Widen decoder output to opaque RGBA, or `None` for 16-bit samples.
fn expand_to_rgba(format: PixelFormat, pixels: &[u8]) -> Option<Vec<u8>> {
    let rgba = match format {
        PixelFormat::RGB24 => pixels
            .chunks_exact(3)
            .flat_map(|p| [p[0], p[1], p[2], u8::MAX])
            .collect(),
        PixelFormat::L8 => pixels.iter().flat_map(|&v| [v, v, v, u8::MAX]).collect(),
        // Ink coverage: each color channel is what the key plate leaves of it.
        PixelFormat::CMYK32 => pixels
            .chunks_exact(4)
            .flat_map(|p| {
                let white = u16::from(u8::MAX - p[3]);
                let ink = |c: u8| (u16::from(u8::MAX - c) * white / 255) as u8;
                [ink(p[0]), ink(p[1]), ink(p[2]), u8::MAX]
            })
            .collect(),
        PixelFormat::L16 => return None,
    };
    Some(rgba)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn write_jpeg(dir: &Path, name: &str, w: u32, h: u32) -> PathBuf {
        let path = dir.join(name);
        RgbImage::from_pixel(w, h, Rgb([200, 40, 40]))
            .save_with_format(&path, ImageFormat::Jpeg)
            .unwrap();
        path
    }

    #[test]
    fn sampled_size_rounds_up() {
        assert_eq!(sampled_size(1001, 500, 2), (501, 250));
        assert_eq!(sampled_size(7, 7, 8), (1, 1));
        assert_eq!(sampled_size(640, 480, 0), (640, 480));
    }

    #[test]
    fn probe_reads_header_dimensions() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_jpeg(tmp.path(), "a.jpg", 320, 200);
        let bounds = probe_bounds(&path).unwrap();
        assert_eq!((bounds.width, bounds.height), (320, 200));
        assert_eq!(bounds.format, Some(ImageFormat::Jpeg));
    }

    #[test]
    fn jpeg_is_reduced_while_decoding() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_jpeg(tmp.path(), "big.jpg", 1600, 800);
        // Wide source onto 200x100: height ratio 8.
        let img = load_scaled(&path, 200, 100).unwrap();
        assert_eq!(img.sample, 8);
        assert_eq!(img.pixels.dimensions(), (200, 100));
    }

    #[test]
    fn non_power_of_two_factor_rounds_down() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_jpeg(tmp.path(), "odd.jpg", 960, 960);
        // Factor 3 becomes a 2x reduction so the result still covers 320x320.
        let img = load_scaled(&path, 320, 320).unwrap();
        assert_eq!(img.sample, 2);
        assert_eq!(img.pixels.dimensions(), (480, 480));
    }

    #[test]
    fn large_factor_finishes_with_resample() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_jpeg(tmp.path(), "huge.jpg", 1600, 1600);
        let img = load_scaled(&path, 100, 100).unwrap();
        assert_eq!(img.sample, 16);
        assert_eq!(img.pixels.dimensions(), (100, 100));
    }

    #[test]
    fn small_image_keeps_native_size() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_jpeg(tmp.path(), "small.jpg", 64, 48);
        let img = load_scaled(&path, 1080, 1920).unwrap();
        assert_eq!(img.sample, 1);
        assert_eq!((img.width(), img.height()), (64, 48));
    }

    #[test]
    fn decoder_output_widens_to_opaque_rgba() {
        assert_eq!(
            expand_to_rgba(PixelFormat::L8, &[7, 200]).unwrap(),
            [7, 7, 7, 255, 200, 200, 200, 255]
        );
        assert_eq!(
            expand_to_rgba(PixelFormat::RGB24, &[1, 2, 3]).unwrap(),
            [1, 2, 3, 255]
        );
        let cmyk = [
            0, 0, 0, 0, // paper
            255, 0, 0, 0, // cyan
            0, 0, 0, 255, // key
            0, 0, 0, 128, // half key
        ];
        assert_eq!(
            expand_to_rgba(PixelFormat::CMYK32, &cmyk).unwrap(),
            [
                255, 255, 255, 255, //
                0, 255, 255, 255, //
                0, 0, 0, 255, //
                127, 127, 127, 255,
            ]
        );
        assert!(expand_to_rgba(PixelFormat::L16, &[0, 0]).is_none());
    }

    #[test]
    fn corrupt_file_is_decode_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("bad.jpg");
        fs::write(&path, b"not a jpeg").unwrap();
        let err = load_scaled(&path, 100, 100).unwrap_err();
        assert!(matches!(err, Error::Decode { .. }), "{err:?}");
    }

    #[test]
    fn missing_file_is_decode_error() {
        let tmp = tempfile::tempdir().unwrap();
        let err = load_scaled(&tmp.path().join("nope.jpg"), 100, 100).unwrap_err();
        assert!(matches!(err, Error::Decode { .. }), "{err:?}");
    }
}
