use std::io::Cursor;

use image::{imageops, DynamicImage, ImageFormat};

use crate::{
    error::{PostforgeError, Result},
    models::{ImageAsset, LogoPosition},
};

/// The logo never exceeds this fraction of either base dimension.
pub const MAX_LOGO_COVERAGE: f64 = 0.15;
/// Margin from the anchored corner, as a fraction of base width.
pub const LOGO_MARGIN_RATIO: f64 = 0.02;

/// Computed logo rectangle within the base image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Compute the logo placement for a corner anchor.
///
/// The scale is the smaller of the two coverage-bound candidates, so the
/// logo keeps its aspect ratio and the tighter base dimension binds.
pub fn placement(
    base_width: u32,
    base_height: u32,
    logo_width: u32,
    logo_height: u32,
    anchor: LogoPosition,
) -> Placement {
    let scale = f64::min(
        MAX_LOGO_COVERAGE * base_width as f64 / logo_width.max(1) as f64,
        MAX_LOGO_COVERAGE * base_height as f64 / logo_height.max(1) as f64,
    );
    let width = (logo_width as f64 * scale).round() as u32;
    let height = (logo_height as f64 * scale).round() as u32;
    let margin = (base_width as f64 * LOGO_MARGIN_RATIO).round() as u32;

    let (x, y) = match anchor {
        LogoPosition::TopLeft => (margin, margin),
        LogoPosition::TopRight => (base_width.saturating_sub(width + margin), margin),
        LogoPosition::BottomLeft => (margin, base_height.saturating_sub(height + margin)),
        LogoPosition::BottomRight => (
            base_width.saturating_sub(width + margin),
            base_height.saturating_sub(height + margin),
        ),
    };

    Placement {
        x,
        y,
        width,
        height,
    }
}

/// Overlay `logo` onto `base` at the given corner and re-encode as PNG.
///
/// Neither input is mutated; the output dimensions always equal the base
/// image's dimensions.
pub fn composite(base: &ImageAsset, logo: &ImageAsset, anchor: LogoPosition) -> Result<ImageAsset> {
    let base_img = base.decode()?;
    let logo_img = logo.decode()?;

    let place = placement(
        base_img.width(),
        base_img.height(),
        logo_img.width(),
        logo_img.height(),
        anchor,
    );

    log::debug!(
        "Compositing {}x{} logo at ({}, {}) on {}x{} base",
        place.width,
        place.height,
        place.x,
        place.y,
        base_img.width(),
        base_img.height()
    );

    let mut canvas = base_img.to_rgba8();
    let scaled = imageops::resize(
        &logo_img.to_rgba8(),
        place.width.max(1),
        place.height.max(1),
        imageops::FilterType::Lanczos3,
    );
    imageops::overlay(&mut canvas, &scaled, place.x as i64, place.y as i64);

    let mut out = Vec::new();
    DynamicImage::ImageRgba8(canvas)
        .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
        .map_err(|e| PostforgeError::Compositing(format!("failed to encode composite: {}", e)))?;

    Ok(ImageAsset::from_bytes(out))
}
