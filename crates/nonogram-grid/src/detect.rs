use std::path::Path;

use ::image::{GrayImage, Rgb, RgbImage};

use crate::{core, crosses, lattice, CrossLocs, CrossLocsParams, Pass};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Errors produced by the high-level facade helpers.
#[derive(thiserror::Error, Debug)]
pub enum GridAppError {
    #[error("invalid grayscale image buffer length (expected {expected} bytes, got {got})")]
    InvalidGrayBuffer { expected: usize, got: usize },

    #[error("invalid grayscale image dimensions (width={width}, height={height})")]
    InvalidGrayDimensions { width: u32, height: u32 },

    #[error(transparent)]
    Detect(#[from] crosses::DetectError),

    #[error(transparent)]
    CellWarp(#[from] crosses::CellWarpError),

    #[error(transparent)]
    Image(#[from] ::image::ImageError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Marker colour per lattice: main blue, top green, left red.
pub fn pass_color(pass: Pass) -> Rgb<u8> {
    match pass {
        Pass::Main => Rgb([0, 0, 255]),
        Pass::Top => Rgb([0, 255, 0]),
        Pass::Left => Rgb([255, 0, 0]),
    }
}

/// Convert an `image::GrayImage` into the lightweight core view type.
pub fn gray_view(img: &GrayImage) -> core::GrayImageView<'_> {
    core::GrayImageView {
        width: img.width() as usize,
        height: img.height() as usize,
        data: img.as_raw(),
    }
}

/// Convert a core image into an `image::GrayImage`.
pub fn to_image_gray(img: &core::GrayImage) -> Result<GrayImage, GridAppError> {
    let width = img.width as u32;
    let height = img.height as u32;
    GrayImage::from_raw(width, height, img.data.clone())
        .ok_or(GridAppError::InvalidGrayDimensions { width, height })
}

/// Run the cross-lattice detector end-to-end on a grayscale image.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip(img, params), fields(width = img.width(), height = img.height()))
)]
pub fn detect_crosses(img: &GrayImage, params: CrossLocsParams) -> Result<CrossLocs, GridAppError> {
    let detector = crosses::CrossLocsDetector::new(params)?;
    Ok(detector.detect(&gray_view(img))?)
}

/// Build an `image::GrayImage` from a raw grayscale buffer.
pub fn gray_image_from_slice(
    width: u32,
    height: u32,
    pixels: &[u8],
) -> Result<GrayImage, GridAppError> {
    let w = usize::try_from(width).ok();
    let h = usize::try_from(height).ok();
    let Some((w, h)) = w.zip(h) else {
        return Err(GridAppError::InvalidGrayDimensions { width, height });
    };
    let Some(expected) = w.checked_mul(h) else {
        return Err(GridAppError::InvalidGrayDimensions { width, height });
    };
    if pixels.len() != expected {
        return Err(GridAppError::InvalidGrayBuffer {
            expected,
            got: pixels.len(),
        });
    }
    GrayImage::from_raw(width, height, pixels.to_vec())
        .ok_or(GridAppError::InvalidGrayDimensions { width, height })
}

pub fn detect_crosses_from_gray_u8(
    width: u32,
    height: u32,
    pixels: &[u8],
    params: CrossLocsParams,
) -> Result<CrossLocs, GridAppError> {
    let img = gray_image_from_slice(width, height, pixels)?;
    detect_crosses(&img, params)
}

/// Paint a filled disc of `radius` px at every known cell of `grid`.
/// Discs are clipped to the canvas.
pub fn draw_markers(canvas: &mut RgbImage, grid: &lattice::DenseGrid, radius: u32, color: Rgb<u8>) {
    let (w, h) = (canvas.width() as i64, canvas.height() as i64);
    let r = radius as i64;
    for (_, _, p) in grid.known() {
        let cx = p.x.round() as i64;
        let cy = p.y.round() as i64;
        for dy in -r..=r {
            for dx in -r..=r {
                if dx * dx + dy * dy > r * r {
                    continue;
                }
                let (x, y) = (cx + dx, cy + dy);
                if x < 0 || y < 0 || x >= w || y >= h {
                    continue;
                }
                canvas.put_pixel(x as u32, y as u32, color);
            }
        }
    }
}

/// Overlay all three lattices of `crosses` on a colour copy of `img`.
pub fn render_overlay(img: &GrayImage, crosses: &CrossLocs, radius: u32) -> RgbImage {
    let mut canvas = ::image::DynamicImage::ImageLuma8(img.clone()).to_rgb8();
    for pass in [Pass::Main, Pass::Top, Pass::Left] {
        draw_markers(&mut canvas, crosses.grid(pass), radius, pass_color(pass));
    }
    canvas
}

/// Rectify the cells of `grid` and write them as `{row:03}_{col:03}.png`
/// into `dir` (created if missing). Returns the number of files written.
pub fn save_cells(
    img: &GrayImage,
    grid: &lattice::DenseGrid,
    side: usize,
    dir: &Path,
) -> Result<usize, GridAppError> {
    let cells = crosses::warp_cells_to_squares(&gray_view(img), grid, side)?;
    std::fs::create_dir_all(dir)?;

    let mut written = 0usize;
    for (row, col, cell) in cells.iter() {
        let path = dir.join(format!("{row:03}_{col:03}.png"));
        to_image_gray(cell)?.save(&path)?;
        written += 1;
    }
    log::info!("saved {} cell image(s) to {}", written, dir.display());
    Ok(written)
}
