//! PNG export of a card preview.
//!
//! The preview's style is switched to a capture-friendly state for the
//! duration of the rasterization and restored afterwards on every path,
//! including errors and panics. See [`StyleOverride`].

use std::io::Cursor;
use std::ops::Deref;
use std::sync::{Arc, OnceLock};

use image::{ImageFormat, RgbaImage};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use resvg::tiny_skia;

use super::preview::{CardLayout, PreviewStyle};

/// Fixed export target, close to the ID-1 aspect ratio of 1.586:1.
pub const TARGET_WIDTH: u32 = 860;
pub const TARGET_HEIGHT: u32 = 540;
pub const DEFAULT_SCALE: u32 = 2;
pub const MIN_SCALE: u32 = 1;
pub const MAX_SCALE: u32 = 4;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("scale must be between 1 and 4, got {0}")]
    InvalidScale(u32),

    #[error("export target must not be empty")]
    EmptyTarget,

    #[error("failed to parse card svg: {0}")]
    Svg(#[from] usvg::Error),

    #[error("cannot allocate a {0}x{1} pixmap")]
    Pixmap(u32, u32),

    #[error("failed to encode png: {0}")]
    Encode(#[source] image::ImageError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportOptions {
    pub width: u32,
    pub height: u32,
    pub scale: u32,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            width: TARGET_WIDTH,
            height: TARGET_HEIGHT,
            scale: DEFAULT_SCALE,
        }
    }
}

impl ExportOptions {
    pub fn with_scale(scale: u32) -> Self {
        Self { scale, ..Self::default() }
    }

    fn check(&self) -> Result<(), ExportError> {
        if !(MIN_SCALE..=MAX_SCALE).contains(&self.scale) {
            return Err(ExportError::InvalidScale(self.scale));
        }
        if self.width == 0 || self.height == 0 {
            return Err(ExportError::EmptyTarget);
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ExportedImage {
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub file_name: String,
}

/// Scoped capture style. Acquiring it snapshots the preview style and
/// applies the export overrides; dropping it puts the snapshot back.
pub struct StyleOverride<'a> {
    style: &'a mut PreviewStyle,
    saved: Option<PreviewStyle>,
}

impl<'a> StyleOverride<'a> {
    pub fn acquire(style: &'a mut PreviewStyle, width: f32, height: f32) -> Self {
        let saved = style.clone();
        style.size = Some((width, height));
        style.clip_overflow = false;
        style.quote_ellipsis = false;
        style.shadow = None;
        style.transform_scale = 1.0;
        Self { style, saved: Some(saved) }
    }
}

impl Deref for StyleOverride<'_> {
    type Target = PreviewStyle;

    fn deref(&self) -> &PreviewStyle {
        &*self.style
    }
}

impl Drop for StyleOverride<'_> {
    fn drop(&mut self) {
        if let Some(saved) = self.saved.take() {
            *self.style = saved;
        }
    }
}

/// Turns an SVG document into pixels.
pub trait Rasterizer {
    fn rasterize(&self, svg: &str, width: u32, height: u32) -> Result<RgbaImage, ExportError>;
}

/// [`Rasterizer`] backed by resvg, with system fonts loaded once per process.
#[derive(Debug, Default, Clone, Copy)]
pub struct ResvgRasterizer;

static FONTS: OnceLock<Arc<usvg::fontdb::Database>> = OnceLock::new();

fn fonts() -> Arc<usvg::fontdb::Database> {
    FONTS
        .get_or_init(|| {
            let mut db = usvg::fontdb::Database::new();
            db.load_system_fonts();
            tracing::debug!(faces = db.len(), "loaded system fonts for card export");
            Arc::new(db)
        })
        .clone()
}

impl Rasterizer for ResvgRasterizer {
    fn rasterize(&self, svg: &str, width: u32, height: u32) -> Result<RgbaImage, ExportError> {
        let opts = usvg::Options {
            fontdb: fonts(),
            ..Default::default()
        };
        let tree = usvg::Tree::from_str(svg, &opts)?;

        let mut pixmap =
            tiny_skia::Pixmap::new(width, height).ok_or(ExportError::Pixmap(width, height))?;
        let size = tree.size();
        let transform = tiny_skia::Transform::from_scale(
            width as f32 / size.width(),
            height as f32 / size.height(),
        );
        resvg::render(&tree, transform, &mut pixmap.as_mut());

        let mut rgba = Vec::with_capacity(width as usize * height as usize * 4);
        for px in pixmap.pixels() {
            let c = px.demultiply();
            rgba.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
        }
        RgbaImage::from_raw(width, height, rgba).ok_or(ExportError::Pixmap(width, height))
    }
}

fn file_stem(username: &str, keep: impl Fn(char) -> bool) -> String {
    let trimmed = username.trim();
    if trimmed.is_empty() {
        return "anonyme".to_string();
    }
    trimmed.chars().map(|c| if keep(c) { c } else { '-' }).collect()
}

/// `carte-otaku-<username>.png`, `anonyme` when the username is blank.
/// ASCII only, for the plain `filename=` parameter.
pub fn download_file_name(username: &str) -> String {
    let stem = file_stem(username, |c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    format!("carte-otaku-{}.png", stem)
}

/// Same name with the username kept as typed, minus path separators,
/// quotes and control characters.
pub fn display_file_name(username: &str) -> String {
    let stem = file_stem(username, |c| {
        !c.is_control() && !matches!(c, '/' | '\\' | '"' | ':' | '*' | '?' | '<' | '>' | '|')
    });
    format!("carte-otaku-{}.png", stem)
}

/// `Content-Disposition` for the export download: an ASCII `filename` plus
/// the UTF-8 `filename*` form (RFC 6266).
pub fn content_disposition(username: &str) -> String {
    let display = display_file_name(username);
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        download_file_name(username),
        utf8_percent_encode(&display, NON_ALPHANUMERIC)
    )
}

pub fn export_png(
    layout: &mut CardLayout,
    username: &str,
    opts: &ExportOptions,
) -> Result<ExportedImage, ExportError> {
    export_with(&ResvgRasterizer, layout, username, opts)
}

/// Capture `layout` with `rasterizer`. The preview style is restored before
/// this returns, whatever the outcome.
pub fn export_with<R: Rasterizer>(
    rasterizer: &R,
    layout: &mut CardLayout,
    username: &str,
    opts: &ExportOptions,
) -> Result<ExportedImage, ExportError> {
    opts.check()?;

    let width = opts.width * opts.scale;
    let height = opts.height * opts.scale;

    let pixels = {
        let style = StyleOverride::acquire(&mut layout.style, opts.width as f32, opts.height as f32);
        let svg = super::svg::render_svg(&layout.scene, &style);
        rasterizer.rasterize(&svg, width, height)?
    };

    let mut png = Vec::new();
    pixels
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(ExportError::Encode)?;

    let file_name = download_file_name(username);
    tracing::info!(%file_name, width, height, bytes = png.len(), "exported card image");

    Ok(ExportedImage { png, width, height, file_name })
}
