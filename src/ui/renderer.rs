//! Grid rendering for the overlay
//!
//! Implements grid visualization with digit labels using tiny-skia.
//! Layout calculation is separated from rasterization so the geometry is
//! testable without a window or a font.

use std::fs;
use std::path::{Path, PathBuf};

use ab_glyph::{Font, FontVec, PxScale, ScaleFont, point};
use log::{debug, info, warn};
use tiny_skia::{
    Color, FillRule, Mask, Paint, PathBuilder, Pixmap, Rect as SkiaRect, Stroke, Transform,
};

use crate::config::settings::{ConfigError, OverlayConfig, parse_hex_color};
use crate::domain::core::Region;

/// Rendering errors
#[derive(Debug, thiserror::Error)]
pub enum RendererError {
    #[error("Failed to create {width}x{height} pixmap for rendering")]
    PixmapCreationFailed { width: u32, height: u32 },

    #[error("Region {region:?} lies outside the overlay canvas {canvas:?}")]
    RegionOutsideCanvas { region: Region, canvas: Region },

    #[error("Failed to load font {path}: {reason}")]
    FontLoad { path: PathBuf, reason: String },
}

/// Fonts tried when no `font_path` is configured
const SYSTEM_FONTS: [&str; 6] = [
    "C:\\Windows\\Fonts\\segoeui.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
];

/// Colors and sizes used to draw a frame
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayStyle {
    pub line_color: Color,
    pub label_color: Color,
    pub shade_color: Color,
    pub line_width: f32,
    pub font_size: f32,
    /// Whole-window alpha applied when presenting
    pub opacity: f32,
    pub font_path: Option<PathBuf>,
}

impl OverlayStyle {
    pub fn from_config(config: &OverlayConfig) -> Result<Self, ConfigError> {
        let color = |field, value: &str| {
            parse_hex_color(field, value).map(|[r, g, b, a]| Color::from_rgba8(r, g, b, a))
        };

        Ok(Self {
            line_color: color("overlay.line_color", &config.line_color)?,
            label_color: color("overlay.label_color", &config.label_color)?,
            shade_color: color("overlay.shade_color", &config.shade_color)?,
            line_width: config.line_width,
            font_size: config.font_size,
            opacity: config.opacity,
            font_path: config.font_path.clone(),
        })
    }
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            line_color: Color::from_rgba8(0, 255, 0, 255),
            label_color: Color::WHITE,
            shade_color: Color::from_rgba8(0, 0, 0, 0x60),
            line_width: 2.0,
            font_size: 32.0,
            opacity: 0.85,
            font_path: None,
        }
    }
}

/// Represents a single line segment for grid rendering
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

/// A label centered in a cell
#[derive(Debug, Clone, PartialEq)]
pub struct LabelPosition {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub font_size: f32,
}

/// Pre-calculated, canvas-local geometry for one overlay frame
#[derive(Debug, Clone)]
pub struct GridLayout {
    pub canvas_width: u32,
    pub canvas_height: u32,
    /// Area outside the current region, dimmed
    pub shades: Vec<SkiaRect>,
    /// Border of the current region followed by the inner grid lines
    pub lines: Vec<Line>,
    pub labels: Vec<LabelPosition>,
    /// Current depth in the top-left corner, absent at the root
    pub badge: Option<LabelPosition>,
    pub style: OverlayStyle,
}

impl GridLayout {
    /// Computes the frame for `region` drawn on a window covering `canvas`
    ///
    /// # Arguments
    /// * `canvas` - Screen area the overlay window covers (the root region)
    /// * `region` - Current navigation region, inside `canvas`
    /// * `depth` - Navigation depth, shown in a badge when non-zero
    /// * `labels` - Cell labels in display order
    /// * `style` - Colors and sizes
    pub fn new(
        canvas: Region,
        region: Region,
        depth: usize,
        labels: [char; 9],
        style: &OverlayStyle,
    ) -> Result<Self, RendererError> {
        if !canvas.contains(&region) {
            return Err(RendererError::RegionOutsideCanvas { region, canvas });
        }

        let to_local_x = |x: i32| (x - canvas.left()) as f32;
        let to_local_y = |y: i32| (y - canvas.top()) as f32;

        let left = to_local_x(region.left());
        let top = to_local_y(region.top());
        let right = to_local_x(region.right());
        let bottom = to_local_y(region.bottom());
        let width = canvas.width() as f32;
        let height = canvas.height() as f32;

        let shades = [
            SkiaRect::from_ltrb(0.0, 0.0, width, top),
            SkiaRect::from_ltrb(0.0, bottom, width, height),
            SkiaRect::from_ltrb(0.0, top, left, bottom),
            SkiaRect::from_ltrb(right, top, width, bottom),
        ]
        .into_iter()
        .flatten()
        .filter(|rect| rect.width() > 0.0 && rect.height() > 0.0)
        .collect();

        let cells = region.subdivide();
        let mut lines = vec![
            Line {
                x1: left,
                y1: top,
                x2: right,
                y2: top,
            },
            Line {
                x1: left,
                y1: bottom,
                x2: right,
                y2: bottom,
            },
            Line {
                x1: left,
                y1: top,
                x2: left,
                y2: bottom,
            },
            Line {
                x1: right,
                y1: top,
                x2: right,
                y2: bottom,
            },
        ];
        for col in [1, 2] {
            let x = to_local_x(cells[col].left());
            lines.push(Line {
                x1: x,
                y1: top,
                x2: x,
                y2: bottom,
            });
        }
        for row in [1, 2] {
            let y = to_local_y(cells[row * 3].top());
            lines.push(Line {
                x1: left,
                y1: y,
                x2: right,
                y2: y,
            });
        }

        // Shrink labels with the cells, but never below a readable size
        let font_size = style
            .font_size
            .min(cells[0].height() as f32 * 0.6)
            .max(8.0);
        let labels = cells
            .iter()
            .zip(labels)
            .filter(|(cell, _)| {
                cell.width() as f32 >= font_size && cell.height() as f32 >= font_size
            })
            .map(|(cell, label)| {
                let center = cell.center();
                LabelPosition {
                    text: label.to_string(),
                    x: to_local_x(center.x),
                    y: to_local_y(center.y),
                    font_size,
                }
            })
            .collect();

        let badge = (depth > 0).then(|| {
            let badge_size = (style.font_size * 0.5).max(8.0);
            LabelPosition {
                text: depth.to_string(),
                x: badge_size,
                y: badge_size,
                font_size: badge_size,
            }
        });

        Ok(Self {
            canvas_width: canvas.width() as u32,
            canvas_height: canvas.height() as u32,
            shades,
            lines,
            labels,
            badge,
            style: style.clone(),
        })
    }
}

/// Loads a TrueType/OpenType font from disk
pub fn load_font(path: &Path) -> Result<FontVec, RendererError> {
    let font_load = |reason: String| RendererError::FontLoad {
        path: path.to_path_buf(),
        reason,
    };
    let data = fs::read(path).map_err(|e| font_load(e.to_string()))?;
    FontVec::try_from_vec(data).map_err(|e| font_load(e.to_string()))
}

/// Grid renderer using tiny-skia, with ab_glyph for label text
pub struct GridRenderer {
    font: Option<FontVec>,
}

impl std::fmt::Debug for GridRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GridRenderer")
            .field("has_font", &self.font.is_some())
            .finish()
    }
}

impl GridRenderer {
    /// Creates a renderer; without a font labels become filled markers
    pub fn new(font: Option<FontVec>) -> Self {
        Self { font }
    }

    /// Loads the configured font, then the first available system font
    pub fn from_style(style: &OverlayStyle) -> Self {
        if let Some(path) = &style.font_path {
            match load_font(path) {
                Ok(font) => {
                    info!("Using font {}", path.display());
                    return Self::new(Some(font));
                }
                Err(e) => warn!("{}", e),
            }
        }

        for candidate in SYSTEM_FONTS.iter().map(Path::new) {
            if !candidate.exists() {
                continue;
            }
            match load_font(candidate) {
                Ok(font) => {
                    info!("Using system font {}", candidate.display());
                    return Self::new(Some(font));
                }
                Err(e) => debug!("{}", e),
            }
        }

        warn!("No usable font found, labels are drawn as markers");
        Self::new(None)
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Render a grid layout to a pixmap
    pub fn render_layout(&self, layout: &GridLayout) -> Result<Pixmap, RendererError> {
        let (width, height) = (layout.canvas_width, layout.canvas_height);
        let mut pixmap = Pixmap::new(width, height)
            .ok_or(RendererError::PixmapCreationFailed { width, height })?;
        pixmap.fill(Color::TRANSPARENT);

        let style = &layout.style;

        let mut shade = Paint::default();
        shade.set_color(style.shade_color);
        for rect in &layout.shades {
            pixmap.fill_rect(*rect, &shade, Transform::identity(), None);
        }

        self.render_lines(&mut pixmap, &layout.lines, style);

        let texts: Vec<&LabelPosition> =
            layout.labels.iter().chain(layout.badge.as_ref()).collect();
        match &self.font {
            Some(font) => render_text(&mut pixmap, font, &texts, style.label_color),
            None => render_markers(&mut pixmap, &texts, style.label_color),
        }

        Ok(pixmap)
    }

    fn render_lines(&self, pixmap: &mut Pixmap, lines: &[Line], style: &OverlayStyle) {
        let mut paint = Paint::default();
        paint.set_color(style.line_color);
        let stroke = Stroke {
            width: style.line_width,
            ..Stroke::default()
        };

        for line in lines {
            let mut path_builder = PathBuilder::new();
            path_builder.move_to(line.x1, line.y1);
            path_builder.line_to(line.x2, line.y2);

            if let Some(path) = path_builder.finish() {
                pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
            }
        }
    }
}

/// Rasterizes every label into one coverage mask, then fills through it
fn render_text(pixmap: &mut Pixmap, font: &FontVec, labels: &[&LabelPosition], color: Color) {
    let (width, height) = (pixmap.width(), pixmap.height());
    let Some(mut mask) = Mask::new(width, height) else {
        return;
    };

    for label in labels {
        let scaled = font.as_scaled(PxScale::from(label.font_size));
        let text_width: f32 = label
            .text
            .chars()
            .map(|ch| scaled.h_advance(font.glyph_id(ch)))
            .sum();
        let baseline = label.y + (scaled.ascent() + scaled.descent()) / 2.0;
        let mut caret = label.x - text_width / 2.0;

        for ch in label.text.chars() {
            let mut glyph = scaled.scaled_glyph(ch);
            let advance = scaled.h_advance(glyph.id);
            glyph.position = point(caret, baseline);
            caret += advance;

            let Some(outlined) = font.outline_glyph(glyph) else {
                continue;
            };
            let bounds = outlined.px_bounds();
            let data = mask.data_mut();
            outlined.draw(|gx, gy, coverage| {
                let x = bounds.min.x as i64 + i64::from(gx);
                let y = bounds.min.y as i64 + i64::from(gy);
                if x < 0 || y < 0 || x >= i64::from(width) || y >= i64::from(height) {
                    return;
                }
                let index = (y * i64::from(width) + x) as usize;
                let value = (coverage.clamp(0.0, 1.0) * 255.0) as u8;
                data[index] = data[index].max(value);
            });
        }
    }

    let mut paint = Paint::default();
    paint.set_color(color);
    if let Some(rect) = SkiaRect::from_xywh(0.0, 0.0, width as f32, height as f32) {
        pixmap.fill_rect(rect, &paint, Transform::identity(), Some(&mask));
    }
}

/// Glyph-less fallback: one filled circle per label
fn render_markers(pixmap: &mut Pixmap, labels: &[&LabelPosition], color: Color) {
    let mut paint = Paint::default();
    paint.set_color(color);

    for label in labels {
        let radius = label.font_size / 4.0;
        let mut path_builder = PathBuilder::new();
        path_builder.push_circle(label.x, label.y, radius);
        if let Some(path) = path_builder.finish() {
            pixmap.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
        }
    }
}
