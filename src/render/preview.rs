//! Card data + theme -> positioned layout.
//!
//! Coordinates are authored for the 860x540 standard card and scaled to the
//! chosen [`DimensionPreset`].

use serde::Serialize;

use super::theme::{DimensionPreset, Theme};
use crate::models::{country, NewCard};

const BASE_WIDTH: f32 = 860.0;

pub const TITLE: &str = "CARTE D'IDENTITÉ OTAKU";
pub const TAGLINE: &str = "Cette carte d'identité atteste de votre passion pour l'univers \
     des animes et des mangas. Montrez-la fièrement";
pub const PLACEHOLDER: &str = "...";
pub const DEFAULT_CARD_NUMBER: &str = "OTK-2025-00001";
pub const DEFAULT_ISSUE_DATE: &str = "28/04/2025";

/// Lines the quote may occupy while ellipsis truncation is on.
pub const QUOTE_MAX_LINES: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    fn scaled(x: f32, y: f32, width: f32, height: f32, k: f32) -> Self {
        Self { x: x * k, y: y * k, width: width * k, height: height * k }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TextRole {
    Title,
    Username,
    RealName,
    Nationality,
    Status,
    Genre,
    QuoteLabel,
    Quote,
    Tagline,
    Organization,
    CardNumber,
    IssueDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Anchor {
    Start,
    Middle,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Corner {
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PhotoContent {
    Image(String),
    Placeholder,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum QrContent {
    Link(String),
    Placeholder,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Element {
    Panel {
        bounds: Rect,
        fill: String,
        radius: f32,
    },
    Badge {
        bounds: Rect,
        fill: String,
        radius: f32,
    },
    Text {
        role: TextRole,
        x: f32,
        y: f32,
        size: f32,
        text: String,
        color: String,
        bold: bool,
        italic: bool,
        anchor: Anchor,
    },
    /// Wrapped paragraph; subject to ellipsis truncation when `truncate` is set.
    Paragraph {
        role: TextRole,
        bounds: Rect,
        size: f32,
        text: String,
        color: String,
        italic: bool,
        truncate: bool,
        centered: bool,
    },
    Photo {
        bounds: Rect,
        frame: String,
        content: PhotoContent,
    },
    Flag {
        bounds: Rect,
        corner: Corner,
        code: String,
        name: String,
        flag_url: String,
    },
    QrBlock {
        bounds: Rect,
        foreground: String,
        frame: String,
        content: QrContent,
    },
    Rule {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        color: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Shadow {
    pub dx: f32,
    pub dy: f32,
    pub blur: f32,
    pub opacity: f32,
}

/// Layout-affecting presentation state of the live preview.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreviewStyle {
    /// Explicit pixel size; `None` renders at the scene's natural size.
    pub size: Option<(f32, f32)>,
    pub clip_overflow: bool,
    pub quote_ellipsis: bool,
    pub shadow: Option<Shadow>,
    pub transform_scale: f32,
}

impl PreviewStyle {
    pub fn on_screen() -> Self {
        Self {
            size: None,
            clip_overflow: true,
            quote_ellipsis: true,
            shadow: Some(Shadow { dx: 0.0, dy: 4.0, blur: 8.0, opacity: 0.2 }),
            transform_scale: 1.0,
        }
    }
}

impl Default for PreviewStyle {
    fn default() -> Self {
        Self::on_screen()
    }
}

/// Everything the renderer draws, independent of presentation style.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardScene {
    pub width: f32,
    pub height: f32,
    pub radius: f32,
    pub theme: Theme,
    pub elements: Vec<Element>,
}

impl CardScene {
    pub fn text(&self, role: TextRole) -> Option<&str> {
        self.elements.iter().find_map(|e| match e {
            Element::Text { role: r, text, .. } | Element::Paragraph { role: r, text, .. }
                if *r == role =>
            {
                Some(text.as_str())
            }
            _ => None,
        })
    }

    pub fn flags(&self) -> impl Iterator<Item = &Element> {
        self.elements.iter().filter(|e| matches!(e, Element::Flag { .. }))
    }

    pub fn qr_block(&self) -> Option<&QrContent> {
        self.elements.iter().find_map(|e| match e {
            Element::QrBlock { content, .. } => Some(content),
            _ => None,
        })
    }

    pub fn photo(&self) -> Option<&PhotoContent> {
        self.elements.iter().find_map(|e| match e {
            Element::Photo { content, .. } => Some(content),
            _ => None,
        })
    }
}

/// A rendered preview: the scene plus its current presentation style.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardLayout {
    pub scene: CardScene,
    pub style: PreviewStyle,
}

impl CardLayout {
    pub fn to_svg(&self) -> String {
        super::svg::render_svg(&self.scene, &self.style)
    }
}

fn or_placeholder(value: &str) -> String {
    if value.trim().is_empty() {
        PLACEHOLDER.to_string()
    } else {
        value.to_string()
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

/// Build the preview for `card`. Pure: the same inputs always give the same
/// layout.
pub fn render_preview(card: &NewCard, theme: &Theme, preset: DimensionPreset) -> CardLayout {
    let (width, height) = preset.size();
    let k = width as f32 / BASE_WIDTH;
    let mut elements = Vec::new();

    let line = |role: TextRole,
                x: f32,
                y: f32,
                size: f32,
                text: String,
                color: &str,
                bold: bool,
                anchor: Anchor| {
        Element::Text {
            role,
            x: x * k,
            y: y * k,
            size: size * k,
            text,
            color: color.to_string(),
            bold,
            italic: false,
            anchor,
        }
    };

    let nation = country(&card.nationality);
    if let Some(c) = nation {
        for (corner, x) in [(Corner::Left, 24.0), (Corner::Right, BASE_WIDTH - 24.0 - 40.0)] {
            elements.push(Element::Flag {
                bounds: Rect::scaled(x, 24.0, 40.0, 28.0, k),
                corner,
                code: c.code.to_string(),
                name: c.name.to_string(),
                flag_url: c.flag_url.to_string(),
            });
        }
    }

    elements.push(line(
        TextRole::Title,
        BASE_WIDTH / 2.0,
        72.0,
        28.0,
        TITLE.to_string(),
        &theme.text,
        true,
        Anchor::Middle,
    ));

    elements.push(Element::Panel {
        bounds: Rect::scaled(32.0, 100.0, 796.0, 408.0, k),
        fill: theme.panel.clone(),
        radius: 6.0 * k,
    });

    // Left column: photo and identity lines.
    let photo = match non_empty(&card.photo) {
        Some(uri) => PhotoContent::Image(uri.to_string()),
        None => PhotoContent::Placeholder,
    };
    elements.push(Element::Photo {
        bounds: Rect::scaled(44.0, 112.0, 180.0, 220.0, k),
        frame: theme.frame.clone(),
        content: photo,
    });

    let identity = [
        (TextRole::Username, "NOM", or_placeholder(&card.username)),
        (TextRole::RealName, "NOM RÉEL", or_placeholder(&card.real_name)),
        (
            TextRole::Nationality,
            "NATIONALITÉ",
            nation.map(|c| c.name.to_string()).unwrap_or_else(|| PLACEHOLDER.to_string()),
        ),
    ];
    for (i, (role, label, value)) in identity.into_iter().enumerate() {
        elements.push(line(
            role,
            44.0,
            368.0 + 26.0 * i as f32,
            16.0,
            format!("{}: {}", label, value),
            &theme.text,
            false,
            Anchor::Start,
        ));
    }

    // Middle column.
    elements.push(line(
        TextRole::Status,
        290.0,
        132.0,
        16.0,
        format!("STATUT: {}", or_placeholder(&card.status)),
        &theme.text,
        false,
        Anchor::Start,
    ));
    elements.push(line(
        TextRole::Genre,
        290.0,
        158.0,
        16.0,
        format!("GENRE: {}", or_placeholder(&card.genre)),
        &theme.text,
        false,
        Anchor::Start,
    ));
    elements.push(line(
        TextRole::QuoteLabel,
        290.0,
        196.0,
        16.0,
        "CITATION FAVORITE:".to_string(),
        &theme.text,
        true,
        Anchor::Start,
    ));
    elements.push(Element::Paragraph {
        role: TextRole::Quote,
        bounds: Rect::scaled(294.0, 206.0, 350.0, 60.0, k),
        size: 15.0 * k,
        text: format!("\"{}\"", or_placeholder(&card.quote)),
        color: theme.text.clone(),
        italic: true,
        truncate: true,
        centered: false,
    });
    elements.push(Element::Paragraph {
        role: TextRole::Tagline,
        bounds: Rect::scaled(290.0, 300.0, 350.0, 60.0, k),
        size: 13.0 * k,
        text: TAGLINE.to_string(),
        color: theme.muted_text.clone(),
        italic: true,
        truncate: false,
        centered: true,
    });

    // Right column: QR block (only when enabled) and the organization badge.
    if card.qr_code_enabled {
        let content = match non_empty(&card.qr_code_link) {
            Some(link) => QrContent::Link(link.to_string()),
            None => QrContent::Placeholder,
        };
        elements.push(Element::QrBlock {
            bounds: Rect::scaled(666.0, 112.0, 150.0, 150.0, k),
            foreground: theme.qr_foreground.clone(),
            frame: theme.frame.clone(),
            content,
        });
    }
    elements.push(Element::Badge {
        bounds: Rect::scaled(666.0, 274.0, 150.0, 44.0, k),
        fill: theme.accent_soft.clone(),
        radius: 2.0 * k,
    });
    elements.push(line(
        TextRole::Organization,
        741.0,
        293.0,
        14.0,
        "SHADOW GARDEN".to_string(),
        &theme.accent,
        true,
        Anchor::Middle,
    ));
    elements.push(line(
        TextRole::Organization,
        741.0,
        310.0,
        12.0,
        "QUARTIER GÉNÉRAL".to_string(),
        &theme.accent,
        false,
        Anchor::Middle,
    ));

    // Footer.
    elements.push(Element::Rule {
        x1: 290.0 * k,
        y1: 444.0 * k,
        x2: 816.0 * k,
        y2: 444.0 * k,
        color: theme.accent_soft.clone(),
    });
    elements.push(line(
        TextRole::CardNumber,
        290.0,
        468.0,
        14.0,
        format!(
            "ID: {}",
            non_empty(&card.card_number).unwrap_or(DEFAULT_CARD_NUMBER)
        ),
        &theme.accent,
        true,
        Anchor::Start,
    ));
    elements.push(line(
        TextRole::IssueDate,
        816.0,
        468.0,
        14.0,
        format!(
            "DATE: {}",
            non_empty(&card.issue_date).unwrap_or(DEFAULT_ISSUE_DATE)
        ),
        &theme.accent,
        true,
        Anchor::End,
    ));

    CardLayout {
        scene: CardScene {
            width: width as f32,
            height: height as f32,
            radius: 8.0 * k,
            theme: theme.clone(),
            elements,
        },
        style: PreviewStyle::on_screen(),
    }
}

/// Greedy word wrap on an approximate glyph width of `0.55 * size`.
pub fn wrap_text(text: &str, width: f32, size: f32) -> Vec<String> {
    let max_chars = ((width / (size * 0.55)).floor() as usize).max(1);
    let mut lines = Vec::new();
    let mut line = String::new();

    for word in text.split_whitespace() {
        let needed = if line.is_empty() {
            word.chars().count()
        } else {
            line.chars().count() + 1 + word.chars().count()
        };
        if needed > max_chars && !line.is_empty() {
            lines.push(std::mem::take(&mut line));
        }
        if !line.is_empty() {
            line.push(' ');
        }
        line.push_str(word);
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

/// Keep at most `max_lines`, marking the cut with an ellipsis.
pub fn truncate_lines(mut lines: Vec<String>, max_lines: usize) -> Vec<String> {
    if lines.len() <= max_lines {
        return lines;
    }
    lines.truncate(max_lines);
    if let Some(last) = lines.last_mut() {
        last.push('…');
    }
    lines
}
