//! SVG serialization of a [`CardScene`] under a given [`PreviewStyle`].

use qrcode::{Color, QrCode};

use super::preview::{
    truncate_lines, wrap_text, Anchor, CardScene, Element, PhotoContent, PreviewStyle, QrContent,
    Rect, TextRole, QUOTE_MAX_LINES,
};

const SANS: &str = "DejaVu Sans, Liberation Sans, Arial, sans-serif";
const SERIF: &str = "DejaVu Serif, Liberation Serif, Georgia, serif";

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}

pub fn render_svg(scene: &CardScene, style: &PreviewStyle) -> String {
    let (out_w, out_h) = style.size.unwrap_or((scene.width, scene.height));
    let mut svg = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="{}" height="{}" viewBox="0 0 {} {}">"#,
        out_w, out_h, scene.width, scene.height
    );

    svg.push_str("<defs>");
    svg.push_str(&format!(
        r#"<linearGradient id="card-bg" x1="0" y1="0" x2="0" y2="1"><stop offset="0" stop-color="{}"/><stop offset="1" stop-color="{}"/></linearGradient>"#,
        scene.theme.background_top, scene.theme.background_bottom
    ));
    if style.clip_overflow {
        svg.push_str(&format!(
            r#"<clipPath id="card-clip"><rect width="{}" height="{}" rx="{}"/></clipPath>"#,
            scene.width, scene.height, scene.radius
        ));
    }
    if let Some(shadow) = &style.shadow {
        svg.push_str(&format!(
            r#"<filter id="card-shadow" x="-10%" y="-10%" width="120%" height="130%"><feDropShadow dx="{}" dy="{}" stdDeviation="{}" flood-opacity="{}"/></filter>"#,
            shadow.dx,
            shadow.dy,
            shadow.blur / 2.0,
            shadow.opacity
        ));
    }
    svg.push_str("</defs>");

    let mut group = String::from("<g");
    if (style.transform_scale - 1.0).abs() > f32::EPSILON {
        group.push_str(&format!(r#" transform="scale({})""#, style.transform_scale));
    }
    if style.clip_overflow {
        group.push_str(r#" clip-path="url(#card-clip)""#);
    }
    if style.shadow.is_some() {
        group.push_str(r#" filter="url(#card-shadow)""#);
    }
    group.push('>');
    svg.push_str(&group);

    svg.push_str(&format!(
        r#"<rect width="{}" height="{}" rx="{}" fill="url(#card-bg)"/>"#,
        scene.width, scene.height, scene.radius
    ));

    let k = scene.width / 860.0;
    for element in &scene.elements {
        render_element(&mut svg, element, style, k);
    }

    svg.push_str("</g></svg>");
    svg
}

fn anchor_attr(anchor: Anchor) -> &'static str {
    match anchor {
        Anchor::Start => "start",
        Anchor::Middle => "middle",
        Anchor::End => "end",
    }
}

fn render_element(svg: &mut String, element: &Element, style: &PreviewStyle, k: f32) {
    match element {
        Element::Panel { bounds, fill, radius } | Element::Badge { bounds, fill, radius } => {
            svg.push_str(&format!(
                r#"<rect x="{}" y="{}" width="{}" height="{}" rx="{}" fill="{}"/>"#,
                bounds.x, bounds.y, bounds.width, bounds.height, radius, fill
            ));
        }
        Element::Text { role, x, y, size, text, color, bold, italic, anchor } => {
            let family = if *role == TextRole::Title { SERIF } else { SANS };
            svg.push_str(&format!(
                r#"<text x="{}" y="{}" font-family="{}" font-size="{}" font-weight="{}" font-style="{}" text-anchor="{}" fill="{}">{}</text>"#,
                x,
                y,
                family,
                size,
                if *bold { "bold" } else { "normal" },
                if *italic { "italic" } else { "normal" },
                anchor_attr(*anchor),
                color,
                escape(text)
            ));
        }
        Element::Paragraph { bounds, size, text, color, italic, truncate, centered, .. } => {
            let mut lines = wrap_text(text, bounds.width, *size);
            if *truncate && style.quote_ellipsis {
                lines = truncate_lines(lines, QUOTE_MAX_LINES);
            }
            let (x, anchor) = if *centered {
                (bounds.x + bounds.width / 2.0, Anchor::Middle)
            } else {
                (bounds.x, Anchor::Start)
            };
            for (i, line) in lines.iter().enumerate() {
                let y = bounds.y + size * (1.0 + 1.25 * i as f32);
                svg.push_str(&format!(
                    r#"<text x="{}" y="{}" font-family="{}" font-size="{}" font-style="{}" text-anchor="{}" fill="{}">{}</text>"#,
                    x,
                    y,
                    SANS,
                    size,
                    if *italic { "italic" } else { "normal" },
                    anchor_attr(anchor),
                    color,
                    escape(line)
                ));
            }
        }
        Element::Photo { bounds, frame, content } => render_photo(svg, bounds, frame, content, k),
        Element::Flag { bounds, code, .. } => {
            svg.push_str(&format!(
                r##"<rect x="{}" y="{}" width="{}" height="{}" rx="{}" fill="#ffffff" fill-opacity="0.8"/>"##,
                bounds.x,
                bounds.y,
                bounds.width,
                bounds.height,
                2.0 * k
            ));
            svg.push_str(&format!(
                r##"<text x="{}" y="{}" font-family="{}" font-size="{}" font-weight="bold" text-anchor="middle" fill="#111827">{}</text>"##,
                bounds.x + bounds.width / 2.0,
                bounds.y + bounds.height * 0.68,
                SANS,
                bounds.height * 0.5,
                escape(&code.to_uppercase())
            ));
        }
        Element::QrBlock { bounds, foreground, frame, content } => {
            svg.push_str(&format!(
                r##"<rect x="{}" y="{}" width="{}" height="{}" rx="{}" fill="#ffffff" stroke="{}" stroke-width="{}"/>"##,
                bounds.x,
                bounds.y,
                bounds.width,
                bounds.height,
                6.0 * k,
                frame,
                2.0 * k
            ));
            match content {
                QrContent::Link(link) => render_qr_code(svg, bounds, foreground, link, k),
                QrContent::Placeholder => render_qr_placeholder(svg, bounds, foreground, k),
            }
        }
        Element::Rule { x1, y1, x2, y2, color } => {
            svg.push_str(&format!(
                r#"<line x1="{}" y1="{}" x2="{}" y2="{}" stroke="{}" stroke-width="{}"/>"#,
                x1, y1, x2, y2, color, k
            ));
        }
    }
}

fn render_photo(svg: &mut String, bounds: &Rect, frame: &str, content: &PhotoContent, k: f32) {
    svg.push_str(&format!(
        r##"<rect x="{}" y="{}" width="{}" height="{}" rx="{}" fill="#ffffff" stroke="{}" stroke-width="{}"/>"##,
        bounds.x,
        bounds.y,
        bounds.width,
        bounds.height,
        6.0 * k,
        frame,
        2.0 * k
    ));
    match content {
        PhotoContent::Image(uri) => {
            svg.push_str(&format!(
                r#"<image x="{}" y="{}" width="{}" height="{}" preserveAspectRatio="xMidYMid slice" xlink:href="{}"/>"#,
                bounds.x,
                bounds.y,
                bounds.width,
                bounds.height,
                escape(uri)
            ));
        }
        PhotoContent::Placeholder => {
            let cx = bounds.x + bounds.width / 2.0;
            let cy = bounds.y + bounds.height / 2.0;
            let r = 22.0 * k;
            svg.push_str(&format!(
                r#"<circle cx="{}" cy="{}" r="{}" fill="none" stroke="{}" stroke-width="{}"/>"#,
                cx,
                cy - r,
                r,
                frame,
                3.0 * k
            ));
            svg.push_str(&format!(
                r#"<path d="M {} {} a {} {} 0 0 1 {} 0" fill="none" stroke="{}" stroke-width="{}"/>"#,
                cx - 1.8 * r,
                cy + 2.2 * r,
                1.8 * r,
                1.8 * r,
                3.6 * r,
                frame,
                3.0 * k
            ));
        }
    }
}

fn render_qr_placeholder(svg: &mut String, bounds: &Rect, foreground: &str, k: f32) {
    let side = bounds.width * 0.64;
    svg.push_str(&format!(
        r#"<rect x="{}" y="{}" width="{}" height="{}" rx="{}" fill="{}" fill-opacity="0.1"/>"#,
        bounds.x + (bounds.width - side) / 2.0,
        bounds.y + bounds.height * 0.1,
        side,
        side,
        4.0 * k,
        foreground
    ));
    svg.push_str(&format!(
        r##"<text x="{}" y="{}" font-family="{}" font-size="{}" text-anchor="middle" fill="#9ca3af">QR Code</text>"##,
        bounds.x + bounds.width / 2.0,
        bounds.y + bounds.height * 0.92,
        SANS,
        14.0 * k
    ));
}

/// Encodes `link` and draws one square per dark module. The white box
/// around the code doubles as its quiet zone.
fn render_qr_code(svg: &mut String, bounds: &Rect, foreground: &str, link: &str, k: f32) {
    let code = match QrCode::new(link.as_bytes()) {
        Ok(code) => code,
        Err(e) => {
            tracing::warn!("cannot encode QR link ({} bytes): {}", link.len(), e);
            return render_qr_placeholder(svg, bounds, foreground, k);
        }
    };

    let n = code.width();
    let inset = 12.0 * k;
    let cell = (bounds.width - 2.0 * inset) / n as f32;
    let mut path = String::new();
    for (i, color) in code.to_colors().into_iter().enumerate() {
        if color != Color::Dark {
            continue;
        }
        let x = bounds.x + inset + (i % n) as f32 * cell;
        let y = bounds.y + inset + (i / n) as f32 * cell;
        path.push_str(&format!("M{} {}h{}v{}h-{}z", x, y, cell, cell, cell));
    }
    svg.push_str(&format!(
        r#"<path d="{}" fill="{}" shape-rendering="crispEdges"/>"#,
        path, foreground
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewCard;
    use crate::render::{render_preview, DimensionPreset, Theme};

    fn layout(quote: &str) -> crate::render::CardLayout {
        let card = NewCard {
            username: "Tom & Jerry <3".to_string(),
            nationality: "jp".to_string(),
            quote: quote.to_string(),
            qr_code_enabled: true,
            qr_code_link: Some("https://anilist.co".to_string()),
            ..Default::default()
        };
        render_preview(&card, &Theme::classic(), DimensionPreset::Standard)
    }

    #[test]
    fn test_text_is_escaped() {
        let svg = layout("hi").to_svg();
        assert!(svg.contains("NOM: Tom &amp; Jerry &lt;3"));
        assert!(!svg.contains("Tom & Jerry"));
    }

    #[test]
    fn test_svg_parses() {
        let svg = layout("Omae wa mou shindeiru").to_svg();
        let tree = usvg::Tree::from_str(&svg, &usvg::Options::default()).unwrap();
        assert_eq!(tree.size().width(), 860.0);
        assert_eq!(tree.size().height(), 540.0);
    }

    #[test]
    fn test_style_drives_clip_shadow_and_size() {
        let mut l = layout("hi");
        let on_screen = l.to_svg();
        assert!(on_screen.contains("card-clip"));
        assert!(on_screen.contains("card-shadow"));

        l.style.clip_overflow = false;
        l.style.shadow = None;
        l.style.size = Some((1720.0, 1080.0));
        let plain = l.to_svg();
        assert!(!plain.contains("card-clip"));
        assert!(!plain.contains("card-shadow"));
        assert!(plain.contains(r#"width="1720" height="1080" viewBox="0 0 860 540""#));
    }

    #[test]
    fn test_quote_ellipsis_follows_style() {
        let long = "lorem ipsum dolor sit amet ".repeat(20);
        let mut l = layout(&long);
        assert!(l.to_svg().contains('…'));

        l.style.quote_ellipsis = false;
        assert!(!l.to_svg().contains('…'));
    }

    #[test]
    fn test_qr_block_draws_encoded_link() {
        let svg = layout("hi").to_svg();
        assert!(svg.contains(r#"shape-rendering="crispEdges""#));
        assert!(!svg.contains(">QR Code</text>"));
    }

    #[test]
    fn test_unencodable_link_falls_back_to_placeholder() {
        let card = NewCard {
            qr_code_enabled: true,
            qr_code_link: Some(format!("https://example.com/{}", "a".repeat(8000))),
            ..Default::default()
        };
        let svg = render_preview(&card, &Theme::classic(), DimensionPreset::Standard).to_svg();
        assert!(svg.contains(">QR Code</text>"));
    }
}
