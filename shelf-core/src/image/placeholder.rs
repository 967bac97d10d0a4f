//! Inline vector placeholder shown when every network tier has failed

use serde::{Deserialize, Serialize};

/// Text announced in place of an unavailable image
pub const UNAVAILABLE_TEXT: &str = "Image unavailable";

pub const DEFAULT_WIDTH: u32 = 200;
pub const DEFAULT_HEIGHT: u32 = 300;

/// Terminal placeholder graphic.
///
/// Rendering is pure string work, so this tier cannot fail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placeholder {
    pub width: u32,
    pub height: u32,
    /// Accessible text, always mentioning that the image is unavailable
    pub alt: String,
}

impl Placeholder {
    /// Create a placeholder for the given box; zero sizes use the cover default
    pub fn new(width: Option<u32>, height: Option<u32>, alt: &str) -> Self {
        let alt = alt.trim();
        let alt = if alt.is_empty() {
            UNAVAILABLE_TEXT.to_string()
        } else {
            format!("{}: {}", UNAVAILABLE_TEXT, alt)
        };

        Self {
            width: width.filter(|w| *w > 0).unwrap_or(DEFAULT_WIDTH),
            height: height.filter(|h| *h > 0).unwrap_or(DEFAULT_HEIGHT),
            alt,
        }
    }

    /// Render the SVG document
    pub fn to_svg(&self) -> String {
        let (w, h) = (self.width, self.height);
        // Picture frame glyph scaled to the shorter side
        let side = w.min(h) as f32 * 0.4;
        let x = (w as f32 - side) / 2.0;
        let y = (h as f32 - side) / 2.0;

        format!(
            concat!(
                r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" role="img" aria-label="{alt}">"#,
                r#"<title>{alt}</title>"#,
                r##"<rect width="{w}" height="{h}" fill="#221e19"/>"##,
                r##"<g fill="none" stroke="#d4a574" stroke-width="2" stroke-linejoin="round" opacity="0.6">"##,
                r#"<rect x="{x:.1}" y="{y:.1}" width="{side:.1}" height="{side:.1}" rx="6"/>"#,
                r#"<path d="M{x:.1} {py:.1}l{s1:.1} -{s1:.1}l{s2:.1} {s2:.1}"/>"#,
                r#"<circle cx="{cx:.1}" cy="{cy:.1}" r="{r:.1}"/>"#,
                r#"</g></svg>"#
            ),
            w = w,
            h = h,
            alt = escape_xml(&self.alt),
            x = x,
            y = y,
            side = side,
            py = y + side * 0.75,
            s1 = side * 0.3,
            s2 = side * 0.55,
            cx = x + side * 0.7,
            cy = y + side * 0.3,
            r = side * 0.1,
        )
    }

    /// Render as a `data:` URI usable wherever an image URL is expected
    pub fn to_data_uri(&self) -> String {
        format!(
            "data:image/svg+xml,{}",
            urlencoding::encode(&self.to_svg())
        )
    }
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
