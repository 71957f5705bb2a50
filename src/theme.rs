//! Color constants shared by the graph canvas and the side panels.
//!
//! All colors are sourced from here so the canvas, the legend and the
//! reducers stay visually consistent.

use egui::Color32;

/// Main canvas background.
pub const BACKGROUND: Color32 = Color32::from_rgb(11, 17, 23);

/// Accent used for focused (hovered or selected) nodes.
pub const ACCENT: Color32 = Color32::from_rgb(183, 217, 255);

/// Resting edge color, barely above the background.
pub const EDGE_DEFAULT: Color32 = Color32::from_rgb(21, 24, 35);

/// Edges touched by hover, selection or the date filter.
pub const EDGE_HIGHLIGHT: Color32 = Color32::from_rgb(144, 194, 255);

/// Nodes dimmed out by an active tag/playlist filter.
pub const NODE_DIM: Color32 = Color32::from_rgb(27, 29, 39);

/// Label color for node captions.
pub const LABEL: Color32 = Color32::from_rgb(187, 187, 187);

/// Fixed genre palette. The ETL stamps these onto nodes; the legend and the
/// fallback color lookup read the same table.
pub const GENRE_COLORS: &[(&str, Color32)] = &[
    ("Techno", Color32::from_rgb(0x42, 0x67, 0xac)),
    ("House", Color32::from_rgb(0xff, 0xca, 0x3a)),
    ("Hip Hop", Color32::from_rgb(0xff, 0x92, 0x4c)),
    ("Latin", Color32::from_rgb(0xff, 0x59, 0x5e)),
    ("Daria", Color32::from_rgb(0xd6, 0x77, 0xb8)),
    ("Breaks", Color32::from_rgb(0x57, 0x57, 0x57)),
    ("Dubstep", Color32::from_rgb(0x6a, 0x4c, 0x93)),
    ("Pop", Color32::from_rgb(0x52, 0xa6, 0x75)),
    ("RnB", Color32::from_rgb(0xc5, 0xca, 0x30)),
    ("IDM", Color32::from_rgb(0x19, 0x82, 0xc4)),
    ("Death Drive", Color32::from_rgb(0x22, 0x22, 0x22)),
];

/// Color for a genre name, falling back to the accent for unknown genres.
pub fn genre_color(genre: &str) -> Color32 {
    GENRE_COLORS
        .iter()
        .find(|(name, _)| *name == genre)
        .map(|(_, color)| *color)
        .unwrap_or(ACCENT)
}

/// Parse a `#rrggbb` hex string as stored in the graph document.
pub fn parse_hex_color(hex: &str) -> Option<Color32> {
    let hex = hex.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some(Color32::from_rgb(r, g, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_genre_resolves() {
        assert_eq!(genre_color("Techno"), Color32::from_rgb(0x42, 0x67, 0xac));
    }

    #[test]
    fn unknown_genre_falls_back_to_accent() {
        assert_eq!(genre_color("Zydeco"), ACCENT);
    }

    #[test]
    fn hex_parsing_round_trips_palette() {
        assert_eq!(
            parse_hex_color("#4267ac"),
            Some(Color32::from_rgb(0x42, 0x67, 0xac))
        );
        assert_eq!(parse_hex_color("4267ac"), None);
        assert_eq!(parse_hex_color("#42"), None);
    }
}
