use crate::ir::ChangeCategory;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static HEX_COLOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#?([a-fA-F\d]{2})([a-fA-F\d]{2})([a-fA-F\d]{2})$").unwrap());

/// Parse `#rrggbb` (leading `#` optional) into RGB components.
pub fn hex_to_rgb(hex: &str) -> Option<[u8; 3]> {
    let caps = HEX_COLOR_RE.captures(hex.trim())?;
    let channel = |idx: usize| u8::from_str_radix(&caps[idx], 16).ok();
    Some([channel(1)?, channel(2)?, channel(3)?])
}

/// Color, render rank and dash style per change category, indexed by
/// [`ChangeCategory::index`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryPalette {
    pub colors: [String; 6],
    pub ranks: [u32; 6],
    pub dashes: [u8; 6],
}

impl Default for CategoryPalette {
    fn default() -> Self {
        Self {
            colors: [
                "#a8aaac".to_string(),
                "#008e9b".to_string(),
                "#10684e".to_string(),
                "#ffc75f".to_string(),
                "#ff9671".to_string(),
                "#CC0000".to_string(),
            ],
            ranks: [1, 2, 3, 4, 5, 6],
            dashes: [0, 0, 0, 1, 2, 3],
        }
    }
}

impl CategoryPalette {
    pub fn color(&self, category: ChangeCategory) -> &str {
        &self.colors[category.index()]
    }

    pub fn rgb(&self, category: ChangeCategory) -> [u8; 3] {
        hex_to_rgb(self.color(category)).unwrap_or([0, 0, 0])
    }

    pub fn rank(&self, category: ChangeCategory) -> u32 {
        self.ranks[category.index()]
    }

    pub fn dash(&self, category: ChangeCategory) -> u8 {
        self.dashes[category.index()]
    }

    /// SVG `stroke-dasharray` for the category, scaled by stroke width.
    /// `None` means a solid line.
    pub fn dash_array(&self, category: ChangeCategory, stroke_width: f32) -> Option<String> {
        let (on, off) = match self.dash(category) {
            0 => return None,
            1 => (6.0, 3.0),
            2 => (3.0, 3.0),
            _ => (1.0, 3.0),
        };
        Some(format!("{:.1} {:.1}", on * stroke_width, off * stroke_width))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub font_family: String,
    pub font_weight: u16,
    pub font_size: f32,
    pub background: String,
    pub label_text_color: String,
    pub highlight_color: String,
    pub panel_background: String,
    pub panel_text_color: String,
    pub route_width: f32,
    pub palette: CategoryPalette,
}

impl Theme {
    pub fn dark() -> Self {
        Self {
            font_family: "Fira Sans, sans-serif".to_string(),
            font_weight: 500,
            font_size: 11.0,
            background: "#242730".to_string(),
            label_text_color: "#000000".to_string(),
            highlight_color: "#ffffff".to_string(),
            panel_background: "#ffffff".to_string(),
            panel_text_color: "#1c2430".to_string(),
            route_width: 2.0,
            palette: CategoryPalette::default(),
        }
    }

    pub fn light() -> Self {
        Self {
            background: "#f4f4f2".to_string(),
            highlight_color: "#1c2430".to_string(),
            panel_background: "#ffffff".to_string(),
            ..Self::dark()
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_colors_parse_with_or_without_hash() {
        assert_eq!(hex_to_rgb("#CC0000"), Some([204, 0, 0]));
        assert_eq!(hex_to_rgb("008e9b"), Some([0, 142, 155]));
        assert_eq!(hex_to_rgb("#fff"), None);
        assert_eq!(hex_to_rgb("red"), None);
    }

    #[test]
    fn palette_lookups_follow_category_order() {
        let palette = CategoryPalette::default();
        assert_eq!(palette.color(ChangeCategory::Other), "#a8aaac");
        assert_eq!(palette.color(ChangeCategory::NoChange), "#10684e");
        assert_eq!(palette.rank(ChangeCategory::Other), 1);
        assert_eq!(palette.rank(ChangeCategory::Eliminated), 6);
        assert_eq!(palette.dash_array(ChangeCategory::Increased, 2.0), None);
        assert_eq!(
            palette.dash_array(ChangeCategory::Modified, 2.0).as_deref(),
            Some("12.0 6.0")
        );
    }
}
