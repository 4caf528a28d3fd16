//! Maps a bound-property key to its semantic category.

use serde::{Deserialize, Serialize};

/// Semantic category of a bound property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Category {
    Fill,
    Stroke,
    Effect,
    Text,
    Spacing,
    CornerRadius,
    Typography,
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Fill => "fill",
            Category::Stroke => "stroke",
            Category::Effect => "effect",
            Category::Text => "text",
            Category::Spacing => "spacing",
            Category::CornerRadius => "cornerRadius",
            Category::Typography => "typography",
            Category::Other => "other",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        ALL_CATEGORIES.iter().copied().find(|c| c.as_str() == s)
    }
}

pub const ALL_CATEGORIES: &[Category] = &[
    Category::Fill,
    Category::Stroke,
    Category::Effect,
    Category::Text,
    Category::Spacing,
    Category::CornerRadius,
    Category::Typography,
    Category::Other,
];

const SPACING_KEYS: &[&str] = &[
    "itemSpacing",
    "counterAxisSpacing",
    "paddingLeft",
    "paddingRight",
    "paddingTop",
    "paddingBottom",
];

const CORNER_RADIUS_KEYS: &[&str] = &[
    "cornerRadius",
    "topLeftRadius",
    "topRightRadius",
    "bottomLeftRadius",
    "bottomRightRadius",
];

const TYPOGRAPHY_KEYS: &[&str] = &[
    "fontSize",
    "fontFamily",
    "fontStyle",
    "fontWeight",
    "lineHeight",
    "letterSpacing",
    "paragraphSpacing",
    "paragraphIndent",
];

/// Classify a raw property key. Total: unknown keys map to [`Category::Other`].
pub fn classify(property_key: &str) -> Category {
    match property_key {
        "fills" => Category::Fill,
        "strokes" => Category::Stroke,
        "effects" => Category::Effect,
        "characters" => Category::Text,
        key if SPACING_KEYS.contains(&key) => Category::Spacing,
        key if CORNER_RADIUS_KEYS.contains(&key) => Category::CornerRadius,
        key if TYPOGRAPHY_KEYS.contains(&key) => Category::Typography,
        _ => Category::Other,
    }
}
