//! Find/replace over `/`-delimited token names.

use regex::{NoExpand, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// How `find` is matched against a token path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchMode {
    /// Only complete path segments match.
    #[default]
    WholeSegment,
    /// Any literal occurrence within the full path matches.
    Substring,
}

impl MatchMode {
    pub fn from_str(s: &str) -> Result<Self> {
        match s {
            "whole-segment" | "segment" => Ok(MatchMode::WholeSegment),
            "substring" => Ok(MatchMode::Substring),
            _ => Err(Error::validation_invalid_argument(
                "mode",
                format!("Unknown match mode '{}'. Use: whole-segment, substring", s),
                None,
                None,
            )),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MatchMode::WholeSegment => "whole-segment",
            MatchMode::Substring => "substring",
        }
    }
}

const SEGMENT_SEPARATOR: char = '/';

/// Apply a find/replace to a token path.
///
/// Whole-segment mode compares each `/`-separated segment against `find` in full.
/// Substring mode replaces every non-overlapping occurrence, left to right, and
/// always inserts `replace` verbatim even when matching case-insensitively.
///
/// An empty `find` returns `original` unchanged.
pub fn apply_find_replace(
    original: &str,
    find: &str,
    replace: &str,
    mode: MatchMode,
    case_sensitive: bool,
) -> String {
    if find.is_empty() {
        return original.to_string();
    }

    match mode {
        MatchMode::WholeSegment => replace_segments(original, find, replace, case_sensitive),
        MatchMode::Substring => replace_substrings(original, find, replace, case_sensitive),
    }
}

fn replace_segments(original: &str, find: &str, replace: &str, case_sensitive: bool) -> String {
    let folded_find = if case_sensitive {
        None
    } else {
        Some(find.to_lowercase())
    };

    original
        .split(SEGMENT_SEPARATOR)
        .map(|segment| {
            let matches = match &folded_find {
                None => segment == find,
                Some(folded) => segment.to_lowercase() == *folded,
            };
            if matches {
                replace
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn replace_substrings(original: &str, find: &str, replace: &str, case_sensitive: bool) -> String {
    if case_sensitive {
        return original.replace(find, replace);
    }

    // `find` is escaped, so the pattern can only fail on size limits.
    match RegexBuilder::new(&regex::escape(find))
        .case_insensitive(true)
        .build()
    {
        Ok(pattern) => pattern.replace_all(original, NoExpand(replace)).into_owned(),
        Err(_) => original.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_segment_replaces_matching_segment() {
        assert_eq!(
            apply_find_replace(
                "button/brand/surface",
                "brand",
                "neutral",
                MatchMode::WholeSegment,
                true
            ),
            "button/neutral/surface"
        );
    }

    #[test]
    fn whole_segment_ignores_partial_segments() {
        assert_eq!(
            apply_find_replace(
                "button/brandish/surface",
                "brand",
                "neutral",
                MatchMode::WholeSegment,
                true
            ),
            "button/brandish/surface"
        );
    }

    #[test]
    fn whole_segment_replaces_every_matching_segment() {
        assert_eq!(
            apply_find_replace("brand/x/brand", "brand", "core", MatchMode::WholeSegment, true),
            "core/x/core"
        );
    }

    #[test]
    fn whole_segment_case_insensitive() {
        assert_eq!(
            apply_find_replace(
                "Button/BRAND/x",
                "brand",
                "neutral",
                MatchMode::WholeSegment,
                false
            ),
            "Button/neutral/x"
        );
        assert_eq!(
            apply_find_replace(
                "Button/BRAND/x",
                "brand",
                "neutral",
                MatchMode::WholeSegment,
                true
            ),
            "Button/BRAND/x"
        );
    }

    #[test]
    fn substring_replaces_inside_segments() {
        assert_eq!(
            apply_find_replace(
                "button/brandish/surface",
                "brand",
                "neutral",
                MatchMode::Substring,
                true
            ),
            "button/neutralish/surface"
        );
    }

    #[test]
    fn substring_can_span_separators() {
        assert_eq!(
            apply_find_replace(
                "color/bg/primary",
                "bg/prim",
                "surface/second",
                MatchMode::Substring,
                true
            ),
            "color/surface/secondary"
        );
    }

    #[test]
    fn substring_case_insensitive_inserts_literal_replacement() {
        assert_eq!(
            apply_find_replace("Brand/BRANDED/brand", "brand", "Core", MatchMode::Substring, false),
            "Core/CoreED/Core"
        );
    }

    #[test]
    fn substring_treats_find_as_literal() {
        assert_eq!(
            apply_find_replace("space/1.5x/(lg)", "(lg)", "xl", MatchMode::Substring, false),
            "space/1.5x/xl"
        );
        assert_eq!(
            apply_find_replace("a.b/axb", ".", "-", MatchMode::Substring, false),
            "a-b/axb"
        );
    }

    #[test]
    fn substring_does_not_expand_replacement_templates() {
        assert_eq!(
            apply_find_replace("price/usd", "usd", "$1", MatchMode::Substring, false),
            "price/$1"
        );
    }

    #[test]
    fn non_overlapping_left_to_right() {
        assert_eq!(
            apply_find_replace("aaaa", "aa", "b", MatchMode::Substring, true),
            "bb"
        );
        assert_eq!(
            apply_find_replace("aaa", "aa", "b", MatchMode::Substring, false),
            "ba"
        );
    }

    #[test]
    fn empty_inputs_are_total() {
        assert_eq!(apply_find_replace("", "x", "y", MatchMode::Substring, true), "");
        assert_eq!(apply_find_replace("", "x", "y", MatchMode::WholeSegment, true), "");
        assert_eq!(apply_find_replace("a/b", "", "y", MatchMode::Substring, true), "a/b");
        assert_eq!(apply_find_replace("a/b", "a", "", MatchMode::WholeSegment, true), "/b");
    }

    #[test]
    fn match_mode_parses_names() {
        assert_eq!(MatchMode::from_str("whole-segment").unwrap(), MatchMode::WholeSegment);
        assert_eq!(MatchMode::from_str("substring").unwrap(), MatchMode::Substring);
        assert!(MatchMode::from_str("regex").is_err());
    }
}
