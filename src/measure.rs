//! Display width of styled terminal text. Style markers (ANSI escapes added
//! by the theme) occupy no columns; glyph widths come from `unicode-width`.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_width::UnicodeWidthChar;

pub const ELLIPSIS: char = '…';

/// SGR reset, emitted after a cut that may have dropped a closing marker.
pub const STYLE_RESET: &str = "\x1b[0m";

static MARKER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\x1b\[[0-?]*[ -/]*[@-~]|\x1b\][^\x07\x1b]*(?:\x07|\x1b\\)|\x1b[@-Z\\-_]")
        .expect("valid escape marker regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub start: usize,
    pub end: usize,
    pub width: usize,
    pub is_marker: bool,
}

pub fn segments(text: &str) -> Vec<Segment> {
    let mut out = Vec::with_capacity(text.len());
    let mut cursor = 0;
    for found in MARKER_RE.find_iter(text) {
        push_glyphs(text, cursor, found.start(), &mut out);
        out.push(Segment {
            start: found.start(),
            end: found.end(),
            width: 0,
            is_marker: true,
        });
        cursor = found.end();
    }
    push_glyphs(text, cursor, text.len(), &mut out);
    out
}

fn push_glyphs(text: &str, from: usize, to: usize, out: &mut Vec<Segment>) {
    for (offset, ch) in text[from..to].char_indices() {
        let start = from + offset;
        out.push(Segment {
            start,
            end: start + ch.len_utf8(),
            width: char_width(ch),
            is_marker: false,
        });
    }
}

// Control characters take no columns.
pub fn char_width(ch: char) -> usize {
    UnicodeWidthChar::width(ch).unwrap_or(0)
}

pub fn strip_markers(text: &str) -> Cow<'_, str> {
    MARKER_RE.replace_all(text, "")
}

pub fn measure_width(text: &str) -> usize {
    if !text.contains('\x1b') {
        return text.chars().map(char_width).sum();
    }
    segments(text).iter().map(|segment| segment.width).sum()
}

/// Cut `text` to `max_width` columns, ending in [`ELLIPSIS`]. Escape
/// sequences are never split, and a [`STYLE_RESET`] follows the cut when any
/// marker was kept. May come out one column short next to a wide glyph.
pub fn truncate_to(text: &str, max_width: usize) -> String {
    if measure_width(text) <= max_width {
        return text.to_string();
    }
    if max_width == 0 {
        return String::new();
    }

    let budget = max_width - 1;
    let mut out = String::with_capacity(text.len().min(max_width * 4) + 8);
    let mut used = 0;
    let mut styled = false;
    for segment in segments(text) {
        if segment.is_marker {
            out.push_str(&text[segment.start..segment.end]);
            styled = true;
            continue;
        }
        if used + segment.width > budget {
            break;
        }
        used += segment.width;
        out.push_str(&text[segment.start..segment.end]);
    }
    out.push(ELLIPSIS);
    if styled {
        out.push_str(STYLE_RESET);
    }
    out
}

/// Pad or cut `text` so that `measure_width` of the result is exactly `target`.
pub fn pad_to(text: &str, target: usize) -> String {
    let width = measure_width(text);
    if width <= target {
        let mut out = String::with_capacity(text.len() + target - width);
        out.push_str(text);
        out.extend(std::iter::repeat(' ').take(target - width));
        return out;
    }

    let mut out = truncate_to(text, target);
    let short = target.saturating_sub(measure_width(&out));
    out.extend(std::iter::repeat(' ').take(short));
    out
}

pub fn center(text: &str, target: usize) -> String {
    let fitted = truncate_to(text, target);
    let slack = target.saturating_sub(measure_width(&fitted));
    let left = slack / 2;
    let mut out = " ".repeat(left);
    out.push_str(&fitted);
    out.extend(std::iter::repeat(' ').take(slack - left));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: &str = "\x1b[38;2;243;139;168m";

    #[test]
    fn markers_contribute_no_width() {
        let styled = format!("{RED}hello{STYLE_RESET}");
        assert_eq!(measure_width(&styled), 5);
        assert_eq!(strip_markers(&styled), "hello");
    }

    #[test]
    fn osc_hyperlinks_are_markers() {
        let link = "\x1b]8;;https://example.com\x1b\\site\x1b]8;;\x1b\\";
        assert_eq!(measure_width(link), 4);
    }

    #[test]
    fn wide_glyphs_take_two_columns() {
        assert_eq!(measure_width("🦀"), 2);
        assert_eq!(measure_width("日本"), 4);
        assert_eq!(measure_width("a🦀b"), 4);
    }

    #[test]
    fn pad_extends_to_target() {
        let padded = pad_to("abc", 6);
        assert_eq!(padded, "abc   ");
        assert_eq!(measure_width(&padded), 6);
    }

    #[test]
    fn pad_keeps_styled_text_aligned() {
        let styled = format!("{RED}abc{STYLE_RESET}");
        let padded = pad_to(&styled, 10);
        assert_eq!(measure_width(&padded), 10);
        assert!(padded.starts_with(RED));
    }

    #[test]
    fn pad_truncates_with_ellipsis() {
        let padded = pad_to("abcdefghij", 5);
        assert_eq!(padded, "abcd…");
        assert_eq!(measure_width(&padded), 5);
    }

    #[test]
    fn truncation_never_splits_markers() {
        let styled = format!("{RED}abcdefghij{STYLE_RESET}");
        let cut = pad_to(&styled, 4);
        assert_eq!(measure_width(&cut), 4);
        assert!(cut.starts_with(RED));
        assert!(cut.ends_with(STYLE_RESET));
        assert_eq!(strip_markers(&cut), "abc…");
    }

    #[test]
    fn wide_glyph_cut_is_back_filled() {
        assert_eq!(pad_to("ab🦀🦀🦀", 5), "ab🦀…");
        let padded = pad_to("ab🦀🦀🦀", 4);
        assert_eq!(padded, "ab… ");
        assert_eq!(measure_width(&padded), 4);
    }

    #[test]
    fn zero_target_yields_empty() {
        assert_eq!(pad_to("abc", 0), "");
        assert_eq!(pad_to("", 0), "");
    }

    #[test]
    fn pad_property_holds_for_assorted_inputs() {
        let samples = [
            "",
            "plain",
            "🦀 crab 🦀 crab 🦀 crab 🦀 crab 🦀 crab",
            "\x1b[1mbold\x1b[0m and long text that keeps going past the edge",
            "日本語のテキストはとても長いのでここで切られます",
        ];
        for sample in samples {
            for width in 20..48 {
                assert_eq!(measure_width(&pad_to(sample, width)), width, "{sample:?} @ {width}");
            }
        }
    }

    #[test]
    fn center_splits_slack() {
        assert_eq!(center("ab", 6), "  ab  ");
        assert_eq!(center("ab", 5), " ab  ");
    }
}
