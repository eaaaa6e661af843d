//! Bordered text panels.
//!
//! Panels are produced as plain multi-line strings; the host shell decides
//! where on screen they go. Every content row is padded with
//! [`pad_to`](crate::measure::pad_to), so borders line up no matter what style
//! markers or wide glyphs the content carries.

use crate::measure::{center, measure_width, pad_to, truncate_to};
use crate::theme::{StyleTag, ThemeContext};

/// Below this many columns panels are drawn without borders.
pub const MIN_PANEL_WIDTH: usize = 20;
/// Columns taken by the left and right border plus their inner padding.
pub const PANEL_MARGIN: usize = 4;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PanelStyle {
    pub rounded: bool,
}

struct BorderGlyphs {
    top_left: &'static str,
    top_right: &'static str,
    bottom_left: &'static str,
    bottom_right: &'static str,
    horizontal: &'static str,
    vertical: &'static str,
}

impl PanelStyle {
    fn glyphs(self) -> BorderGlyphs {
        let (top_left, top_right, bottom_left, bottom_right) = if self.rounded {
            ("╭", "╮", "╰", "╯")
        } else {
            ("┌", "┐", "└", "┘")
        };
        BorderGlyphs {
            top_left,
            top_right,
            bottom_left,
            bottom_right,
            horizontal: "─",
            vertical: "│",
        }
    }
}

/// One titled block of a multi-section panel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Section {
    pub title: String,
    pub lines: Vec<String>,
}

impl Section {
    pub fn new(title: impl Into<String>, lines: Vec<String>) -> Self {
        Self {
            title: title.into(),
            lines,
        }
    }
}

/// Columns available to content inside a panel of `width`.
pub fn inner_width(width: usize) -> usize {
    if width < MIN_PANEL_WIDTH {
        width
    } else {
        width - PANEL_MARGIN
    }
}

/// Draw `lines` inside a border `width` columns wide with `title` centered
/// in the top edge. Narrower than [`MIN_PANEL_WIDTH`], the title and lines
/// come back unbordered instead.
pub fn render_panel<S: AsRef<str>>(
    title: &str,
    lines: &[S],
    width: usize,
    theme: &ThemeContext,
    style: PanelStyle,
) -> String {
    render_rows(title, lines, width, theme, style).join("\n")
}

/// Stack several sections, all sharing one `width`.
pub fn render_sections(
    sections: &[Section],
    width: usize,
    theme: &ThemeContext,
    style: PanelStyle,
) -> String {
    sections
        .iter()
        .map(|section| render_panel(&section.title, &section.lines, width, theme, style))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_rows<S: AsRef<str>>(
    title: &str,
    lines: &[S],
    width: usize,
    theme: &ThemeContext,
    style: PanelStyle,
) -> Vec<String> {
    if width < MIN_PANEL_WIDTH {
        return render_plain(title, lines, width, theme);
    }

    let glyphs = style.glyphs();
    let inner = width - PANEL_MARGIN;
    let border = |text: &str| theme.paint(StyleTag::Border, text);

    let mut rows = Vec::with_capacity(lines.len() + 2);
    rows.push(top_edge(title, width, &glyphs, theme));
    for line in lines {
        rows.push(format!(
            "{left} {content} {right}",
            left = border(glyphs.vertical),
            content = pad_to(line.as_ref(), inner),
            right = border(glyphs.vertical),
        ));
    }
    rows.push(border(&format!(
        "{}{}{}",
        glyphs.bottom_left,
        glyphs.horizontal.repeat(width - 2),
        glyphs.bottom_right
    )));
    rows
}

fn top_edge(title: &str, width: usize, glyphs: &BorderGlyphs, theme: &ThemeContext) -> String {
    let span = width - 2;
    let title = title.trim();
    if title.is_empty() {
        return theme.paint(
            StyleTag::Border,
            &format!(
                "{}{}{}",
                glyphs.top_left,
                glyphs.horizontal.repeat(span),
                glyphs.top_right
            ),
        );
    }

    // One border glyph stays visible on each side of the label.
    let label = truncate_to(&format!(" {title} "), span - 2);
    let slack = span - measure_width(&label);
    let left = slack / 2;
    let right = slack - left;
    format!(
        "{}{}{}",
        theme.paint(
            StyleTag::Border,
            &format!("{}{}", glyphs.top_left, glyphs.horizontal.repeat(left))
        ),
        theme.paint(StyleTag::Title, &label),
        theme.paint(
            StyleTag::Border,
            &format!("{}{}", glyphs.horizontal.repeat(right), glyphs.top_right)
        ),
    )
}

fn render_plain<S: AsRef<str>>(
    title: &str,
    lines: &[S],
    width: usize,
    theme: &ThemeContext,
) -> Vec<String> {
    let fit = |text: &str| {
        if width == 0 {
            text.to_string()
        } else {
            pad_to(text, width)
        }
    };
    let mut rows = Vec::with_capacity(lines.len() + 1);
    if !title.trim().is_empty() {
        let heading = if width == 0 {
            title.trim().to_string()
        } else {
            center(title.trim(), width)
        };
        rows.push(theme.paint(StyleTag::Title, &heading));
    }
    rows.extend(lines.iter().map(|line| fit(line.as_ref())));
    rows
}
