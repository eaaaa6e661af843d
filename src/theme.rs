use std::collections::HashMap;

use crossterm::style::{Attribute, Color, SetAttribute, SetForegroundColor};
use crossterm::Command;

use crate::measure::STYLE_RESET;

pub const DEFAULT_THEME: &str = "default";
pub const PLAIN_THEME: &str = "plain";

const COLOR_TEXT_PRIMARY: Color = Color::Rgb {
    r: 205,
    g: 214,
    b: 244,
};
const COLOR_TEXT_SECONDARY: Color = Color::Rgb {
    r: 166,
    g: 173,
    b: 200,
};
const COLOR_ACCENT: Color = Color::Rgb {
    r: 137,
    g: 180,
    b: 250,
};
const COLOR_SUCCESS: Color = Color::Rgb {
    r: 166,
    g: 227,
    b: 161,
};
const COLOR_BORDER_IDLE: Color = Color::Rgb {
    r: 88,
    g: 91,
    b: 112,
};
const COMMENT_DEPTH_COLORS: [Color; 6] = [
    Color::Rgb {
        r: 250,
        g: 179,
        b: 135,
    },
    Color::Rgb {
        r: 166,
        g: 227,
        b: 161,
    },
    Color::Rgb {
        r: 203,
        g: 166,
        b: 247,
    },
    Color::Rgb {
        r: 245,
        g: 194,
        b: 231,
    },
    Color::Rgb {
        r: 137,
        g: 220,
        b: 235,
    },
    Color::Rgb {
        r: 249,
        g: 226,
        b: 175,
    },
];

#[derive(Debug, thiserror::Error)]
pub enum ThemeError {
    #[error("unknown theme {0:?}")]
    UnknownTheme(String),
}

/// Semantic roles text can be styled with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StyleTag {
    Title,
    Author,
    Score,
    Age,
    Body,
    Separator,
    Highlight,
    Border,
    Muted,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Marker {
    open: String,
    close: String,
}

impl Marker {
    fn color(color: Color) -> Self {
        Self {
            open: ansi(SetForegroundColor(color)),
            close: ansi(SetAttribute(Attribute::Reset)),
        }
    }

    fn bold(color: Color) -> Self {
        Self {
            open: format!(
                "{}{}",
                ansi(SetAttribute(Attribute::Bold)),
                ansi(SetForegroundColor(color))
            ),
            close: ansi(SetAttribute(Attribute::Reset)),
        }
    }

    fn reverse() -> Self {
        Self {
            open: ansi(SetAttribute(Attribute::Reverse)),
            close: ansi(SetAttribute(Attribute::Reset)),
        }
    }
}

fn ansi(command: impl Command) -> String {
    let mut out = String::new();
    // Formatting into a String cannot fail.
    let _ = command.write_ansi(&mut out);
    out
}

/// Maps style tags to the escape markers wrapped around text.
///
/// Passed by reference into flattening and panel rendering; nothing in the
/// crate keeps a process-wide theme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeContext {
    name: String,
    markers: HashMap<StyleTag, Marker>,
    depth_markers: Vec<Marker>,
}

impl Default for ThemeContext {
    fn default() -> Self {
        Self::catppuccin()
    }
}

impl ThemeContext {
    pub fn named(name: &str) -> Result<Self, ThemeError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "" | DEFAULT_THEME => Ok(Self::catppuccin()),
            PLAIN_THEME | "none" | "mono" => Ok(Self::plain()),
            _ => Err(ThemeError::UnknownTheme(name.to_string())),
        }
    }

    /// No markers at all; painted text comes back unchanged.
    pub fn plain() -> Self {
        Self {
            name: PLAIN_THEME.to_string(),
            markers: HashMap::new(),
            depth_markers: Vec::new(),
        }
    }

    fn catppuccin() -> Self {
        let markers = HashMap::from([
            (StyleTag::Title, Marker::bold(COLOR_ACCENT)),
            (StyleTag::Author, Marker::bold(COLOR_TEXT_PRIMARY)),
            (StyleTag::Score, Marker::color(COLOR_SUCCESS)),
            (StyleTag::Age, Marker::color(COLOR_TEXT_SECONDARY)),
            (StyleTag::Body, Marker::color(COLOR_TEXT_PRIMARY)),
            (StyleTag::Separator, Marker::color(COLOR_BORDER_IDLE)),
            (StyleTag::Highlight, Marker::reverse()),
            (StyleTag::Border, Marker::color(COLOR_ACCENT)),
            (StyleTag::Muted, Marker::color(COLOR_TEXT_SECONDARY)),
        ]);
        Self {
            name: DEFAULT_THEME.to_string(),
            markers,
            depth_markers: COMMENT_DEPTH_COLORS.iter().copied().map(Marker::color).collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn paint(&self, tag: StyleTag, text: &str) -> String {
        match self.markers.get(&tag) {
            Some(marker) if !text.is_empty() => wrap_marker(marker, text),
            _ => text.to_string(),
        }
    }

    /// Paint with the color assigned to a reply depth, cycling through the
    /// palette. Falls back to [`StyleTag::Separator`].
    pub fn paint_depth(&self, depth: usize, text: &str) -> String {
        if self.depth_markers.is_empty() || text.is_empty() {
            return self.paint(StyleTag::Separator, text);
        }
        wrap_marker(&self.depth_markers[depth % self.depth_markers.len()], text)
    }

    /// Paint a row that may already contain styled spans. The style is
    /// re-opened after every reset inside `text`, so it covers the whole row.
    pub fn paint_row(&self, tag: StyleTag, text: &str) -> String {
        match self.markers.get(&tag) {
            Some(marker) if !text.is_empty() => {
                let reopen = format!("{STYLE_RESET}{}", marker.open);
                wrap_marker(marker, &text.replace(STYLE_RESET, &reopen))
            }
            _ => text.to_string(),
        }
    }
}

fn wrap_marker(marker: &Marker, text: &str) -> String {
    let mut out = String::with_capacity(marker.open.len() + text.len() + marker.close.len());
    out.push_str(&marker.open);
    out.push_str(text);
    out.push_str(&marker.close);
    out
}
