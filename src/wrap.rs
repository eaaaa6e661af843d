//! Word wrapping that respects style markers and wide glyphs.
//!
//! Line breaking is delegated to textwrap's first-fit algorithm, but the
//! fragments fed to it are measured with [`crate::measure`] so a line never
//! exceeds the requested width once markers are stripped.

use textwrap::core::Fragment;
use textwrap::wrap_algorithms::wrap_first_fit;
use tracing::trace;

use crate::measure::{measure_width, segments};

/// Narrowest width `wrap` will lay text out at.
pub const MIN_WRAP_WIDTH: usize = 1;

#[derive(Debug)]
struct Word<'a> {
    text: &'a str,
    width: usize,
}

impl Fragment for Word<'_> {
    fn width(&self) -> f64 {
        self.width as f64
    }

    fn whitespace_width(&self) -> f64 {
        1.0
    }

    fn penalty_width(&self) -> f64 {
        0.0
    }
}

/// Wrap `text` into lines no wider than `width` columns.
///
/// Each newline-separated paragraph is wrapped on its own. Blank paragraphs
/// produce no lines, so every returned line holds at least one word.
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(MIN_WRAP_WIDTH);
    let lines: Vec<String> = text
        .split('\n')
        .filter(|paragraph| !paragraph.trim().is_empty())
        .flat_map(|paragraph| wrap_paragraph(paragraph, width))
        .collect();
    trace!(width, lines = lines.len(), "wrapped text");
    lines
}

fn wrap_paragraph(paragraph: &str, width: usize) -> Vec<String> {
    let mut words = Vec::new();
    for token in paragraph.split_whitespace() {
        let token_width = measure_width(token);
        if token_width <= width {
            words.push(Word {
                text: token,
                width: token_width,
            });
        } else {
            words.extend(hard_break(token, width));
        }
    }

    wrap_first_fit(&words, &[width as f64])
        .into_iter()
        .map(|line| {
            line.iter()
                .map(|word| word.text)
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect()
}

/// Split a token wider than `width` into chunks that each fit.
///
/// Markers never open a chunk of their own. A lone glyph wider than
/// `width` still gets a chunk of its own.
fn hard_break(token: &str, width: usize) -> Vec<Word<'_>> {
    let mut chunks = Vec::new();
    let mut chunk_start = 0;
    let mut used = 0;

    for segment in segments(token) {
        if segment.is_marker {
            continue;
        }
        if used > 0 && used + segment.width > width {
            chunks.push(Word {
                text: &token[chunk_start..segment.start],
                width: used,
            });
            chunk_start = segment.start;
            used = 0;
        }
        used += segment.width;
    }
    chunks.push(Word {
        text: &token[chunk_start..],
        width: used,
    });
    chunks
}
