//! Nested reply threads and their flattening into display lines.
//!
//! A thread arrives as a forest of [`ThreadNode`]s, already sorted by the
//! content service. [`Flattener`] walks it depth-first and produces a flat
//! sequence of [`FlattenedLine`]s that a [`crate::viewport::Viewport`] can
//! scroll over. The walk is pure: the output depends only on the forest,
//! the options, the theme and the vote ledger, and any change to those means
//! flattening again from scratch.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::measure::pad_to;
use crate::theme::{StyleTag, ThemeContext};
use crate::votes::VoteLedger;
use crate::wrap::wrap;

/// Columns of indentation added per reply level.
pub const INDENT_PER_DEPTH: usize = 2;
/// Gap between a node's header column and its body text.
pub const BODY_MARGIN: usize = 2;
/// Narrowest content column a line is ever laid out at.
pub const MIN_CONTENT_WIDTH: usize = 8;

const DELETED_AUTHOR: &str = "[deleted]";
const SEPARATOR_GLYPH: &str = "─";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadNode {
    pub id: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub score: i64,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub children: Vec<ThreadNode>,
}

impl ThreadNode {
    pub fn has_body(&self) -> bool {
        !self.body.trim().is_empty()
    }

    pub fn author_label(&self) -> &str {
        match self.author.as_deref().map(str::trim) {
            Some(author) if !author.is_empty() => author,
            _ => DELETED_AUTHOR,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Header,
    BodyLine,
    Separator,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlattenedLine {
    /// Content without leading indentation; may contain style markers.
    pub styled_text: String,
    pub origin_node_id: String,
    pub kind: LineKind,
    pub depth: usize,
    /// Columns of blank space to the left of `styled_text`.
    pub indent: usize,
}

impl FlattenedLine {
    /// The line as it appears on screen, indentation included.
    pub fn display(&self) -> String {
        let mut out = " ".repeat(self.indent);
        out.push_str(&self.styled_text);
        out
    }
}

#[derive(Debug, Clone)]
pub struct FlattenOptions {
    pub max_depth: usize,
    pub available_width: usize,
    pub expand_replies: bool,
    /// Nodes whose body and replies are folded away behind their header.
    pub collapsed: HashSet<String>,
    /// Reference time for relative ages in headers.
    pub now: DateTime<Utc>,
}

impl FlattenOptions {
    pub fn new(max_depth: usize, available_width: usize, expand_replies: bool) -> Self {
        Self {
            max_depth,
            available_width,
            expand_replies,
            collapsed: HashSet::new(),
            now: Utc::now(),
        }
    }

    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    /// Fold or unfold `id`. Returns true if the node is now collapsed.
    pub fn toggle_collapsed(&mut self, id: &str) -> bool {
        if self.collapsed.remove(id) {
            false
        } else {
            self.collapsed.insert(id.to_string());
            true
        }
    }

    fn content_width(&self, depth: usize) -> usize {
        self.available_width
            .saturating_sub(depth * INDENT_PER_DEPTH)
            .max(MIN_CONTENT_WIDTH)
    }

    fn body_width(&self, depth: usize) -> usize {
        self.available_width
            .saturating_sub(depth * INDENT_PER_DEPTH + BODY_MARGIN)
            .max(MIN_CONTENT_WIDTH)
    }
}

/// Flatten with no local votes.
pub fn flatten(
    forest: &[ThreadNode],
    options: &FlattenOptions,
    theme: &ThemeContext,
) -> Vec<FlattenedLine> {
    let votes = VoteLedger::new();
    Flattener::new(options, theme, &votes).flatten(forest)
}

pub struct Flattener<'a> {
    options: &'a FlattenOptions,
    theme: &'a ThemeContext,
    votes: &'a VoteLedger,
}

impl<'a> Flattener<'a> {
    pub fn new(
        options: &'a FlattenOptions,
        theme: &'a ThemeContext,
        votes: &'a VoteLedger,
    ) -> Self {
        Self {
            options,
            theme,
            votes,
        }
    }

    pub fn flatten(&self, forest: &[ThreadNode]) -> Vec<FlattenedLine> {
        let mut lines = Vec::new();
        let mut visited = 0;
        for node in forest {
            self.visit(node, 0, &mut lines, &mut visited);
        }
        debug!(
            roots = forest.len(),
            visited,
            lines = lines.len(),
            width = self.options.available_width,
            max_depth = self.options.max_depth,
            "flattened thread"
        );
        lines
    }

    fn visit(
        &self,
        node: &ThreadNode,
        depth: usize,
        lines: &mut Vec<FlattenedLine>,
        visited: &mut usize,
    ) {
        if depth > self.options.max_depth {
            return;
        }
        *visited += 1;

        let collapsed = self.options.collapsed.contains(&node.id);
        if node.has_body() {
            let hidden = if collapsed {
                self.hidden_replies(node, depth)
            } else {
                0
            };
            self.emit_node(node, depth, collapsed, hidden, lines);
        }

        if collapsed || !self.options.expand_replies {
            return;
        }
        for child in &node.children {
            self.visit(child, depth + 1, lines, visited);
        }
    }

    fn emit_node(
        &self,
        node: &ThreadNode,
        depth: usize,
        collapsed: bool,
        hidden: usize,
        lines: &mut Vec<FlattenedLine>,
    ) {
        let indent = depth * INDENT_PER_DEPTH;
        let content_width = self.options.content_width(depth);
        let line = |styled_text: String, kind: LineKind, indent: usize| FlattenedLine {
            styled_text,
            origin_node_id: node.id.clone(),
            kind,
            depth,
            indent,
        };

        let header = self.header_text(node, collapsed, hidden);
        lines.push(line(pad_to(&header, content_width), LineKind::Header, indent));

        if !collapsed {
            for body_line in wrap(&node.body, self.options.body_width(depth)) {
                let styled = self.theme.paint(StyleTag::Body, &body_line);
                lines.push(line(styled, LineKind::BodyLine, indent + BODY_MARGIN));
            }
        }

        let rule = SEPARATOR_GLYPH.repeat(content_width);
        lines.push(line(
            self.theme.paint_depth(depth, &rule),
            LineKind::Separator,
            indent,
        ));
    }

    fn header_text(&self, node: &ThreadNode, collapsed: bool, hidden: usize) -> String {
        let score = self.votes.adjusted_score(&node.id, node.score);
        let points = if score.abs() == 1 { "point" } else { "points" };
        let mut header = format!(
            "{} {} · {} · {}",
            self.votes.marker(&node.id),
            self.theme.paint(StyleTag::Author, node.author_label()),
            self.theme.paint(StyleTag::Score, &format!("{score} {points}")),
            self.theme
                .paint(StyleTag::Age, &relative_age(node.created_at, self.options.now)),
        );
        if collapsed && hidden > 0 {
            let suffix = if hidden == 1 { "reply" } else { "replies" };
            header.push_str(
                &self
                    .theme
                    .paint(StyleTag::Muted, &format!(" · {hidden} hidden {suffix}")),
            );
        }
        header
    }

    /// Descendants of `node` that would produce lines if it were expanded.
    fn hidden_replies(&self, node: &ThreadNode, depth: usize) -> usize {
        if !self.options.expand_replies || depth >= self.options.max_depth {
            return 0;
        }
        node.children
            .iter()
            .map(|child| usize::from(child.has_body()) + self.hidden_replies(child, depth + 1))
            .sum()
    }
}

/// Compact age like `5m ago`. Timestamps in the future read as `just now`.
pub fn relative_age(created_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - created_at).num_seconds();
    if seconds < 60 {
        return "just now".to_string();
    }
    let minutes = seconds / 60;
    let hours = minutes / 60;
    let days = hours / 24;
    if minutes < 60 {
        format!("{minutes}m ago")
    } else if hours < 24 {
        format!("{hours}h ago")
    } else if days < 30 {
        format!("{days}d ago")
    } else if days < 365 {
        format!("{}mo ago", days / 30)
    } else {
        format!("{}y ago", days / 365)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measure::{measure_width, strip_markers};
    use crate::votes::Vote;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn node(
        id: &str,
        author: &str,
        score: i64,
        body: &str,
        children: Vec<ThreadNode>,
    ) -> ThreadNode {
        ThreadNode {
            id: id.to_string(),
            author: Some(author.to_string()),
            score,
            created_at: now() - Duration::hours(3),
            body: body.to_string(),
            children,
        }
    }

    fn options(max_depth: usize, width: usize) -> FlattenOptions {
        FlattenOptions::new(max_depth, width, true).at(now())
    }

    fn sample_forest() -> Vec<ThreadNode> {
        vec![node(
            "a",
            "alice",
            10,
            "hello world",
            vec![node("b", "bob", 2, "hi", vec![])],
        )]
    }

    fn kinds(lines: &[FlattenedLine]) -> Vec<(LineKind, &str, usize)> {
        lines
            .iter()
            .map(|line| (line.kind, line.origin_node_id.as_str(), line.depth))
            .collect()
    }

    #[test]
    fn flattens_parent_and_reply() {
        let lines = flatten(&sample_forest(), &options(5, 40), &ThemeContext::plain());
        assert_eq!(
            kinds(&lines),
            vec![
                (LineKind::Header, "a", 0),
                (LineKind::BodyLine, "a", 0),
                (LineKind::Separator, "a", 0),
                (LineKind::Header, "b", 1),
                (LineKind::BodyLine, "b", 1),
                (LineKind::Separator, "b", 1),
            ]
        );
        assert_eq!(lines[0].styled_text.trim_end(), "· alice · 10 points · 3h ago");
        assert_eq!(lines[1].styled_text, "hello world");
        assert_eq!(lines[4].styled_text, "hi");
        assert_eq!(lines[3].indent, 2);
        assert_eq!(lines[4].indent, 4);
    }

    #[test]
    fn lines_fit_available_width() {
        let long = "word ".repeat(60);
        let forest = vec![node("a", "alice", 1, &long, vec![node("b", "bob", 1, &long, vec![])])];
        let theme = ThemeContext::default();
        for line in flatten(&forest, &options(5, 40), &theme) {
            assert!(measure_width(&line.display()) <= 40, "{:?}", line);
            if line.kind == LineKind::BodyLine {
                assert!(
                    measure_width(&line.styled_text)
                        <= 40 - line.depth * INDENT_PER_DEPTH - BODY_MARGIN
                );
            }
        }
    }

    #[test]
    fn headers_and_separators_fill_content_width() {
        let lines = flatten(&sample_forest(), &options(5, 40), &ThemeContext::default());
        assert_eq!(measure_width(&lines[0].styled_text), 40);
        assert_eq!(measure_width(&lines[2].styled_text), 40);
        assert_eq!(measure_width(&lines[3].display()), 40);
        assert_eq!(measure_width(&lines[5].display()), 40);
    }

    #[test]
    fn depth_cutoff_drops_whole_subtree() {
        let forest = vec![node(
            "a",
            "alice",
            1,
            "root",
            vec![node(
                "b",
                "bob",
                1,
                "child",
                vec![node("c", "carol", 1, "grandchild", vec![])],
            )],
        )];
        let lines = flatten(&forest, &options(1, 40), &ThemeContext::plain());
        assert!(lines.iter().all(|line| line.depth <= 1));
        assert!(lines.iter().all(|line| line.origin_node_id != "c"));

        let top_only = flatten(&forest, &options(0, 40), &ThemeContext::plain());
        assert!(top_only.iter().all(|line| line.origin_node_id == "a"));
        assert_eq!(top_only.len(), 3);
    }

    #[test]
    fn collapsed_replies_are_not_visited() {
        let mut opts = options(5, 40);
        opts.expand_replies = false;
        let lines = flatten(&sample_forest(), &opts, &ThemeContext::plain());
        assert_eq!(lines.len(), 3);
        assert!(lines.iter().all(|line| line.depth == 0));
    }

    #[test]
    fn empty_body_still_visits_children() {
        let forest = vec![node(
            "a",
            "alice",
            1,
            "   ",
            vec![node("b", "bob", 1, "reply", vec![])],
        )];
        let lines = flatten(&forest, &options(5, 40), &ThemeContext::plain());
        assert_eq!(lines.len(), 3);
        assert!(lines.iter().all(|line| line.origin_node_id == "b" && line.depth == 1));
    }

    #[test]
    fn missing_author_renders_placeholder() {
        let mut forest = sample_forest();
        forest[0].author = None;
        forest[0].children[0].author = Some("  ".to_string());
        let lines = flatten(&forest, &options(5, 60), &ThemeContext::plain());
        assert!(lines[0].styled_text.contains("[deleted]"));
        assert!(lines[3].styled_text.contains("[deleted]"));
    }

    #[test]
    fn collapsed_node_hides_body_and_replies() {
        let mut opts = options(5, 60);
        opts.toggle_collapsed("a");
        let lines = flatten(&sample_forest(), &opts, &ThemeContext::plain());
        assert_eq!(
            kinds(&lines),
            vec![(LineKind::Header, "a", 0), (LineKind::Separator, "a", 0)]
        );
        assert!(lines[0].styled_text.contains("1 hidden reply"));
        assert!(!opts.toggle_collapsed("a"));
    }

    #[test]
    fn votes_adjust_header() {
        let mut votes = VoteLedger::new();
        votes.toggle("a", Vote::Up);
        let opts = options(5, 60);
        let theme = ThemeContext::plain();
        let lines = Flattener::new(&opts, &theme, &votes).flatten(&sample_forest());
        assert!(lines[0].styled_text.starts_with("▲ alice · 11 points"));
    }

    #[test]
    fn styled_header_strips_to_plain_header() {
        let plain = flatten(&sample_forest(), &options(5, 40), &ThemeContext::plain());
        let styled = flatten(&sample_forest(), &options(5, 40), &ThemeContext::default());
        for (plain, styled) in plain.iter().zip(&styled) {
            assert_eq!(strip_markers(&styled.styled_text), plain.styled_text);
        }
    }

    #[test]
    fn tiny_width_clamps_instead_of_failing() {
        let lines = flatten(&sample_forest(), &options(5, 0), &ThemeContext::plain());
        // "hello world" wraps onto two lines at the minimum body width.
        assert_eq!(lines.len(), 7);
        assert_eq!(measure_width(&lines[0].styled_text), MIN_CONTENT_WIDTH);
    }

    #[test]
    fn empty_forest_flattens_to_nothing() {
        assert!(flatten(&[], &options(5, 40), &ThemeContext::plain()).is_empty());
    }

    #[test]
    fn relative_age_buckets() {
        let now = now();
        assert_eq!(relative_age(now + Duration::minutes(5), now), "just now");
        assert_eq!(relative_age(now - Duration::seconds(30), now), "just now");
        assert_eq!(relative_age(now - Duration::minutes(7), now), "7m ago");
        assert_eq!(relative_age(now - Duration::hours(5), now), "5h ago");
        assert_eq!(relative_age(now - Duration::days(3), now), "3d ago");
        assert_eq!(relative_age(now - Duration::days(65), now), "2mo ago");
        assert_eq!(relative_age(now - Duration::days(800), now), "2y ago");
    }

    #[test]
    fn deserializes_with_defaults() {
        let json = r#"[{"id":"x","created_at":"2024-06-01T09:00:00Z","children":[{"id":"y","author":"bob","score":3,"created_at":"2024-06-01T10:00:00Z","body":"ok"}]}]"#;
        let forest: Vec<ThreadNode> = serde_json::from_str(json).unwrap();
        assert_eq!(forest[0].author_label(), "[deleted]");
        assert!(!forest[0].has_body());
        assert_eq!(forest[0].children[0].score, 3);
    }
}
