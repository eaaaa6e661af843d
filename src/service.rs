use std::cmp::Reverse;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::thread::ThreadNode;

/// Order in which the content service returns replies. The layout core
/// never sorts; it only forwards the mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    #[default]
    Best,
    Top,
    New,
    Controversial,
    Old,
    Qa,
}

impl SortMode {
    pub const ALL: [SortMode; 6] = [
        SortMode::Best,
        SortMode::Top,
        SortMode::New,
        SortMode::Controversial,
        SortMode::Old,
        SortMode::Qa,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortMode::Best => "best",
            SortMode::Top => "top",
            SortMode::New => "new",
            SortMode::Controversial => "controversial",
            SortMode::Old => "old",
            SortMode::Qa => "qa",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SortMode::Best => "Best",
            SortMode::Top => "Top",
            SortMode::New => "New",
            SortMode::Controversial => "Controversial",
            SortMode::Old => "Old",
            SortMode::Qa => "Q&A",
        }
    }

    pub fn from_key(key: &str) -> Self {
        match key.trim().to_ascii_lowercase().as_str() {
            "top" => SortMode::Top,
            "new" => SortMode::New,
            "controversial" => SortMode::Controversial,
            "old" => SortMode::Old,
            "qa" | "q&a" => SortMode::Qa,
            _ => SortMode::Best,
        }
    }

    pub fn next(&self) -> Self {
        let index = Self::ALL.iter().position(|mode| mode == self).unwrap_or(0);
        Self::ALL[(index + 1) % Self::ALL.len()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListKind {
    Posts,
    Communities,
    Accounts,
    Conversations,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListEntry {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub comment_count: usize,
}

#[derive(Debug, Clone, Default)]
pub struct ListParams {
    pub sort: SortMode,
    /// Return entries after this id, for paging.
    pub after: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("thread {0} not found")]
    ThreadNotFound(String),
    #[error("{0:?} listings are not available from this source")]
    UnsupportedList(ListKind),
}

pub trait ContentService: Send + Sync {
    fn fetch_thread(&self, target_id: &str, sort: SortMode) -> Result<Vec<ThreadNode>>;
    fn fetch_list(&self, kind: ListKind, params: &ListParams) -> Result<Vec<ListEntry>>;
}

/// A posts listing and the reply forest of each post, as stored on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadDocument {
    #[serde(default)]
    pub posts: Vec<DocumentPost>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentPost {
    #[serde(flatten)]
    pub entry: ListEntry,
    #[serde(default)]
    pub comments: Vec<ThreadNode>,
}

impl ThreadDocument {
    fn thread(&self, target_id: &str) -> Result<Vec<ThreadNode>> {
        self.posts
            .iter()
            .find(|post| post.entry.id == target_id)
            .map(|post| post.comments.clone())
            .ok_or_else(|| ServiceError::ThreadNotFound(target_id.to_string()).into())
    }

    fn page(&self, params: &ListParams) -> Vec<ListEntry> {
        let start = params
            .after
            .as_deref()
            .and_then(|after| self.posts.iter().position(|post| post.entry.id == after))
            .map(|index| index + 1)
            .unwrap_or(0);
        let limit = params.limit.unwrap_or(usize::MAX);
        self.posts
            .iter()
            .skip(start)
            .take(limit)
            .map(|post| post.entry.clone())
            .collect()
    }
}

/// Serves a [`ThreadDocument`] loaded from a JSON or YAML file.
pub struct FileContentService {
    path: PathBuf,
    document: ThreadDocument,
}

impl FileContentService {
    pub fn open(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("Failed to read thread file at {}", path.display()))?;
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let document: ThreadDocument = if is_json {
            serde_json::from_str(&data)
                .with_context(|| format!("Failed to parse thread file at {}", path.display()))?
        } else {
            serde_yaml::from_str(&data)
                .with_context(|| format!("Failed to parse thread file at {}", path.display()))?
        };
        debug!(path = %path.display(), posts = document.posts.len(), "loaded thread document");
        Ok(Self {
            path: path.to_path_buf(),
            document,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ContentService for FileContentService {
    fn fetch_thread(&self, target_id: &str, sort: SortMode) -> Result<Vec<ThreadNode>> {
        let mut forest = self.document.thread(target_id)?;
        sort_forest(&mut forest, sort);
        Ok(forest)
    }

    fn fetch_list(&self, kind: ListKind, params: &ListParams) -> Result<Vec<ListEntry>> {
        match kind {
            ListKind::Posts => Ok(self.document.page(params)),
            other => Err(ServiceError::UnsupportedList(other).into()),
        }
    }
}

/// Order siblings the way a remote service would for `sort`. `Qa` keeps the
/// stored order.
pub fn sort_forest(forest: &mut [ThreadNode], sort: SortMode) {
    match sort {
        SortMode::Best | SortMode::Top => forest.sort_by_key(|node| Reverse(node.score)),
        SortMode::New => forest.sort_by_key(|node| Reverse(node.created_at)),
        SortMode::Old => forest.sort_by_key(|node| node.created_at),
        SortMode::Controversial => forest.sort_by_key(|node| node.score.abs()),
        SortMode::Qa => {}
    }
    for node in forest.iter_mut() {
        sort_forest(&mut node.children, sort);
    }
}

#[derive(Default)]
pub struct MockContentService;

impl ContentService for MockContentService {
    fn fetch_thread(&self, target_id: &str, sort: SortMode) -> Result<Vec<ThreadNode>> {
        let mut forest = sample_document().thread(target_id)?;
        sort_forest(&mut forest, sort);
        Ok(forest)
    }

    fn fetch_list(&self, kind: ListKind, params: &ListParams) -> Result<Vec<ListEntry>> {
        match kind {
            ListKind::Posts => Ok(sample_document().page(params)),
            ListKind::Communities => Ok(vec![
                mock_entry("frontpage", "Frontpage", "Everything, all at once"),
                mock_entry("rust", "Rust", "Systems programming"),
            ]),
            other => Err(ServiceError::UnsupportedList(other).into()),
        }
    }
}

fn mock_entry(id: &str, title: &str, subtitle: &str) -> ListEntry {
    ListEntry {
        id: id.into(),
        title: title.into(),
        subtitle: subtitle.into(),
        score: 0,
        comment_count: 0,
    }
}

fn mock_node(
    id: &str,
    author: Option<&str>,
    score: i64,
    hours_ago: i64,
    body: &str,
    children: Vec<ThreadNode>,
) -> ThreadNode {
    let anchor = Utc
        .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or_else(Utc::now);
    ThreadNode {
        id: id.into(),
        author: author.map(str::to_string),
        score,
        created_at: anchor - Duration::hours(hours_ago),
        body: body.into(),
        children,
    }
}

/// Built-in sample content used when no thread file is given.
pub fn sample_document() -> ThreadDocument {
    let welcome = vec![
        mock_node(
            "w1",
            Some("alice"),
            42,
            5,
            "Welcome to threadview. Use j/k to scroll, Enter to open a thread and Esc to go back.",
            vec![
                mock_node(
                    "w2",
                    Some("bob"),
                    7,
                    4,
                    "Replies are indented one level per depth. Press c to fold the reply at the top of the screen.",
                    vec![mock_node(
                        "w3",
                        None,
                        -2,
                        3,
                        "Deleted authors show up as a placeholder.",
                        vec![],
                    )],
                ),
                mock_node(
                    "w4",
                    Some("carol"),
                    3,
                    2,
                    "",
                    vec![mock_node(
                        "w5",
                        Some("dave"),
                        1,
                        1,
                        "My parent had an empty body, so only I am shown.",
                        vec![],
                    )],
                ),
            ],
        ),
        mock_node(
            "w6",
            Some("erin"),
            12,
            6,
            "Wide glyphs like 🦀 and 日本語 are measured with a width table.",
            vec![],
        ),
    ];
    let shortcuts = vec![mock_node(
        "s1",
        Some("threadview"),
        1,
        1,
        "j/k: scroll\nPgUp/PgDn: page\ng/G: top/bottom\ns: cycle sort\ne: toggle replies\nu/d: vote\nq: quit",
        vec![],
    )];

    ThreadDocument {
        posts: vec![
            DocumentPost {
                entry: ListEntry {
                    id: "welcome".into(),
                    title: "Welcome to threadview".into(),
                    subtitle: "threadview".into(),
                    score: 128,
                    comment_count: 6,
                },
                comments: welcome,
            },
            DocumentPost {
                entry: ListEntry {
                    id: "shortcuts".into(),
                    title: "Keyboard shortcuts".into(),
                    subtitle: "threadview".into(),
                    score: 64,
                    comment_count: 1,
                },
                comments: shortcuts,
            },
        ],
    }
}
