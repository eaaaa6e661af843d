use std::io::{self, Stdout, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::style::Print;
use crossterm::terminal::{
    self, disable_raw_mode, enable_raw_mode, Clear, ClearType, EnterAlternateScreen,
    LeaveAlternateScreen,
};
use crossterm::{queue, ExecutableCommand};
use tracing::{debug, info, warn};

use crate::config::{self, Config, OverrideWarning, ThreadConfig};
use crate::list::{SelectableList, SelectionChange};
use crate::logging;
use crate::measure::pad_to;
use crate::panel::{self, render_panel, render_sections, PanelStyle, Section};
use crate::service::{
    ContentService, FileContentService, ListEntry, ListKind, ListParams, MockContentService,
    SortMode,
};
use crate::theme::ThemeContext;
use crate::thread::{flatten, FlattenOptions, FlattenedLine, Flattener, ThreadNode};
use crate::viewport::Viewport;
use crate::votes::{Vote, VoteLedger};

pub const HELP: &str = "threadview - Browse posts and nested reply threads from the terminal.

  --thread,  -t FILE   Load posts and threads from a JSON or YAML file
  --config,  -c FILE   Read configuration from FILE
  --dump               Print every thread as text panels and exit
  --write-config       Save the effective configuration and exit
  --width,   -w N      Panel width for --dump (default 80)
  --version, -V        Show version and exit
  --help,    -h        Show this help message";

const DEFAULT_DUMP_WIDTH: usize = 80;
const PAGE_SIZE: usize = 25;
/// Rows reserved outside panel content: top border, bottom border, status.
const CHROME_ROWS: usize = 3;
const HINTS_POSTS: &str = "j/k move · Enter open · s sort · r refresh · q quit";
const HINTS_THREAD: &str =
    "j/k scroll · PgUp/PgDn page · c fold · e replies · u/d vote · s sort · Esc back · q quit";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptions {
    pub thread_file: Option<PathBuf>,
    pub config_file: Option<PathBuf>,
    pub dump: bool,
    pub write_config: bool,
    pub width: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Version,
    Help,
    Run(RunOptions),
}

pub fn parse_args<I>(args: I) -> Result<Command>
where
    I: IntoIterator<Item = String>,
{
    let mut options = RunOptions::default();
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--version" | "-V" => return Ok(Command::Version),
            "--help" | "-h" => return Ok(Command::Help),
            "--dump" => options.dump = true,
            "--write-config" => options.write_config = true,
            "--thread" | "-t" => {
                options.thread_file = Some(PathBuf::from(next_value(&mut args, &arg)?));
            }
            "--config" | "-c" => {
                options.config_file = Some(PathBuf::from(next_value(&mut args, &arg)?));
            }
            "--width" | "-w" => {
                let raw = next_value(&mut args, &arg)?;
                let width = raw
                    .trim()
                    .parse::<usize>()
                    .with_context(|| format!("invalid width {raw:?}"))?;
                options.width = Some(width);
            }
            other => bail!("unknown argument {other:?} (see --help)"),
        }
    }
    Ok(Command::Run(options))
}

fn next_value(args: &mut impl Iterator<Item = String>, flag: &str) -> Result<String> {
    match args.next() {
        Some(value) => Ok(value),
        None => bail!("{flag} requires a value"),
    }
}

pub fn run(options: RunOptions) -> Result<()> {
    let loaded = config::load(config::LoadOptions {
        config_file: options.config_file.clone(),
        env_prefix: None,
    })
    .context("load config")?;
    let cfg = loaded.config;

    if options.write_config {
        report_override_warnings(&loaded.warnings, true);
        let path = config::save(options.config_file.clone(), &cfg)?;
        println!("Wrote config to {}", path.display());
        return Ok(());
    }

    let log_guard = match logging::init(&cfg.logging) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("warning: logging disabled: {err:#}");
            None
        }
    };
    report_override_warnings(&loaded.warnings, log_guard.is_none());

    let theme = ThemeContext::named(&cfg.ui.theme).unwrap_or_else(|err| {
        warn!(%err, "falling back to the default theme");
        ThemeContext::default()
    });

    let service: Arc<dyn ContentService> = match options.thread_file.as_ref() {
        Some(path) => Arc::new(FileContentService::open(path).context("open thread file")?),
        None => Arc::new(MockContentService),
    };
    info!(
        source = ?options.thread_file,
        theme = theme.name(),
        dump = options.dump,
        "starting threadview"
    );

    if options.dump {
        let width = options.width.unwrap_or(DEFAULT_DUMP_WIDTH);
        let text = dump(service.as_ref(), &cfg, &theme, width, Utc::now())?;
        println!("{text}");
        return Ok(());
    }

    let mut shell = Shell::new(service, cfg, theme)?;
    shell.run()
}

fn report_override_warnings(warnings: &[OverrideWarning], to_stderr: bool) {
    for warning in warnings {
        warn!(
            key = %warning.key,
            value = %warning.value,
            reason = %warning.reason,
            "ignoring invalid config override"
        );
        if to_stderr {
            eprintln!("warning: {warning}");
        }
    }
}

/// Rows the posts list shows: the configured count, capped by the screen.
fn list_window(body_rows: usize, configured: usize) -> usize {
    body_rows.min(configured).max(1)
}

fn thread_options(cfg: &ThreadConfig, width: usize, expand_replies: bool) -> FlattenOptions {
    FlattenOptions::new(cfg.max_comment_depth, width, expand_replies)
}

fn post_row(entry: &ListEntry) -> String {
    let mut row = entry.title.clone();
    if !entry.subtitle.trim().is_empty() {
        row.push_str(&format!(" · {}", entry.subtitle.trim()));
    }
    let replies = if entry.comment_count == 1 {
        "comment"
    } else {
        "comments"
    };
    row.push_str(&format!(
        " · {} points · {} {replies}",
        entry.score, entry.comment_count
    ));
    row
}

/// Render the posts listing followed by every thread, one panel each.
pub fn dump(
    service: &dyn ContentService,
    cfg: &Config,
    theme: &ThemeContext,
    width: usize,
    now: DateTime<Utc>,
) -> Result<String> {
    let sort = cfg.threads.default_sort;
    let style = PanelStyle {
        rounded: cfg.ui.rounded_borders,
    };
    let inner = panel::inner_width(width);
    let posts = service
        .fetch_list(
            ListKind::Posts,
            &ListParams {
                sort,
                ..ListParams::default()
            },
        )
        .context("fetch posts")?;

    let mut list = SelectableList::new(cfg.lists.visible_count);
    list.set_items(posts);
    let mut sections = vec![Section::new(
        format!("Posts · {}", sort.label()),
        list.render_rows(inner, theme, post_row),
    )];

    let options = thread_options(&cfg.threads, inner, cfg.threads.auto_expand_replies).at(now);
    for (_, post, _) in list.visible_items() {
        let forest = service
            .fetch_thread(&post.id, sort)
            .with_context(|| format!("fetch thread {}", post.id))?;
        let lines = flatten(&forest, &options, theme)
            .iter()
            .map(FlattenedLine::display)
            .collect();
        sections.push(Section::new(post.title.clone(), lines));
    }

    Ok(render_sections(&sections, width, theme, style))
}

struct ThreadView {
    post: ListEntry,
    forest: Vec<ThreadNode>,
    options: FlattenOptions,
    lines: Vec<FlattenedLine>,
    viewport: Viewport,
}

impl ThreadView {
    fn reflow(&mut self, theme: &ThemeContext, votes: &VoteLedger) {
        self.options.now = Utc::now();
        self.lines = Flattener::new(&self.options, theme, votes).flatten(&self.forest);
        self.viewport.set_total(self.lines.len());
    }

    fn focused_node(&self) -> Option<String> {
        self.lines
            .get(self.viewport.offset())
            .map(|line| line.origin_node_id.clone())
    }
}

enum Screen {
    Posts,
    Thread(ThreadView),
}

struct Shell {
    service: Arc<dyn ContentService>,
    cfg: Config,
    theme: ThemeContext,
    style: PanelStyle,
    posts: SelectableList<ListEntry>,
    posts_exhausted: bool,
    screen: Screen,
    sort: SortMode,
    expand_replies: bool,
    votes: VoteLedger,
    status: String,
    width: usize,
    body_rows: usize,
    needs_redraw: bool,
}

impl Shell {
    fn new(service: Arc<dyn ContentService>, cfg: Config, theme: ThemeContext) -> Result<Self> {
        let posts = SelectableList::new(cfg.lists.visible_count)
            .with_navigation(cfg.lists.navigation());
        let mut shell = Self {
            service,
            style: PanelStyle {
                rounded: cfg.ui.rounded_borders,
            },
            sort: cfg.threads.default_sort,
            expand_replies: cfg.threads.auto_expand_replies,
            cfg,
            theme,
            posts,
            posts_exhausted: false,
            screen: Screen::Posts,
            votes: VoteLedger::new(),
            status: HINTS_POSTS.to_string(),
            width: DEFAULT_DUMP_WIDTH,
            body_rows: 1,
            needs_redraw: true,
        };
        shell.reload_posts()?;
        Ok(shell)
    }

    fn run(&mut self) -> Result<()> {
        let mut stdout = io::stdout();
        enable_raw_mode()?;
        stdout.execute(EnterAlternateScreen)?;
        stdout.execute(Hide)?;

        let result = self.event_loop(&mut stdout);

        disable_raw_mode()?;
        stdout.execute(Show)?;
        stdout.execute(LeaveAlternateScreen)?;

        result
    }

    fn event_loop(&mut self, stdout: &mut Stdout) -> Result<()> {
        let (cols, rows) = terminal::size()?;
        self.apply_size(cols, rows);

        loop {
            if self.needs_redraw {
                self.draw(stdout)?;
                self.needs_redraw = false;
            }

            if !event::poll(self.cfg.ui.tick_rate)? {
                continue;
            }
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    match self.handle_key(key.code) {
                        Ok(true) => break,
                        Ok(false) => {}
                        Err(err) => {
                            warn!(error = %err, "key handling failed");
                            self.status = format!("Error: {err}");
                        }
                    }
                    self.needs_redraw = true;
                }
                Event::Resize(cols, rows) => {
                    self.apply_size(cols, rows);
                    self.needs_redraw = true;
                }
                _ => {}
            }
        }

        Ok(())
    }

    /// Resize the list window and viewport; a width change re-flattens the
    /// open thread.
    fn apply_size(&mut self, cols: u16, rows: u16) {
        self.width = usize::from(cols);
        self.body_rows = usize::from(rows).saturating_sub(CHROME_ROWS).max(1);
        self.posts
            .set_visible_count(list_window(self.body_rows, self.cfg.lists.visible_count));

        let inner = panel::inner_width(self.width);
        if let Screen::Thread(view) = &mut self.screen {
            view.viewport.set_height(self.body_rows);
            if view.options.available_width != inner {
                view.options.available_width = inner;
                view.reflow(&self.theme, &self.votes);
            }
        }
        debug!(cols, rows, body_rows = self.body_rows, "applied terminal size");
    }

    fn reload_posts(&mut self) -> Result<()> {
        let params = ListParams {
            sort: self.sort,
            after: None,
            limit: Some(PAGE_SIZE),
        };
        let posts = self
            .service
            .fetch_list(ListKind::Posts, &params)
            .context("fetch posts")?;
        self.posts_exhausted = posts.len() < PAGE_SIZE;
        if let Some(change) = self.posts.set_items(posts) {
            self.on_selection(change);
        }
        Ok(())
    }

    fn load_more_posts(&mut self) -> Result<()> {
        if self.posts_exhausted || !self.posts.near_bottom(self.cfg.lists.load_more_threshold) {
            return Ok(());
        }
        let params = ListParams {
            sort: self.sort,
            after: self.posts.items().last().map(|entry| entry.id.clone()),
            limit: Some(PAGE_SIZE),
        };
        let page = self
            .service
            .fetch_list(ListKind::Posts, &params)
            .context("fetch more posts")?;
        debug!(count = page.len(), "loaded more posts");
        self.posts_exhausted = page.len() < PAGE_SIZE;
        self.posts.append_items(page);
        Ok(())
    }

    fn on_selection(&mut self, change: SelectionChange) {
        self.status = match change.current {
            Some(index) => format!("Selected post #{}.", index + 1),
            None => "No posts.".to_string(),
        };
    }

    fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        if code == KeyCode::Char('q') {
            return Ok(true);
        }
        if matches!(self.screen, Screen::Posts) {
            self.handle_posts_key(code)?;
        } else {
            self.handle_thread_key(code)?;
        }
        Ok(false)
    }

    fn handle_posts_key(&mut self, code: KeyCode) -> Result<()> {
        let change = match code {
            KeyCode::Char('j') | KeyCode::Down => self.posts.move_down(),
            KeyCode::Char('k') | KeyCode::Up => self.posts.move_up(),
            KeyCode::PageDown => self.posts.page_down(),
            KeyCode::PageUp => self.posts.page_up(),
            KeyCode::Char('g') | KeyCode::Home => self.posts.select_first(),
            KeyCode::Char('G') | KeyCode::End => self.posts.select_last(),
            KeyCode::Enter | KeyCode::Char('l') | KeyCode::Right => {
                self.open_selected()?;
                None
            }
            KeyCode::Char('s') => {
                self.sort = self.sort.next();
                self.reload_posts()?;
                self.status = format!("Sorted by {}.", self.sort.label());
                None
            }
            KeyCode::Char('r') => {
                self.reload_posts()?;
                self.status = "Posts refreshed.".to_string();
                None
            }
            _ => None,
        };
        if let Some(change) = change {
            self.on_selection(change);
            self.load_more_posts()?;
        }
        Ok(())
    }

    fn open_selected(&mut self) -> Result<()> {
        let Some(post) = self.posts.get_selected().cloned() else {
            self.status = "No post selected.".to_string();
            return Ok(());
        };
        let forest = self
            .service
            .fetch_thread(&post.id, self.sort)
            .with_context(|| format!("fetch thread {}", post.id))?;
        let options = thread_options(
            &self.cfg.threads,
            panel::inner_width(self.width),
            self.expand_replies,
        );
        let mut view = ThreadView {
            post,
            forest,
            options,
            lines: Vec::new(),
            viewport: Viewport::new(self.body_rows, 0),
        };
        view.reflow(&self.theme, &self.votes);
        info!(post = %view.post.id, lines = view.lines.len(), "opened thread");
        self.status = HINTS_THREAD.to_string();
        self.screen = Screen::Thread(view);
        Ok(())
    }

    fn handle_thread_key(&mut self, code: KeyCode) -> Result<()> {
        let Shell {
            screen,
            service,
            theme,
            votes,
            sort,
            expand_replies,
            status,
            ..
        } = self;
        let Screen::Thread(view) = screen else {
            return Ok(());
        };

        match code {
            KeyCode::Char('j') | KeyCode::Down => {
                view.viewport.scroll_by(1);
            }
            KeyCode::Char('k') | KeyCode::Up => {
                view.viewport.scroll_by(-1);
            }
            KeyCode::PageDown | KeyCode::Char(' ') => {
                view.viewport.page_down();
            }
            KeyCode::PageUp => {
                view.viewport.page_up();
            }
            KeyCode::Char('g') | KeyCode::Home => {
                view.viewport.scroll_to_top();
            }
            KeyCode::Char('G') | KeyCode::End => {
                view.viewport.scroll_to_bottom();
            }
            KeyCode::Char('s') => {
                *sort = sort.next();
                view.forest = service
                    .fetch_thread(&view.post.id, *sort)
                    .with_context(|| format!("fetch thread {}", view.post.id))?;
                view.viewport.scroll_to_top();
                view.reflow(theme, votes);
                *status = format!("Sorted by {}.", sort.label());
            }
            KeyCode::Char('e') => {
                *expand_replies = !*expand_replies;
                view.options.expand_replies = *expand_replies;
                view.reflow(theme, votes);
                *status = if *expand_replies {
                    "Showing replies.".to_string()
                } else {
                    "Showing top-level comments only.".to_string()
                };
            }
            KeyCode::Char('c') => {
                if let Some(id) = view.focused_node() {
                    let folded = view.options.toggle_collapsed(&id);
                    view.reflow(theme, votes);
                    *status = if folded { "Folded." } else { "Unfolded." }.to_string();
                }
            }
            KeyCode::Char('u') | KeyCode::Char('d') => {
                let requested = if code == KeyCode::Char('u') {
                    Vote::Up
                } else {
                    Vote::Down
                };
                if let Some(id) = view.focused_node() {
                    let vote = votes.toggle(&id, requested);
                    view.reflow(theme, votes);
                    *status = match vote {
                        Vote::Up => "Upvoted.",
                        Vote::Down => "Downvoted.",
                        Vote::None => "Cleared vote.",
                    }
                    .to_string();
                }
            }
            KeyCode::Esc | KeyCode::Char('h') | KeyCode::Left | KeyCode::Backspace => {
                *screen = Screen::Posts;
                *status = HINTS_POSTS.to_string();
            }
            _ => {}
        }
        Ok(())
    }

    fn panel_content(&self) -> (String, Vec<String>) {
        let inner = panel::inner_width(self.width);
        match &self.screen {
            Screen::Posts => {
                let title = format!("Posts · {}", self.sort.label());
                if self.posts.is_empty() {
                    return (title, vec!["No posts.".to_string()]);
                }
                (title, self.posts.render_rows(inner, &self.theme, post_row))
            }
            Screen::Thread(view) => {
                let percent = (view.viewport.scroll_percent() * 100.0).round();
                let title = format!("{} · {} · {percent}%", view.post.title, self.sort.label());
                if view.lines.is_empty() {
                    return (title, vec!["No comments yet.".to_string()]);
                }
                let lines = view
                    .viewport
                    .visible_slice(&view.lines)
                    .iter()
                    .map(FlattenedLine::display)
                    .collect();
                (title, lines)
            }
        }
    }

    fn draw(&mut self, stdout: &mut Stdout) -> Result<()> {
        let (title, lines) = self.panel_content();
        let block = render_panel(&title, &lines, self.width, &self.theme, self.style);

        queue!(stdout, Clear(ClearType::All))?;
        for (row, text) in block.lines().enumerate() {
            queue!(stdout, MoveTo(0, screen_row(row)), Print(text))?;
        }
        let status_row = screen_row(self.body_rows + CHROME_ROWS - 1);
        queue!(
            stdout,
            MoveTo(0, status_row),
            Print(pad_to(&self.status, self.width))
        )?;
        stdout.flush()?;
        Ok(())
    }
}

fn screen_row(row: usize) -> u16 {
    u16::try_from(row).unwrap_or(u16::MAX)
}
