use chrono::{Duration, TimeZone, Utc};
use threadview::list::{Navigation, SelectableList};
use threadview::measure::{measure_width, pad_to, strip_markers, truncate_to};
use threadview::panel::{inner_width, render_panel, PanelStyle};
use threadview::service::{ContentService, MockContentService, SortMode};
use threadview::theme::{StyleTag, ThemeContext};
use threadview::thread::{flatten, FlattenOptions, LineKind, ThreadNode};
use threadview::viewport::Viewport;
use threadview::wrap::wrap;

fn reply_chain(depth: usize) -> ThreadNode {
    let created_at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let mut node = ThreadNode {
        id: format!("n{depth}"),
        author: Some(format!("user{depth}")),
        score: depth as i64,
        created_at,
        body: "A reply that is long enough to wrap several times at narrow widths.".into(),
        children: Vec::new(),
    };
    for level in (0..depth).rev() {
        node = ThreadNode {
            id: format!("n{level}"),
            author: Some(format!("user{level}")),
            score: level as i64,
            created_at: created_at - Duration::days(level as i64),
            body: "Parent 🦀 body".into(),
            children: vec![node],
        };
    }
    node
}

#[test]
fn padded_text_always_has_exact_width() {
    let theme = ThemeContext::default();
    let samples = [
        String::new(),
        "plain".to_string(),
        "日本語のテキスト".to_string(),
        theme.paint(StyleTag::Author, "styled author name"),
    ];
    for sample in &samples {
        for width in 0..24 {
            assert_eq!(measure_width(&pad_to(sample, width)), width, "{sample:?} @ {width}");
            assert!(measure_width(&truncate_to(sample, width)) <= width);
        }
    }
}

#[test]
fn wrapped_lines_never_exceed_width() {
    let text = "supercalifragilisticexpialidocious words 🦀🦀🦀 and\n\nmore 日本語 text";
    // Width 2 is the narrowest that fits every glyph used here.
    for width in 2..30 {
        for line in wrap(text, width) {
            assert!(measure_width(&line) <= width, "{line:?} @ {width}");
        }
    }
}

#[test]
fn deep_chain_respects_width_and_depth() {
    let forest = vec![reply_chain(12)];
    let theme = ThemeContext::default();
    for max_depth in [0, 3, 8] {
        let options = FlattenOptions::new(max_depth, 50, true);
        let lines = flatten(&forest, &options, &theme);
        assert!(lines.iter().all(|line| line.depth <= max_depth));
        assert!(lines.iter().all(|line| measure_width(&line.display()) <= 50));
        let headers = lines.iter().filter(|line| line.kind == LineKind::Header).count();
        assert_eq!(headers, max_depth + 1);
    }
}

#[test]
fn viewport_walks_flattened_thread_inside_panel() {
    let service = MockContentService;
    let forest = service.fetch_thread("welcome", SortMode::Top).unwrap();
    let theme = ThemeContext::plain();
    let width = 44;
    let options = FlattenOptions::new(8, inner_width(width), true);
    let lines: Vec<String> = flatten(&forest, &options, &theme)
        .iter()
        .map(|line| line.display())
        .collect();

    let mut viewport = Viewport::new(6, lines.len());
    let mut seen = Vec::new();
    loop {
        let page = viewport.visible_slice(&lines);
        assert!(page.len() <= 6);
        let block = render_panel("Thread", page, width, &theme, PanelStyle::default());
        assert!(block.split('\n').all(|row| measure_width(row) == width));
        seen.extend(page.iter().cloned());
        if !viewport.page_down() {
            break;
        }
    }
    assert_eq!(viewport.offset() + viewport.height(), lines.len());
    assert!(seen.iter().any(|line| strip_markers(line).contains("[deleted]")));
}

#[test]
fn list_selection_stays_in_window() {
    let mut list = SelectableList::new(4).with_navigation(Navigation::Clamp);
    list.set_items((0..20).collect::<Vec<u32>>());
    for _ in 0..30 {
        list.move_down();
        let selected = list.selected_index().unwrap();
        assert!(selected >= list.scroll_offset());
        assert!(selected < list.scroll_offset() + list.visible_count());
    }
    assert_eq!(list.selected_index(), Some(19));

    let rows = list.render_rows(16, &ThemeContext::plain(), |item| format!("item {item}"));
    assert_eq!(rows.len(), 4);
    assert!(rows.iter().all(|row| measure_width(row) == 16));
    assert!(rows[3].starts_with("▶ item 19"));
}
