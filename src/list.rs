//! Single-selection list with a scroll window, shared by every list-style
//! screen. Row rendering is left to a caller-supplied callback.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::measure::pad_to;
use crate::theme::{StyleTag, ThemeContext};
use crate::viewport::Viewport;

const SELECTED_PREFIX: &str = "▶ ";
const IDLE_PREFIX: &str = "  ";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Navigation {
    #[default]
    Clamp,
    Wrap,
}

impl Navigation {
    pub fn from_wrap(wrap: bool) -> Self {
        if wrap {
            Navigation::Wrap
        } else {
            Navigation::Clamp
        }
    }
}

/// Emitted only when the selection actually changes. `current` is `None`
/// once the list has been emptied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionChange {
    pub previous: Option<usize>,
    pub current: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct SelectableList<T> {
    items: Vec<T>,
    selected: Option<usize>,
    window: Viewport,
    navigation: Navigation,
}

impl<T> Default for SelectableList<T> {
    fn default() -> Self {
        Self::new(1)
    }
}

impl<T> SelectableList<T> {
    pub fn new(visible_count: usize) -> Self {
        Self {
            items: Vec::new(),
            selected: None,
            window: Viewport::new(visible_count.max(1), 0),
            navigation: Navigation::default(),
        }
    }

    pub fn with_navigation(mut self, navigation: Navigation) -> Self {
        self.navigation = navigation;
        self
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    pub fn scroll_offset(&self) -> usize {
        self.window.offset()
    }

    pub fn visible_count(&self) -> usize {
        self.window.height()
    }

    pub fn get_selected(&self) -> Option<&T> {
        self.selected.and_then(|index| self.items.get(index))
    }

    pub fn get_selected_mut(&mut self) -> Option<&mut T> {
        self.selected.and_then(|index| self.items.get_mut(index))
    }

    /// Replace the contents and reset selection and scroll to the top.
    pub fn set_items(&mut self, items: Vec<T>) -> Option<SelectionChange> {
        let previous = self.selected;
        self.items = items;
        self.window.set_total(self.items.len());
        self.window.scroll_to_top();
        self.selected = if self.items.is_empty() { None } else { Some(0) };
        if previous.is_none() && self.selected.is_none() {
            return None;
        }
        Some(self.emit(previous, self.selected))
    }

    /// Add a page of items below the current ones. Selection stays put
    /// unless the list was empty.
    pub fn append_items(&mut self, items: impl IntoIterator<Item = T>) -> Option<SelectionChange> {
        self.items.extend(items);
        self.window.set_total(self.items.len());
        if self.selected.is_none() && !self.items.is_empty() {
            self.selected = Some(0);
            self.window.scroll_to_top();
            return Some(self.emit(None, Some(0)));
        }
        None
    }

    pub fn move_up(&mut self) -> Option<SelectionChange> {
        self.step(-1)
    }

    pub fn move_down(&mut self) -> Option<SelectionChange> {
        self.step(1)
    }

    pub fn page_up(&mut self) -> Option<SelectionChange> {
        let current = self.selected?;
        self.select(current.saturating_sub(self.visible_count()))
    }

    pub fn page_down(&mut self) -> Option<SelectionChange> {
        let current = self.selected?;
        self.select(current.saturating_add(self.visible_count()))
    }

    pub fn select_first(&mut self) -> Option<SelectionChange> {
        self.select(0)
    }

    pub fn select_last(&mut self) -> Option<SelectionChange> {
        self.select(self.items.len().saturating_sub(1))
    }

    /// Clamps `index` into range. No-op on an empty list.
    pub fn select(&mut self, index: usize) -> Option<SelectionChange> {
        let last = self.items.len().checked_sub(1)?;
        let previous = self.selected;
        let next = index.min(last);
        self.selected = Some(next);
        self.ensure_visible();
        if previous == Some(next) {
            return None;
        }
        Some(self.emit(previous, Some(next)))
    }

    fn step(&mut self, delta: isize) -> Option<SelectionChange> {
        let last = self.items.len().checked_sub(1)?;
        let current = self.selected.unwrap_or(0);
        let next = match (self.navigation, delta < 0) {
            (Navigation::Wrap, true) if current == 0 => last,
            (Navigation::Wrap, false) if current == last => 0,
            _ => current.saturating_add_signed(delta).min(last),
        };
        self.select(next)
    }

    pub fn ensure_visible(&mut self) {
        match self.selected {
            Some(selected) => {
                self.window.reveal(selected);
            }
            None => {
                self.window.scroll_to_top();
            }
        }
    }

    pub fn set_visible_count(&mut self, visible_count: usize) {
        self.window.set_height(visible_count.max(1));
        self.ensure_visible();
    }

    /// True when the selection is within `threshold` rows of the last item.
    pub fn near_bottom(&self, threshold: usize) -> bool {
        self.selected
            .is_some_and(|selected| selected.saturating_add(threshold) + 1 >= self.items.len())
    }

    pub fn visible_items(&self) -> impl Iterator<Item = (usize, &T, bool)> + '_ {
        let range = self.window.visible_range();
        self.items[range.clone()]
            .iter()
            .zip(range)
            .map(move |(item, index)| (index, item, self.selected == Some(index)))
    }

    /// One row per visible item, each exactly `width` columns. The selected
    /// row gets a marker and the highlight style.
    pub fn render_rows<F>(&self, width: usize, theme: &ThemeContext, render: F) -> Vec<String>
    where
        F: Fn(&T) -> String,
    {
        self.visible_items()
            .map(|(_, item, selected)| {
                let prefix = if selected { SELECTED_PREFIX } else { IDLE_PREFIX };
                let row = pad_to(&format!("{prefix}{}", render(item)), width);
                if selected {
                    theme.paint_row(StyleTag::Highlight, &row)
                } else {
                    row
                }
            })
            .collect()
    }

    fn emit(&self, previous: Option<usize>, current: Option<usize>) -> SelectionChange {
        trace!(?previous, ?current, offset = self.window.offset(), "selection changed");
        SelectionChange { previous, current }
    }
}
