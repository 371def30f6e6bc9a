//! Generic table widget state: sorting, filtering, pagination, search-input
//! mode, and selection (spec.md §4.5). Grounded on the prior generation's
//! `TableState<T>`/`TableRow` split, generalized here with explicit paging
//! and a sentinel-aware sort instead of diff tracking (the ES dashboard has
//! no per-row change highlighting).

use ratatui::layout::Alignment;
use unicode_width::UnicodeWidthStr;

use crate::derive::consts::is_not_available;

/// A sortable, filterable cell value. `Number` sorts sentinel-last
/// regardless of direction (spec.md §4.5, §8 "Sentinel sorting").
#[derive(Debug, Clone, PartialEq)]
pub enum SortValue {
    Text(String),
    Number(f64),
}

/// Column definition: display title, preferred width, alignment, and
/// whether its default sort direction on first press is descending
/// (numeric columns) or ascending (the name column).
#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub title: &'static str,
    pub preferred_width: u16,
    pub alignment: Alignment,
    pub numeric: bool,
}

pub trait Row: Clone {
    fn name(&self) -> &str;
    /// Fields matched by search: indices match name only, nodes match name
    /// or ip (spec.md §4.5 "Search").
    fn search_haystack(&self) -> Vec<&str>;
    fn cell(&self, col: usize) -> String;
    fn sort_value(&self, col: usize) -> SortValue;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Browsing,
    Searching,
}

/// Generic table state, parameterized over the row type. `track_selection`
/// controls whether `space` toggles a name-keyed selection set — only the
/// index table uses it.
#[derive(Debug, Clone)]
pub struct Table<T: Row> {
    pub columns: Vec<Column>,
    rows: Vec<T>,
    display_rows: Vec<usize>,
    pub sort_col: i32,
    pub sort_desc: bool,
    pub page: usize,
    pub page_size: usize,
    pub search: String,
    pub input_mode: InputMode,
    pub focused: bool,
    pub cursor: usize,
    pub selected: std::collections::HashSet<String>,
    track_selection: bool,
}

impl<T: Row> Table<T> {
    pub fn new(columns: Vec<Column>, track_selection: bool) -> Self {
        Self {
            columns,
            rows: Vec::new(),
            display_rows: Vec::new(),
            sort_col: -1,
            sort_desc: false,
            page: 0,
            page_size: 20,
            search: String::new(),
            input_mode: InputMode::Browsing,
            focused: false,
            cursor: 0,
            selected: std::collections::HashSet::new(),
            track_selection,
        }
    }

    /// Replaces the row set. For the index table, selections for names no
    /// longer present are dropped; surviving names keep their selection
    /// (spec.md §4.5 "On SetData").
    pub fn set_data(&mut self, rows: Vec<T>) {
        if self.track_selection {
            let names: std::collections::HashSet<&str> = rows.iter().map(|r| r.name()).collect();
            self.selected.retain(|n| names.contains(n.as_str()));
        }
        self.rows = rows;
        self.recompute();
    }

    fn recompute(&mut self) {
        let search = self.search.to_lowercase();
        let mut idx: Vec<usize> = self
            .rows
            .iter()
            .enumerate()
            .filter(|(_, r)| {
                search.is_empty()
                    || r.search_haystack()
                        .iter()
                        .any(|field| field.to_lowercase().contains(&search))
            })
            .map(|(i, _)| i)
            .collect();

        if self.sort_col >= 0 {
            let col = self.sort_col as usize;
            let desc = self.sort_desc;
            idx.sort_by(|&a, &b| {
                let va = self.rows[a].sort_value(col);
                let vb = self.rows[b].sort_value(col);
                let ord = compare_sort_values(&va, &vb, desc);
                ord.then_with(|| self.rows[a].name().to_lowercase().cmp(&self.rows[b].name().to_lowercase()))
            });
        } else {
            idx.sort_by(|&a, &b| self.rows[a].name().to_lowercase().cmp(&self.rows[b].name().to_lowercase()));
        }

        self.display_rows = idx;
        self.clamp_page();
        self.clamp_cursor();
    }

    pub fn display_len(&self) -> usize {
        self.display_rows.len()
    }

    pub fn total_pages(&self) -> usize {
        if self.page_size == 0 {
            1
        } else {
            self.display_len().div_ceil(self.page_size).max(1)
        }
    }

    fn clamp_page(&mut self) {
        let max_page = self.total_pages().saturating_sub(1);
        if self.page > max_page {
            self.page = max_page;
        }
    }

    fn rows_on_current_page(&self) -> usize {
        let start = self.page * self.page_size;
        self.display_len().saturating_sub(start).min(self.page_size)
    }

    fn clamp_cursor(&mut self) {
        let visible = self.rows_on_current_page();
        if visible == 0 {
            self.cursor = 0;
        } else if self.cursor >= visible {
            self.cursor = visible - 1;
        }
    }

    /// Rows visible on the current page, in display order.
    pub fn page_rows(&self) -> Vec<&T> {
        let start = self.page * self.page_size;
        self.display_rows
            .iter()
            .skip(start)
            .take(self.page_size)
            .map(|&i| &self.rows[i])
            .collect()
    }

    pub fn selected_row(&self) -> Option<&T> {
        self.page_rows().into_iter().nth(self.cursor)
    }

    pub fn set_page_size(&mut self, size: usize) {
        self.page_size = size.max(1);
        self.clamp_page();
        self.clamp_cursor();
    }

    pub fn press_sort_column(&mut self, col: usize) {
        if col >= self.columns.len() {
            return;
        }
        if self.sort_col == col as i32 {
            self.sort_desc = !self.sort_desc;
        } else {
            self.sort_col = col as i32;
            self.sort_desc = self.columns[col].numeric;
        }
        self.recompute();
    }

    pub fn next_page(&mut self) {
        if self.page + 1 < self.total_pages() {
            self.page += 1;
            self.cursor = 0;
        }
    }

    pub fn prev_page(&mut self) {
        if self.page > 0 {
            self.page -= 1;
            self.cursor = 0;
        }
    }

    pub fn move_cursor_up(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_cursor_down(&mut self) {
        let visible = self.rows_on_current_page();
        if visible > 0 && self.cursor + 1 < visible {
            self.cursor += 1;
        }
    }

    pub fn toggle_selection_at_cursor(&mut self) {
        if !self.track_selection {
            return;
        }
        if let Some(row) = self.selected_row() {
            let name = row.name().to_string();
            if !self.selected.remove(&name) {
                self.selected.insert(name);
            }
        }
    }

    pub fn open_search(&mut self) {
        self.input_mode = InputMode::Searching;
    }

    pub fn commit_search(&mut self) {
        self.input_mode = InputMode::Browsing;
        self.page = 0;
        self.cursor = 0;
        self.recompute();
    }

    pub fn cancel_search_input(&mut self) {
        self.input_mode = InputMode::Browsing;
    }

    /// `esc` while browsing with an active filter clears it; otherwise a
    /// no-op (spec.md §4.5 "Keys").
    pub fn clear_filter_if_active(&mut self) -> bool {
        if self.input_mode == InputMode::Browsing && !self.search.is_empty() {
            self.search.clear();
            self.page = 0;
            self.cursor = 0;
            self.recompute();
            true
        } else {
            false
        }
    }

    pub fn push_search_char(&mut self, c: char) {
        self.search.push(c);
    }

    pub fn pop_search_char(&mut self) {
        self.search.pop();
    }
}

/// Compares two cell values for the given direction. `NotAvailable` numeric
/// sentinels always sort last, in both ascending and descending order
/// (spec.md §4.5, §8 "Sentinel sorting") — only non-sentinel numbers and
/// text actually flip with `desc`.
fn compare_sort_values(a: &SortValue, b: &SortValue, desc: bool) -> std::cmp::Ordering {
    use std::cmp::Ordering;
    match (a, b) {
        (SortValue::Text(a), SortValue::Text(b)) => {
            let ord = a.to_lowercase().cmp(&b.to_lowercase());
            if desc {
                ord.reverse()
            } else {
                ord
            }
        }
        (SortValue::Number(a), SortValue::Number(b)) => {
            let a_na = is_not_available(*a);
            let b_na = is_not_available(*b);
            match (a_na, b_na) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
                (false, false) => {
                    let ord = a.partial_cmp(b).unwrap_or(Ordering::Equal);
                    if desc {
                        ord.reverse()
                    } else {
                        ord
                    }
                }
            }
        }
        _ => Ordering::Equal,
    }
}

/// Computes proportional column widths from preferred widths to fill
/// `available`, with a floor of 4 per column; the final column absorbs the
/// rounding remainder so widths sum exactly to `available` (spec.md §4.5,
/// §8 "column widths").
pub fn compute_column_widths(columns: &[Column], available: u16) -> Vec<u16> {
    let n = columns.len();
    if n == 0 {
        return Vec::new();
    }
    let floor = 4u16;
    let total_preferred: u32 = columns.iter().map(|c| c.preferred_width as u32).sum();
    let available = available.max(floor * n as u16);

    let mut widths: Vec<u16> = columns
        .iter()
        .map(|c| {
            let share = if total_preferred == 0 {
                available as u32 / n as u32
            } else {
                (c.preferred_width as u32 * available as u32) / total_preferred
            };
            (share as u16).max(floor)
        })
        .collect();

    let sum: u32 = widths.iter().map(|&w| w as u32).sum();
    let target = available as u32;
    if let Some(last) = widths.last_mut() {
        if sum <= target {
            *last += (target - sum) as u16;
        } else {
            let overshoot = sum - target;
            *last = last.saturating_sub(overshoot as u16).max(floor);
        }
    }
    widths
}

/// Truncates `s` to at most `width` terminal display cells, appending a
/// trailing `...` marker when truncation occurs. Wide glyphs (CJK) count as
/// two cells, matching `unicode-width`'s terminal model.
pub fn truncate_name(s: &str, width: usize) -> String {
    if s.width() <= width {
        return s.to_string();
    }
    if width <= 3 {
        return "...".chars().take(width).collect();
    }
    let budget = width - 3;
    let mut out = String::new();
    let mut used = 0usize;
    for c in s.chars() {
        let w = UnicodeWidthStr::width(c.to_string().as_str());
        if used + w > budget {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push_str("...");
    out
}
