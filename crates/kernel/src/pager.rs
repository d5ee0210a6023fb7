//! Page window computation.
//!
//! The paginator never mutates the working rows. Locally it copies one
//! page out of them; in remote mode the fetched page is the whole working
//! set and only the declared row count comes from the response.

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::persistence::Persistence;
use crate::types::{Params, Row};

/// Rows per page when not configured.
pub const DEFAULT_ROWS_PER_PAGE: usize = 10;

/// Page buttons shown when not configured.
pub const DEFAULT_PAGES_TO_DISPLAY: usize = 5;

/// Paging state. `current_page` is always within `[1, total_pages]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageState {
    pub current_page: usize,
    pub rows_per_page: usize,
    pub pages_to_display: usize,
    pub total_rows: usize,
}

impl PageState {
    /// `ceil(total_rows / rows_per_page)`, at least 1. Zero rows per page
    /// means a single page.
    pub fn total_pages(&self) -> usize {
        if self.rows_per_page == 0 {
            return 1;
        }
        self.total_rows.div_ceil(self.rows_per_page).max(1)
    }
}

/// Navigation metadata for the presentation layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Navigation {
    /// Page buttons to show; empty when there is only one page.
    pub pages: Vec<usize>,
    pub current_page: usize,
    pub total_pages: usize,
    pub first_disabled: bool,
    pub previous_disabled: bool,
    pub next_disabled: bool,
    pub last_disabled: bool,
}

/// Computes and holds the visible page.
#[derive(Debug, Clone)]
pub struct Paginator {
    state: PageState,
    page_rows: Vec<Row>,
    navigation: Navigation,
}

impl Default for Paginator {
    fn default() -> Self {
        Self::new(DEFAULT_ROWS_PER_PAGE, DEFAULT_PAGES_TO_DISPLAY)
    }
}

impl Paginator {
    pub fn new(rows_per_page: usize, pages_to_display: usize) -> Self {
        let mut pager = Self {
            state: PageState {
                current_page: 1,
                rows_per_page,
                pages_to_display,
                total_rows: 0,
            },
            page_rows: Vec::new(),
            navigation: Navigation::default(),
        };
        pager.update_navigation();
        pager
    }

    pub fn state(&self) -> PageState {
        self.state
    }

    pub fn total_pages(&self) -> usize {
        self.state.total_pages()
    }

    pub fn current_page(&self) -> usize {
        self.state.current_page
    }

    /// Clamp a requested page into `[1, total_pages]`. Non-positive
    /// requests resolve to 1.
    pub fn validate_page(&self, page: i64) -> usize {
        if page < 1 {
            return 1;
        }
        let page = usize::try_from(page).unwrap_or(usize::MAX);
        page.min(self.total_pages())
    }

    /// Integer form of a loosely-typed page request.
    ///
    /// Integers pass through, floats and numeric strings truncate, anything
    /// else is 0 (which [`validate_page`](Self::validate_page) turns into 1).
    pub fn coerce_page(value: &Value) -> i64 {
        match value {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
                .unwrap_or(0),
            Value::String(s) => {
                let s = s.trim();
                s.parse::<i64>()
                    .ok()
                    .or_else(|| {
                        s.parse::<f64>()
                            .ok()
                            .filter(|f| f.is_finite())
                            .map(|f| f.trunc() as i64)
                    })
                    .unwrap_or(0)
            }
            _ => 0,
        }
    }

    /// First page of the button window around `current`.
    ///
    /// The window is `pages_to_display` wide, offset
    /// `p / 2 + p % 2` back from `current`, and shifted so it stays inside
    /// `[1, total_pages]`.
    pub fn first_display_page(&self, current: usize) -> usize {
        let window = self.state.pages_to_display;
        if window == 0 {
            return 1;
        }
        let total = self.total_pages();
        let offset = window / 2 + window % 2;
        let latest_start = total.saturating_sub(window) + 1;

        (current + 1).saturating_sub(offset).clamp(1, latest_start.max(1))
    }

    /// Move to `page`, clamped against the current total.
    pub fn set_page(&mut self, page: i64) -> usize {
        self.state.current_page = self.validate_page(page);
        self.update_navigation();
        self.state.current_page
    }

    pub fn next_page(&self) -> i64 {
        self.state.current_page as i64 + 1
    }

    pub fn previous_page(&self) -> i64 {
        self.state.current_page as i64 - 1
    }

    pub fn last_page(&self) -> i64 {
        self.total_pages() as i64
    }

    /// Slice the current page out of the working rows.
    pub fn render_local(&mut self, persistence: &Persistence) {
        self.state.total_rows = persistence.row_count();
        self.state.current_page = self.validate_page(self.state.current_page as i64);

        let rows = persistence.rows();
        self.page_rows = if self.state.rows_per_page == 0 {
            rows.to_vec()
        } else {
            let start = (self.state.current_page - 1) * self.state.rows_per_page;
            let end = (start + self.state.rows_per_page).min(rows.len());
            rows.get(start..end).map(<[Row]>::to_vec).unwrap_or_default()
        };

        self.update_navigation();
        debug!(
            page = self.state.current_page,
            rows = self.page_rows.len(),
            total = self.state.total_rows,
            "local page rendered"
        );
    }

    /// Take a fetched page: its rows are the working set, `row_count` is
    /// the declared total.
    pub fn render_remote(&mut self, persistence: &Persistence, row_count: usize) {
        self.state.total_rows = row_count;
        self.state.current_page = self.validate_page(self.state.current_page as i64);
        self.page_rows = persistence.rows().to_vec();
        self.update_navigation();
        debug!(
            page = self.state.current_page,
            rows = self.page_rows.len(),
            total = row_count,
            "remote page rendered"
        );
    }

    /// Remote-mode contribution: `{page}`.
    pub fn remote_params(&self, mut params: Params) -> Params {
        params.insert(
            "page".to_string(),
            Value::from(self.state.current_page as u64),
        );
        params
    }

    pub fn page_rows(&self) -> &[Row] {
        &self.page_rows
    }

    pub fn navigation(&self) -> &Navigation {
        &self.navigation
    }

    fn update_navigation(&mut self) {
        let total = self.total_pages();
        let current = self.state.current_page;

        let pages = if total <= 1 {
            Vec::new()
        } else {
            let first = self.first_display_page(current);
            let last = (first + self.state.pages_to_display)
                .saturating_sub(1)
                .min(total);
            (first..=last).collect()
        };

        self.navigation = Navigation {
            pages,
            current_page: current,
            total_pages: total,
            first_disabled: current == 1,
            previous_disabled: current == 1,
            next_disabled: current == total,
            last_disabled: current == total,
        };
    }
}

/// Declared row count of a remote page body; absent or invalid is 0.
pub fn row_count_of(body: &Value) -> usize {
    match body.get("rowCount") {
        Some(Value::Number(n)) => n
            .as_u64()
            .map(|n| n as usize)
            .or_else(|| count_from_float(n.as_f64()?))
            .unwrap_or(0),
        Some(Value::String(s)) => {
            let s = s.trim();
            s.parse::<usize>()
                .ok()
                .or_else(|| count_from_float(s.parse::<f64>().ok()?))
                .unwrap_or(0)
        }
        _ => 0,
    }
}

/// Finite non-negative floats truncate to a count.
fn count_from_float(f: f64) -> Option<usize> {
    (f.is_finite() && f >= 0.0).then(|| f.trunc() as usize)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn persistence(n: usize) -> Persistence {
        let rows = (1..=n)
            .map(|i| json!({"id": i}).as_object().cloned().unwrap())
            .collect();
        Persistence::new(rows)
    }

    fn ids(pager: &Paginator) -> Vec<Value> {
        pager.page_rows().iter().map(|r| r["id"].clone()).collect()
    }

    #[test]
    fn total_pages_and_clamping() {
        let mut pager = Paginator::new(2, 5);
        pager.render_local(&persistence(5));

        assert_eq!(pager.total_pages(), 3);
        assert_eq!(pager.validate_page(10), 3);
        assert_eq!(pager.validate_page(0), 1);
        assert_eq!(pager.validate_page(-4), 1);
    }

    #[test]
    fn total_pages_edge_cases() {
        let state = |total_rows, rows_per_page| PageState {
            current_page: 1,
            rows_per_page,
            pages_to_display: 5,
            total_rows,
        };
        assert_eq!(state(0, 10).total_pages(), 1);
        assert_eq!(state(10, 10).total_pages(), 1);
        assert_eq!(state(11, 10).total_pages(), 2);
        assert_eq!(state(500, 0).total_pages(), 1);
    }

    #[test]
    fn coerce_page_inputs() {
        assert_eq!(Paginator::coerce_page(&json!(3)), 3);
        assert_eq!(Paginator::coerce_page(&json!("4")), 4);
        assert_eq!(Paginator::coerce_page(&json!(2.7)), 2);
        assert_eq!(Paginator::coerce_page(&json!("2.7")), 2);
        assert_eq!(Paginator::coerce_page(&json!("next")), 0);
        assert_eq!(Paginator::coerce_page(&Value::Null), 0);
    }

    #[test]
    fn render_local_slices_current_page() {
        let p = persistence(5);
        let mut pager = Paginator::new(2, 5);
        pager.render_local(&p);
        assert_eq!(ids(&pager), vec![json!(1), json!(2)]);

        pager.set_page(3);
        pager.render_local(&p);
        assert_eq!(ids(&pager), vec![json!(5)]);
    }

    #[test]
    fn render_local_clamps_after_rows_shrink() {
        let mut pager = Paginator::new(2, 5);
        pager.render_local(&persistence(10));
        pager.set_page(5);

        pager.render_local(&persistence(3));
        assert_eq!(pager.current_page(), 2);
        assert_eq!(ids(&pager), vec![json!(3)]);
    }

    #[test]
    fn zero_rows_per_page_shows_everything() {
        let mut pager = Paginator::new(0, 5);
        pager.render_local(&persistence(4));
        assert_eq!(pager.page_rows().len(), 4);
        assert!(pager.navigation().pages.is_empty());
    }

    #[test]
    fn display_window_is_centered_and_clamped() {
        let mut pager = Paginator::new(1, 5);
        pager.render_local(&persistence(10));

        assert_eq!(pager.first_display_page(1), 1);
        assert_eq!(pager.first_display_page(3), 1);
        assert_eq!(pager.first_display_page(5), 3);
        assert_eq!(pager.first_display_page(9), 6);
        assert_eq!(pager.first_display_page(10), 6);

        pager.set_page(5);
        assert_eq!(pager.navigation().pages, vec![3, 4, 5, 6, 7]);
    }

    #[test]
    fn even_window_offset() {
        let mut pager = Paginator::new(1, 4);
        pager.render_local(&persistence(10));
        // offset = 2, so page 5 starts the window at 4
        assert_eq!(pager.first_display_page(5), 4);
    }

    #[test]
    fn window_narrower_than_total() {
        let mut pager = Paginator::new(1, 5);
        pager.render_local(&persistence(3));
        pager.set_page(3);
        assert_eq!(pager.navigation().pages, vec![1, 2, 3]);
    }

    #[test]
    fn single_page_has_no_buttons() {
        let mut pager = Paginator::new(10, 5);
        pager.render_local(&persistence(4));
        let nav = pager.navigation();
        assert!(nav.pages.is_empty());
        assert!(nav.first_disabled && nav.last_disabled);
    }

    #[test]
    fn controls_disabled_at_edges() {
        let mut pager = Paginator::new(2, 5);
        pager.render_local(&persistence(6));

        let nav = pager.navigation();
        assert!(nav.first_disabled && nav.previous_disabled);
        assert!(!nav.next_disabled && !nav.last_disabled);

        pager.set_page(pager.next_page());
        let nav = pager.navigation();
        assert!(!nav.first_disabled && !nav.next_disabled);

        pager.set_page(pager.last_page());
        let nav = pager.navigation();
        assert_eq!(nav.current_page, 3);
        assert!(nav.next_disabled && nav.last_disabled);
        assert!(!nav.previous_disabled);
    }

    #[test]
    fn remote_render_uses_declared_count() {
        let mut pager = Paginator::new(2, 5);
        let page = persistence(2);
        pager.render_remote(&page, 9);

        assert_eq!(pager.total_pages(), 5);
        assert_eq!(pager.page_rows().len(), 2);
        assert_eq!(pager.remote_params(Params::new()).get("page"), Some(&json!(1)));
    }

    #[test]
    fn row_count_parsing() {
        assert_eq!(row_count_of(&json!({"rowCount": 42})), 42);
        assert_eq!(row_count_of(&json!({"rowCount": "7"})), 7);
        assert_eq!(row_count_of(&json!({"data": []})), 0);
        assert_eq!(row_count_of(&json!([1, 2])), 0);
    }

    #[test]
    fn float_row_count_truncates() {
        assert_eq!(row_count_of(&json!({"rowCount": 25.0})), 25);
        assert_eq!(row_count_of(&json!({"rowCount": 25.9})), 25);
        assert_eq!(row_count_of(&json!({"rowCount": "12.0"})), 12);
        assert_eq!(row_count_of(&json!({"rowCount": -3.0})), 0);

        let mut pager = Paginator::new(10, 5);
        pager.render_remote(&persistence(10), row_count_of(&json!({"rowCount": 25.0})));
        assert_eq!(pager.total_pages(), 3);
    }

    #[test]
    fn zero_window_stays_in_range() {
        let mut pager = Paginator::new(1, 0);
        pager.render_local(&persistence(4));
        pager.set_page(4);

        assert_eq!(pager.first_display_page(4), 1);
        assert!(pager.navigation().pages.is_empty());
    }
}
