// Page/mode bookkeeping for the results list (replace vs. load more)

use serde::Serialize;

use crate::models::{FilterState, MAX_PAGE};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderMode {
    #[default]
    Replace,
    Append,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PaginationState {
    pub page: u32,
    pub per_page: u32,
    pub total_cars: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyStateChange {
    Entered,
    Cleared,
    Unchanged,
}

#[derive(Debug, Default)]
pub struct ResultsPaginator {
    mode: RenderMode,
    total_cars: Option<u64>,
    empty: bool,
}

impl ResultsPaginator {
    pub fn new(total_cars: Option<u64>) -> Self {
        Self { mode: RenderMode::Replace, total_cars, empty: total_cars == Some(0) }
    }

    pub fn mode(&self) -> RenderMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: RenderMode) {
        self.mode = mode;
    }

    /// Any filter, sort, view or category change starts over from page 1.
    pub fn reset(&mut self, state: &mut FilterState) {
        state.page = 1;
        self.mode = RenderMode::Replace;
    }

    /// Page to append next, if there is one. The state keeps its page until the
    /// appended results actually arrive.
    pub fn next_page(&mut self, state: &FilterState) -> Option<u32> {
        if !self.has_more(state) {
            return None;
        }
        let next = state.page.checked_add(1)?;
        self.mode = RenderMode::Append;
        Some(next)
    }

    /// Direct pagination link.
    pub fn go_to(&mut self, state: &mut FilterState, page: u32) {
        state.page = self.clamp_page(page, state.per_page);
        self.mode = RenderMode::Replace;
    }

    /// Keeps selections; lands on `page` when supplied, else page 1.
    pub fn set_per_page(&mut self, state: &mut FilterState, per_page: u32, page: Option<u32>) {
        state.per_page = per_page.max(1);
        state.page = self.clamp_page(page.unwrap_or(1), state.per_page);
        self.mode = RenderMode::Replace;
    }

    /// Last page holding results, or [`MAX_PAGE`] while the total is unknown.
    pub fn last_page(&self, per_page: u32) -> u32 {
        match self.total_cars {
            Some(total) if total > 0 => {
                let pages = total.div_ceil(u64::from(per_page.max(1)));
                u32::try_from(pages).unwrap_or(MAX_PAGE).min(MAX_PAGE)
            }
            _ => MAX_PAGE,
        }
    }

    pub fn clamp_page(&self, page: u32, per_page: u32) -> u32 {
        page.clamp(1, self.last_page(per_page))
    }

    pub fn has_more(&self, state: &FilterState) -> bool {
        match self.total_cars {
            None => true,
            Some(0) => false,
            Some(total) => u64::from(state.page) * u64::from(state.per_page) < total,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.empty
    }

    pub fn apply_total(&mut self, total_cars: u64) -> EmptyStateChange {
        self.total_cars = Some(total_cars);
        let was_empty = self.empty;
        self.empty = total_cars == 0;
        match (was_empty, self.empty) {
            (false, true) => EmptyStateChange::Entered,
            (true, false) => EmptyStateChange::Cleared,
            _ => EmptyStateChange::Unchanged,
        }
    }

    pub fn state(&self, state: &FilterState) -> PaginationState {
        PaginationState { page: state.page, per_page: state.per_page, total_cars: self.total_cars }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_more_appends_the_next_page() {
        let mut paginator = ResultsPaginator::new(Some(60));
        let mut state = FilterState::default();

        assert_eq!(paginator.next_page(&state), Some(2));
        assert_eq!(paginator.mode(), RenderMode::Append);
        assert_eq!(state.page, 1);

        state.page = 2;
        assert_eq!(paginator.next_page(&state), Some(3));
        // 3 * 25 >= 60
        state.page = 3;
        assert!(!paginator.has_more(&state));
        assert_eq!(paginator.next_page(&state), None);
    }

    #[test]
    fn reset_returns_to_first_page_in_replace_mode() {
        let mut paginator = ResultsPaginator::new(None);
        let mut state = FilterState::default();
        state.page = 4;
        paginator.next_page(&state);

        paginator.reset(&mut state);
        assert_eq!(state.page, 1);
        assert_eq!(paginator.mode(), RenderMode::Replace);
    }

    #[test]
    fn per_page_change_honours_an_explicit_page() {
        let mut paginator = ResultsPaginator::new(Some(500));
        let mut state = FilterState::default();
        state.marks_ids.insert(7);

        paginator.set_per_page(&mut state, 50, Some(3));
        assert_eq!((state.per_page, state.page), (50, 3));
        paginator.set_per_page(&mut state, 100, None);
        assert_eq!((state.per_page, state.page), (100, 1));
        assert!(state.marks_ids.contains(&7));
    }

    #[test]
    fn pages_are_clamped_to_the_known_total() {
        let mut paginator = ResultsPaginator::new(Some(60));
        let mut state = FilterState::default();

        paginator.go_to(&mut state, 10);
        assert_eq!(state.page, 3);
        paginator.go_to(&mut state, 0);
        assert_eq!(state.page, 1);
        paginator.set_per_page(&mut state, 50, Some(4));
        assert_eq!((state.per_page, state.page), (50, 2));
    }

    #[test]
    fn huge_pages_never_overflow() {
        let mut paginator = ResultsPaginator::new(None);
        let mut state = FilterState::default();

        paginator.go_to(&mut state, u32::MAX);
        assert_eq!(state.page, MAX_PAGE);
        assert_eq!(paginator.next_page(&state), Some(u32::MAX));

        state.page = u32::MAX;
        assert_eq!(paginator.next_page(&state), None);
    }

    #[test]
    fn zero_total_toggles_the_empty_state() {
        let mut paginator = ResultsPaginator::new(Some(10));
        let state = FilterState::default();

        assert_eq!(paginator.apply_total(0), EmptyStateChange::Entered);
        assert!(!paginator.has_more(&state));
        assert_eq!(paginator.apply_total(0), EmptyStateChange::Unchanged);
        assert_eq!(paginator.apply_total(40), EmptyStateChange::Cleared);
        assert!(paginator.has_more(&state));
    }
}
