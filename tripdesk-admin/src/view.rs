use std::cmp::Ordering;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tripdesk_core::Booking;

pub const PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FilterMode {
    #[default]
    All,
    /// Only bookings travelling on the current date.
    Today,
    /// Every booking, highest price first.
    Revenue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    Name,
    TravelDate,
    Price,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub key: SortKey,
    pub direction: SortDirection,
}

/// Operator-selected view parameters. Holds no rows of its own.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub filter: FilterMode,
    pub search: String,
    pub sort: Option<SortSpec>,
    /// 1-based.
    pub page: usize,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            filter: FilterMode::All,
            search: String::new(),
            sort: None,
            page: 1,
        }
    }
}

/// One rendered page plus the numbers needed for pager controls.
#[derive(Debug, Clone)]
pub struct PageView<'a> {
    pub rows: Vec<&'a Booking>,
    pub page: usize,
    pub total_pages: usize,
    pub total_rows: usize,
}

impl ViewState {
    pub fn set_filter(&mut self, filter: FilterMode) {
        self.filter = filter;
    }

    /// Changing the term sends the operator back to the first page.
    pub fn set_search(&mut self, term: impl Into<String>) {
        let term = term.into();
        if term != self.search {
            self.search = term;
            self.page = 1;
        }
    }

    /// Selecting the active key flips its direction; a new key starts ascending.
    pub fn toggle_sort(&mut self, key: SortKey) {
        self.sort = Some(match self.sort {
            Some(spec) if spec.key == key => SortSpec { key, direction: spec.direction.flipped() },
            _ => SortSpec { key, direction: SortDirection::Asc },
        });
    }

    pub fn set_page(&mut self, page: usize) {
        self.page = page;
    }

    /// Filter, search and sort, in that order. This is the collection that
    /// pagination slices and export materializes.
    pub fn apply<'a>(&self, rows: &'a [Booking], today: NaiveDate) -> Vec<&'a Booking> {
        let filtered = filter_rows(rows, self.filter, today);
        let mut found = search_rows(filtered, &self.search);
        if let Some(spec) = self.sort {
            sort_rows(&mut found, spec);
        }
        found
    }

    pub fn visible<'a>(&self, rows: &'a [Booking], today: NaiveDate) -> PageView<'a> {
        let all = self.apply(rows, today);
        let total_rows = all.len();
        PageView {
            rows: paginate(&all, self.page).to_vec(),
            page: self.page,
            total_pages: total_pages(total_rows),
            total_rows,
        }
    }
}

pub fn filter_rows(rows: &[Booking], mode: FilterMode, today: NaiveDate) -> Vec<&Booking> {
    match mode {
        FilterMode::All => rows.iter().collect(),
        FilterMode::Today => rows.iter().filter(|b| b.travel_date == today).collect(),
        FilterMode::Revenue => {
            let mut out: Vec<&Booking> = rows.iter().collect();
            out.sort_by(|a, b| b.price.total_cmp(&a.price));
            out
        }
    }
}

/// Case-insensitive substring match over name, email and place. Keeps order.
pub fn search_rows<'a>(rows: Vec<&'a Booking>, term: &str) -> Vec<&'a Booking> {
    if term.is_empty() {
        return rows;
    }
    let needle = term.to_lowercase();
    rows.into_iter()
        .filter(|b| {
            format!("{} {} {}", b.name, b.email, b.place_name)
                .to_lowercase()
                .contains(&needle)
        })
        .collect()
}

fn compare(a: &Booking, b: &Booking, key: SortKey) -> Ordering {
    match key {
        SortKey::Name => a.name.cmp(&b.name),
        SortKey::TravelDate => a.travel_date.cmp(&b.travel_date),
        SortKey::Price => a.price.total_cmp(&b.price),
    }
}

/// Stable in both directions: equal keys keep their incoming order.
pub fn sort_rows(rows: &mut [&Booking], spec: SortSpec) {
    match spec.direction {
        SortDirection::Asc => rows.sort_by(|a, b| compare(a, b, spec.key)),
        SortDirection::Desc => rows.sort_by(|a, b| compare(b, a, spec.key)),
    }
}

/// Page `page` (1-based) of `rows`. Page 0 and pages past the end are empty.
pub fn paginate<T>(rows: &[T], page: usize) -> &[T] {
    if page == 0 {
        return &[];
    }
    let start = (page - 1).saturating_mul(PAGE_SIZE);
    if start >= rows.len() {
        return &[];
    }
    let end = (start + PAGE_SIZE).min(rows.len());
    &rows[start..end]
}

pub fn total_pages(total_rows: usize) -> usize {
    total_rows.div_ceil(PAGE_SIZE)
}
