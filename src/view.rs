//! Client-side list projection
//!
//! Derives the currently visible window of a collection purely from an
//! explicit [`ViewState`] — search term, sort key and direction, page —
//! with no I/O and no server support. The projection never mutates its
//! inputs, so it can be re-run on every event and replayed in tests.
//!
//! `ViewState` persists across projections (the worker keeps one per
//! screen in KV) and changes only through its three event methods.

use serde::{Deserialize, Serialize};

use crate::types::{Record, field_number, field_text};

/// Sort direction for the active sort key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    fn toggled(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }
}

/// Search, sort and pagination state of one list screen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewState {
    pub search_term: String,
    pub sort_key: String,
    pub sort_direction: SortDirection,
    /// Current page, 1-based. May point past the filtered collection,
    /// which yields an empty window rather than an error.
    pub page: usize,
    pub page_size: usize,
}

impl ViewState {
    /// Fresh state: empty search, ascending on the given key, first page
    pub fn new(sort_key: impl Into<String>, page_size: usize) -> Self {
        Self {
            search_term: String::new(),
            sort_key: sort_key.into(),
            sort_direction: SortDirection::Ascending,
            page: 1,
            page_size,
        }
    }

    /// Search event: set the term and reset to the first page
    pub fn search(&mut self, term: &str) {
        self.search_term = term.to_string();
        self.page = 1;
    }

    /// Sort event: reselecting the active key toggles the direction,
    /// selecting a new key resets it to ascending. The page is preserved.
    pub fn sort_by(&mut self, key: &str) {
        if self.sort_key == key {
            self.sort_direction = self.sort_direction.toggled();
        } else {
            self.sort_key = key.to_string();
            self.sort_direction = SortDirection::Ascending;
        }
    }

    /// Page event: clamp the requested page into `[1, max(1, page_count)]`
    pub fn go_to_page(&mut self, page: usize, page_count: usize) {
        self.page = page.clamp(1, page_count.max(1));
    }
}

/// Per-screen column declaration: which fields a search term matches
/// against and which sort keys compare numerically
#[derive(Debug, Clone, Copy)]
pub struct Columns {
    pub searchable: &'static [&'static str],
    pub numeric: &'static [&'static str],
}

/// The visible window of a projected collection
#[derive(Debug)]
pub struct PageView {
    /// The slice `[(page-1)*page_size, page*page_size)` of the
    /// filtered and sorted collection
    pub items: Vec<Record>,

    /// Item count after filtering, before pagination
    pub filtered_count: usize,

    /// `ceil(filtered_count / page_size)`; zero for an empty result
    pub page_count: usize,
}

/// Derive the visible window of `items` under `state`.
///
/// Filtering retains an item iff the search term is a case-insensitive
/// substring of at least one searchable field; a blank term retains all.
/// Sorting is stable: ties keep their relative order from the filtered
/// collection, and descending reverses the comparison, not the tie-break.
pub fn project(items: &[Record], state: &ViewState, columns: &Columns) -> PageView {
    let term = state.search_term.to_lowercase();
    let searching = !term.trim().is_empty();

    let mut filtered: Vec<&Record> = items
        .iter()
        .filter(|item| {
            if !searching {
                return true;
            }
            columns.searchable.iter().any(|field| {
                field_text(item, field).is_some_and(|text| text.to_lowercase().contains(&term))
            })
        })
        .collect();

    let sort_key = state.sort_key.as_str();
    let numeric = columns.numeric.contains(&sort_key);
    filtered.sort_by(|a, b| {
        let ordering = if numeric {
            field_number(a, sort_key).total_cmp(&field_number(b, sort_key))
        } else {
            let left = field_text(a, sort_key).unwrap_or_default();
            let right = field_text(b, sort_key).unwrap_or_default();
            left.cmp(&right)
        };
        match state.sort_direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    });

    let filtered_count = filtered.len();
    let size = state.page_size.max(1);
    let page_count = filtered_count.div_ceil(size);
    let start = state.page.saturating_sub(1).saturating_mul(size);

    let items = filtered.into_iter().skip(start).take(size).cloned().collect();

    PageView {
        items,
        filtered_count,
        page_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const COLUMNS: Columns = Columns {
        searchable: &["symbol", "name"],
        numeric: &["last_price", "change_percent"],
    };

    fn record(value: serde_json::Value) -> Record {
        value.as_object().expect("test record must be an object").clone()
    }

    fn stocks() -> Vec<Record> {
        vec![
            record(json!({ "symbol": "AAPL", "name": "Apple Inc.", "last_price": 173.45 })),
            record(json!({ "symbol": "MSFT", "name": "Microsoft Corporation", "last_price": 324.78 })),
            record(json!({ "symbol": "GOOGL", "name": "Alphabet Inc.", "last_price": 134.56 })),
            record(json!({ "symbol": "AMZN", "name": "Amazon.com, Inc.", "last_price": 167.89 })),
        ]
    }

    // 23 stocks with distinct prices 1.0..=23.0, shuffled deterministically
    fn many_stocks() -> Vec<Record> {
        let mut items = Vec::new();
        for i in 1..=23u32 {
            let scrambled = (i * 7) % 23 + 1;
            items.push(record(json!({
                "symbol": format!("SYM{scrambled:02}"),
                "name": format!("Company {scrambled}"),
                "last_price": f64::from(scrambled),
            })));
        }
        items
    }

    #[test]
    fn test_empty_search_is_no_op_filter() {
        let items = stocks();
        let state = ViewState::new("symbol", 2);
        let view = project(&items, &state, &COLUMNS);

        assert_eq!(view.filtered_count, items.len());
        assert_eq!(view.page_count, 2);
        // Sorted ascending by symbol, first page of 2
        assert_eq!(view.items[0]["symbol"], json!("AAPL"));
        assert_eq!(view.items[1]["symbol"], json!("AMZN"));
    }

    #[test]
    fn test_search_matches_any_searchable_field() {
        let items = stocks();
        let mut state = ViewState::new("symbol", 10);
        state.search("corporation");

        let view = project(&items, &state, &COLUMNS);

        assert_eq!(view.filtered_count, 1);
        assert_eq!(view.items[0]["symbol"], json!("MSFT"));
        // Every retained item contains the term in a searchable field;
        // nothing else slipped through.
        for item in &view.items {
            let hit = COLUMNS.searchable.iter().any(|f| {
                field_text(item, f).is_some_and(|t| t.to_lowercase().contains("corporation"))
            });
            assert!(hit);
        }
    }

    #[test]
    fn test_whitespace_search_retains_all() {
        let items = stocks();
        let mut state = ViewState::new("symbol", 10);
        state.search("   ");

        let view = project(&items, &state, &COLUMNS);
        assert_eq!(view.filtered_count, items.len());
    }

    #[test]
    fn test_sort_is_stable_on_ties() {
        let items = vec![
            record(json!({ "symbol": "AAA", "name": "First", "last_price": 10.0 })),
            record(json!({ "symbol": "BBB", "name": "Second", "last_price": 10.0 })),
            record(json!({ "symbol": "CCC", "name": "Third", "last_price": 5.0 })),
        ];
        let mut state = ViewState::new("last_price", 10);
        let view = project(&items, &state, &COLUMNS);
        assert_eq!(view.items[0]["symbol"], json!("CCC"));
        assert_eq!(view.items[1]["symbol"], json!("AAA"));
        assert_eq!(view.items[2]["symbol"], json!("BBB"));

        // Descending reverses the comparison, not the tie-break
        state.sort_direction = SortDirection::Descending;
        let view = project(&items, &state, &COLUMNS);
        assert_eq!(view.items[0]["symbol"], json!("AAA"));
        assert_eq!(view.items[1]["symbol"], json!("BBB"));
        assert_eq!(view.items[2]["symbol"], json!("CCC"));
    }

    #[test]
    fn test_unparseable_numeric_sorts_as_zero() {
        let items = vec![
            record(json!({ "symbol": "AAA", "last_price": "n/a" })),
            record(json!({ "symbol": "BBB", "last_price": -1.0 })),
            record(json!({ "symbol": "CCC", "last_price": 3.0 })),
        ];
        let state = ViewState::new("last_price", 10);
        let view = project(&items, &state, &COLUMNS);
        assert_eq!(view.items[0]["symbol"], json!("BBB"));
        assert_eq!(view.items[1]["symbol"], json!("AAA"));
        assert_eq!(view.items[2]["symbol"], json!("CCC"));
    }

    #[test]
    fn test_page_beyond_range_is_empty_not_an_error() {
        let items = stocks();
        let mut state = ViewState::new("symbol", 10);
        state.page = 7;

        let view = project(&items, &state, &COLUMNS);
        assert!(view.items.is_empty());
        assert_eq!(view.filtered_count, 4);
        assert_eq!(view.page_count, 1);
    }

    #[test]
    fn test_descending_numeric_last_page_has_smallest() {
        // 23 items, page size 10, numeric descending, page 3:
        // 3 items, being the three smallest prices.
        let items = many_stocks();
        let mut state = ViewState::new("last_price", 10);
        state.sort_direction = SortDirection::Descending;
        state.page = 3;

        let view = project(&items, &state, &COLUMNS);

        assert_eq!(view.filtered_count, 23);
        assert_eq!(view.page_count, 3);
        assert_eq!(view.items.len(), 3);
        let prices: Vec<f64> = view.items.iter().map(|i| field_number(i, "last_price")).collect();
        assert_eq!(prices, vec![3.0, 2.0, 1.0]);
    }

    #[test]
    fn test_search_resets_page_to_first() {
        // Caller is on page 2 when a search narrows 23 items to 4:
        // the page is forced back to 1 and the window shows all matches.
        let mut items = many_stocks();
        for (i, item) in items.iter_mut().take(4).enumerate() {
            item.insert("name".to_string(), json!(format!("Acme Unit {i}")));
        }
        let mut state = ViewState::new("symbol", 10);
        state.go_to_page(2, 3);
        assert_eq!(state.page, 2);

        state.search("acme");
        assert_eq!(state.page, 1);

        let view = project(&items, &state, &COLUMNS);
        assert_eq!(view.filtered_count, 4);
        assert_eq!(view.items.len(), 4);
        assert_eq!(view.page_count, 1);
    }

    #[test]
    fn test_sort_event_toggles_and_resets() {
        let mut state = ViewState::new("symbol", 10);
        state.go_to_page(2, 5);

        // Reselecting the active key flips direction, page untouched
        state.sort_by("symbol");
        assert_eq!(state.sort_direction, SortDirection::Descending);
        assert_eq!(state.page, 2);

        state.sort_by("symbol");
        assert_eq!(state.sort_direction, SortDirection::Ascending);

        // A new key resets to ascending
        state.sort_by("symbol");
        state.sort_by("last_price");
        assert_eq!(state.sort_key, "last_price");
        assert_eq!(state.sort_direction, SortDirection::Ascending);
        assert_eq!(state.page, 2);
    }

    #[test]
    fn test_page_event_clamps_into_range() {
        let mut state = ViewState::new("symbol", 10);

        state.go_to_page(7, 3);
        assert_eq!(state.page, 3);

        state.go_to_page(0, 3);
        assert_eq!(state.page, 1);

        // Empty collection: page count 0 still leaves a valid page 1
        state.go_to_page(5, 0);
        assert_eq!(state.page, 1);
    }

    #[test]
    fn test_view_state_serde_round_trip() {
        let mut state = ViewState::new("last_price", 25);
        state.search("apple");
        state.sort_by("last_price");

        let encoded = serde_json::to_string(&state).unwrap();
        let decoded: ViewState = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, state);
    }

    #[test]
    fn test_projection_does_not_mutate_inputs() {
        let items = stocks();
        let before = items.clone();
        let state = ViewState::new("symbol", 2);

        let _ = project(&items, &state, &COLUMNS);

        assert_eq!(items, before);
    }
}
