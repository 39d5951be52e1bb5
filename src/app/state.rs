use std::cmp::Ordering;

use chrono::{DateTime, Local};
use tracing::{debug, warn};
use tui::widgets::TableState;

use crate::models::config::Config;
use crate::models::market::MarketRecord;
use crate::services::api::ApiError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputMode {
    Normal,
    Editing,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SortColumn {
    Rank,
    Price,
    Change24h,
    Volume24h,
    MarketCap,
}

impl SortColumn {
    pub fn next(self) -> SortColumn {
        match self {
            SortColumn::Rank => SortColumn::Price,
            SortColumn::Price => SortColumn::Change24h,
            SortColumn::Change24h => SortColumn::Volume24h,
            SortColumn::Volume24h => SortColumn::MarketCap,
            SortColumn::MarketCap => SortColumn::Rank,
        }
    }

    fn key(self, record: &MarketRecord) -> Option<f64> {
        match self {
            SortColumn::Rank => record.rank.map(f64::from),
            SortColumn::Price => record.price,
            SortColumn::Change24h => record.change_24h_pct,
            SortColumn::Volume24h => record.volume_24h,
            SortColumn::MarketCap => record.market_cap,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Status {
    Idle,
    Loading,
    Error(String),
    NoResults(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum RequestKind {
    List,
    Search(String),
}

/// What the event loop should do after the user submits the search input
#[derive(Debug, Clone, PartialEq)]
pub enum SearchAction {
    /// Blank query: the unfiltered list is already restored, nothing to fetch
    Clear,
    Search { seq: u64, query: String },
}

/// Result of a spawned fetch, tagged with the request it answers
#[derive(Debug)]
pub struct FetchResponse {
    pub seq: u64,
    pub kind: RequestKind,
    pub result: Result<Vec<MarketRecord>, ApiError>,
}

pub struct App {
    pub config: Config,
    pub table_state: TableState,
    /// Records currently on screen, sorted
    pub items: Vec<MarketRecord>,
    /// Last unfiltered list, restored when a search is cleared
    pub base_items: Vec<MarketRecord>,
    pub query: Option<String>,
    pub status: Status,
    pub last_update: Option<DateTime<Local>>,
    pub sort_column: SortColumn,
    pub sort_ascending: bool,
    pub input_mode: InputMode,
    pub input: String,
    pub fill_area: bool,
    /// Chart axis shows `$64.1K` instead of full-precision prices
    pub compact_labels: bool,
    next_seq: u64,
    latest_list: u64,
    latest_search: u64,
    list_in_flight: bool,
}

impl App {
    pub fn new(config: Config) -> App {
        App {
            config,
            table_state: TableState::default(),
            items: Vec::new(),
            base_items: Vec::new(),
            query: None,
            status: Status::Idle,
            last_update: None,
            sort_column: SortColumn::Rank,
            sort_ascending: true,
            input_mode: InputMode::Normal,
            input: String::new(),
            fill_area: false,
            compact_labels: false,
            next_seq: 0,
            latest_list: 0,
            latest_search: 0,
            list_in_flight: false,
        }
    }

    pub fn enter_edit_mode(&mut self) {
        self.input_mode = InputMode::Editing;
        self.input.clear();
    }

    pub fn exit_edit_mode(&mut self) {
        self.input_mode = InputMode::Normal;
        self.input.clear();
    }

    pub fn selected(&self) -> Option<&MarketRecord> {
        self.table_state.selected().and_then(|i| self.items.get(i))
    }

    /// Issues a sequence number for a fetch of the unfiltered list
    pub fn begin_refresh(&mut self) -> u64 {
        self.latest_list = self.issue_seq();
        self.list_in_flight = true;
        if self.query.is_none() {
            self.status = Status::Loading;
        }
        self.latest_list
    }

    /// Turns the input buffer into a search, or clears the active search
    /// when the input is blank
    pub fn submit_search(&mut self) -> SearchAction {
        let query = self.input.trim().to_string();
        self.exit_edit_mode();

        if query.is_empty() {
            self.clear_search();
            return SearchAction::Clear;
        }

        self.latest_search = self.issue_seq();
        self.query = Some(query.clone());
        self.status = Status::Loading;
        SearchAction::Search {
            seq: self.latest_search,
            query,
        }
    }

    pub fn clear_search(&mut self) {
        // Drop any search still in flight
        self.latest_search = self.issue_seq();
        self.query = None;
        self.status = if self.list_in_flight {
            Status::Loading
        } else {
            Status::Idle
        };
        let base = self.base_items.clone();
        self.replace_items(base);
    }

    /// Applies a finished fetch; returns false when a newer request of the
    /// same kind has superseded it
    pub fn apply_response(&mut self, response: FetchResponse) -> bool {
        let FetchResponse { seq, kind, result } = response;

        match kind {
            RequestKind::List => {
                if seq != self.latest_list {
                    debug!(seq, latest = self.latest_list, "dropping stale list response");
                    return false;
                }
                self.list_in_flight = false;
                match result {
                    Ok(records) => {
                        self.base_items = records;
                        self.last_update = Some(Local::now());
                        if self.query.is_none() {
                            self.status = Status::Idle;
                            let base = self.base_items.clone();
                            self.replace_items(base);
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "list fetch failed");
                        if self.query.is_none() {
                            self.status = Status::Error(e.to_string());
                        }
                    }
                }
            }
            RequestKind::Search(query) => {
                if seq != self.latest_search || self.query.as_deref() != Some(query.as_str()) {
                    debug!(seq, latest = self.latest_search, "dropping stale search response");
                    return false;
                }
                match result {
                    Ok(records) if records.is_empty() => {
                        self.status = Status::NoResults(query);
                        self.replace_items(Vec::new());
                    }
                    Ok(records) => {
                        self.status = Status::Idle;
                        self.last_update = Some(Local::now());
                        self.replace_items(records);
                    }
                    Err(e) => {
                        warn!(error = %e, query = %query, "search failed");
                        self.status = Status::Error(e.to_string());
                    }
                }
            }
        }
        true
    }

    pub fn next(&mut self) {
        if self.items.is_empty() {
            return;
        }
        let i = match self.table_state.selected() {
            Some(i) => {
                if i >= self.items.len() - 1 {
                    0
                } else {
                    i + 1
                }
            }
            None => 0,
        };
        self.table_state.select(Some(i));
    }

    pub fn previous(&mut self) {
        if self.items.is_empty() {
            return;
        }
        let i = match self.table_state.selected() {
            Some(i) => {
                if i == 0 {
                    self.items.len() - 1
                } else {
                    i - 1
                }
            }
            None => 0,
        };
        self.table_state.select(Some(i));
    }

    pub fn cycle_sort(&mut self) {
        self.sort_column = self.sort_column.next();
        // Rank reads naturally ascending, everything else largest first
        self.sort_ascending = self.sort_column == SortColumn::Rank;
        self.resort();
    }

    pub fn toggle_sort_direction(&mut self) {
        self.sort_ascending = !self.sort_ascending;
        self.resort();
    }

    pub fn toggle_fill_area(&mut self) {
        self.fill_area = !self.fill_area;
    }

    pub fn toggle_compact_labels(&mut self) {
        self.compact_labels = !self.compact_labels;
    }

    fn resort(&mut self) {
        let items = self.items.clone();
        self.replace_items(items);
    }

    /// Swaps in a new list, keeping the selected coin selected when it survives
    fn replace_items(&mut self, mut records: Vec<MarketRecord>) {
        let selected_id = self.selected().map(|r| r.id.clone());

        let column = self.sort_column;
        let ascending = self.sort_ascending;
        records.sort_by(|a, b| compare_optional(column.key(a), column.key(b), ascending));
        self.items = records;

        let index = selected_id
            .and_then(|id| self.items.iter().position(|r| r.id == id))
            .or(if self.items.is_empty() { None } else { Some(0) });
        self.table_state.select(index);
    }

    fn issue_seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }
}

/// Orders present values by direction and always puts absent values last
fn compare_optional(a: Option<f64>, b: Option<f64>, ascending: bool) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => {
            let cmp = x.partial_cmp(&y).unwrap_or(Ordering::Equal);
            if ascending {
                cmp
            } else {
                cmp.reverse()
            }
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    fn record(id: &str, rank: Option<u32>, price: Option<f64>) -> MarketRecord {
        MarketRecord {
            id: id.to_string(),
            name: id.to_string(),
            symbol: id.to_uppercase(),
            rank,
            price,
            ..MarketRecord::default()
        }
    }

    fn loaded_app() -> App {
        let mut app = App::new(Config::default());
        let seq = app.begin_refresh();
        app.apply_response(FetchResponse {
            seq,
            kind: RequestKind::List,
            result: Ok(vec![
                record("ethereum", Some(2), Some(3100.0)),
                record("bitcoin", Some(1), Some(64000.0)),
                record("pepe", Some(30), Some(0.00000456)),
            ]),
        });
        app
    }

    fn ids(app: &App) -> Vec<&str> {
        app.items.iter().map(|r| r.id.as_str()).collect()
    }

    fn search(app: &mut App, query: &str) -> SearchAction {
        app.enter_edit_mode();
        app.input = query.to_string();
        app.submit_search()
    }

    #[test]
    fn test_list_response_sorted_by_rank() {
        let app = loaded_app();
        assert_eq!(ids(&app), vec!["bitcoin", "ethereum", "pepe"]);
        assert_eq!(app.status, Status::Idle);
        assert_eq!(app.table_state.selected(), Some(0));
        assert!(app.last_update.is_some());
    }

    #[test]
    fn test_blank_search_restores_unfiltered_list() {
        let mut app = loaded_app();
        let SearchAction::Search { seq, query } = search(&mut app, "pepe") else {
            panic!("expected a search");
        };
        app.apply_response(FetchResponse {
            seq,
            kind: RequestKind::Search(query),
            result: Ok(vec![record("pepe", Some(30), Some(0.00000456))]),
        });
        assert_eq!(ids(&app), vec!["pepe"]);

        assert_eq!(search(&mut app, "   \t "), SearchAction::Clear);
        assert_eq!(app.query, None);
        assert_eq!(app.status, Status::Idle);
        assert_eq!(ids(&app), vec!["bitcoin", "ethereum", "pepe"]);
        assert_eq!(app.input_mode, InputMode::Normal);
    }

    #[test]
    fn test_search_query_is_trimmed() {
        let mut app = loaded_app();
        match search(&mut app, "  doge ") {
            SearchAction::Search { query, .. } => assert_eq!(query, "doge"),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(app.status, Status::Loading);
    }

    #[test]
    fn test_stale_search_response_is_dropped() {
        let mut app = loaded_app();
        let SearchAction::Search { seq: first, query: first_query } = search(&mut app, "eth") else {
            panic!("expected a search");
        };
        let SearchAction::Search { seq: second, query: second_query } = search(&mut app, "sol") else {
            panic!("expected a search");
        };

        let applied = app.apply_response(FetchResponse {
            seq: second,
            kind: RequestKind::Search(second_query),
            result: Ok(vec![record("solana", Some(5), Some(150.0))]),
        });
        assert!(applied);

        let applied = app.apply_response(FetchResponse {
            seq: first,
            kind: RequestKind::Search(first_query),
            result: Ok(vec![record("ethereum", Some(2), Some(3100.0))]),
        });
        assert!(!applied);
        assert_eq!(ids(&app), vec!["solana"]);
    }

    #[test]
    fn test_search_after_clear_is_dropped() {
        let mut app = loaded_app();
        let SearchAction::Search { seq, query } = search(&mut app, "eth") else {
            panic!("expected a search");
        };
        app.clear_search();

        assert!(!app.apply_response(FetchResponse {
            seq,
            kind: RequestKind::Search(query),
            result: Ok(vec![record("ethereum", Some(2), Some(3100.0))]),
        }));
        assert_eq!(ids(&app), vec!["bitcoin", "ethereum", "pepe"]);
    }

    #[test]
    fn test_empty_search_reports_no_results() {
        let mut app = loaded_app();
        let SearchAction::Search { seq, query } = search(&mut app, "zzzz") else {
            panic!("expected a search");
        };
        app.apply_response(FetchResponse {
            seq,
            kind: RequestKind::Search(query),
            result: Ok(Vec::new()),
        });
        assert_eq!(app.status, Status::NoResults("zzzz".to_string()));
        assert!(app.items.is_empty());
        assert_eq!(app.table_state.selected(), None);
        assert_eq!(app.base_items.len(), 3);
    }

    #[test]
    fn test_failed_refresh_keeps_previous_list() {
        let mut app = loaded_app();
        let seq = app.begin_refresh();
        app.apply_response(FetchResponse {
            seq,
            kind: RequestKind::List,
            result: Err(ApiError::Status {
                status: StatusCode::TOO_MANY_REQUESTS,
                body: "slow down".to_string(),
            }),
        });
        assert!(matches!(app.status, Status::Error(ref msg) if msg.contains("429")));
        assert_eq!(app.items.len(), 3);
    }

    #[test]
    fn test_refresh_during_search_updates_base_only() {
        let mut app = loaded_app();
        let SearchAction::Search { seq, query } = search(&mut app, "pepe") else {
            panic!("expected a search");
        };
        app.apply_response(FetchResponse {
            seq,
            kind: RequestKind::Search(query),
            result: Ok(vec![record("pepe", Some(30), Some(0.00000456))]),
        });

        let seq = app.begin_refresh();
        app.apply_response(FetchResponse {
            seq,
            kind: RequestKind::List,
            result: Ok(vec![record("bitcoin", Some(1), Some(65000.0))]),
        });
        assert_eq!(ids(&app), vec!["pepe"]);
        assert_eq!(app.base_items.len(), 1);
    }

    #[test]
    fn test_sort_puts_missing_values_last() {
        let mut app = loaded_app();
        let seq = app.begin_refresh();
        app.apply_response(FetchResponse {
            seq,
            kind: RequestKind::List,
            result: Ok(vec![
                record("a", Some(3), Some(2.0)),
                record("b", Some(1), None),
                record("c", Some(2), Some(9.0)),
            ]),
        });

        app.cycle_sort();
        assert_eq!(app.sort_column, SortColumn::Price);
        assert!(!app.sort_ascending);
        assert_eq!(ids(&app), vec!["c", "a", "b"]);

        app.toggle_sort_direction();
        assert_eq!(ids(&app), vec!["a", "c", "b"]);
    }

    #[test]
    fn test_selection_follows_coin_across_resort() {
        let mut app = loaded_app();
        app.next();
        assert_eq!(app.selected().map(|r| r.id.as_str()), Some("ethereum"));
        app.toggle_sort_direction();
        assert_eq!(app.selected().map(|r| r.id.as_str()), Some("ethereum"));
    }

    #[test]
    fn test_clear_while_list_loading_stays_loading() {
        let mut app = App::new(Config::default());
        let seq = app.begin_refresh();

        app.clear_search();
        assert_eq!(app.status, Status::Loading);

        app.apply_response(FetchResponse {
            seq,
            kind: RequestKind::List,
            result: Ok(vec![record("bitcoin", Some(1), Some(64000.0))]),
        });
        app.clear_search();
        assert_eq!(app.status, Status::Idle);
    }

    #[test]
    fn test_chart_toggles() {
        let mut app = App::new(Config::default());
        assert!(!app.fill_area && !app.compact_labels);
        app.toggle_fill_area();
        app.toggle_compact_labels();
        assert!(app.fill_area && app.compact_labels);
        app.toggle_compact_labels();
        assert!(!app.compact_labels);
    }

    #[test]
    fn test_navigation_wraps_and_ignores_empty() {
        let mut app = App::new(Config::default());
        app.next();
        app.previous();
        assert_eq!(app.table_state.selected(), None);

        let mut app = loaded_app();
        app.previous();
        assert_eq!(app.table_state.selected(), Some(2));
        app.next();
        assert_eq!(app.table_state.selected(), Some(0));
    }
}
