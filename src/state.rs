//! Viewer state and the single function that changes it.
//!
//! UI code never mutates the state directly: it emits an [`Intent`], and
//! [`ViewerState::update`] applies it and returns the [`Command`]s the shell
//! has to carry out (network, clipboard, repaint).

use crate::config::AppConfig;
use crate::detail::{show_details, DetailDialog, DetailView};
use crate::fetcher::FetchOutcome;
use crate::markup;
use crate::query::{FetchRequest, ParamKey, QueryParams};
use crate::record::LogRecord;
use crate::search::SearchHighlighter;
use crate::virtual_list::{
    ListGeometry, RenderScheduler, RowView, RowWindow, ViewportState, VirtualList,
};
use std::path::PathBuf;
use std::time::Duration;

pub const LOADING_TEXT: &str = "Loading...";
pub const EMPTY_TEXT: &str = "No logs found.";

#[derive(Debug)]
pub enum Intent {
    SetParam(ParamKey, String),
    SetEndpoint(String),
    Refresh,
    Scroll(f32),
    Resize(f32),
    ShowDetail(usize),
    CloseDetail,
    Copy,
    Tick,
    Export(PathBuf),
    FetchSettled(FetchOutcome),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Fetch(FetchRequest),
    CopyToClipboard(String),
    RequestRepaint,
    RequestRepaintAfter(Duration),
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadState {
    Idle,
    Loading,
    Loaded,
    Failed(String),
}

/// What the list area shows this frame.
#[derive(Debug, PartialEq)]
pub enum ListContent<'a> {
    Idle,
    Loading,
    Empty,
    Failed(&'a str),
    Rows(&'a RowWindow),
}

pub struct ViewerState {
    endpoint: String,
    params: QueryParams,
    records: Vec<LogRecord>,
    viewport: ViewportState,
    loading: bool,
    load_state: LoadState,
    list: VirtualList,
    window: Option<RowWindow>,
    scheduler: RenderScheduler,
    dialog: DetailDialog,
    copy_feedback: Duration,
    highlighter: SearchHighlighter,
    issued_seq: u64,
    applied_seq: u64,
    notice: Option<String>,
}

impl ViewerState {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            endpoint: config.endpoint.clone(),
            params: config.default_params.clone(),
            records: Vec::new(),
            viewport: ViewportState::default(),
            loading: false,
            load_state: LoadState::Idle,
            list: VirtualList::new(ListGeometry::new(config.item_height, config.buffer)),
            window: None,
            scheduler: RenderScheduler::default(),
            dialog: DetailDialog::default(),
            copy_feedback: config.copy_feedback,
            highlighter: SearchHighlighter::new(),
            issued_seq: 0,
            applied_seq: 0,
            notice: None,
        }
    }

    pub fn update(&mut self, intent: Intent, now: f64) -> Vec<Command> {
        match intent {
            Intent::SetParam(key, value) => {
                self.params.set(key, value);
                Vec::new()
            }
            Intent::SetEndpoint(endpoint) => {
                self.endpoint = endpoint;
                Vec::new()
            }
            Intent::Refresh => self.submit_query(),
            Intent::Scroll(offset) => {
                if self.viewport.scroll_to(offset) {
                    self.schedule_render()
                } else {
                    Vec::new()
                }
            }
            Intent::Resize(height) => {
                if self.viewport.resize(height) {
                    self.schedule_render()
                } else {
                    Vec::new()
                }
            }
            Intent::ShowDetail(index) => {
                match show_details(&self.records, index) {
                    Some(view) => self.dialog.open(view),
                    None => log::warn!(
                        "Ignoring details for row {} of {}",
                        index,
                        self.records.len()
                    ),
                }
                Vec::new()
            }
            Intent::CloseDetail => {
                self.dialog.close();
                Vec::new()
            }
            Intent::Copy => {
                let Some(text) = self.dialog.view().map(|view| view.copy_text.clone()) else {
                    return Vec::new();
                };
                self.dialog
                    .copy_feedback_mut()
                    .confirm(now, self.copy_feedback);
                vec![
                    Command::CopyToClipboard(text),
                    Command::RequestRepaintAfter(self.copy_feedback),
                ]
            }
            Intent::Tick => {
                let feedback = self.dialog.copy_feedback_mut();
                if feedback.tick(now) {
                    vec![Command::RequestRepaint]
                } else {
                    feedback
                        .remaining(now)
                        .map(Command::RequestRepaintAfter)
                        .into_iter()
                        .collect()
                }
            }
            Intent::Export(path) => {
                self.export(path);
                Vec::new()
            }
            Intent::FetchSettled(outcome) => self.apply_outcome(outcome),
        }
    }

    fn submit_query(&mut self) -> Vec<Command> {
        self.issued_seq += 1;
        self.loading = true;
        self.load_state = LoadState::Loading;
        self.window = None;
        self.notice = None;
        self.highlighter.set_term(self.params.get(ParamKey::Search));

        log::info!("Fetching logs with {:?}", self.params);
        let request = FetchRequest::new(self.issued_seq, &self.endpoint, &self.params);
        let mut commands = vec![Command::Fetch(request)];
        commands.extend(self.schedule_render());
        commands
    }

    fn apply_outcome(&mut self, outcome: FetchOutcome) -> Vec<Command> {
        if outcome.seq <= self.applied_seq {
            log::debug!(
                "Discarding stale response #{} (already applied #{})",
                outcome.seq,
                self.applied_seq
            );
            return Vec::new();
        }
        self.applied_seq = outcome.seq;

        match outcome.result {
            Ok(records) => {
                log::info!("Received response #{}: {} records", outcome.seq, records.len());
                if records.is_empty() {
                    log::info!("No logs to render");
                }
                self.records = records;
                self.load_state = LoadState::Loaded;
            }
            Err(err) => {
                log::error!("Fetching logs failed ({}): {}", err.kind(), err);
                self.load_state = LoadState::Failed(err.to_string());
            }
        }

        self.loading = self.applied_seq < self.issued_seq;
        if !self.loading {
            log::info!("Loading completed");
        }
        self.schedule_render()
    }

    fn schedule_render(&mut self) -> Vec<Command> {
        if self.scheduler.request() {
            vec![Command::RequestRepaint]
        } else {
            Vec::new()
        }
    }

    /// Runs the pending render, if any. The previous window is replaced
    /// wholesale, never patched.
    pub fn run_pending_render(&mut self) -> bool {
        let stale = self.window.is_none() && !self.loading && !self.records.is_empty();
        if self.scheduler.take() || stale {
            self.window = self.list.render(&self.records, &self.viewport, self.loading);
            true
        } else {
            false
        }
    }

    pub fn list_content(&self) -> ListContent<'_> {
        if self.loading {
            return ListContent::Loading;
        }
        match &self.load_state {
            LoadState::Idle => ListContent::Idle,
            LoadState::Loading => ListContent::Loading,
            LoadState::Failed(message) => ListContent::Failed(message),
            LoadState::Loaded => match &self.window {
                Some(window) => ListContent::Rows(window),
                None => ListContent::Empty,
            },
        }
    }

    fn export(&mut self, path: PathBuf) {
        let geometry = self.list.geometry();
        let rows: Vec<RowView> = self
            .records
            .iter()
            .enumerate()
            .map(|(index, record)| RowView::from_record(index, record, geometry))
            .collect();
        let details: Vec<DetailView> = self
            .records
            .iter()
            .enumerate()
            .map(|(index, record)| DetailView::from_record(index, record))
            .collect();

        match markup::write_export(&path, &rows, &details, geometry) {
            Ok(()) => {
                log::info!("Exported {} records to {}", rows.len(), path.display());
                self.notice = Some(format!("Exported to {}", path.display()));
            }
            Err(err) => {
                log::error!("{}", err);
                self.notice = Some(err.to_string());
            }
        }
    }

    pub fn status_text(&self) -> &str {
        if self.loading {
            return LOADING_TEXT;
        }
        match &self.load_state {
            LoadState::Idle => "",
            LoadState::Loading => LOADING_TEXT,
            LoadState::Loaded => "Done.",
            LoadState::Failed(_) => "Something went wrong",
        }
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn records(&self) -> &[LogRecord] {
        &self.records
    }

    pub fn params(&self) -> &QueryParams {
        &self.params
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn geometry(&self) -> &ListGeometry {
        self.list.geometry()
    }

    /// Scroll extent for the current result set.
    pub fn total_height(&self) -> f32 {
        self.list.geometry().total_height(self.records.len())
    }

    pub fn dialog(&self) -> &DetailDialog {
        &self.dialog
    }

    pub fn highlighter(&self) -> &SearchHighlighter {
        &self.highlighter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detail::CopyFeedback;
    use crate::error::FetchError;

    fn state() -> ViewerState {
        ViewerState::new(&AppConfig::default())
    }

    fn records(n: usize) -> Vec<LogRecord> {
        (0..n)
            .map(|i| LogRecord {
                message: Some(format!("line {}", i)),
                ..Default::default()
            })
            .collect()
    }

    // Mirrors what the list panel does each frame.
    fn content(state: &mut ViewerState) -> ListContent<'_> {
        state.run_pending_render();
        state.list_content()
    }

    fn settle(state: &mut ViewerState, seq: u64, result: Result<Vec<LogRecord>, FetchError>) -> Vec<Command> {
        state.update(Intent::FetchSettled(FetchOutcome { seq, result }), 0.0)
    }

    #[test]
    fn test_refresh_shows_loading_and_fetches() {
        let mut state = state();
        state.update(Intent::SetParam(ParamKey::Level, "ERROR".into()), 0.0);
        let commands = state.update(Intent::Refresh, 0.0);

        assert_eq!(
            commands,
            vec![
                Command::Fetch(FetchRequest {
                    seq: 1,
                    url: "http://localhost:8081/v1/logs?limit=1000&level=ERROR&subscriber_type=file".into(),
                }),
                Command::RequestRepaint,
            ]
        );
        assert!(state.is_loading());
        assert_eq!(content(&mut state), ListContent::Loading);
        assert_eq!(state.status_text(), "Loading...");
    }

    #[test]
    fn test_successful_fetch_renders_window() {
        let mut state = state();
        state.update(Intent::Resize(800.0), 0.0);
        state.update(Intent::Scroll(4000.0), 0.0);
        state.update(Intent::Refresh, 0.0);
        settle(&mut state, 1, Ok(records(5000)));

        assert!(!state.is_loading());
        assert_eq!(state.total_height(), 400_000.0);
        match content(&mut state) {
            ListContent::Rows(window) => {
                assert_eq!(window.range, 40..70);
                assert_eq!(window.rows.len(), 30);
            }
            other => panic!("expected rows, got {:?}", other),
        }
        assert_eq!(state.status_text(), "Done.");
    }

    #[test]
    fn test_record_with_odd_field_types_still_renders() {
        let body = br#"[{"time":1705311005000,"level":"ERROR","message":"odd"},{"time":"2024-01-15T09:30:05Z","message":"normal"}]"#;
        let result = crate::fetcher::interpret_response(true, 200, "OK", body);
        let mut state = state();
        state.update(Intent::Resize(800.0), 0.0);
        state.update(Intent::Refresh, 0.0);
        settle(&mut state, 1, result);

        assert_eq!(state.status_text(), "Done.");
        match content(&mut state) {
            ListContent::Rows(window) => {
                assert_eq!(window.rows.len(), 2);
                assert_eq!(window.rows[0].message, "odd");
                assert_eq!(window.rows[0].level, "ERROR");
                assert_ne!(window.rows[0].time, "1705311005000");
                assert_eq!(window.rows[1].message, "normal");
            }
            other => panic!("expected rows, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_result_shows_no_logs() {
        let mut state = state();
        state.update(Intent::Refresh, 0.0);
        settle(&mut state, 1, Ok(Vec::new()));

        assert_eq!(content(&mut state), ListContent::Empty);
        assert_eq!(EMPTY_TEXT, "No logs found.");
        assert!(state.records().is_empty());
    }

    #[test]
    fn test_endpoint_failure_shows_inline_error() {
        let mut state = state();
        state.update(Intent::Refresh, 0.0);
        settle(
            &mut state,
            1,
            Err(FetchError::Endpoint {
                status: 500,
                status_text: "Internal Server Error".into(),
                body: "db unavailable".into(),
            }),
        );

        assert!(!state.is_loading());
        match content(&mut state) {
            ListContent::Failed(message) => assert!(message.contains("db unavailable")),
            other => panic!("expected failure, got {:?}", other),
        }
        assert_eq!(state.status_text(), "Something went wrong");
    }

    #[test]
    fn test_failure_keeps_previous_records() {
        let mut state = state();
        state.update(Intent::Refresh, 0.0);
        settle(&mut state, 1, Ok(records(3)));
        state.update(Intent::Refresh, 0.0);
        settle(&mut state, 2, Err(FetchError::Transport("offline".into())));

        assert_eq!(state.records().len(), 3);
        assert_eq!(content(&mut state), ListContent::Failed("offline"));
    }

    #[test]
    fn test_stale_response_is_discarded() {
        let mut state = state();
        state.update(Intent::Refresh, 0.0);
        state.update(Intent::Refresh, 0.0);

        settle(&mut state, 2, Ok(records(2)));
        assert!(!state.is_loading());
        let commands = settle(&mut state, 1, Ok(records(7)));

        assert!(commands.is_empty());
        assert_eq!(state.records().len(), 2);
    }

    #[test]
    fn test_older_response_keeps_loading_until_latest() {
        let mut state = state();
        state.update(Intent::Refresh, 0.0);
        state.update(Intent::Refresh, 0.0);

        settle(&mut state, 1, Ok(records(7)));
        assert!(state.is_loading());
        assert_eq!(content(&mut state), ListContent::Loading);

        settle(&mut state, 2, Ok(records(2)));
        assert!(!state.is_loading());
        assert_eq!(state.records().len(), 2);
    }

    #[test]
    fn test_scroll_requests_are_coalesced() {
        let mut state = state();
        assert_eq!(state.update(Intent::Scroll(100.0), 0.0), vec![Command::RequestRepaint]);
        assert!(state.update(Intent::Scroll(200.0), 0.0).is_empty());
        assert!(state.update(Intent::Resize(600.0), 0.0).is_empty());
        content(&mut state);
        assert_eq!(state.update(Intent::Scroll(300.0), 0.0), vec![Command::RequestRepaint]);
        assert!(state.update(Intent::Scroll(300.0), 0.0).is_empty());
    }

    #[test]
    fn test_new_result_set_keeps_scroll_position() {
        let mut state = state();
        state.update(Intent::Resize(800.0), 0.0);
        state.update(Intent::Scroll(1600.0), 0.0);
        state.update(Intent::Refresh, 0.0);
        settle(&mut state, 1, Ok(records(100)));
        state.update(Intent::Refresh, 0.0);
        settle(&mut state, 2, Ok(records(200)));

        match content(&mut state) {
            ListContent::Rows(window) => assert_eq!(window.range, 10..40),
            other => panic!("expected rows, got {:?}", other),
        }
    }

    #[test]
    fn test_detail_copy_uses_error_text() {
        let mut state = state();
        state.update(Intent::Refresh, 0.0);
        settle(
            &mut state,
            1,
            Ok(vec![LogRecord {
                error: Some("disk full".into()),
                ..Default::default()
            }]),
        );

        state.update(Intent::ShowDetail(0), 0.0);
        assert!(state.dialog().is_open());
        assert_eq!(state.dialog().view().unwrap().message, "");

        let commands = state.update(Intent::Copy, 5.0);
        assert_eq!(
            commands,
            vec![
                Command::CopyToClipboard("disk full".into()),
                Command::RequestRepaintAfter(Duration::from_millis(2000)),
            ]
        );
        assert_eq!(*state.dialog().copy_feedback(), CopyFeedback::Confirmed { until: 7.0 });

        assert_eq!(
            state.update(Intent::Tick, 6.0),
            vec![Command::RequestRepaintAfter(Duration::from_secs(1))]
        );
        assert_eq!(state.update(Intent::Tick, 7.0), vec![Command::RequestRepaint]);
        assert_eq!(*state.dialog().copy_feedback(), CopyFeedback::Idle);

        state.update(Intent::CloseDetail, 8.0);
        assert!(!state.dialog().is_open());
    }

    #[test]
    fn test_show_detail_out_of_range_is_ignored() {
        let mut state = state();
        state.update(Intent::ShowDetail(3), 0.0);
        assert!(!state.dialog().is_open());
        assert!(state.update(Intent::Copy, 0.0).is_empty());
    }

    #[test]
    fn test_refresh_updates_search_highlight() {
        let mut state = state();
        state.update(Intent::SetParam(ParamKey::Search, "timeout".into()), 0.0);
        assert_eq!(state.highlighter().term(), "");
        state.update(Intent::Refresh, 0.0);
        assert_eq!(state.highlighter().term(), "timeout");
    }

    #[test]
    fn test_export_writes_all_records() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("export.html");
        let mut state = state();
        state.update(Intent::Refresh, 0.0);
        settle(&mut state, 1, Ok(records(3)));

        state.update(Intent::Export(path.clone()), 0.0);
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written.matches("class=\"log-item\"").count(), 3);
        assert!(state.notice().unwrap().starts_with("Exported to"));
    }
}
