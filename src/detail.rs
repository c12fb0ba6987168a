use crate::record::{format_detail_time, LogRecord, Severity, MISSING};
use std::time::Duration;

/// Expanded read-only view of a single record.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailView {
    pub index: usize,
    pub time_local: String,
    pub time_raw: String,
    pub level: String,
    pub severity: Severity,
    pub session_id: String,
    pub client_id: String,
    pub source: String,
    pub message: String,
    pub error: Option<String>,
    pub stacktrace: Option<String>,
    pub raw_json: String,
    pub copy_text: String,
}

impl DetailView {
    pub fn from_record(index: usize, record: &LogRecord) -> Self {
        Self {
            index,
            time_local: format_detail_time(record.time()),
            time_raw: record.time().unwrap_or(MISSING).to_string(),
            level: record.level_label().to_string(),
            severity: record.severity(),
            session_id: record.session_id().to_string(),
            client_id: record.client_id().to_string(),
            source: record.source().to_string(),
            message: record.message().unwrap_or_default().to_string(),
            error: record.error().map(str::to_string),
            stacktrace: record.stacktrace().map(str::to_string),
            raw_json: record.to_pretty_json(),
            copy_text: record.copy_text(),
        }
    }
}

/// Looks up `index` in the current result set. An index the set no longer
/// covers yields `None` rather than a panic.
pub fn show_details(records: &[LogRecord], index: usize) -> Option<DetailView> {
    records
        .get(index)
        .map(|record| DetailView::from_record(index, record))
}

/// Transient "Copied!" confirmation on the copy button.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum CopyFeedback {
    #[default]
    Idle,
    Confirmed {
        until: f64,
    },
}

impl CopyFeedback {
    pub fn confirm(&mut self, now: f64, duration: Duration) {
        *self = CopyFeedback::Confirmed {
            until: now + duration.as_secs_f64(),
        };
    }

    /// Reverts to idle once the deadline has passed. Returns whether it did.
    pub fn tick(&mut self, now: f64) -> bool {
        match *self {
            CopyFeedback::Confirmed { until } if now >= until => {
                *self = CopyFeedback::Idle;
                true
            }
            _ => false,
        }
    }

    pub fn remaining(&self, now: f64) -> Option<Duration> {
        match *self {
            CopyFeedback::Confirmed { until } => {
                Some(Duration::from_secs_f64((until - now).max(0.0)))
            }
            CopyFeedback::Idle => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CopyFeedback::Idle => "📋 Copy",
            CopyFeedback::Confirmed { .. } => "✔ Copied!",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum DialogState {
    #[default]
    Closed,
    Open(DetailView),
}

#[derive(Debug, Clone, Default)]
pub struct DetailDialog {
    state: DialogState,
    copy: CopyFeedback,
}

impl DetailDialog {
    /// Opening any record drops a pending confirmation from the previous one.
    pub fn open(&mut self, view: DetailView) {
        self.state = DialogState::Open(view);
        self.copy = CopyFeedback::Idle;
    }

    pub fn close(&mut self) {
        self.state = DialogState::Closed;
        self.copy = CopyFeedback::Idle;
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, DialogState::Open(_))
    }

    pub fn view(&self) -> Option<&DetailView> {
        match &self.state {
            DialogState::Open(view) => Some(view),
            DialogState::Closed => None,
        }
    }

    pub fn copy_feedback(&self) -> &CopyFeedback {
        &self.copy
    }

    pub fn copy_feedback_mut(&mut self) -> &mut CopyFeedback {
        &mut self.copy
    }
}
