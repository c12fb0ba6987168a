//! Virtual scrolling for the log list.
//!
//! Only the rows intersecting the viewport, plus an overscan of `buffer` rows
//! on each side, are materialized. Every row sits at `index * item_height`, so
//! the scroll extent is `len * item_height` no matter how many rows exist.

use crate::record::{format_row_time, LogRecord, Severity};
use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ListGeometry {
    item_height: f32,
    buffer: usize,
}

impl ListGeometry {
    pub fn new(item_height: f32, buffer: usize) -> Self {
        let item_height = if item_height.is_finite() && item_height >= 1.0 {
            item_height
        } else {
            1.0
        };
        Self {
            item_height,
            buffer,
        }
    }

    pub fn item_height(&self) -> f32 {
        self.item_height
    }

    pub fn total_height(&self, len: usize) -> f32 {
        len as f32 * self.item_height
    }

    pub fn row_top(&self, index: usize) -> f32 {
        index as f32 * self.item_height
    }

    /// Index range to materialize. Always `start <= end <= len`.
    pub fn window(&self, len: usize, viewport: &ViewportState) -> Range<usize> {
        if len == 0 {
            return 0..0;
        }
        let height = self.item_height as f64;
        let top = viewport.scroll_offset() as f64;
        let bottom = top + viewport.viewport_height() as f64;

        // Float to usize casts saturate, so huge offsets land on `len`.
        let start = ((top / height).floor() as usize)
            .saturating_sub(self.buffer)
            .min(len);
        let end = ((bottom / height).ceil() as usize)
            .saturating_add(self.buffer)
            .min(len);
        start..end.max(start)
    }
}

/// Scroll position and visible height of the list, in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ViewportState {
    scroll_offset: f32,
    viewport_height: f32,
}

fn non_negative(value: f32) -> f32 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

impl ViewportState {
    #[cfg(test)]
    pub fn new(scroll_offset: f32, viewport_height: f32) -> Self {
        Self {
            scroll_offset: non_negative(scroll_offset),
            viewport_height: non_negative(viewport_height),
        }
    }

    pub fn scroll_offset(&self) -> f32 {
        self.scroll_offset
    }

    pub fn viewport_height(&self) -> f32 {
        self.viewport_height
    }

    /// Returns whether the offset actually changed.
    pub fn scroll_to(&mut self, offset: f32) -> bool {
        let offset = non_negative(offset);
        let changed = offset != self.scroll_offset;
        self.scroll_offset = offset;
        changed
    }

    pub fn resize(&mut self, height: f32) -> bool {
        let height = non_negative(height);
        let changed = height != self.viewport_height;
        self.viewport_height = height;
        changed
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RowView {
    pub index: usize,
    pub top: f32,
    pub time: String,
    pub level: String,
    pub severity: Severity,
    pub message: String,
}

impl RowView {
    pub fn from_record(index: usize, record: &LogRecord, geometry: &ListGeometry) -> Self {
        Self {
            index,
            top: geometry.row_top(index),
            time: format_row_time(record.time()),
            level: record.level_label().to_string(),
            severity: record.severity(),
            message: record.display_message().to_string(),
        }
    }
}

/// The materialized slice of the list produced by one render.
#[derive(Debug, Clone, PartialEq)]
pub struct RowWindow {
    pub range: Range<usize>,
    pub total_height: f32,
    pub rows: Vec<RowView>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VirtualList {
    geometry: ListGeometry,
}

impl VirtualList {
    pub fn new(geometry: ListGeometry) -> Self {
        Self { geometry }
    }

    pub fn geometry(&self) -> &ListGeometry {
        &self.geometry
    }

    /// Builds the row window for `records` at `viewport`.
    ///
    /// Returns `None` while a fetch is in flight or when there is nothing to
    /// show; the caller displays a status placeholder instead.
    pub fn render(
        &self,
        records: &[LogRecord],
        viewport: &ViewportState,
        loading: bool,
    ) -> Option<RowWindow> {
        if loading || records.is_empty() {
            return None;
        }
        let range = self.geometry.window(records.len(), viewport);
        let rows = records[range.clone()]
            .iter()
            .zip(range.clone())
            .map(|(record, index)| RowView::from_record(index, record, &self.geometry))
            .collect();
        Some(RowWindow {
            range,
            total_height: self.geometry.total_height(records.len()),
            rows,
        })
    }
}

/// Coalesces render requests: any number of requests before the next frame
/// result in a single render.
#[derive(Debug, Clone, Default)]
pub struct RenderScheduler {
    pending: bool,
}

impl RenderScheduler {
    /// Returns `true` only for the request that scheduled the render, so the
    /// caller wakes the frame loop once.
    pub fn request(&mut self) -> bool {
        let scheduled = !self.pending;
        self.pending = true;
        scheduled
    }

    pub fn take(&mut self) -> bool {
        std::mem::take(&mut self.pending)
    }
}
