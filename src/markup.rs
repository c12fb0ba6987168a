//! HTML rendering of rows and detail views, used by the export writer.
//!
//! Every value that originates from a log record goes through
//! [`escape_markup`] before it is placed in the document.

use crate::detail::DetailView;
use crate::error::ExportError;
use crate::virtual_list::{ListGeometry, RowView};
use std::fs;
use std::path::Path;

/// Escapes `&`, `<` and `>`. The ampersand goes first so the entities
/// produced for the other two are not escaped again.
pub fn escape_markup(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Like [`escape_markup`], plus quotes, for values placed inside attributes.
fn escape_attr(text: &str) -> String {
    escape_markup(text).replace('"', "&quot;")
}

pub fn row_html(row: &RowView) -> String {
    let level = escape_attr(&row.level);
    format!(
        "<div class=\"log-item\" data-index=\"{}\" style=\"transform: translateY({}px)\">\
         <div class=\"log-ts\">{}</div>\
         <div><span class=\"log-lvl {}\">{}</span></div>\
         <div class=\"log-msg\">{}</div>\
         </div>",
        row.index,
        row.top,
        escape_markup(&row.time),
        level,
        escape_markup(&row.level),
        escape_markup(&row.message),
    )
}

pub fn detail_html(detail: &DetailView) -> String {
    let mut html = String::new();
    html.push_str("<div class=\"meta-grid\">");
    html.push_str(&format!(
        "<div class=\"meta-item\"><span class=\"meta-label\">Time</span>\
         <span class=\"meta-value\">{}</span><span class=\"meta-value raw\">{}</span></div>",
        escape_markup(&detail.time_local),
        escape_markup(&detail.time_raw),
    ));
    html.push_str(&format!(
        "<div class=\"meta-item\"><span class=\"meta-label\">Level</span>\
         <span class=\"meta-value\"><span class=\"log-lvl {}\">{}</span></span></div>",
        escape_attr(&detail.level),
        escape_markup(&detail.level),
    ));
    for (label, value) in [
        ("Session ID", &detail.session_id),
        ("Client ID", &detail.client_id),
        ("Source", &detail.source),
    ] {
        html.push_str(&format!(
            "<div class=\"meta-item\"><span class=\"meta-label\">{}</span>\
             <span class=\"meta-value\">{}</span></div>",
            label,
            escape_markup(value),
        ));
    }
    html.push_str("</div>");

    section(&mut html, "Message", &detail.message);
    if let Some(error) = &detail.error {
        section(&mut html, "Error", error);
    }
    if let Some(stacktrace) = &detail.stacktrace {
        section(&mut html, "Stacktrace", stacktrace);
    }
    section(&mut html, "Raw JSON", &detail.raw_json);
    html
}

fn section(html: &mut String, label: &str, body: &str) {
    html.push_str(&format!(
        "<div class=\"section\"><div class=\"section-label\">{}</div>\
         <pre class=\"code-block\">{}</pre></div>",
        label,
        escape_markup(body),
    ));
}

/// A standalone page holding every row of a result set, followed by the
/// detail view of each record. Rows link to their detail section.
pub fn export_document(rows: &[RowView], details: &[DetailView], geometry: &ListGeometry) -> String {
    let mut html = String::from(
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>Logs</title>\
         <style>.log-list{position:relative}\
         .log-item{position:absolute;left:0;right:0;box-sizing:border-box}</style>\
         </head><body>\n",
    );
    html.push_str(&format!(
        "<div class=\"log-list\" style=\"height: {}px\">\n",
        geometry.total_height(rows.len())
    ));
    for row in rows {
        html.push_str(&format!("<a href=\"#record-{}\">{}</a>\n", row.index, row_html(row)));
    }
    html.push_str("</div>\n");
    for detail in details {
        html.push_str(&format!(
            "<section id=\"record-{}\" class=\"detail\">{}</section>\n",
            detail.index,
            detail_html(detail)
        ));
    }
    html.push_str("</body></html>\n");
    html
}

pub fn write_export(
    path: &Path,
    rows: &[RowView],
    details: &[DetailView],
    geometry: &ListGeometry,
) -> Result<(), ExportError> {
    fs::write(path, export_document(rows, details, geometry)).map_err(|cause| ExportError::Write {
        path: path.to_path_buf(),
        cause,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{LogRecord, Severity};

    fn row(message: &str) -> RowView {
        RowView {
            index: 3,
            top: 240.0,
            time: "1/15/2024, 09:30:05 AM".into(),
            level: "INFO".into(),
            severity: Severity::Info,
            message: message.into(),
        }
    }

    #[test]
    fn test_escape_ampersand_first() {
        assert_eq!(escape_markup("<b>&hi</b>"), "&lt;b&gt;&amp;hi&lt;/b&gt;");
        assert_eq!(escape_markup("&lt;"), "&amp;lt;");
    }

    #[test]
    fn test_row_message_is_escaped() {
        let html = row_html(&row("<b>&hi</b>"));
        assert!(html.contains("&lt;b&gt;&amp;hi&lt;/b&gt;"));
        assert!(!html.contains("<b>"));
        assert!(html.contains("translateY(240px)"));
    }

    #[test]
    fn test_detail_fields_are_escaped() {
        let record = LogRecord {
            message: Some("<script>x</script>".into()),
            error: Some("a < b".into()),
            session_id: Some("\"><img>".into()),
            ..Default::default()
        };
        let detail = DetailView::from_record(0, &record);
        let html = detail_html(&detail);
        assert!(!html.contains("<script>"));
        assert!(!html.contains("<img>"));
        assert!(html.contains("a &lt; b"));
        assert!(!html.contains("Stacktrace"));
    }

    #[test]
    fn test_export_document_layout() {
        let geometry = ListGeometry::new(80.0, 10);
        let record = LogRecord {
            time: Some("raw-time".into()),
            level: Some("WARN".into()),
            message: Some("m".into()),
            stacktrace: Some("at x".into()),
            ..Default::default()
        };
        let details = [DetailView::from_record(3, &record)];
        let doc = export_document(&[row("first")], &details, &geometry);

        assert!(doc.contains("<div class=\"log-list\" style=\"height: 80px\">\n<a href=\"#record-3\">"));
        assert!(doc.contains("</a>\n</div>\n<section id=\"record-3\" class=\"detail\">"));
        assert!(doc.contains("<span class=\"meta-value raw\">raw-time</span>"));
        assert!(doc.contains("<span class=\"log-lvl WARN\">WARN</span>"));
        assert!(doc.contains("<div class=\"section-label\">Stacktrace</div><pre class=\"code-block\">at x</pre>"));
        assert!(doc.ends_with("</section>\n</body></html>\n"));
    }

    #[test]
    fn test_write_export() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("logs.html");
        let geometry = ListGeometry::new(80.0, 10);
        let details = [DetailView::from_record(3, &LogRecord::default())];
        write_export(&path, &[row("first"), row("a & b")], &details, &geometry).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("<!DOCTYPE html>"));
        assert!(written.contains("height: 160px"));
        assert!(written.contains("a &amp; b"));
        assert!(written.contains("href=\"#record-3\""));
        assert!(written.contains("<section id=\"record-3\""));
    }

    #[test]
    fn test_write_export_reports_path() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("missing").join("logs.html");
        let err = write_export(&path, &[], &[], &ListGeometry::new(80.0, 10)).unwrap_err();
        assert!(err.to_string().contains("logs.html"));
    }
}
