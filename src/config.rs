use crate::query::{ParamKey, QueryParams};
use crate::record::Severity;
use egui::Color32;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ColorPalette {
    pub info: Color32,
    pub warn: Color32,
    pub error: Color32,
    pub debug: Color32,
    pub trace: Color32,
    pub default: Color32,
}

impl ColorPalette {
    pub fn for_severity(&self, severity: Severity) -> Color32 {
        match severity {
            Severity::Info => self.info,
            Severity::Warn => self.warn,
            Severity::Error => self.error,
            Severity::Debug => self.debug,
            Severity::Trace => self.trace,
            Severity::Unknown => self.default,
        }
    }
}

impl Default for ColorPalette {
    fn default() -> Self {
        Self {
            info: Color32::from_rgb(216, 237, 250),
            warn: Color32::from_rgb(255, 240, 213),
            error: Color32::from_rgb(250, 202, 202),
            debug: Color32::from_rgb(222, 251, 199),
            trace: Color32::from_rgb(100, 100, 100),
            default: Color32::from_rgb(220, 220, 220),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub color_palette: ColorPalette,
    pub endpoint: String,
    pub item_height: f32,
    pub buffer: usize,
    pub copy_feedback: Duration,
    pub default_params: QueryParams,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            color_palette: ColorPalette::default(),
            endpoint: "http://localhost:8081/v1/logs".to_string(),
            item_height: 80.0,
            buffer: 10,
            copy_feedback: Duration::from_millis(2000),
            default_params: QueryParams::new()
                .with(ParamKey::Limit, "1000")
                .with(ParamKey::SubscriberType, "file"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.item_height, 80.0);
        assert_eq!(config.buffer, 10);
        assert_eq!(
            config.default_params.to_query_string(),
            "limit=1000&subscriber_type=file"
        );
    }

    #[test]
    fn test_palette_by_severity() {
        let palette = ColorPalette::default();
        assert_eq!(palette.for_severity(Severity::Error), palette.error);
        assert_eq!(palette.for_severity(Severity::Unknown), palette.default);
    }
}
