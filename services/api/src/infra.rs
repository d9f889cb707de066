use feedback_reports::config::ReportConfig;
use feedback_reports::reports::download::derive_base_name_or;
use feedback_reports::reports::layout::PageSize;
use feedback_reports::reports::RenderSettings;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) reports: Arc<ReportConfig>,
}

impl AppState {
    pub(crate) fn render_settings(&self) -> RenderSettings {
        RenderSettings::from(self.reports.as_ref())
    }

    pub(crate) fn base_name(&self, source_filename: Option<&str>) -> String {
        derive_base_name_or(source_filename, &self.reports.fallback_base_name)
    }
}

pub(crate) fn parse_page_size(raw: &str) -> Result<PageSize, String> {
    PageSize::from_name(raw).ok_or_else(|| format!("unknown page size '{raw}' (use a4 or letter)"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_size_parser_accepts_known_names() {
        assert_eq!(parse_page_size("A4"), Ok(PageSize::A4));
        assert_eq!(parse_page_size("carta"), Ok(PageSize::Letter));
        assert!(parse_page_size("a3").is_err());
    }
}
