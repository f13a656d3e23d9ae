use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use fluxscan_logging::{flux_info, flux_warn};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::persist::AtomicFileWriter;
use crate::{ApiClient, ClientError, NoticeLevel, Notifier, RequestOptions, ScanSubscriber};

const SCAN_ENDPOINT: &str = "/scan/api/scan";
const VALIDATE_ENDPOINT: &str = "/scanners/api/scanners/validate";
const WATCHLIST_ENDPOINT: &str = "/watchlists/api/watchlists";
const SYMBOL_SEARCH_ENDPOINT: &str = "/api/symbols/search";
const EXPORT_ENDPOINT: &str = "/api/results/export";

pub const DEFAULT_EXCHANGE: &str = "NSE";

/// Shorter queries are answered locally with an empty list.
pub const MIN_SEARCH_CHARS: usize = 2;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScanStarted {
    #[serde(deserialize_with = "crate::events::scan_id_from_wire")]
    pub scan_id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub total_symbols: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ValidationReport {
    pub is_valid: bool,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
    Other(String),
}

impl ExportFormat {
    pub fn parse(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "csv" => ExportFormat::Csv,
            "json" => ExportFormat::Json,
            _ => ExportFormat::Other(raw.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
            ExportFormat::Other(raw) => raw,
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExportOutcome {
    /// Tabular export saved to disk.
    Downloaded(PathBuf),
    /// Any other format, handed back to the caller.
    Data(Value),
}

/// File name for a CSV export taken on `date`.
pub fn export_filename(date: NaiveDate) -> String {
    format!("scan_results_{}.csv", date.format("%Y-%m-%d"))
}

/// The client-facing bundle of domain actions.
///
/// Every action reports its outcome through the [`Notifier`]; failures are
/// also returned so callers can react further.
#[derive(Clone)]
pub struct FluxScan {
    api: ApiClient,
    downloads: AtomicFileWriter,
    notifier: Arc<dyn Notifier>,
    subscriber: Arc<dyn ScanSubscriber>,
}

impl FluxScan {
    pub fn new(
        api: ApiClient,
        download_dir: PathBuf,
        notifier: Arc<dyn Notifier>,
        subscriber: Arc<dyn ScanSubscriber>,
    ) -> Self {
        Self {
            api,
            downloads: AtomicFileWriter::new(download_dir),
            notifier,
            subscriber,
        }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn notify(&self, level: NoticeLevel, message: impl Into<String>) {
        self.notifier.notify(level, message.into());
    }

    /// Starts a scan and subscribes to its push events.
    pub async fn run_scanner(
        &self,
        scanner_id: u64,
        watchlist_id: u64,
        parameters: Map<String, Value>,
    ) -> Result<ScanStarted, ClientError> {
        let body = json!({
            "scanner_id": scanner_id,
            "watchlist_id": watchlist_id,
            "parameters": parameters,
        });
        let result = self
            .api
            .request_as::<ScanStarted>(SCAN_ENDPOINT, RequestOptions::post_json(&body))
            .await;

        match result {
            Ok(started) => {
                flux_info!("Scan {} started", started.scan_id);
                self.notify(NoticeLevel::Success, "Scan started successfully");
                self.subscriber.subscribe(&started.scan_id);
                Ok(started)
            }
            Err(err) => Err(self.fail("Failed to start scan", err)),
        }
    }

    pub async fn validate_scanner_code(&self, code: &str) -> Result<ValidationReport, ClientError> {
        let body = json!({ "code": code });
        let result = self
            .api
            .request_as::<ValidationReport>(VALIDATE_ENDPOINT, RequestOptions::post_json(&body))
            .await;

        match result {
            Ok(report) => {
                if report.is_valid {
                    self.notify(NoticeLevel::Success, "Scanner code is valid");
                } else {
                    self.notify(
                        NoticeLevel::Warning,
                        format!("Scanner code has {} error(s)", report.errors.len()),
                    );
                }
                Ok(report)
            }
            Err(err) => Err(self.fail("Failed to validate scanner", err)),
        }
    }

    /// Creates a watchlist. `exchange` defaults to NSE.
    pub async fn import_watchlist(
        &self,
        name: &str,
        symbols: &[String],
        exchange: Option<&str>,
    ) -> Result<Value, ClientError> {
        let body = json!({
            "name": name,
            "symbols": symbols,
            "exchange": exchange.unwrap_or(DEFAULT_EXCHANGE),
        });
        match self
            .api
            .request(WATCHLIST_ENDPOINT, RequestOptions::post_json(&body))
            .await
        {
            Ok(watchlist) => {
                self.notify(NoticeLevel::Success, "Watchlist imported successfully");
                Ok(watchlist)
            }
            Err(err) => Err(self.fail("Failed to import watchlist", err)),
        }
    }

    /// Looks up symbols. Never fails: short queries and errors both yield an
    /// empty list so a live-search field keeps working.
    pub async fn search_symbols(&self, query: &str) -> Vec<Value> {
        if query.chars().count() < MIN_SEARCH_CHARS {
            return Vec::new();
        }
        let mut url = match self.api.endpoint(SYMBOL_SEARCH_ENDPOINT) {
            Ok(url) => url,
            Err(err) => {
                flux_warn!("Symbol search error: {}", err);
                return Vec::new();
            }
        };
        url.query_pairs_mut().append_pair("q", query);

        match self
            .api
            .request_url_as::<Vec<Value>>(url, RequestOptions::get())
            .await
        {
            Ok(matches) => matches,
            Err(err) => {
                flux_warn!("Symbol search error: {}", err);
                Vec::new()
            }
        }
    }

    /// Exports stored results. CSV is written to the download directory as
    /// `scan_results_<date>.csv`; other formats come back as JSON.
    pub async fn export_results(
        &self,
        format: &ExportFormat,
        filters: Map<String, Value>,
    ) -> Result<ExportOutcome, ClientError> {
        match self.export_inner(format, filters).await {
            Ok(outcome) => {
                if let ExportOutcome::Downloaded(path) = &outcome {
                    flux_info!("Export saved to {:?}", path);
                    self.notify(
                        NoticeLevel::Success,
                        format!("Results exported to {}", path.display()),
                    );
                }
                Ok(outcome)
            }
            Err(err) => Err(self.fail("Export failed", err)),
        }
    }

    async fn export_inner(
        &self,
        format: &ExportFormat,
        filters: Map<String, Value>,
    ) -> Result<ExportOutcome, ClientError> {
        let mut body = filters;
        body.insert("format".to_string(), Value::String(format.to_string()));
        let options = RequestOptions::post_json(&Value::Object(body));

        match format {
            ExportFormat::Csv => {
                let payload = self.api.request_bytes(EXPORT_ENDPOINT, options).await?;
                let filename = export_filename(Utc::now().date_naive());
                let path = self.downloads.write_bytes(&filename, &payload)?;
                Ok(ExportOutcome::Downloaded(path))
            }
            ExportFormat::Json | ExportFormat::Other(_) => {
                let data = self.api.request(EXPORT_ENDPOINT, options).await?;
                Ok(ExportOutcome::Data(data))
            }
        }
    }

    fn fail(&self, context: &str, err: ClientError) -> ClientError {
        flux_warn!("{}: {}", context, err);
        self.notify(NoticeLevel::Error, format!("{context}: {err}"));
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn export_filename_uses_iso_date() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        assert_eq!(export_filename(date), "scan_results_2024-03-07.csv");
    }

    #[test]
    fn export_format_parsing() {
        assert_eq!(ExportFormat::parse("CSV"), ExportFormat::Csv);
        assert_eq!(ExportFormat::parse("json"), ExportFormat::Json);
        assert_eq!(
            ExportFormat::parse("xlsx"),
            ExportFormat::Other("xlsx".to_string())
        );
    }
}
