use std::fs;

use anyhow::{bail, Context};
use fluxscan_core::{Msg, ScanId};
use fluxscan_engine::{ExportFormat, ExportOutcome, FluxScan};
use serde_json::{Map, Value};

use super::app::Session;
use super::cli::{params_to_map, Command, ThemeAction};
use super::ui::render;

pub async fn execute(
    command: Command,
    actions: &FluxScan,
    session: &mut Session,
) -> anyhow::Result<()> {
    match command {
        Command::Scan {
            scanner_id,
            watchlist_id,
            params,
            follow,
        } => {
            let started = actions
                .run_scanner(scanner_id, watchlist_id, params_to_map(params))
                .await;
            session.drain();
            let started = started?;
            match started.total_symbols {
                Some(total) => println!("Scan {} started ({} symbols)", started.scan_id, total),
                None => println!("Scan {} started", started.scan_id),
            }
            if follow {
                let scan_id = ScanId::new(started.scan_id);
                session
                    .pump_until(|state| state.is_scan_finished(&scan_id))
                    .await;
                println!("{}", render::summary(&session.state().view()));
            }
            Ok(())
        }
        Command::Watch { .. } => {
            println!("Watching for scan events; press Ctrl-C to stop.");
            session.pump_until(|_| false).await;
            println!("{}", render::summary(&session.state().view()));
            Ok(())
        }
        Command::Validate { file } => {
            let code = fs::read_to_string(&file)
                .with_context(|| format!("failed to read scanner code from {}", file.display()))?;
            let report = actions.validate_scanner_code(&code).await;
            session.drain();
            let report = report?;
            for error in &report.errors {
                println!("error: {error}");
            }
            for warning in &report.warnings {
                println!("warning: {warning}");
            }
            if !report.is_valid {
                bail!("{} is not valid scanner code", file.display());
            }
            Ok(())
        }
        Command::ImportWatchlist {
            name,
            symbols,
            exchange,
        } => {
            let symbols: Vec<String> = symbols
                .iter()
                .map(|symbol| symbol.trim().to_string())
                .filter(|symbol| !symbol.is_empty())
                .collect();
            let watchlist = actions
                .import_watchlist(&name, &symbols, exchange.as_deref())
                .await;
            session.drain();
            println!("{}", serde_json::to_string_pretty(&watchlist?)?);
            Ok(())
        }
        Command::Search { queries } => {
            for query in queries {
                session.dispatch(Msg::SearchInput(query));
            }
            session.pump_until(|state| state.is_search_idle()).await;
            Ok(())
        }
        Command::Export {
            format,
            scanner_id,
            start_date,
            end_date,
        } => {
            let mut filters = Map::new();
            if let Some(scanner_id) = scanner_id {
                filters.insert("scanner_id".to_string(), Value::from(scanner_id));
            }
            if let Some(start_date) = start_date {
                filters.insert("start_date".to_string(), Value::String(start_date));
            }
            if let Some(end_date) = end_date {
                filters.insert("end_date".to_string(), Value::String(end_date));
            }
            let outcome = actions
                .export_results(&ExportFormat::parse(&format), filters)
                .await;
            session.drain();
            if let ExportOutcome::Data(data) = outcome? {
                println!("{}", serde_json::to_string_pretty(&data)?);
            }
            Ok(())
        }
        Command::Theme { action } => {
            if action == ThemeAction::Toggle {
                session.dispatch(Msg::ThemeToggleClicked);
            }
            println!("Theme: {}", session.state().theme());
            Ok(())
        }
    }
}
