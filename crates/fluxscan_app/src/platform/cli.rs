use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde_json::{Map, Value};

#[derive(Debug, Parser)]
#[command(name = "fluxscan")]
#[command(about = "Terminal client for a FluxScan stock-scanner server")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Server base URL (overrides the config file)
    #[arg(long, global = true, env = "FLUXSCAN_SERVER_URL")]
    pub server: Option<String>,

    /// Path to a config.ron file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start a scan of a watchlist
    Scan {
        scanner_id: u64,
        watchlist_id: u64,

        /// Scanner parameter as key=value; repeatable. Values are read as JSON
        /// when they parse, otherwise as plain strings.
        #[arg(short, long = "param", value_name = "KEY=VALUE", value_parser = parse_param)]
        params: Vec<(String, Value)>,

        /// Stay connected and show live progress until the scan finishes
        #[arg(short, long)]
        follow: bool,
    },

    /// Follow live scan events until interrupted
    Watch {
        /// Treat the session as a results view, refreshing after each completed scan
        #[arg(long)]
        results: bool,
    },

    /// Check scanner code without running it
    Validate {
        /// File holding the scanner source
        file: PathBuf,
    },

    /// Create a watchlist from a list of symbols
    ImportWatchlist {
        name: String,

        /// Symbols, comma-separated
        #[arg(short, long, value_delimiter = ',', required = true)]
        symbols: Vec<String>,

        /// Exchange code; the server default is NSE
        #[arg(short, long)]
        exchange: Option<String>,
    },

    /// Live symbol search; each query supersedes the previous one
    Search {
        #[arg(required = true)]
        queries: Vec<String>,
    },

    /// Export stored scan results
    Export {
        #[arg(short, long, default_value = "csv")]
        format: String,

        #[arg(long)]
        scanner_id: Option<u64>,

        /// Inclusive start date, YYYY-MM-DD
        #[arg(long)]
        start_date: Option<String>,

        /// Inclusive end date, YYYY-MM-DD
        #[arg(long)]
        end_date: Option<String>,
    },

    /// Show or toggle the saved color theme
    Theme {
        #[arg(value_enum, default_value_t = ThemeAction::Show)]
        action: ThemeAction,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ThemeAction {
    Show,
    Toggle,
}

impl Command {
    /// The location the session reports to the controller. Only results
    /// views refresh after a completed scan.
    pub fn location(&self) -> &'static str {
        match self {
            Command::Scan { .. } => "/scan",
            Command::Watch { results: true } | Command::Export { .. } => "/results",
            Command::Watch { results: false } => "/",
            Command::Validate { .. } => "/scanners",
            Command::ImportWatchlist { .. } => "/watchlists",
            Command::Search { .. } | Command::Theme { .. } => "/",
        }
    }

    /// Whether the command needs the push channel.
    pub fn needs_channel(&self) -> bool {
        matches!(self, Command::Scan { follow: true, .. } | Command::Watch { .. })
    }
}

pub fn parse_param(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got {raw:?}"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing parameter name in {raw:?}"));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

pub fn params_to_map(params: Vec<(String, Value)>) -> Map<String, Value> {
    params.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn params_parse_json_values_and_fall_back_to_strings() {
        assert_eq!(parse_param("period=14").unwrap(), ("period".into(), json!(14)));
        assert_eq!(parse_param("strict=true").unwrap(), ("strict".into(), json!(true)));
        assert_eq!(parse_param("mode=fast").unwrap(), ("mode".into(), json!("fast")));
        assert_eq!(parse_param("expr=a=b").unwrap(), ("expr".into(), json!("a=b")));
        assert!(parse_param("novalue").is_err());
        assert!(parse_param("=3").is_err());
    }

    #[test]
    fn scan_command_collects_repeated_params() {
        let cli = Cli::try_parse_from([
            "fluxscan", "scan", "3", "7", "--param", "period=14", "-p", "mode=fast", "--follow",
        ])
        .expect("parse");
        let Command::Scan {
            scanner_id,
            watchlist_id,
            params,
            follow,
        } = cli.command
        else {
            panic!("expected scan command");
        };
        assert_eq!((scanner_id, watchlist_id, follow), (3, 7, true));
        let map = params_to_map(params);
        assert_eq!(map.get("period"), Some(&json!(14)));
        assert_eq!(map.get("mode"), Some(&json!("fast")));
    }

    #[test]
    fn import_watchlist_splits_symbols() {
        let cli = Cli::try_parse_from([
            "fluxscan",
            "import-watchlist",
            "Banks",
            "--symbols",
            "HDFCBANK,ICICIBANK",
        ])
        .expect("parse");
        match cli.command {
            Command::ImportWatchlist {
                name,
                symbols,
                exchange,
            } => {
                assert_eq!(name, "Banks");
                assert_eq!(symbols, vec!["HDFCBANK", "ICICIBANK"]);
                assert_eq!(exchange, None);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn only_following_commands_open_the_channel() {
        let follow = Cli::try_parse_from(["fluxscan", "scan", "1", "2", "-f"]).expect("parse");
        let detached = Cli::try_parse_from(["fluxscan", "scan", "1", "2"]).expect("parse");
        let watch = Cli::try_parse_from(["fluxscan", "watch", "--results"]).expect("parse");
        assert!(follow.command.needs_channel());
        assert!(!detached.command.needs_channel());
        assert!(watch.command.needs_channel());
        assert_eq!(watch.command.location(), "/results");
    }
}
