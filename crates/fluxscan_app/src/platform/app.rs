use std::io;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use fluxscan_core::{update, AppState, Msg};
use fluxscan_engine::{ApiClient, ApiSettings, ChannelHandle, FluxScan, ScanSubscriber};
use fluxscan_logging::{flux_debug, flux_info};
use log::LevelFilter;
use tokio::sync::mpsc;

use super::cli::Cli;
use super::config::{self, AppConfig};
use super::effects::{self, DetachedSubscriber, EffectRunner, MsgNotifier};
use super::logging::{self, LogDestination};
use super::ui::render::TerminalView;
use super::{commands, persistence};

pub fn run_app() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config =
        config::load(cli.config.as_deref()).context("failed to load configuration")?;
    if let Some(server) = &cli.server {
        config.server_url = server.clone();
    }

    let destination = if config.log_to_file {
        LogDestination::Both
    } else {
        LogDestination::Terminal
    };
    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    logging::initialize(destination, level);

    let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
    runtime.block_on(run(cli, config))
}

async fn run(cli: Cli, config: AppConfig) -> anyhow::Result<()> {
    let base_url = config.server_url()?;
    flux_info!("Using FluxScan server at {}", base_url);
    let state_dir = persistence::state_dir();
    let (msg_tx, msg_rx) = mpsc::unbounded_channel();

    let mut channel = None;
    let mut forwarder = None;
    if cli.command.needs_channel() {
        let (push_tx, push_rx) = mpsc::unbounded_channel();
        let settings = config.channel_settings(base_url.clone());
        channel = Some(Arc::new(ChannelHandle::spawn(settings, push_tx)));
        forwarder = Some(effects::spawn_push_forwarder(push_rx, msg_tx.clone()));
    }
    let subscriber: Arc<dyn ScanSubscriber> = match &channel {
        Some(handle) => handle.clone(),
        None => Arc::new(DetachedSubscriber),
    };

    let api = ApiClient::new(ApiSettings::new(base_url)).context("failed to build HTTP client")?;
    let actions = FluxScan::new(
        api,
        config.download_dir(),
        Arc::new(MsgNotifier::new(msg_tx.clone())),
        subscriber,
    );
    let runner = EffectRunner::new(
        Box::new(TerminalView::new(io::stdout())),
        msg_tx,
        actions.clone(),
        state_dir.clone(),
    );

    let mut session = Session::new(msg_rx, runner);
    session.dispatch(Msg::PageLoaded {
        path: cli.command.location().to_string(),
        saved_theme: persistence::load_theme(&state_dir),
    });

    let outcome = commands::execute(cli.command, &actions, &mut session).await;
    session.drain();

    if let Some(handle) = channel {
        handle.shutdown().await;
    }
    if let Some(forwarder) = forwarder {
        forwarder.abort();
    }
    outcome
}

/// The controller loop: owns the state, feeds messages through `update` and
/// hands the resulting effects to the runner.
pub struct Session {
    state: AppState,
    msg_rx: mpsc::UnboundedReceiver<Msg>,
    runner: EffectRunner,
}

impl Session {
    pub fn new(msg_rx: mpsc::UnboundedReceiver<Msg>, runner: EffectRunner) -> Self {
        Self {
            state: AppState::new(),
            msg_rx,
            runner,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn dispatch(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        if state.consume_dirty() {
            flux_debug!(
                "State changed: {} toast(s), {} active scan(s)",
                state.toasts().len(),
                state.progress().len()
            );
        }
        self.state = state;
        self.runner.run(effects);
    }

    /// Handles every message already waiting, without blocking.
    pub fn drain(&mut self) {
        while let Ok(msg) = self.msg_rx.try_recv() {
            self.dispatch(msg);
        }
    }

    /// Handles messages until `done` holds. Returns false when interrupted
    /// by Ctrl-C or when every sender is gone.
    pub async fn pump_until(&mut self, done: impl Fn(&AppState) -> bool) -> bool {
        loop {
            if done(&self.state) {
                return true;
            }
            tokio::select! {
                msg = self.msg_rx.recv() => match msg {
                    Some(msg) => self.dispatch(msg),
                    None => return false,
                },
                _ = tokio::signal::ctrl_c() => {
                    flux_info!("Interrupted");
                    return false;
                }
            }
        }
    }
}
