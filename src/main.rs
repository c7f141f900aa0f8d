use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Parser;

use ctrl_panel::command::handle_stdin_command;
use ctrl_panel::config::ConfigStore;
use ctrl_panel::panel::Panel;
use ctrl_panel::request::HttpTransport;
use ctrl_panel::view::TerminalView;

const SHUTDOWN_WAIT: Duration = Duration::from_secs(3);

#[derive(Parser, Debug)]
#[command(author, version, about = "Terminal control panel for the controller")]
struct Args {
    /// Config file, defaults to <config dir>/ctrl-panel/config.json
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Controller base URL, e.g. http://192.168.10.1
    #[arg(short, long)]
    url: Option<String>,

    /// Write the effective config back to the config file
    #[arg(long)]
    save_config: bool,

    /// Do not send watchdog heartbeats
    #[arg(long)]
    no_watchdog: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    if let Err(e) = run_app(args) {
        log::error!("App error: {}", e);
        std::process::exit(1);
    }
}

fn run_app(args: Args) -> anyhow::Result<()> {
    let store = ConfigStore::new(args.config.unwrap_or_else(ConfigStore::default_path));
    let mut config = store.load_or_default()?;
    if let Some(url) = args.url {
        config.controller_url = url;
        config = config.sanitized();
    }
    if args.save_config {
        store.set_panel_config(&config)?;
        log::info!("Config saved to {}", store.path().display());
    }
    log::info!(
        "Controller: {}, time axis 0..{}, watchdog {}",
        config.controller_url,
        config.initial_x_limit,
        if args.no_watchdog { "off".to_string() } else { format!("every {} ms", config.watchdog_interval_ms) }
    );

    let transport = Arc::new(HttpTransport::new(&config.controller_url, config.request_queue_len)?);
    let panel = Panel::new(
        &config,
        transport.clone(),
        Box::new(TerminalView::new()),
        !args.no_watchdog,
        Instant::now(),
    );

    let (tx, rx) = crossbeam_channel::unbounded();
    std::thread::Builder::new()
        .name("stdin".to_string())
        .spawn(move || handle_stdin_command(tx))?;

    log::info!("Type 'help' for commands");
    panel.run(rx);
    transport.shutdown(SHUTDOWN_WAIT);
    Ok(())
}
