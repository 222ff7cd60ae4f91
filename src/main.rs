use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing::{Level, error, info};

use trackpadd::Config;
use trackpadd::event_dispatcher::{MessageEncoder, OutputChannel, OutputMode};
use trackpadd::run_loop::RunSummary;
use trackpadd::shutdown::{self, Shutdown};

/// Stream touchpad contacts as JSON frames on stdout.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Use this event node instead of searching for a touchpad
    #[arg(short, long)]
    device: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum)]
    output: Option<OutputMode>,

    /// error, warn, info, debug or trace
    #[arg(long)]
    log_level: Option<String>,

    /// Browsers start native messaging hosts with the caller origin (and on
    /// some platforms a window handle) as extra arguments.
    #[arg(hide = true, num_args = 0.., allow_hyphen_values = true, trailing_var_arg = true)]
    host_args: Vec<String>,
}

impl Cli {
    fn load_config(&self) -> anyhow::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };
        if let Some(device) = &self.device {
            config.device = Some(device.clone());
        }
        if let Some(output) = self.output {
            config.output = output;
        }
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        config.validate()?;
        Ok(config)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = cli.load_config();

    // stdout 是数据通道，日志只能走 stderr
    let level = config
        .as_ref()
        .ok()
        .and_then(|c| c.level().ok())
        .unwrap_or(Level::INFO);
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            error!("{e:#}");
            return ExitCode::FAILURE;
        }
    };
    if !cli.host_args.is_empty() {
        info!(args = ?cli.host_args, "started as native messaging host");
    }

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!(error = %e, "failed to start runtime");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(serve(config)) {
        Ok(summary) => {
            info!(
                frames = summary.frames,
                truncated = summary.truncated,
                reason = ?summary.stopped,
                "stopped"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn serve(config: Config) -> anyhow::Result<RunSummary> {
    let (handle, shutdown) = shutdown::channel();
    tokio::spawn(shutdown::forward_signals(handle));

    let stdout = io::stdout();
    let mode = config.output.resolve(stdout.is_terminal());
    info!(?mode, "output mode");
    let channel = OutputChannel::new(mode, stdout);
    let encoder = MessageEncoder::with_limit(config.max_message_bytes);

    stream(&config, channel, encoder, shutdown).await
}

#[cfg(target_os = "linux")]
async fn stream(
    config: &Config,
    channel: OutputChannel<io::Stdout>,
    encoder: MessageEncoder,
    shutdown: Shutdown,
) -> anyhow::Result<RunSummary> {
    use trackpadd::input_devices::{evdev, selector};
    use trackpadd::touch_tracker::Tracker;

    let device = match &config.device {
        Some(path) => {
            info!(path = %path.display(), "using configured device");
            evdev::EvdevDevice::open(path)?
        }
        None => selector::select_device(evdev::candidates(&config.input_dir)?, &config.patterns())
            .with_context(|| format!("searching {}", config.input_dir.display()))?,
    };
    let source = Tracker::new(device)?;

    let summary = trackpadd::run(trackpadd::RunContext {
        source,
        encoder,
        channel,
        shutdown,
    })
    .await
    .context("streaming stopped")?;
    Ok(summary)
}

#[cfg(target_os = "macos")]
async fn stream(
    _config: &Config,
    channel: OutputChannel<io::Stdout>,
    encoder: MessageEncoder,
    shutdown: Shutdown,
) -> anyhow::Result<RunSummary> {
    use trackpadd::input_devices::multitouch_macos::MultitouchDevice;

    let source = MultitouchDevice::start_default()?;
    let summary = trackpadd::run(trackpadd::RunContext {
        source,
        encoder,
        channel,
        shutdown,
    })
    .await
    .context("streaming stopped")?;
    Ok(summary)
}

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
async fn stream(
    _config: &Config,
    _channel: OutputChannel<io::Stdout>,
    _encoder: MessageEncoder,
    _shutdown: Shutdown,
) -> anyhow::Result<RunSummary> {
    anyhow::bail!("no multitouch backend for this platform")
}
