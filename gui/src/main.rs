use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use cowork_core::{
    detect_terminal_appearance, AgentSpec, FilePreferenceStore, NotificationCenter,
    RateLimitForm, RunState, RunStatus, ShellConfig, ThemeMode, ThemeStore,
};
use cowork_gui::{
    AgentRuntime, CommandGateway, RpcClient, RpcClientConfig, RunRequest, WsEventChannel,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "cowork-shell",
    about = "Headless driver for the Cowork agent runtime pane",
    version = env!("CARGO_PKG_VERSION")
)]
struct Args {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Launch an agent run and follow its timeline
    Run {
        #[arg(short, long)]
        prompt: String,
        #[arg(short, long)]
        model: String,
        #[arg(short, long)]
        workspace: String,
    },
    /// Show the transcript of a past run
    History { run_id: String },
    /// Show or set the theme mode (light, dark, system)
    Theme { mode: Option<String> },
    /// Validate an agent spec JSON file
    SpecCheck { file: PathBuf },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = ShellConfig::load_or_default(args.config.as_deref())
        .context("Failed to load configuration")?;
    config.validate()?;

    let log_level = if args.verbose {
        "debug"
    } else {
        config.logging.level.as_str()
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(log_level.parse()?))
        .with_target(false)
        .with_line_number(true)
        .init();

    info!("Starting Cowork shell v{}", cowork_gui::VERSION);

    match args.command {
        Command::Run {
            prompt,
            model,
            workspace,
        } => run(&config, RunRequest::new(prompt, model, workspace)).await,
        Command::History { run_id } => history(&config, &run_id).await,
        Command::Theme { mode } => theme(&config, mode.as_deref()),
        Command::SpecCheck { file } => spec_check(&file),
    }
}

fn build_runtime(
    config: &ShellConfig,
    notifications: Arc<NotificationCenter>,
) -> anyhow::Result<AgentRuntime> {
    let mut rpc_config = RpcClientConfig::new(&config.backend.rpc_url);
    if let Some(token) = &config.backend.auth_token {
        rpc_config = rpc_config.with_auth(token.clone());
    }
    let gateway = CommandGateway::new(Arc::new(RpcClient::new(rpc_config)?));
    let events = Arc::new(
        WsEventChannel::new(config.backend.events_url.clone()).with_reconnect(
            config.backend.reconnect_attempts,
            Duration::from_millis(config.backend.reconnect_delay_ms),
        ),
    );

    Ok(AgentRuntime::new(
        gateway,
        events,
        notifications,
        config.runtime.clone(),
        Handle::current(),
    ))
}

fn print_from(state: &RunState, printed: usize) -> usize {
    for event in state.timeline.iter().skip(printed) {
        println!(
            "[{}] {:<11} {}",
            event.observed_at.format("%H:%M:%S%.3f"),
            event.kind,
            event.payload_text()
        );
    }
    state.timeline.len()
}

fn flush_notifications(notifications: &NotificationCenter) {
    for notification in notifications.take_all() {
        eprintln!("{}: {}", notification.severity, notification.message);
    }
}

async fn run(config: &ShellConfig, request: RunRequest) -> anyhow::Result<()> {
    let notifications = Arc::new(NotificationCenter::new());
    let runtime = build_runtime(config, notifications.clone())?;
    runtime.activate().await?;

    let started = runtime.start(request);
    let mut settlement = tokio::spawn(started.settled());
    let mut updates = runtime.watch();
    let mut printed = 0;

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = updates.borrow_and_update().clone();
                printed = print_from(&state, printed);
            }
            _ = &mut settlement => break,
            _ = tokio::signal::ctrl_c() => {
                warn!("Interrupted; the backend run keeps going");
                break;
            }
        }
    }

    runtime.shutdown().await;

    let state = runtime.snapshot();
    print_from(&state, printed);
    flush_notifications(&notifications);
    println!("status: {}", state.status);

    if state.status == RunStatus::Error {
        bail!(state.last_error.unwrap_or_default());
    }
    Ok(())
}

async fn history(config: &ShellConfig, run_id: &str) -> anyhow::Result<()> {
    let notifications = Arc::new(NotificationCenter::new());
    let runtime = build_runtime(config, notifications.clone())?;

    let result = runtime.load_history(run_id).await;
    flush_notifications(&notifications);
    result?;

    print_from(&runtime.snapshot(), 0);
    Ok(())
}

fn theme(config: &ShellConfig, mode: Option<&str>) -> anyhow::Result<()> {
    let path = config
        .theme
        .preference_file
        .clone()
        .unwrap_or_else(FilePreferenceStore::default_path);
    let mut store = ThemeStore::init(
        FilePreferenceStore::new(path),
        Box::new(detect_terminal_appearance),
    );

    if let Some(mode) = mode {
        let mode: ThemeMode = mode.parse()?;
        store.set_mode(mode)?;
    }

    println!("mode: {} (painted {})", store.mode(), store.resolved());
    Ok(())
}

fn spec_check(file: &Path) -> anyhow::Result<()> {
    let body = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let spec: AgentSpec = serde_json::from_str(&body).context("Invalid agent spec json")?;
    spec.validate()?;

    let form = RateLimitForm::from_limits(&spec.airlock.rate_limits);
    println!("{} ({}) is valid", spec.soul.name, spec.id);
    println!("  requests/minute: {}", or_unlimited(&form.max_requests_per_minute));
    println!("  tokens/day:      {}", or_unlimited(&form.max_tokens_per_day));
    Ok(())
}

fn or_unlimited(field: &str) -> &str {
    if field.is_empty() {
        "unlimited"
    } else {
        field
    }
}
