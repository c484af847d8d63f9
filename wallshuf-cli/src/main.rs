use std::fs::OpenOptions;
use std::io::BufReader;
use std::os::unix::process::CommandExt;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

use clap::{Args, Parser, Subcommand};
use wallshuf_common::error::{ErrorContext, HandshakeError, PidFileError, ProcessError};
use wallshuf_common::handshake::{read_message, write_message};
use wallshuf_common::{
    format_duration, parse_duration, resolve_candidates, ControlSignal, ErrorReporting,
    ProcessInfo, RotationError, StartMessage, StatusMessage, WallshufError,
};
use wallshuf_config::{Config, Overrides};

const DAEMON_BINARY: &str = "wallshuf-daemon";

#[derive(Parser)]
#[command(name = "wallshuf-cli")]
#[command(about = "wallshuf-cli (random wallpaper rotation)")]
#[command(version)]
struct Cli {
    /// PID file of the daemon
    #[arg(short, long, global = true)]
    pid: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start rotating wallpapers in the background
    Start(StartArgs),

    /// Stop the running daemon
    Stop,

    /// Toggle pause
    Pause,

    /// Change the wallpaper now
    Next,

    /// Show daemon status
    Status,
}

#[derive(Args, Debug)]
struct StartArgs {
    /// Directory containing the wallpapers [default: current directory]
    #[arg(short, long)]
    directory: Option<PathBuf>,

    /// File glob inside the directory [default: *.{png,jpg,jpeg}]
    #[arg(short, long)]
    glob: Option<String>,

    /// Rotation interval, e.g. 30m, 1h or "5 minutes" [default: 5m]
    #[arg(short, long)]
    interval: Option<String>,

    /// Show desktop notifications
    #[arg(short, long)]
    notify: bool,

    /// Write daemon logs to this file
    #[arg(short, long)]
    log: Option<PathBuf>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Start(args) => start(args, cli.pid),
        Commands::Stop => stop(cli.pid),
        Commands::Pause => send(cli.pid, ControlSignal::TogglePause, "play/pause"),
        Commands::Next => send(cli.pid, ControlSignal::Next, "changing wallpaper"),
        Commands::Status => status(cli.pid),
    };

    if let Err(e) = result {
        let message = match e.downcast_ref::<WallshufError>() {
            Some(error) => error.user_friendly_message(),
            None => format!("{:#}", e),
        };
        eprintln!("✗ Error: {}", message);
        std::process::exit(1);
    }
}

fn pid_file(pid: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    match pid {
        Some(path) => Ok(path),
        None => Ok(Config::load()?.pid_file()),
    }
}

fn start(args: StartArgs, pid: Option<PathBuf>) -> anyhow::Result<()> {
    let interval = args.interval.as_deref().map(parse_duration).transpose()?;
    let config = Config::load()?.with_overrides(Overrides {
        directory: args.directory,
        glob: args.glob,
        interval,
        notify: args.notify,
        pid_file: pid,
        log_file: args.log,
    })?;

    let pid_file = config.pid_file();
    if let Some(existing) = ProcessInfo::load(&pid_file)? {
        if existing.is_alive() {
            let running = PidFileError::AlreadyRunning { pid: existing.pid };
            return Err(WallshufError::from(running).into());
        }
        log::debug!("Replacing stale PID file for process {}", existing.pid);
        ProcessInfo::remove(&pid_file)?;
    }

    let pattern = config.pattern();
    let found = resolve_candidates(&pattern).with_context("scanning for wallpapers")?;
    if found.is_empty() {
        return Err(WallshufError::from(RotationError::EmptyCandidateSet { pattern }).into());
    }
    log::debug!("Found {} wallpapers matching {:?}", found.len(), pattern);

    let mut child = spawn_daemon(config.log_file.as_deref())?;
    let raw_interval = args
        .interval
        .unwrap_or_else(|| format_duration(config.interval));
    let info = ProcessInfo::new(child.id() as i32, &raw_interval, config.interval, &pattern);
    info.save(&pid_file).with_context("recording daemon pid")?;

    match handshake(&mut child, &config.start_message()) {
        Ok(StatusMessage { running: true, .. }) => {
            print_info(&info, "running");
            Ok(())
        }
        Ok(StatusMessage { error, .. }) => {
            ProcessInfo::remove(&pid_file)?;
            let _ = child.wait();
            let message = error.unwrap_or_else(|| "daemon reported failure".to_string());
            Err(WallshufError::from(HandshakeError::StartFailed { message }).into())
        }
        Err(e) => {
            ProcessInfo::remove(&pid_file)?;
            let _ = child.kill();
            let _ = child.wait();
            Err(WallshufError::from(e).into())
        }
    }
}

fn daemon_binary() -> Result<PathBuf, ProcessError> {
    // Prefer the daemon installed next to this binary
    if let Ok(exe) = std::env::current_exe() {
        let sibling = exe.with_file_name(DAEMON_BINARY);
        if sibling.is_file() {
            return Ok(sibling);
        }
    }

    which::which(DAEMON_BINARY).map_err(|_| ProcessError::NotFound {
        binary: DAEMON_BINARY.to_string(),
    })
}

/// Launch the daemon in its own process group so it outlives this terminal.
fn spawn_daemon(log_file: Option<&Path>) -> anyhow::Result<Child> {
    let daemon = daemon_binary()?;

    let stderr = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| ProcessError::Execution {
                    command: format!("open log file {:?}", path),
                    source: e,
                })?;
            Stdio::from(file)
        }
        None => Stdio::null(),
    };

    let child = Command::new(&daemon)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(stderr)
        .process_group(0)
        .spawn()
        .map_err(|e| ProcessError::Execution {
            command: daemon.display().to_string(),
            source: e,
        })?;

    log::debug!("Spawned {:?} as process {}", daemon, child.id());
    Ok(child)
}

fn handshake(child: &mut Child, message: &StartMessage) -> Result<StatusMessage, HandshakeError> {
    // Dropping stdin after the write closes it for the daemon
    let mut stdin = child.stdin.take().ok_or(HandshakeError::Closed)?;
    write_message(&mut stdin, message)?;
    drop(stdin);

    let stdout = child.stdout.take().ok_or(HandshakeError::Closed)?;
    read_message(&mut BufReader::new(stdout))
}

fn stop(pid: Option<PathBuf>) -> anyhow::Result<()> {
    let pid_file = pid_file(pid)?;
    let info = ProcessInfo::load_running(&pid_file)?;

    info.signal(ControlSignal::Terminate)?;
    ProcessInfo::remove(&pid_file)?;
    println!("✓ stopped");
    Ok(())
}

fn send(pid: Option<PathBuf>, signal: ControlSignal, message: &str) -> anyhow::Result<()> {
    let pid_file = pid_file(pid)?;
    let info = ProcessInfo::load_running(&pid_file)?;

    info.signal(signal)?;
    println!("✓ {}", message);
    Ok(())
}

fn status(pid: Option<PathBuf>) -> anyhow::Result<()> {
    let pid_file = pid_file(pid)?;

    match ProcessInfo::load(&pid_file)? {
        Some(info) if info.is_alive() => print_info(&info, "running"),
        Some(info) => {
            print_info(&info, "not running");
            ProcessInfo::remove(&pid_file)?;
        }
        None => println!("status:     not running"),
    }

    Ok(())
}

fn print_info(info: &ProcessInfo, status: &str) {
    let uptime = (chrono::Utc::now() - info.started_at)
        .to_std()
        .map(format_duration)
        .unwrap_or_else(|_| "0s".to_string());

    println!("wallshuf Status:");
    println!("================");
    println!("pid:        {}", info.pid);
    println!("pattern:    {}", info.pattern);
    println!(
        "interval:   {} ({} ms)",
        info.interval.raw, info.interval.milliseconds
    );
    println!("started at: {} (up {})", info.started_at.to_rfc3339(), uptime);
    println!("status:     {}", status);
}
