use std::fs::{self, File};
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use clap::{Parser, ValueEnum};
use log::{error, info, warn};
use simplelog::{
    ColorChoice, CombinedLogger, ConfigBuilder, LevelFilter, SharedLogger, TermLogger,
    TerminalMode, WriteLogger,
};

use numgrid::app::state::Command;
use numgrid::app::{AppError, EventLoop, NavigationController, NavigationSettings};
use numgrid::config::settings::{self, AppConfig};
use numgrid::input::script;
use numgrid::input::{KeyBindings, ScriptError};
use numgrid::platform::headless::{
    HeadlessMonitor, HeadlessOverlay, HeadlessPointer, HeadlessSound,
};
use numgrid::ui::OverlayStyle;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(Parser)]
#[command(
    name = "numgrid",
    version,
    about = "Drive the mouse pointer from the keyboard with a recursive 3x3 grid"
)]
struct Args {
    /// Config file [default: <config dir>/numgrid/config.toml]
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Level for messages on stderr; the log file always gets debug
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    log_level: LogLevel,

    /// Log file [default: <config dir>/numgrid/numgrid.log]
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Replay commands from a script ("-" for stdin) instead of capturing the keyboard
    #[arg(long)]
    script: Option<PathBuf>,

    /// Print the default configuration and exit
    #[arg(long)]
    print_default_config: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    if args.print_default_config {
        return match settings::default_toml() {
            Ok(toml) => {
                print!("{}", toml);
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("numgrid: {}", e);
                ExitCode::FAILURE
            }
        };
    }

    init_logging(&args);
    info!("numgrid {} starting", env!("CARGO_PKG_VERSION"));

    match run(args) {
        Ok(()) => {
            info!("numgrid exited");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(args: &Args) {
    let log_config = ConfigBuilder::new().set_time_format_rfc3339().build();

    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        args.log_level.into(),
        log_config.clone(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )];

    let log_path = args.log_file.clone().or_else(|| {
        settings::config_path().and_then(|path| path.parent().map(|dir| dir.join("numgrid.log")))
    });
    if let Some(path) = log_path {
        match create_log_file(&path) {
            Ok(file) => loggers.push(WriteLogger::new(LevelFilter::Debug, log_config, file)),
            Err(e) => eprintln!("numgrid: cannot open log file {}: {}", path.display(), e),
        }
    }

    if let Err(e) = CombinedLogger::init(loggers) {
        eprintln!("numgrid: failed to initialise logging: {}", e);
    }
}

fn create_log_file(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    File::create(path)
}

fn run(args: Args) -> Result<(), AppError> {
    let config_path = args.config.clone().or_else(settings::config_path);
    let config = match &config_path {
        Some(path) => settings::load_from(path)?,
        None => {
            warn!("Could not determine config directory, using default config");
            AppConfig::default()
        }
    };

    let bindings = KeyBindings::from_config(&config.hotkeys)?;
    info!("{} key bindings loaded", bindings.len());

    let style = OverlayStyle::from_config(&config.overlay)?;
    let controller = NavigationController::new(NavigationSettings::from_config(&config));
    let (sender, receiver) = mpsc::channel();

    if let Some(script_path) = &args.script {
        let reader = open_script(script_path)?;
        return run_headless(&config, style, controller, config_path, sender, receiver, reader);
    }

    run_live(bindings, &config, style, controller, config_path, sender, receiver)
}

/// Re-reads the file the process started with
fn config_loader(path: Option<PathBuf>) -> numgrid::app::event_loop::ConfigLoader {
    Box::new(move || match &path {
        Some(path) => settings::load_from(path),
        None => Ok(AppConfig::default()),
    })
}

fn open_script(path: &Path) -> Result<Box<dyn BufRead + Send>, AppError> {
    if path == Path::new("-") {
        return Ok(Box::new(BufReader::new(io::stdin())));
    }
    let file = File::open(path).map_err(ScriptError::from)?;
    info!("Replaying commands from {}", path.display());
    Ok(Box::new(BufReader::new(file)))
}

fn run_headless(
    config: &AppConfig,
    style: OverlayStyle,
    controller: NavigationController,
    config_path: Option<PathBuf>,
    sender: Sender<Command>,
    receiver: Receiver<Command>,
    reader: Box<dyn BufRead + Send>,
) -> Result<(), AppError> {
    let monitor = config.headless.monitor_region()?;
    info!("Headless mode over {:?}", monitor);

    // Detached: a reader blocked on stdin must not keep the process alive after quit
    let _feeder = thread::Builder::new()
        .name("numgrid-script".to_string())
        .spawn(move || {
            if let Err(e) = script::feed(reader, &sender) {
                warn!("Script input stopped: {}", e);
            }
        })?;

    let mut event_loop = EventLoop::new(
        controller,
        receiver,
        HeadlessMonitor(monitor),
        HeadlessOverlay::new(style),
        HeadlessPointer::new(),
        HeadlessSound::new(),
    )
    .with_loader(config_loader(config_path));
    event_loop.run();
    Ok(())
}

#[cfg(not(windows))]
fn run_live(
    _bindings: KeyBindings,
    config: &AppConfig,
    style: OverlayStyle,
    controller: NavigationController,
    config_path: Option<PathBuf>,
    sender: Sender<Command>,
    receiver: Receiver<Command>,
) -> Result<(), AppError> {
    warn!("Live keyboard capture is only available on Windows, reading commands from stdin");
    let reader: Box<dyn BufRead + Send> = Box::new(BufReader::new(io::stdin()));
    run_headless(config, style, controller, config_path, sender, receiver, reader)
}

#[cfg(windows)]
fn run_live(
    bindings: KeyBindings,
    _config: &AppConfig,
    style: OverlayStyle,
    controller: NavigationController,
    config_path: Option<PathBuf>,
    sender: Sender<Command>,
    receiver: Receiver<Command>,
) -> Result<(), AppError> {
    use numgrid::app::state::SharedNavState;
    use numgrid::input::KeyboardHook;
    use numgrid::platform::monitors::{self, CursorMonitorLocator};
    use numgrid::platform::pointer::Win32Pointer;
    use numgrid::platform::sound::BeepPlayer;
    use numgrid::ui::LayeredOverlay;

    monitors::enable_dpi_awareness();
    match monitors::enumerate_monitors() {
        Ok(found) => info!("{} monitor(s) detected", found.len()),
        Err(e) => warn!("Monitor enumeration failed: {}", e),
    }

    let overlay = LayeredOverlay::new(style)?;
    let nav_state = SharedNavState::new();
    let mut hook = KeyboardHook::start(bindings, nav_state.clone(), sender)?;
    info!("Keyboard hook installed, waiting for the toggle hotkey");

    let mut event_loop = EventLoop::new(
        controller,
        receiver,
        CursorMonitorLocator,
        overlay,
        Win32Pointer,
        BeepPlayer,
    )
    .with_nav_state(nav_state)
    .with_loader(config_loader(config_path));
    event_loop.run();

    hook.stop()?;
    Ok(())
}
