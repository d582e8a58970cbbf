use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgGroup, Parser};
use tracing::{Level, debug, error, info};

use scriptor_log::{LogConfig, init_logging, parse_level};
use scriptor_runtime::{RunOutcome, ScriptingConfig, Validatable};

mod session;
use session::{Session, load_model, save_model, script_source};

const VERSION: &str = "0.1.0";

/// Exit code for configuration and model errors
const EXIT_SETUP_ERROR: u8 = 2;

/// Get default config path: `<config dir>/scriptor/scriptor.json`
fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join("scriptor").join("scriptor.json"))
        .filter(|path| path.is_file())
}

/// Scriptor - run scripts against a model
#[derive(Parser, Debug)]
#[command(name = "scriptor")]
#[command(version = VERSION)]
#[command(about = "Run a script against a model document", long_about = None)]
#[command(group(ArgGroup::new("source").required(true).args(["script", "eval"])))]
struct Args {
    /// Path to configuration file (JSON)
    #[arg(short, long, env = "SCRIPTOR_CONFIG")]
    config: Option<PathBuf>,

    /// Model document to load (a new model is created when omitted)
    #[arg(short, long)]
    model: Option<PathBuf>,

    /// Save the model to this file after the run
    #[arg(short, long)]
    save: Option<PathBuf>,

    /// Enable logging to file (scriptor.log in current directory)
    #[arg(long, env = "SCRIPTOR_LOG_FILE")]
    log_file: bool,

    /// Undo the run before saving
    #[arg(long)]
    undo: bool,

    /// Script file to run (.ajs, .js or .link)
    #[arg(long)]
    script: Option<PathBuf>,

    /// Inline script source
    #[arg(long)]
    eval: Option<String>,
}

fn load_config(path: Option<&Path>) -> Result<ScriptingConfig, String> {
    match path {
        Some(path) => ScriptingConfig::from_json_file(&path.to_string_lossy())
            .map_err(|e| format!("Failed to load config from '{}': {}", path.display(), e)),
        None => Ok(ScriptingConfig::default()),
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    // We can't log errors yet, so we use eprintln! for early failures
    let config_path = args.config.clone().or_else(default_config_path);
    let config = match load_config(config_path.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::from(EXIT_SETUP_ERROR);
        }
    };

    let log_level = parse_level(&config.log_level).unwrap_or_else(|| {
        eprintln!("Warning: Invalid log level '{}', using INFO", config.log_level);
        Level::INFO
    });

    let log_config = if args.log_file {
        match std::fs::File::create("scriptor.log") {
            Ok(file) => LogConfig::new("scriptor_cli::").with_level(log_level).with_log_file(file),
            Err(e) => {
                eprintln!("Unable to create scriptor.log: {}", e);
                return ExitCode::from(EXIT_SETUP_ERROR);
            }
        }
    } else {
        LogConfig::<std::fs::File>::new("scriptor_cli::").with_level(log_level)
    };

    if let Err(e) = init_logging(log_config) {
        eprintln!("Failed to initialize logging: {}", e);
        return ExitCode::from(EXIT_SETUP_ERROR);
    }

    info!("Scriptor v{}", VERSION);
    match &config_path {
        Some(path) => info!("Configuration: {}", path.display()),
        None => info!("Configuration: defaults"),
    }

    debug!("Settings:");
    debug!("  Log Level: {}", config.log_level);
    debug!("  Default Provider: {}", config.default_provider);
    debug!("  Blocked Globals: {:?}", config.blocked_globals);
    debug!("  Rollback On Error: {}", config.rollback_on_error);
    debug!("  Undo Limit: {}", config.undo_limit);
    debug!("  JS Memory Limit: {}", config.js.memory_limit);

    let graph = match load_model(args.model.as_deref()) {
        Ok(graph) => graph,
        Err(e) => {
            error!("{}", e);
            return ExitCode::from(EXIT_SETUP_ERROR);
        }
    };

    let Some(source) = script_source(args.script, args.eval) else {
        error!("Nothing to run");
        return ExitCode::from(EXIT_SETUP_ERROR);
    };

    let session = Session::new(config, graph);
    let report = match session.run(source) {
        Ok(report) => report,
        Err(e) => {
            error!("{}", e);
            return ExitCode::from(EXIT_SETUP_ERROR);
        }
    };

    info!(
        "Run finished: {:?}, {} command(s) recorded",
        report.outcome, report.commands_recorded
    );
    if report.commands_rolled_back > 0 {
        info!("{} command(s) rolled back", report.commands_rolled_back);
    }

    if args.undo {
        if let Err(e) = session.undo_last() {
            error!("Undo failed: {}", e);
            return ExitCode::from(EXIT_SETUP_ERROR);
        }
    }

    if let Some(path) = &args.save {
        if let Err(e) = save_model(session.graph(), path) {
            error!("{}", e);
            return ExitCode::from(EXIT_SETUP_ERROR);
        }
    }

    match report.outcome {
        RunOutcome::Completed | RunOutcome::Exited => ExitCode::SUCCESS,
        RunOutcome::Failed(_) => ExitCode::FAILURE,
    }
}
