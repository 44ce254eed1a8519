use clap::{ArgAction, Parser};
use eyre::{Context, Result, eyre};
use serde::Deserialize;
use std::fs;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use tomboy_zim_export::utils;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Convert Gnote/Tomboy notes to Zim.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Gnote/Tomboy source directory.
    #[arg(long, value_name = "DIR")]
    source_dir: Option<PathBuf>,

    /// Zim destination directory.
    /// Created if missing. If it is the source directory, a `zim` subdirectory is used.
    #[arg(long, value_name = "DIR")]
    dest_dir: Option<PathBuf>,

    /// Path to a specific configuration file.
    /// Defaults to $XDG_CONFIG_HOME/tomboy-zim-export/config.toml
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Stop the whole run at the first note without a title or content.
    #[arg(long)]
    strict: bool,

    /// Print more detail (-v for debug, -vv for trace).
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Only print warnings and errors.
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Deserialize, Default)]
struct FileConfig {
    source_dir: Option<PathBuf>,
    dest_dir: Option<PathBuf>,
    strict: Option<bool>,
}

fn load_file_config(explicit_path: Option<&Path>) -> Result<FileConfig> {
    let path = if let Some(p) = explicit_path {
        if !p.exists() {
            return Err(eyre!("Config file not found: {}", p.display()));
        }
        Some(p.to_path_buf())
    } else {
        dirs::config_dir()
            .map(|d| d.join("tomboy-zim-export/config.toml"))
            .filter(|p| p.exists())
    };

    match path {
        None => Ok(FileConfig::default()),
        Some(p) => {
            let content = fs::read_to_string(&p)
                .wrap_err_with(|| format!("Failed to read config: {}", p.display()))?;
            toml::from_str(&content)
                .wrap_err_with(|| format!("Failed to parse config: {}", p.display()))
        }
    }
}

fn setup_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => LevelFilter::WARN,
        (false, 0) => LevelFilter::INFO,
        (false, 1) => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .without_time()
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose, cli.quiet);

    // 1. Load config file (CLI path > default path)
    let file_cfg = load_file_config(cli.config.as_deref())?;

    // 2. Resolve directories (CLI > Config)
    let source_dir = cli.source_dir.or(file_cfg.source_dir).ok_or_else(|| {
        eyre!("No source directory.\nUse --source-dir, or set source_dir in config.toml.")
    })?;
    let dest_dir = cli.dest_dir.or(file_cfg.dest_dir).ok_or_else(|| {
        eyre!("No destination directory.\nUse --dest-dir, or set dest_dir in config.toml.")
    })?;

    // 3. Build the Export Config
    let config = utils::ExportConfig {
        source_dir,
        dest_dir,
        strict: cli.strict || file_cfg.strict.unwrap_or(false),
        quiet: cli.quiet,
    };

    // 4. Run the conversion
    #[cfg(feature = "sequential")]
    return tomboy_zim_export::sequential::execute(config);

    #[cfg(not(feature = "sequential"))]
    tomboy_zim_export::parallel::execute(config)
}
