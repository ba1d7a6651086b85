//! kepub: recover reader-encrypted books with the device's own credentials
//!
//! Commands:
//!   decrypt <volume-id>  - search the master key and write a decrypted copy
//!   books                - list volumes that have content keys on the device
//!   keys                 - print the candidate master key for every serial/seed
//!   config show          - display the merged configuration

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use kepub_archive::{ArchiveReader, ZipArchiveReader, ZipArchiveWriter};
use kepub_core::config::{expand_tilde, KepubConfig};
use kepub_core::TranscodeEvent;
use kepub_engine::{candidates, decrypt_volume, ProgressFn, VolumeJob, VolumeOutcome};
use kepub_secrets::{CredentialStore, KoboDatabase, VersionInfo};

// ── CLI structure ──────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "kepub",
    version,
    about = "Decrypt books stored by an e-reader",
    long_about = "kepub: recover the device master key by trial and rewrite encrypted books as plain EPUB"
)]
struct Cli {
    /// Path to kepub.toml configuration file
    #[arg(
        long,
        short = 'c',
        env = "KEPUB_CONFIG",
        default_value = "~/.config/kepub/kepub.toml"
    )]
    config: PathBuf,

    /// Reader data directory (overrides [device] kobo_dir)
    #[arg(long, env = "KEPUB_KOBO_DIR")]
    kobo_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "KEPUB_LOG")]
    log: Option<String>,

    /// Log format (json, text)
    #[arg(long, env = "KEPUB_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Debug, ValueEnum, PartialEq)]
enum LogFormat {
    Json,
    Text,
}

impl LogFormat {
    fn from_config(value: &str) -> Self {
        if value.eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Text
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Decrypt one volume into a plain EPUB
    Decrypt {
        /// Volume id (the book's file name under the kepub directory)
        volume_id: String,
        /// Encrypted book (default: <kepub_dir>/<volume-id>)
        #[arg(long, short = 'i')]
        input: Option<PathBuf>,
        /// Destination file (default: <output dir>/<volume-id>.<extension>)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
        /// Entry used to verify candidate keys (default: chosen automatically)
        #[arg(long)]
        probe_entry: Option<String>,
        /// Print the outcome as JSON
        #[arg(long)]
        json: bool,
    },

    /// List volumes with content keys in the reader database
    Books,

    /// Print the candidate master key for every serial and seed
    Keys,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the active configuration (merged defaults + config file)
    Show,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = expand_tilde(&cli.config);
    let (mut config, from_file) = load_config(&config_path)?;

    let level = cli.log.clone().unwrap_or_else(|| config.log.level.clone());
    let format = cli
        .log_format
        .clone()
        .unwrap_or_else(|| LogFormat::from_config(&config.log.format));
    init_logging(&level, &format);

    if !from_file {
        warn!(
            "config file not found: {}  (using defaults)",
            config_path.display()
        );
    }
    if let Some(dir) = &cli.kobo_dir {
        config.device.kobo_dir = dir.clone();
    }

    match cli.command {
        Commands::Decrypt {
            volume_id,
            input,
            output,
            probe_entry,
            json,
        } => cmd_decrypt(
            &config,
            &volume_id,
            input.as_deref(),
            output.as_deref(),
            probe_entry.as_deref(),
            json,
        ),
        Commands::Books => cmd_books(&config),
        Commands::Keys => cmd_keys(&config),
        Commands::Config {
            action: ConfigAction::Show,
        } => cmd_config_show(&config, &config_path, from_file),
    }
}

// ── Config loading ────────────────────────────────────────────────────────────

/// Returns the config and whether it came from a file.
fn load_config(path: &Path) -> Result<(KepubConfig, bool)> {
    if path.exists() {
        let config = KepubConfig::from_file(path)
            .with_context(|| format!("reading config: {}", path.display()))?;
        Ok((config, true))
    } else {
        Ok((KepubConfig::default(), false))
    }
}

fn init_logging(level: &str, format: &LogFormat) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // stdout is reserved for command output
    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}

/// Device serial first, then configured extras
fn device_serials(config: &KepubConfig) -> Result<Vec<String>> {
    let version = VersionInfo::load(&config.device.version_file_path())?;
    info!(
        serial = %version.serial,
        platform = version.platform_id().unwrap_or("-"),
        "device descriptor"
    );
    let mut serials = vec![version.serial];
    serials.extend(config.device.serials.iter().cloned());
    Ok(serials)
}

// ── Progress display ──────────────────────────────────────────────────────────

fn make_progress_bar(total: u64, prefix: &str) -> ProgressBar {
    let pb = ProgressBar::new(total);
    if let Ok(style) =
        ProgressStyle::with_template("{prefix:.bold} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
    {
        pb.set_style(style.progress_chars("=>-"));
    }
    pb.set_prefix(prefix.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn progress_callback(pb: &ProgressBar) -> ProgressFn {
    let pb = pb.clone();
    Box::new(move |event: &TranscodeEvent| {
        if let TranscodeEvent::Failed { name, reason, .. } = event {
            pb.println(format!("  ! {name}: {reason} (copied unchanged)"));
        }
        pb.set_message(event.name().to_string());
        pb.inc(1);
    })
}

// ── `kepub decrypt` ───────────────────────────────────────────────────────────

fn cmd_decrypt(
    config: &KepubConfig,
    volume_id: &str,
    input: Option<&Path>,
    output: Option<&Path>,
    probe_entry: Option<&str>,
    json: bool,
) -> Result<()> {
    let serials = device_serials(config)?;
    let db = KoboDatabase::open(&config.device.database_path())?;
    let user_id = db.user_id()?;
    let keys = db.content_keys(volume_id)?;

    let input = input
        .map(Path::to_path_buf)
        .unwrap_or_else(|| config.device.book_path(volume_id));
    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| config.output.book_path(volume_id));

    let mut source = ZipArchiveReader::open(&input)
        .with_context(|| format!("opening book: {}", input.display()))?;

    // Written next to the destination and renamed once complete
    let partial = partial_path(&output);
    if let Some(parent) = partial.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating output directory: {}", parent.display()))?;
    }
    let mut dest = ZipArchiveWriter::create(&partial)
        .with_context(|| format!("creating output: {}", partial.display()))?;

    let pb = if json {
        ProgressBar::hidden()
    } else {
        make_progress_bar(source.list_entries().len() as u64, "decrypt")
    };
    pb.set_message("searching for master key");
    let progress = progress_callback(&pb);

    let job = VolumeJob {
        volume_id,
        user_id: &user_id,
        serials: &serials,
        seeds: &config.search.seeds,
        keys: &keys,
        probe_entry,
    };
    let result = decrypt_volume(&job, &mut source, &mut dest, Some(&progress))
        .map_err(anyhow::Error::from)
        .and_then(|outcome| {
            dest.finish()?;
            std::fs::rename(&partial, &output)
                .with_context(|| format!("moving output into place: {}", output.display()))?;
            Ok(outcome)
        });
    pb.finish_and_clear();

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(e) => {
            let _ = std::fs::remove_file(&partial);
            return Err(e.context(format!("decrypting volume {volume_id}")));
        }
    };

    print_outcome(volume_id, &output, &outcome, json)?;

    if !outcome.report.is_clean() {
        // Written, but some entries are still encrypted
        std::process::exit(2);
    }
    Ok(())
}

fn partial_path(output: &Path) -> PathBuf {
    let mut name = output.as_os_str().to_owned();
    name.push(".partial");
    PathBuf::from(name)
}

fn print_outcome(volume_id: &str, output: &Path, outcome: &VolumeOutcome, json: bool) -> Result<()> {
    let report = &outcome.report;
    if json {
        let value = serde_json::json!({
            "volume_id": volume_id,
            "output": output.display().to_string(),
            "seed": outcome.key.seed,
            "serial": outcome.key.serial,
            "probe_entry": outcome.probe_entry,
            "report": report,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&value).context("serializing outcome")?
        );
        return Ok(());
    }

    println!("volume:     {volume_id}");
    println!("key:        seed {} / serial {}", outcome.key.seed, outcome.key.serial);
    println!(
        "entries:    {} decrypted, {} copied, {} failed",
        report.decrypted, report.copied, report.failed
    );
    for name in &report.failed_entries {
        println!("  failed:   {name}");
    }
    println!("written:    {}", output.display());
    Ok(())
}

// ── `kepub books` ─────────────────────────────────────────────────────────────

fn cmd_books(config: &KepubConfig) -> Result<()> {
    let db = KoboDatabase::open(&config.device.database_path())?;
    let volumes = db.volumes()?;
    if volumes.is_empty() {
        println!("no volumes with content keys");
        return Ok(());
    }
    for volume in volumes {
        let present = config.device.book_path(&volume.volume_id).exists();
        println!(
            "{}  {:>4} keys{}",
            volume.volume_id,
            volume.keys,
            if present { "" } else { "  (book file missing)" }
        );
    }
    Ok(())
}

// ── `kepub keys` ──────────────────────────────────────────────────────────────

fn cmd_keys(config: &KepubConfig) -> Result<()> {
    let serials = device_serials(config)?;
    let db = KoboDatabase::open(&config.device.database_path())?;
    let user_id = db.user_id()?;

    for candidate in candidates(&serials, &config.search.seeds) {
        let key = kepub_crypto::derive_master_key(&candidate.seed, &candidate.serial, &user_id);
        println!("{}  {:<12} {}", candidate.serial, candidate.seed, key.to_hex());
    }
    Ok(())
}

// ── `kepub config show` ───────────────────────────────────────────────────────

fn cmd_config_show(config: &KepubConfig, config_path: &Path, from_file: bool) -> Result<()> {
    if from_file {
        println!("# Configuration from: {}", config_path.display());
    } else {
        println!("# Configuration: defaults (no file at {})", config_path.display());
    }
    println!();
    let rendered = toml::to_string_pretty(config).context("serializing config to TOML")?;
    print!("{rendered}");
    Ok(())
}
