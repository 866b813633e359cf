mod cli;
mod run;

use clap::Parser;
use eyre::WrapErr;
use pitctl_core::error::Result as CoreResult;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use cli::{Cli, Commands, FILE_GUARD};

fn humanize(err: &eyre::Report) -> String {
    use pitctl_core::error::{BuildError, CoreError};

    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingAdc
            | BuildError::MissingFan
            | BuildError::MissingDamper
            | BuildError::MissingBuzzer
            | BuildError::MissingStore => format!(
                "What happened: {be}.\nLikely causes: A backend failed to initialize or was not wired into the builder.\nHow to fix: Check the backend construction logs and the [sampler]/[fan] sections of the config."
            ),
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun. See etc/pitctl.toml for a sample."
            ),
        };
    }

    if let Some(ce) = err.downcast_ref::<CoreError>() {
        if let CoreError::Storage(s) = ce {
            return format!(
                "What happened: Session storage failed ({s}).\nLikely causes: The session file path is not writable or the disk is full.\nHow to fix: Check [session].file in the config and free space, then rerun."
            );
        }
        return format!(
            "What happened: {ce}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
        );
    }

    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();

    if lower.contains("calibration csv") {
        return String::from("Invalid calibration CSV. Expected headers 'probe,field,value'.");
    }
    if lower.contains("exactly 3 probes") {
        return format!(
            "What happened: {msg}.\nHow to fix: Declare [[probes]] entries for pit, meat1 and meat2 in the config."
        );
    }
    if lower.contains("no recorded session") {
        return format!("What happened: {msg}.\nHow to fix: Run a cook first (`pitctl run`), then export.");
    }

    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Build a file sink writer with optional rotation, storing the non-blocking
/// guard in OnceLock.
fn file_layer(
    file: Option<&str>,
    rotation: Option<&str>,
) -> Option<tracing_appender::non_blocking::NonBlocking> {
    let path = file?;
    let p = std::path::Path::new(path);
    if let Some(parent) = p.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let file_appender = match rotation.unwrap_or("never").to_ascii_lowercase().as_str() {
        "daily" => tracing_appender::rolling::daily(".", path),
        "hourly" => tracing_appender::rolling::hourly(".", path),
        _ => tracing_appender::rolling::never(".", path),
    };
    let (nb_writer, guard) = tracing_appender::non_blocking(file_appender);
    let _ = FILE_GUARD.set(guard);
    Some(nb_writer)
}

/// Initialize tracing once for the whole app. RUST_LOG wins over the CLI
/// level when set.
fn init_tracing(json: bool, level: &str, file: Option<&str>, rotation: Option<&str>) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        let console = fmt::layer().json().with_target(false);
        if let Some(nb_writer) = file_layer(file, rotation) {
            let file_l = fmt::layer()
                .with_ansi(false)
                .with_target(false)
                .with_writer(nb_writer);
            registry.with(console).with(file_l).init();
        } else {
            registry.with(console).init();
        }
    } else {
        let console = fmt::layer().pretty().with_target(false);
        if let Some(nb_writer) = file_layer(file, rotation) {
            let file_l = fmt::layer()
                .with_ansi(false)
                .with_target(false)
                .with_writer(nb_writer);
            registry.with(console).with(file_l).init();
        } else {
            registry.with(console).init();
        }
    }
}

fn try_main(args: &Cli) -> CoreResult<()> {
    let raw = std::fs::read_to_string(&args.config)
        .wrap_err_with(|| format!("reading config {}", args.config.display()))?;
    let cfg = pitctl_config::load_toml(&raw).wrap_err("parsing config TOML")?;

    init_tracing(
        args.json,
        &args.log_level,
        cfg.logging.file.as_deref(),
        cfg.logging.rotation.as_deref(),
    );

    let calibration = match &args.calibration {
        Some(path) => Some(
            pitctl_config::load_calibration_csv(path)
                .wrap_err("loading calibration CSV")?,
        ),
        None => None,
    };

    match &args.cmd {
        Commands::Run {
            setpoint,
            duration_s,
            new_session,
            snapshot,
        } => run::run(
            &cfg,
            calibration.as_ref(),
            *setpoint,
            *duration_s,
            *new_session,
            *snapshot,
        ),
        Commands::Export { format, out } => run::export(&cfg, *format, out.as_deref()),
        Commands::SelfCheck => run::self_check(&cfg, calibration.as_ref()),
    }
}

fn main() {
    let args = Cli::parse();
    if let Err(err) = try_main(&args) {
        eprintln!("{}", humanize(&err));
        std::process::exit(1);
    }
}
