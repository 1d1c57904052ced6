mod cli;
mod error_fmt;
mod rt;
mod run;

use clap::Parser;
use cli::{Cli, Commands, FILE_GUARD, JSON_MODE};
use eyre::{Result, WrapErr};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

fn main() {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    if let Err(err) = real_main(cli) {
        if JSON_MODE.get().copied().unwrap_or(false) {
            eprintln!("{}", error_fmt::format_error_json(&err));
        } else {
            eprintln!("{}", error_fmt::humanize(&err));
        }
        std::process::exit(error_fmt::exit_code_for_error(&err));
    }
}

fn real_main(cli: Cli) -> Result<()> {
    color_eyre::install()?;

    let cfg = load_config(cli.config.as_deref())?;
    init_tracing(cli.json, &cli.log_level, &cfg.logging);

    match cli.cmd {
        Commands::Run {
            ticks,
            stats,
            sim_byte,
            console,
            rt,
            rt_prio,
            rt_lock,
            rt_cpu,
        } => {
            let shutdown = Arc::new(AtomicBool::new(false));
            let flag = shutdown.clone();
            if let Err(e) = ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed)) {
                tracing::warn!(error = %e, "failed to install Ctrl-C handler");
            }

            let opts = run::RunOptions {
                ticks,
                sim_byte,
                console,
                json: cli.json,
                rt: rt::RtOptions {
                    enabled: rt,
                    prio: rt_prio,
                    lock: rt_lock,
                    cpu: rt_cpu,
                },
            };
            let loop_stats = run::run_loop(&cfg, opts, shutdown)?;

            if stats {
                run::print_stats(&loop_stats, cfg.runner.tick_hz);
            }
            if cli.json {
                println!("{}", run::stats_json(&loop_stats));
            } else {
                println!(
                    "Stopped after {} ticks (drive {}, brake {}, failsafe {})",
                    loop_stats.ticks,
                    loop_stats.drive_ticks,
                    loop_stats.brake_ticks,
                    loop_stats.failsafe_ticks
                );
            }
        }
        Commands::SelfCheck => self_check(&cfg, cli.json)?,
        Commands::Health => health(&cfg, cli.json),
    }
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<throttle_config::Config> {
    let cfg = match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .wrap_err_with(|| format!("read config {}", path.display()))?;
            throttle_config::load_toml(&text)
                .wrap_err_with(|| format!("parse config {}", path.display()))?
        }
        None => throttle_config::Config::default(),
    };
    cfg.validate().wrap_err("invalid config")?;
    Ok(cfg)
}

fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

/// Console logs go to stderr so stdout stays machine-readable.
fn init_tracing(json: bool, level: &str, logging: &throttle_config::Logging) {
    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();

    let console = fmt::layer().with_writer(std::io::stderr);
    if json {
        layers.push(console.json().with_filter(env_filter(level)).boxed());
    } else {
        layers.push(
            console
                .with_target(false)
                .with_filter(env_filter(level))
                .boxed(),
        );
    }

    if let Some(file) = logging.file.as_deref() {
        let path = Path::new(file);
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "throttle.log".to_string());
        let rotation = match logging.rotation.as_deref() {
            Some("daily") => tracing_appender::rolling::Rotation::DAILY,
            Some("hourly") => tracing_appender::rolling::Rotation::HOURLY,
            _ => tracing_appender::rolling::Rotation::NEVER,
        };
        let appender = tracing_appender::rolling::RollingFileAppender::new(rotation, dir, name);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let _ = FILE_GUARD.set(guard);
        let file_level = logging.level.as_deref().unwrap_or("info");
        layers.push(
            fmt::layer()
                .json()
                .with_ansi(false)
                .with_writer(writer)
                .with_filter(EnvFilter::new(file_level))
                .boxed(),
        );
    }

    let _ = tracing_subscriber::registry().with(layers).try_init();
}

fn self_check(cfg: &throttle_config::Config, json: bool) -> Result<()> {
    let params = throttle_core::RunParams::from_config(cfg);
    let throttle = throttle_core::Throttle::builder()
        .apply_config(cfg)
        .build()
        .wrap_err("self-check")?;
    let preset = cfg
        .current
        .preset
        .map(|p| format!("{p:?}").to_lowercase())
        .unwrap_or_else(|| "outrunner1".to_string());
    let c = throttle.current_cfg();
    let k = throttle.control_cfg();
    let s = throttle.safety_cfg();

    if json {
        println!(
            "{}",
            serde_json::json!({
                "status": "ok",
                "preset": preset,
                "max_drive_a": c.max_drive_a,
                "min_drive_a": c.min_drive_a,
                "authority_floor_a": c.authority_floor_a,
                "hysteresis": k.hysteresis,
                "soft_rpm": k.soft_rpm,
                "hard_rpm": k.hard_rpm,
                "reverse_guard_rpm": k.reverse_guard_rpm,
                "stale_timeout_ms": s.stale_timeout_ms,
                "safe_brake_a": s.safe_brake_a,
                "tick_hz": params.loop_cfg.tick_hz,
            })
        );
    } else {
        println!("Config OK");
        println!(
            "current: preset={preset} max={} A min={} A floor={} A",
            c.max_drive_a, c.min_drive_a, c.authority_floor_a
        );
        println!(
            "control: hysteresis={} soft_rpm={} hard_rpm={} reverse_guard_rpm={}",
            k.hysteresis, k.soft_rpm, k.hard_rpm, k.reverse_guard_rpm
        );
        println!(
            "safety: stale_timeout_ms={} safe_brake_a={}",
            s.stale_timeout_ms, s.safe_brake_a
        );
        println!("runner: tick_hz={}", params.loop_cfg.tick_hz);
    }
    Ok(())
}

fn health(cfg: &throttle_config::Config, json: bool) {
    let backend = if cfg!(all(feature = "hardware", target_os = "linux")) && cfg.source.device.is_some() {
        "uart"
    } else {
        "sim"
    };
    if json {
        println!(
            "{}",
            serde_json::json!({
                "status": "ok",
                "backend": backend,
                "tick_hz": cfg.runner.tick_hz,
                "version": env!("CARGO_PKG_VERSION"),
            })
        );
    } else {
        println!("OK (backend: {backend}, tick_hz: {})", cfg.runner.tick_hz);
    }
}
