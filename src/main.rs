//! Entry point: parses args, loads config, spawns the command poller and
//! drives the tick loop, printing each resolved frame to stdout (the display
//! surface proper is external).

use std::env;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::info;
use tracing_subscriber::EnvFilter;

use traymon::commands::{spawn_poller, CommandRunner};
use traymon::config::load_config;
use traymon::metrics::MetricRegistry;
use traymon::sampler::SysinfoSampler;
use traymon::template::Template;

struct ParsedArgs {
    config: Option<PathBuf>,
    once: bool,
}

fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Result<ParsedArgs, String> {
    let mut it = args.into_iter();
    let prog = it.next().unwrap_or_else(|| "traymon".into());
    let mut config: Option<PathBuf> = None;
    let mut once = false;

    while let Some(arg) = it.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                return Err(format!("Usage: {prog} [--config PATH|-c PATH] [--once]"));
            }
            "--config" | "-c" => {
                config = it.next().map(PathBuf::from);
            }
            "--once" => {
                once = true;
            }
            _ if arg.starts_with("--config=") => {
                if let Some((_, v)) = arg.split_once('=') {
                    if !v.is_empty() {
                        config = Some(PathBuf::from(v));
                    }
                }
            }
            _ => {
                return Err(format!(
                    "Unexpected argument '{arg}'. Usage: {prog} [--config PATH|-c PATH] [--once]"
                ));
            }
        }
    }
    Ok(ParsedArgs { config, once })
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let parsed = match parse_args(env::args()) {
        Ok(v) => v,
        Err(msg) => {
            eprintln!("{msg}");
            return Ok(());
        }
    };

    let config = load_config(parsed.config.as_deref());

    let commands = CommandRunner::new();
    for (key, command) in &config.custom_keys {
        commands.register(key, command);
    }
    let poller = (!config.custom_keys.is_empty()).then(|| {
        spawn_poller(
            commands.clone(),
            Duration::from_millis(config.command_poll_msec.max(1)),
        )
    });

    let mut registry = MetricRegistry::new(SysinfoSampler::new(), commands);
    registry.apply_config(&config);
    let template = Template::parse(&config.info_label);

    if parsed.once {
        registry.begin_tick(Instant::now());
        println!("{}", template.render(&mut registry));
        if let Some(handle) = poller {
            handle.abort();
        }
        return Ok(());
    }

    info!(
        "monitor starting, refresh interval {} ms",
        config.refresh_interval_msec
    );
    let mut ticker = interval(Duration::from_millis(config.refresh_interval_msec.max(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                registry.begin_tick(Instant::now());
                println!("{}", template.render(&mut registry));
            }
            _ = tokio::signal::ctrl_c() => {
                info!("shutting down");
                break;
            }
        }
    }
    if let Some(handle) = poller {
        handle.abort();
    }
    Ok(())
}
