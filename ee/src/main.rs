//! ee - playground binary for the eventemitter crate

use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use tracing::{debug, info};

use eventemitter::cli::{Cli, Command};
use eventemitter::{Arg, Emitter, EmitterConfig, EventKey, Listener};

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { tracing::Level::DEBUG } else { tracing::Level::WARN };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    debug!("Logging initialized (verbose: {})", verbose);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose).context("Failed to setup logging")?;

    let config = EmitterConfig::load(cli.config.as_ref()).context("Failed to load configuration")?;
    config.apply();
    info!(default_max_listeners = config.default_max_listeners, "ee starting");

    match cli.command {
        Command::Demo => cmd_demo(&config),
        Command::LeakCheck { listeners, max } => cmd_leak_check(&config, listeners, max),
        Command::Emit {
            event,
            args,
            no_listener,
        } => cmd_emit(&config, event, &args, no_listener),
        Command::Config => cmd_config(&config),
    }
}

fn announce(message: &'static str) -> Listener {
    Listener::new(move |_, _| {
        println!("  {}", message);
        Ok(())
    })
}

fn cmd_demo(config: &EmitterConfig) -> Result<()> {
    let emitter = Emitter::with_config(config);

    emitter
        .on("eventName1", announce("An event occurred!"))
        .on("eventName1", announce("Another event occurred!"))
        .once("eventName1", announce("Third event occurred!"))
        .once("eventName1", announce("Fourth event occurred!"));

    println!("{}", "listeners".bold());
    for listener in emitter.listeners("eventName1") {
        println!("  {:?}", listener);
    }
    println!("{}", "rawListeners".bold());
    for listener in emitter.raw_listeners("eventName1") {
        println!("  {:?}", listener);
    }

    print_count("before:", &emitter);
    for _ in 0..2 {
        println!("{} eventName1", "emit".cyan());
        emitter.emit("eventName1", &[])?;
        print_count("after:", &emitter);
    }
    Ok(())
}

fn print_count(label: &str, emitter: &Emitter) {
    println!(
        "{} {}",
        label.bold(),
        emitter.listener_count("eventName1").to_string().green()
    );
}

fn cmd_leak_check(config: &EmitterConfig, listeners: usize, max: Option<i64>) -> Result<()> {
    let emitter = Emitter::with_config(config);
    if let Some(n) = max {
        emitter.set_max_listeners(n);
    }

    for _ in 0..listeners {
        emitter.on("leaky", Listener::new(|_, _| Ok(())));
    }

    println!(
        "{} {} listeners on 'leaky' (max {})",
        "✓".green(),
        emitter.listener_count("leaky"),
        emitter.max_listeners()
    );
    Ok(())
}

/// Parse a CLI argument as JSON, falling back to a plain string
fn parse_arg(raw: &str) -> Arg {
    serde_json::from_str::<serde_json::Value>(raw)
        .map(Arg::from)
        .unwrap_or_else(|_| Arg::from(raw))
}

fn cmd_emit(config: &EmitterConfig, event: String, raw_args: &[String], no_listener: bool) -> Result<()> {
    let emitter = Emitter::with_config(config);
    let key = EventKey::from(event);

    if !no_listener {
        let name = key.to_string();
        emitter.on(
            key.clone(),
            Listener::new(move |_, args| {
                let rendered: Vec<String> = args.iter().map(Arg::to_string).collect();
                println!("{} {}({})", "→".cyan(), name, rendered.join(", "));
                Ok(())
            }),
        );
    }

    let args: Vec<Arg> = raw_args.iter().map(|raw| parse_arg(raw)).collect();
    let handled = emitter
        .emit(key.clone(), &args)
        .context(format!("Emitting '{}' failed", key))?;

    if handled {
        println!("{} '{}' handled", "✓".green(), key);
    } else {
        println!("{} '{}' had no listeners", "✗".yellow(), key);
    }
    Ok(())
}

fn cmd_config(config: &EmitterConfig) -> Result<()> {
    let rendered = serde_yaml::to_string(config).context("Failed to render configuration")?;
    print!("{}", rendered);
    Ok(())
}
