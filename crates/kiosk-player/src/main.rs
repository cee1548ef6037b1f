use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};

use kiosk_player::config;
use kiosk_player::controller::DisplayController;
use kiosk_player::debounce::Debouncer;
use kiosk_player::input::SysfsInput;
use kiosk_player::media;
use kiosk_player::poll::{ButtonPoller, LineBinding};
use kiosk_player::supervisor::{DisplayBackend, ProcessSupervisor};
use kiosk_player::{envcheck, Error, Result};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the kiosk: show the image, poll the buttons, drive the renderers
    Run {
        /// Path to the kiosk TOML config
        #[arg(long, default_value = "/etc/kiosk-player.toml")]
        config: PathBuf,
    },
    /// Check renderer programs and media files, then exit
    Check {
        #[arg(long, default_value = "/etc/kiosk-player.toml")]
        config: PathBuf,
    },
    /// List the media files available for slot assignment
    Media {
        #[arg(long, default_value = "/etc/kiosk-player.toml")]
        config: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    match args.cmd {
        Command::Run { config } => cmd_run(&config),
        Command::Check { config } => cmd_check(&config),
        Command::Media { config } => cmd_media(&config),
    }
}

fn cmd_run(path: &Path) -> Result<()> {
    let cfg = config::load(path)?;
    envcheck::check(&cfg);

    let supervisor = Arc::new(ProcessSupervisor::new(
        cfg.viewer.clone(),
        cfg.player.clone(),
    ));
    let controller = DisplayController::new(
        cfg.media.image_path(),
        cfg.media.slot_paths(),
        Arc::clone(&supervisor) as Arc<dyn DisplayBackend>,
    );
    controller.startup();

    let bindings: Vec<LineBinding> = cfg
        .input
        .lines
        .iter()
        .enumerate()
        .map(|(i, &line)| LineBinding {
            line,
            slot: (i + 1) as media::SlotId,
        })
        .collect();
    let input = SysfsInput::new(cfg.input.gpio_root.clone(), cfg.input.active_low);
    let poller = ButtonPoller::new(
        input,
        Debouncer::new(cfg.input.debounce_window()),
        bindings,
        cfg.input.poll_interval(),
        controller,
    );

    // Blocks for the life of the daemon.
    poller.run();

    supervisor.kill_all();
    Ok(())
}

fn cmd_check(path: &Path) -> Result<()> {
    let cfg = config::load(path)?;
    let report = envcheck::check(&cfg);
    if !report.ok() {
        return Err(Error::renderer(format!(
            "missing renderer programs: {}",
            report.missing_programs.join(", ")
        )));
    }
    Ok(())
}

fn cmd_media(path: &Path) -> Result<()> {
    let cfg = config::load(path)?;
    let lib = media::scan(&cfg.media);

    println!("images:");
    for entry in &lib.images {
        println!("  {:<28} {}", entry.name, entry.path.display());
    }
    println!("videos:");
    for entry in &lib.videos {
        println!("  {:<28} {}", entry.name, entry.path.display());
    }
    Ok(())
}
