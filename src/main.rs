use anyhow::Result;
use clap::Parser;
use console::{Term, style};
use log::{info, warn};
use video_integrity_kit::cli::{Cli, run_command};
use video_integrity_kit::config::Config;
use video_integrity_kit::init;
use video_integrity_kit::menu::show_main_menu;
use video_integrity_kit::signal::setup_shutdown_signal;

fn main() -> Result<()> {
    init::init();
    let cli = Cli::parse();
    let shutdown_signal = setup_shutdown_signal()?;

    let mut config = Config::new()?;
    cli.apply_overrides(&mut config.settings);

    if let Some(command) = cli.command {
        return run_command(command, &config, &shutdown_signal);
    }

    let term = Term::stdout();
    loop {
        match show_main_menu(&term, &shutdown_signal, &mut config) {
            Ok(true) => {}
            Ok(false) => {
                term.clear_screen()?;
                println!("\n{}", style("再見！").green().bold());
                info!("Program exited normally");
                break;
            }
            Err(e) => {
                warn!("Program error: {e}");
                eprintln!("{} {}", style("錯誤:").red().bold(), e);
                break;
            }
        }
    }

    Ok(())
}
