use clap::Parser;
use kubecheck::check::{self, executor};
use kubecheck::cli::Cli;
use kubecheck::utils::logging;

const EXIT_INTERRUPTED: i32 = 130;

fn main() {
    let cli = Cli::parse();

    logging::init(cli.log_level.as_deref());
    if cli.no_color {
        console::set_colors_enabled(false);
    }

    // providers run in their own process groups and miss the terminal's SIGINT
    if let Err(e) = ctrlc::set_handler(|| {
        eprintln!("\nInterrupted, exiting...");
        executor::terminate_running();
        std::process::exit(EXIT_INTERRUPTED);
    }) {
        tracing::warn!("cannot install Ctrl+C handler: {}", e);
    }

    let config = cli.into_config();
    if let Err(e) = check::run_checks(&config) {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}
