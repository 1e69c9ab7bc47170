// ABOUTME: Main entry point for the ocr-deck program.
// ABOUTME: Provides the CLI interface and is the only place that exits the process.

use clap::Parser;
use log::{error, info, LevelFilter};
use ocr_deck::logging::{setup_logger, LogSettings};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the YAML configuration file
    #[arg(short, long, default_value = ocr_deck::config::DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Directory for the dated log files
    #[arg(long, default_value = "logs")]
    log_dir: PathBuf,

    /// Tesseract language code(s), e.g. 'eng' or 'eng+deu'
    #[arg(long, default_value = ocr_deck::ocr::DEFAULT_LANGUAGE)]
    lang: String,

    /// Print debug messages to the console as well
    #[arg(short, long)]
    verbose: bool,
}

fn execute(cli: &Cli) -> ocr_deck::Result<ocr_deck::RunReport> {
    let config = ocr_deck::Config::load(&cli.config)?;
    let recognizer = ocr_deck::TesseractRecognizer::new(&cli.lang)?;
    ocr_deck::generate_presentation(&config, &recognizer)
}

fn main() {
    let cli = Cli::parse();

    let settings = LogSettings {
        directory: cli.log_dir.clone(),
        console_level: if cli.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        },
        ..LogSettings::default()
    };
    if let Err(e) = setup_logger(&settings) {
        eprintln!("Failed to initialize logger: {}", e);
        std::process::exit(1);
    }

    match execute(&cli) {
        Ok(report) => {
            info!("{}", report.summary());
        }
        Err(e) => {
            error!("{}", e);
            log::logger().flush();
            std::process::exit(1);
        }
    }
}
