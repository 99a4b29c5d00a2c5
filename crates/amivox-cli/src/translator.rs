use std::io::{self, Write};
use std::process;

use clap::error::ErrorKind;
use clap::Parser;

/// Run an Amiga translator.library image over English text and print
/// the phonetic string
#[derive(Parser)]
#[command(
    name = "translator",
    version,
    about,
    after_help = "\
Examples:
  translator \"Hello world.\"
  translator -l translator.library~1.2 \"Hello world.\"
  translator -l translator.library~1.3.3 \"Hello world.\"
  translator -l translator.library~2.04 \"Hello world.\"

The phonetic output feeds straight into the narrator:
  translator \"Hello world.\" | narrator -"
)]
struct Cli {
    /// Translator library image (Amiga hunk format)
    #[arg(short, long, default_value = "translator.library")]
    library: String,

    /// English text to translate
    text: String,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let code = match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => 1,
            };
            let _ = err.print();
            process::exit(code);
        }
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("opening '{}'", cli.library);
    let image = match std::fs::read(&cli.library) {
        Ok(image) => image,
        Err(err) => {
            eprintln!("unable to open '{}': {}", cli.library, err);
            process::exit(1);
        }
    };

    match amivox::run_translator(&image, &cli.text) {
        Ok(phonetic) => {
            let mut stdout = io::stdout().lock();
            if stdout
                .write_all(&phonetic)
                .and_then(|()| stdout.write_all(b"\n"))
                .is_err()
            {
                process::exit(1);
            }
        }
        Err(err) => {
            eprintln!("error: {err}");
            process::exit(1);
        }
    }
}
