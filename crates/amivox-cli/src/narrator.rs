use std::io::{self, BufRead};
use std::process;

use clap::error::ErrorKind;
use clap::Parser;

use amivox::machine::Halt;

/// Run an Amiga narrator.device image and write its speech to stdout
#[derive(Parser)]
#[command(
    name = "narrator",
    version,
    about,
    after_help = "\
Examples:
  narrator \"/HEH4LOW WER4LD.\"
  narrator -d narrator.device~1.0 \"/HEH4LOW WER4LD.\"
  narrator -d narrator.device~1.1 \"/HEH4LOW WER4LD.\"
  narrator -d narrator.device~1.2 \"/HEH4LOW WER4LD.\"
  narrator -d narrator.device~2.04 \"/HEH4LOW WER4LD.\"
  narrator -              # read one line of phonetic text from stdin

PCM samples are written to stdout as signed 8-bit (S8) at 22200 Hz;
on Linux, play them with: aplay -f S8 -r 22200

Set RUST_LOG=debug for the library-call trace, RUST_LOG=trace for a
per-instruction register dump; RUST_LOG=warn speeds things up."
)]
struct Cli {
    /// Narrator device image (Amiga hunk format)
    #[arg(short, long, default_value = "narrator.device")]
    device: String,

    /// Phonetic text, or "-" to read one line from stdin
    input: String,
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

    let phonetic = if cli.input == "-" {
        log::info!("reading first line from stdin");
        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) | Err(_) => {
                eprintln!("no input");
                process::exit(1);
            }
            Ok(_) => {}
        }
        if line.ends_with('\n') {
            line.pop();
        }
        line
    } else {
        cli.input.clone()
    };

    log::info!("opening '{}'", cli.device);
    let image = match std::fs::read(&cli.device) {
        Ok(image) => image,
        Err(err) => {
            eprintln!("unable to open '{}': {}", cli.device, err);
            process::exit(1);
        }
    };

    let stdout = io::stdout().lock();
    match amivox::run_narrator(&image, &phonetic, stdout) {
        Ok(Halt::Stopped) => {}
        Ok(Halt::GuestReply { io_error }) => {
            eprintln!("device replied with io_Error {io_error:#x}");
            process::exit(1);
        }
        Err(err) => {
            eprintln!("error: {err}");
            process::exit(1);
        }
    }
}
