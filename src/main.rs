mod caption;
mod error;
mod parser;
mod processor;
mod serialiser;

use crate::parser::ReaderOpts;
use crate::processor::{Outcome, OverwritePolicy, ProcessOpts};

use std::path::Path;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser as ClapParser;
use env_logger::{Builder, Env};

fn main() -> ExitCode {
    init_logger();
    if run() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn init_logger() {
    let env = Env::default().filter_or("LOGLEVEL", "info");
    Builder::from_env(env)
        .format_timestamp(None)
        .target(env_logger::Target::Stderr)
        .init();
}

#[derive(ClapParser)]
#[command(about = "Convert YouTube transcripts to SRT subtitles")]
struct Cli {
    #[arg(
        value_name = "FILE",
        required = true,
        help = "Transcript files to convert. Each FILE is written next to itself as NAME.srt."
    )]
    files: Vec<String>,
    #[arg(
        short,
        long,
        conflicts_with = "no_clobber",
        help = "Overwrite existing destination files without asking."
    )]
    yes: bool,
    #[arg(
        short,
        long,
        help = "Never overwrite existing destination files."
    )]
    no_clobber: bool,
    #[arg(
        long,
        help = "Carry the last caption's extra seconds into minutes and hours."
    )]
    carry_overflow: bool,
}

/// Returns `false` when at least one file could not be converted.
fn run() -> bool {
    let cli = Cli::parse();

    let overwrite = if cli.yes {
        OverwritePolicy::Always
    } else if cli.no_clobber {
        OverwritePolicy::Never
    } else {
        OverwritePolicy::Ask
    };
    let opts = ProcessOpts {
        reader: ReaderOpts {
            carry_overflow: cli.carry_overflow,
        },
        overwrite,
    };

    convert_all(&cli.files, &opts, processor::ask_overwrite)
}

/// Converts every file in turn. A failing file is reported and the rest
/// are still converted.
fn convert_all<F>(files: &[String], opts: &ProcessOpts, mut confirm: F) -> bool
where
    F: FnMut(&Path) -> Result<bool>,
{
    let mut all_ok = true;
    for file in files {
        match processor::convert(Path::new(file), opts, &mut confirm) {
            Ok(Outcome::Malformed) => all_ok = false,
            Ok(Outcome::Written(dst)) | Ok(Outcome::Kept(dst)) => {
                log::debug!("{} -> {}", file, dst.display());
            }
            Ok(Outcome::Missing) => (),
            Err(err) => {
                all_ok = false;
                log::error!("An error occurred: {}", err);
                for cause in err.chain().skip(1) {
                    log::error!("    {}", cause);
                }
            }
        }
    }
    all_ok
}
