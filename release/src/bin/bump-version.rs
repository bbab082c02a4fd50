//! bump-version - print the next release version

use std::process::ExitCode;

use clap::Parser;
use santoku_release::{ReleaseType, bump};

#[derive(Debug, Parser)]
#[command(name = "bump-version", version, about = "Print the next release version")]
struct Cli {
    /// Current dotted version, e.g. 0.8
    #[arg(value_name = "VERSION")]
    current: String,

    /// `M` for a major release, anything else for a minor one
    #[arg(value_name = "RELEASE_TYPE")]
    release_type: String,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match bump(&cli.current, ReleaseType::from(cli.release_type.as_str())) {
        Ok(next) => {
            println!("{}", next);
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("Error: {}", err);
            ExitCode::FAILURE
        }
    }
}
