use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use launcher::cli::{self, Cli};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let code = cli::execute(cli).await?;

    match cli::exit_status_byte(code) {
        Some(byte) => Ok(ExitCode::from(byte)),
        // Windows exit codes such as 0xC000013A do not fit in a byte
        None => std::process::exit(code),
    }
}
