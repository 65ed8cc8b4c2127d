// Entrypoint for the CLI application.
// - Keeps `main` small: parse flags, open both stores, run one command.
// - Returns `anyhow::Result` so a missing data file or a failed write
//   prints the error and exits non-zero.

use clap::{error::ErrorKind, CommandFactory, Parser};
use job_seeker::{
    cli::Cli,
    config::Config,
    prompt::TerminalPrompter,
    ui::{run, Stores},
};

fn main() -> anyhow::Result<()> {
    // Logging is off unless RUST_LOG asks for it.
    env_logger::init();

    let cli = Cli::parse();
    let command = match cli.resolve() {
        Ok(command) => command,
        Err(e) => Cli::command()
            .error(ErrorKind::MissingRequiredArgument, e)
            .exit(),
    };

    // Both files must be readable before any command runs.
    let config = Config::load()?.with_data_dir(cli.data_dir.clone());
    let stores = Stores::open(&config)?;

    let mut prompter = TerminalPrompter;
    let stdout = std::io::stdout();
    run(&command, &stores, &mut prompter, &mut stdout.lock())?;
    Ok(())
}
