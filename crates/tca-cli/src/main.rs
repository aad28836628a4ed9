// tca CLI entry point.

use clap::Parser;

mod commands;
mod exit_code;
mod logging;
mod output;

#[derive(Parser)]
#[command(
    name = "tca",
    version,
    about = "Administrative client for the TCA academic records backend"
)]
struct Cli {
    #[command(flatten)]
    global: commands::GlobalArgs,

    #[command(subcommand)]
    command: commands::Command,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init(cli.global.verbose);

    let format = output::OutputFormat::detect(cli.global.json);
    let code = match commands::run(cli.global, cli.command).await {
        Ok(()) => exit_code::ExitCode::Success,
        Err(err) => {
            output::print_anyhow_error(format, &err);
            exit_code::ExitCode::from_error(&err)
        }
    };

    std::process::exit(code.code());
}
