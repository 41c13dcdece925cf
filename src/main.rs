use bank_mart_report::app;
use bank_mart_report::utils::logger;
use bank_mart_report::Cli;
use clap::Parser;
use std::process::ExitCode;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.log_json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    let code = app::execute(&cli, std::io::stdout(), std::io::stderr()).await;
    ExitCode::from(code)
}
