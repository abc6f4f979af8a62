use clap::Parser;
use docs_template_cli::{exit_code_for, init_logging, run, Cli};
use docs_template_core::ExitCode;

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            let exit = if err.use_stderr() {
                ExitCode::InvalidArguments
            } else {
                ExitCode::Success
            };
            return std::process::ExitCode::from(exit as u8);
        }
    };

    init_logging(cli.verbose);

    match run(cli).await {
        Ok(exit) => std::process::ExitCode::from(exit as u8),
        Err(err) => {
            eprintln!("docs-template-update error: {err:#}");
            std::process::ExitCode::from(exit_code_for(&err) as u8)
        }
    }
}
