use std::process::ExitCode;

use clap::Parser;
use status_notify::cli::{Args, run};
use status_notify::logging::init_logging;
use tracing::error;

#[tokio::main]
async fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            // Help and version go to stdout and are not failures.
            let code = if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
            let _ = e.print();
            return code;
        }
    };

    if let Err(e) = init_logging(args.verbose, args.quiet, args.log_format) {
        eprintln!("Error: {e}");
        return ExitCode::FAILURE;
    }

    let mut stdout = std::io::stdout().lock();
    match run(&args, &mut stdout).await {
        Ok(summary) => summary.to_exit_code(),
        Err(e) => {
            error!("Application error: {}", e);
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
