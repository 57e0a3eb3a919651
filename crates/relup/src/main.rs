//! relup command-line entry point.

// The binary reports through workflow commands on stdout and diagnostics on stderr
#![allow(clippy::print_stdout, clippy::print_stderr)]

use relup::cli::{self, Cli, EXIT_FAILED, EXIT_OK};
use relup::{Workflow, commands};

fn main() {
    // NOTE: tracing may not be usable during a panic
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Application panicked: {panic_info}");
        eprintln!("Internal error occurred. Run with RUST_LOG=debug for more information.");
    }));

    let cli = cli::parse();
    std::process::exit(run_with_tokio(&cli));
}

/// Create the tokio runtime and run the install
fn run_with_tokio(cli: &Cli) -> i32 {
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Fatal error: Failed to create tokio runtime: {e}");
            return EXIT_FAILED;
        }
    };

    rt.block_on(run(cli))
}

async fn run(cli: &Cli) -> i32 {
    if let Err(e) = relup::tracing::init_tracing(cli.tracing_config()) {
        eprintln!("{e:?}");
    }

    let workflow = Workflow::from_env();
    let mut stdout = std::io::stdout();

    match commands::execute(cli, &workflow, &mut stdout).await {
        Ok(_) => EXIT_OK,
        Err(e) => {
            if let Err(write_err) = workflow.error(&e.to_string(), &mut stdout) {
                eprintln!("Failed to write error annotation: {write_err}");
            }
            // The annotation already carries the message on a runner
            if std::env::var_os("GITHUB_ACTIONS").is_none() {
                eprintln!("{:?}", miette::Report::new(e));
            }
            EXIT_FAILED
        }
    }
}
