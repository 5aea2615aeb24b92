use pinpoint_ci::{app, cli::Cli};
use std::io::{IsTerminal, Write};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Initialize tracing; warnings always reach stderr, --debug shows everything
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into())
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let args = match Cli::try_parse_ordered(std::env::args_os()) {
        Ok(args) => args,
        Err(e) if e.use_stderr() => {
            // Usage errors exit with 1 rather than clap's default of 2
            let _ = e.print();
            return ExitCode::FAILURE;
        }
        Err(e) => e.exit(),
    };

    init_tracing(args.debug);

    match app::run(&args) {
        Ok(output) => {
            let mut stdout = std::io::stdout().lock();
            if let Err(e) = stdout.write_all(output.as_bytes()).and_then(|()| stdout.flush()) {
                eprintln!("Error: {}", e);
                return ExitCode::FAILURE;
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            // Fatal errors bypass the RUST_LOG filter
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
