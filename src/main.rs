use std::env;
use std::process::ExitCode;

use framelog::{dump_file, DumpStyle};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

// Renders a closed log file as text: `framelog <log-file> <text-file>`.
fn main() -> ExitCode {
    let (writer, _guard) = tracing_appender::non_blocking(std::io::stderr());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(writer)
        .with_target(false)
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    let [input, output] = args.as_slice() else {
        eprintln!("usage: framelog <log-file> <text-file>");
        return ExitCode::from(2);
    };

    match dump_file(input, output, &DumpStyle::default()) {
        Ok(records) => {
            info!(input = %input, output = %output, records, "dump complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(input = %input, output = %output, "dump failed: {e}");
            ExitCode::FAILURE
        }
    }
}
