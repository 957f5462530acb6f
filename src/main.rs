use std::process::ExitCode;

use hubscan::cli;
use hubscan::ui::output;

fn main() -> ExitCode {
    match cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            output::error(output::format_error_chain(err.as_ref()));
            ExitCode::FAILURE
        }
    }
}
