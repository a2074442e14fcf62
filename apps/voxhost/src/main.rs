use voxhost::app;

use std::process::ExitCode;

fn main() -> ExitCode {
    match app::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // The logger may not be installed yet, or already closed
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
