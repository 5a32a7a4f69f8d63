use std::process::ExitCode;

use airborne::runner::run_with_args;

fn main() -> ExitCode {
    match run_with_args() {
        Ok(_) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("airborne: {error}");
            ExitCode::FAILURE
        }
    }
}
