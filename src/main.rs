use std::process::ExitCode;

use meshlock::ui::output;

fn main() -> ExitCode {
    match meshlock::cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}
