use rask_log_reporter::app;
use std::process::ExitCode;

fn main() -> ExitCode {
    app::main()
}
