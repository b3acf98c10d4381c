use std::process::ExitCode;

fn main() -> ExitCode {
    dealcraft_cli::run()
}
