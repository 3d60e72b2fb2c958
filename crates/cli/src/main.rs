use std::process::ExitCode;

fn main() -> ExitCode {
    whispercart_cli::run()
}
