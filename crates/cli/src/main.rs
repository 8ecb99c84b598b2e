use std::process::ExitCode;

fn main() -> ExitCode {
    soundrent_cli::run()
}
