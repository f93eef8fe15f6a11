use std::process::ExitCode;

fn main() -> ExitCode {
    fieldquote_cli::run()
}
