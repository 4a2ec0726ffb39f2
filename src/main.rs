//! sprc - Command-line tool for encoding and decoding run-length sprite books

use std::process::ExitCode;

use spritecodec::cli;

fn main() -> ExitCode {
    env_logger::init();
    cli::run()
}
