// fbaudit - FlashBlade audit-log collector
// Copyright (c) 2025 fbaudit Contributors
// Licensed under the MIT License

use fbaudit::cli::{parse_args, Invocation, EXIT_FATAL, EXIT_SUCCESS, USAGE};
use std::process;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Load environment variables from .env file if present
    // This is optional - if .env doesn't exist, it's silently ignored
    let _ = dotenvy::dotenv();

    let cli = match parse_args(std::env::args_os()) {
        Invocation::Run(cli) => cli,
        Invocation::Usage => {
            print!("{USAGE}");
            process::exit(EXIT_SUCCESS);
        }
        Invocation::Display(e) => e.exit(),
    };

    // Logging is torn down inside execute, so nothing is lost on exit
    let exit_code = match cli.collect.execute().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            EXIT_FATAL
        }
    };

    process::exit(exit_code);
}
