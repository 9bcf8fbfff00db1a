// src/main.rs

use std::env;
use std::process::ExitCode;

use log::info;
use num::bigint::BigInt;

use mpqs::config::MpqsConfig;
use mpqs::Session;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let arg = match env::args().nth(1) {
        Some(a) => a,
        None => {
            eprintln!("usage: mpqs <odd composite N>");
            return ExitCode::FAILURE;
        }
    };

    let n: BigInt = match arg.parse() {
        Ok(n) => n,
        Err(e) => {
            eprintln!("invalid integer '{}': {}", arg, e);
            return ExitCode::FAILURE;
        }
    };

    let config = MpqsConfig::load().unwrap_or_else(|e| {
        info!("no usable config file found ({}), using defaults", e);
        MpqsConfig::default()
    });

    let mut session = match Session::configure(n, config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("cannot factor: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let cancel_token = session.cancellation_token();
    ctrlc::set_handler(move || {
        eprintln!("\nreceived interrupt, finishing current polynomial then stopping...");
        cancel_token.cancel();
    })
    .expect("failed to install ctrl-c handler");

    let outcome = session.factor();

    for event in session.progress_events() {
        eprintln!("[{}] {}", event.at, event.message);
    }

    match outcome {
        Ok((p, q)) => {
            println!("{} = {} * {}", arg, p, q);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("factoring failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
