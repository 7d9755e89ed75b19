use std::env;
use std::fs;
use std::io::{self, Write};
use std::process::ExitCode;

use serde_json::Value;

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();
    if args.len() != 2 {
        eprintln!("usage: {} <job.json>", args.first().map(String::as_str).unwrap_or("kauma"));
        return ExitCode::FAILURE;
    }

    let text = match fs::read_to_string(&args[1]) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("cannot read {}: {}", args[1], e);
            return ExitCode::FAILURE;
        }
    };

    let job: Value = match serde_json::from_str(&text) {
        Ok(job) => job,
        Err(e) => {
            eprintln!("invalid JSON in {}: {}", args[1], e);
            return ExitCode::FAILURE;
        }
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match kauma::job::run(&job, &mut out) {
        Ok(()) => {
            let _ = out.flush();
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("job failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
