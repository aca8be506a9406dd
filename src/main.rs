use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use mimalloc::MiMalloc;
use sxml::Session;

mod driver;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

const USAGE: &str = "usage: sxml <input-file>";

fn main() -> ExitCode {
    // Diagnostics go to stderr through the `log` facade.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("sxml: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> anyhow::Result<ExitCode> {
    let Some(arg) = std::env::args_os().nth(1) else {
        eprintln!("{USAGE}");
        return Ok(ExitCode::from(2));
    };
    if arg == "-h" || arg == "--help" {
        println!("{USAGE}");
        return Ok(ExitCode::SUCCESS);
    }

    let path = PathBuf::from(arg);
    let chunk_size = driver::chunk_size_from_env()?;
    let file = File::open(&path).with_context(|| format!("failed to open {}", path.display()))?;

    let mut session = Session::new();
    let summary = driver::translate_stream(&mut session, file, io::stdout().lock(), chunk_size)
        .with_context(|| format!("failed to translate {}", path.display()))?;

    log::info!(
        "translated {}: {} bytes in {} chunks, {} fragments",
        path.display(),
        summary.bytes_read,
        summary.chunks,
        summary.fragments
    );
    if !session.is_balanced() {
        log::warn!(
            "{}: input ended with {} open construct(s)",
            path.display(),
            session.open_frames()
        );
    }
    Ok(ExitCode::SUCCESS)
}
