//! plystate CLI - inspect, compare and convert application state files.

use std::env;
use std::process::ExitCode;

use plystate::ply::Encoding;
use plystate::{ReadOptions, Result, VariantStore, WriteOptions};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();

    // Parse global flags
    let mut level = None;
    let mut filtered_args: Vec<&str> = Vec::new();
    for arg in &args[1..] {
        match arg.as_str() {
            "-v" | "--verbose" => level = Some("debug"),
            "-vv" | "--trace" => level = Some("trace"),
            "-q" | "--quiet" => level = Some("error"),
            _ => filtered_args.push(arg),
        }
    }
    init_logging(level);

    let Some(&command) = filtered_args.first() else {
        print_help();
        return ExitCode::SUCCESS;
    };

    let result = match (command, &filtered_args[1..]) {
        ("probe" | "p", [file]) => cmd_probe(file),
        ("dump" | "d", [file]) => cmd_dump(file),
        ("info" | "i", [file]) => cmd_info(file),
        ("diff", [a, b]) => cmd_diff(a, b),
        ("convert" | "c", [input, output, rest @ ..]) => match parse_encoding(rest) {
            Some(encoding) => cmd_convert(input, output, encoding),
            None => {
                eprintln!("Error: unknown convert option in {rest:?}");
                return ExitCode::FAILURE;
            }
        },
        ("help" | "h" | "-h" | "--help", _) => {
            print_help();
            Ok(ExitCode::SUCCESS)
        }
        (other, _) => {
            eprintln!("Error: unknown command or wrong arguments: {other}");
            eprintln!("Run 'plystate help' for usage.");
            return ExitCode::FAILURE;
        }
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(format!("plystate={level}")),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("plystate=warn")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_help() {
    println!("plystate - application state file toolkit");
    println!();
    println!("USAGE:");
    println!("    plystate [OPTIONS] <COMMAND> [ARGS]");
    println!();
    println!("COMMANDS:");
    println!("    p, probe   <file>                 Check whether a file holds application state");
    println!("    d, dump    <file>                 Print every entry");
    println!("    i, info    <file>                 Show element groups, shapes and sizes");
    println!("       diff    <a> <b>                Compare two files (exit code 1 if different)");
    println!("    c, convert <in> <out> [encoding]  Rewrite a file in another encoding");
    println!("    h, help                           Show this help");
    println!();
    println!("ENCODINGS:");
    println!("    --binary       Binary little endian (default)");
    println!("    --big-endian   Binary big endian");
    println!("    --ascii        Text");
    println!();
    println!("OPTIONS:");
    println!("    -v, --verbose    Show debug output");
    println!("    -vv, --trace     Show trace output (very verbose)");
    println!("    -q, --quiet      Only show errors");
    println!();
    println!("Without -v/-q the RUST_LOG environment variable selects the log level.");
}

fn parse_encoding(flags: &[&str]) -> Option<Encoding> {
    match flags {
        [] | ["--binary"] => Some(Encoding::BinaryLittleEndian),
        ["--big-endian"] => Some(Encoding::BinaryBigEndian),
        ["--ascii"] => Some(Encoding::Ascii),
        _ => None,
    }
}

fn load(path: &str) -> Result<VariantStore> {
    let mut report = |label: &str, fraction: f32| {
        debug!("{label} ({:.0}%)", fraction * 100.0);
    };
    VariantStore::read(path, &ReadOptions::default(), Some(&mut report))
}

fn cmd_probe(path: &str) -> Result<ExitCode> {
    if VariantStore::is_serialized_file(path) {
        println!("{path}: application state");
        Ok(ExitCode::SUCCESS)
    } else {
        println!("{path}: not an application state file");
        Ok(ExitCode::FAILURE)
    }
}

fn cmd_dump(path: &str) -> Result<ExitCode> {
    let store = load(path)?;
    println!("{store}");
    Ok(ExitCode::SUCCESS)
}

fn cmd_info(path: &str) -> Result<ExitCode> {
    let store = load(path)?;
    println!("File: {path}");
    println!("Entries: {}", store.len());
    println!();
    for (key, variant) in store.iter() {
        println!(
            "  {key:<32} {:<12} {:>10} instances {:>12} bytes",
            variant.type_id().to_string(),
            variant.instances(),
            variant.byte_size()
        );
    }
    println!();
    println!("Payload: {} bytes", store.total_size());
    Ok(ExitCode::SUCCESS)
}

fn cmd_diff(a: &str, b: &str) -> Result<ExitCode> {
    let first = load(a)?;
    let second = load(b)?;
    if plystate::diff(&first, &second) {
        Ok(ExitCode::FAILURE)
    } else {
        info!("{a} and {b} hold identical state");
        Ok(ExitCode::SUCCESS)
    }
}

fn cmd_convert(input: &str, output: &str, encoding: Encoding) -> Result<ExitCode> {
    let store = load(input)?;
    let mut report = |label: &str, fraction: f32| {
        debug!("{label} ({:.0}%)", fraction * 100.0);
    };
    let bytes = store.write(output, &WriteOptions { encoding }, Some(&mut report))?;
    println!("Wrote {} entries ({bytes} body bytes, {encoding}) to {output}", store.len());
    Ok(ExitCode::SUCCESS)
}
