use std::fs;
use std::io::IsTerminal;
use std::path::PathBuf;

use clap::Parser;
use xciso::io_utils::{ciso_cli_error, io_cli_error, simple_cli_error, CliError};
use xciso::{convert_file, output_paths, ConvertOptions};

/// Compress an Xbox ISO (Redump or raw XDVDFS) into CISO volumes.
#[derive(Parser)]
struct Args {
    /// Input image; volumes are written next to it as <input>.N.cso
    input: PathBuf,
    /// Print conversion statistics as JSON on stdout
    #[arg(long)]
    json: bool,
    /// Do not draw a progress bar
    #[arg(long)]
    no_progress: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    if let Err(e) = run() {
        eprintln!("{e}");
        std::process::exit(e.code);
    }
}

fn run() -> Result<(), CliError> {
    let args = Args::parse();
    let meta = fs::metadata(&args.input)
        .map_err(|e| io_cli_error("reading input file", &args.input, e))?;
    if !meta.is_file() {
        return Err(simple_cli_error(&format!(
            "'{}' is not a regular file",
            args.input.display()
        )));
    }

    let options = ConvertOptions {
        progress: !args.no_progress && std::io::stderr().is_terminal(),
        ..ConvertOptions::default()
    };
    let conversion =
        convert_file(&args.input, &options).map_err(|e| ciso_cli_error(&args.input, e))?;

    if args.json {
        let out = serde_json::json!({
            "input": args.input,
            "volumes": output_paths(&args.input, conversion.volumes),
            "total_bytes": conversion.descriptor.total_bytes,
            "stats": conversion.stats,
        });
        let text = serde_json::to_string_pretty(&out)
            .map_err(|e| simple_cli_error(&format!("serializing statistics: {e}")))?;
        println!("{text}");
    } else {
        for path in output_paths(&args.input, conversion.volumes) {
            eprintln!("Wrote {}", path.display());
        }
    }
    Ok(())
}
