//! Run a source file through an interpreter and print the transcript.
//!
//! The file is cut into blocks at lines of the form `## <name>`; everything
//! up to the first marker goes into a block named `preamble`.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example transcript -- --variant python --file analysis.py
//! ```
//!
//! Dump the interpreter's variables after the last block:
//! ```bash
//! cargo run --example transcript -- --file analysis.py --vars /tmp
//! ```

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use linewise::driver::vars_artifact_name;
use linewise::{InputBlocks, SessionBuilder};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging (set RUST_LOG=debug for verbose output)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let source = std::fs::read_to_string(&args.file)?;
    let blocks = split_blocks(&source);

    let mut builder = SessionBuilder::new(&args.variant).timeout(Duration::from_secs(args.timeout));
    if let Some(command) = &args.command {
        builder = builder.command(command);
    }
    if args.lenient {
        builder = builder.lenient();
    }
    if let Some(dir) = &args.vars_dir {
        let key = args
            .file
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());
        builder = builder.record_vars(dir.join(vars_artifact_name(&key)));
    }

    let driver = builder.build_driver()?;
    println!(
        "Running {} blocks through '{}'...",
        blocks.len(),
        driver.config().spawn.command
    );

    let output = match driver.run(&blocks).await {
        Ok(output) => output,
        Err(e) => {
            if let Some(partial) = e.partial_transcript() {
                eprintln!("Partial transcript:\n{partial}");
            }
            return Err(e.into());
        }
    };

    for (key, transcript) in &output.blocks {
        println!("{}", "-".repeat(50));
        println!("[{key}]");
        println!("{}", transcript.replace("\r\n", "\n"));
    }
    println!("{}", "-".repeat(50));

    for warning in &output.warnings {
        eprintln!("warning: {warning}");
    }
    if let Some(path) = &output.vars_artifact {
        println!("Variables written to {}", path.display());
    }
    println!("Interpreter finished with {}", output.exit_status);

    Ok(())
}

fn split_blocks(source: &str) -> InputBlocks {
    let mut blocks = InputBlocks::new();
    let mut name = "preamble".to_string();
    let mut lines: Vec<&str> = Vec::new();

    for line in source.lines() {
        if let Some(marker) = line.strip_prefix("## ") {
            if !lines.is_empty() {
                blocks.insert(name, lines.join("\n"));
            }
            name = marker.trim().to_string();
            lines.clear();
        } else {
            lines.push(line);
        }
    }
    blocks.insert(name, lines.join("\n"));
    blocks
}

/// Simple argument parser (avoiding external dependencies)
struct Args {
    variant: String,
    file: PathBuf,
    command: Option<String>,
    vars_dir: Option<PathBuf>,
    lenient: bool,
    timeout: u64,
}

impl Args {
    fn parse() -> Self {
        let args: Vec<String> = env::args().collect();
        let mut variant = "python".to_string();
        let mut file = None;
        let mut command = None;
        let mut vars_dir = None;
        let mut lenient = false;
        let mut timeout = 30u64;

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--variant" | "-v" => {
                    i += 1;
                    if i < args.len() {
                        variant = args[i].clone();
                    }
                }
                "--file" | "-f" => {
                    i += 1;
                    if i < args.len() {
                        file = Some(PathBuf::from(&args[i]));
                    }
                }
                "--command" | "-c" => {
                    i += 1;
                    if i < args.len() {
                        command = Some(args[i].clone());
                    }
                }
                "--vars" => {
                    i += 1;
                    if i < args.len() {
                        vars_dir = Some(PathBuf::from(&args[i]));
                    }
                }
                "--lenient" => lenient = true,
                "--timeout" | "-t" => {
                    i += 1;
                    if i < args.len() {
                        timeout = args[i].parse().unwrap_or(30);
                    }
                }
                "--help" => {
                    Self::print_help();
                    std::process::exit(0);
                }
                _ => {
                    eprintln!("Unknown argument: {}", args[i]);
                }
            }
            i += 1;
        }

        let Some(file) = file else {
            eprintln!("Error: Must provide --file");
            std::process::exit(1);
        };

        Self {
            variant,
            file,
            command,
            vars_dir,
            lenient,
            timeout,
        }
    }

    fn print_help() {
        println!(
            r#"linewise transcript example

USAGE:
    cargo run --example transcript -- [OPTIONS] --file <FILE>

OPTIONS:
    -f, --file <FILE>        Source file, blocks separated by '## <name>' lines
    -v, --variant <NAME>     Interpreter variant or alias [default: python]
    -c, --command <CMD>      Override the interpreter command line
    --vars <DIR>             Dump interpreter variables into DIR
    --lenient                Warn instead of failing on a non-zero exit
    -t, --timeout <SECS>     Per-prompt timeout [default: 30]
    --help                   Print this help message

EXAMPLES:
    cargo run --example transcript -- --file analysis.py
    cargo run --example transcript -- --variant rint --file model.R --lenient
    cargo run --example transcript -- --variant clj --command "clojure -M -r" --file core.clj
"#
        );
    }
}
