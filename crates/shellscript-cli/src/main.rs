//! shs - run shellscript helpers from the command line.
//!
//! Logs go to stderr; command results go to stdout.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use shellscript::fs::{
    combine_files, copy_file_with_progress, cp, find, find_dirs, format_bytes, split_chunks,
    split_file, ConsoleProgress, CopyOptions,
};
use shellscript::process::{
    list_processes, run, sh_with, to_records, ProcessFilter, RunOptions, ShOptions,
};
use shellscript::system::SystemMonitor;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "shs", version)]
#[command(about = "Shell scripting helpers: files, processes and system info")]
struct Cli {
    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a command and exit with its exit code
    Run {
        /// Command line, passed to the platform shell
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,

        /// Kill the command after this many seconds
        #[arg(short, long)]
        timeout: Option<f64>,

        /// Split on whitespace and execute directly instead of using the shell
        #[arg(long)]
        no_shell: bool,

        /// Refuse to start if a process with the same program name is running
        #[arg(long)]
        unique: bool,
    },

    /// Run a script file line by line
    Sh {
        script: PathBuf,

        /// Stop at the first line that exits non-zero
        #[arg(short = 'e', long)]
        stop_on_error: bool,
    },

    /// List processes
    Ps {
        /// Hide system and kernel processes
        #[arg(short, long)]
        user_only: bool,

        /// Only processes whose name contains this text (case-insensitive)
        #[arg(short, long)]
        name: Option<String>,

        /// Attributes to print as JSON records
        #[arg(long, value_delimiter = ',', default_value = "pid,name,username,memory_rss")]
        attrs: Vec<String>,
    },

    /// Show CPU, memory and disk usage
    Sys {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,

        /// Report the disk holding this path
        #[arg(long, default_value = ".")]
        path: PathBuf,
    },

    /// Find paths matching a glob mask
    Find {
        dir: PathBuf,

        #[arg(default_value = "*")]
        mask: String,

        /// Search every depth
        #[arg(short, long)]
        recursive: bool,

        /// Directories only
        #[arg(long)]
        dirs: bool,
    },

    /// Copy a file or directory tree
    Cp {
        src: PathBuf,
        dest: PathBuf,

        /// Show a progress bar (files only)
        #[arg(short, long)]
        progress: bool,
    },

    /// Split a file into numbered chunks
    Split {
        file: PathBuf,

        /// Chunk size in bytes; K, M and G suffixes are powers of 1024
        #[arg(short, long, value_parser = parse_size)]
        size: u64,
    },

    /// Join chunks produced by `split`
    Combine {
        /// First chunk (`name.001`); the rest are found next to it
        first_chunk: PathBuf,

        output: PathBuf,
    },

    /// Print the operating system name and version
    Os,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Set up logging
    let default_level = if cli.debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    debug!("Parsed arguments: {:?}", cli);
    execute(cli.command)
}

fn execute(command: Command) -> Result<ExitCode> {
    match command {
        Command::Run {
            command,
            timeout,
            no_shell,
            unique,
        } => {
            let mut opts = RunOptions::new()
                .with_capture_output(false)
                .with_shell(!no_shell)
                .with_ensure_unique(unique);
            if let Some(seconds) = timeout {
                let timeout = Duration::try_from_secs_f64(seconds)
                    .with_context(|| format!("invalid timeout {}", seconds))?;
                opts = opts.with_timeout(timeout);
            }

            let output = run(&command.join(" "), &opts)?;
            info!("Finished in {:.2?} with code {:?}", output.elapsed, output.code);
            Ok(exit_code(output.code))
        }

        Command::Sh {
            script,
            stop_on_error,
        } => {
            let text = shellscript::fs::read_text(&script)?;
            let opts = RunOptions::new().with_capture_output(false);
            let outputs = sh_with(&text, &opts, ShOptions { stop_on_error })?;
            let last = outputs.last().and_then(|o| o.code).unwrap_or(0);
            Ok(exit_code(Some(last)))
        }

        Command::Ps {
            user_only,
            name,
            attrs,
        } => {
            let filter = if user_only {
                ProcessFilter::user_only()
            } else {
                ProcessFilter::default()
            };
            let mut processes = list_processes(&filter);
            if let Some(needle) = name {
                let needle = needle.to_lowercase();
                processes.retain(|p| p.name.to_lowercase().contains(&needle));
            }

            let attrs: Vec<&str> = attrs.iter().map(String::as_str).collect();
            for record in to_records(&processes, &attrs)? {
                println!("{}", record);
            }
            Ok(ExitCode::SUCCESS)
        }

        Command::Sys { json, path } => {
            let monitor = SystemMonitor::default();
            let snapshot = monitor.system_snapshot();
            let disk = monitor.disk_usage(&path)?;

            if json {
                let value = serde_json::json!({ "system": snapshot, "disk": disk });
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else {
                println!("CPU:    {:.1}% of {} cores", snapshot.cpu_usage, snapshot.cpu_count);
                println!(
                    "RAM:    {} / {}",
                    format_bytes(snapshot.ram_used, true),
                    format_bytes(snapshot.ram_total, true)
                );
                println!(
                    "Swap:   {} / {}",
                    format_bytes(snapshot.swap_used, true),
                    format_bytes(snapshot.swap_total, true)
                );
                println!(
                    "Load:   {:.2} {:.2} {:.2}",
                    snapshot.load_average[0], snapshot.load_average[1], snapshot.load_average[2]
                );
                println!("Uptime: {}s", snapshot.uptime);
                println!(
                    "Disk:   {} / {} ({}%)",
                    format_bytes(disk.used, true),
                    format_bytes(disk.total, true),
                    disk.percent
                );
            }
            Ok(ExitCode::SUCCESS)
        }

        Command::Find {
            dir,
            mask,
            recursive,
            dirs,
        } => {
            let found = if dirs {
                find_dirs(&dir, &mask, recursive)?
            } else {
                find(&dir, &mask, recursive)?
            };
            for path in found {
                println!("{}", path.display());
            }
            Ok(ExitCode::SUCCESS)
        }

        Command::Cp {
            src,
            dest,
            progress,
        } => {
            if progress && src.is_file() {
                let mut bar = ConsoleProgress::new();
                copy_file_with_progress(&src, &dest, CopyOptions::default(), |p| bar.update(p))?;
            } else {
                cp(&src, &dest)?;
            }
            Ok(ExitCode::SUCCESS)
        }

        Command::Split { file, size } => {
            for chunk in split_file(&file, size, true)? {
                println!("{}", chunk.display());
            }
            Ok(ExitCode::SUCCESS)
        }

        Command::Combine {
            first_chunk,
            output,
        } => {
            let chunks = split_chunks(&first_chunk);
            if chunks.is_empty() {
                bail!(
                    "{} is not the first chunk of a complete set",
                    first_chunk.display()
                );
            }
            let written = combine_files(&output, &chunks)?;
            info!("Combined {} chunks into {} ({} bytes)", chunks.len(), output.display(), written);
            Ok(ExitCode::SUCCESS)
        }

        Command::Os => {
            println!("{}", shellscript::os_name());
            println!("{}", shellscript::os_version());
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Map a child exit code onto ours; signals become 1.
fn exit_code(code: Option<i32>) -> ExitCode {
    match code {
        Some(0) => ExitCode::SUCCESS,
        Some(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        None => ExitCode::FAILURE,
    }
}

/// Parse `4096`, `64K`, `10M` or `1G`.
fn parse_size(text: &str) -> std::result::Result<u64, String> {
    let text = text.trim();
    let (digits, multiplier) = match text.char_indices().last() {
        Some((i, 'k' | 'K')) => (&text[..i], 1u64 << 10),
        Some((i, 'm' | 'M')) => (&text[..i], 1u64 << 20),
        Some((i, 'g' | 'G')) => (&text[..i], 1u64 << 30),
        _ => (text, 1),
    };
    let value: u64 = digits
        .trim()
        .parse()
        .map_err(|_| format!("invalid size {:?}", text))?;
    if value == 0 {
        return Err("size must be greater than zero".to_string());
    }
    value
        .checked_mul(multiplier)
        .ok_or_else(|| format!("size {:?} is too large", text))
}
