//! assetcheck CLI
//!
//! Entry point for the `assetcheck` command-line tool.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;

use assetcheck::roundtrip::{BatchInput, RoundTripOptions, RoundTripVerifier};
use assetcheck::runner::{ManifestRunner, RunMode, RunOptions};
use assetcheck::{manifest, HarnessConfig, ToolRunner, Workspace};

const DEFAULT_CONFIG_PATH: &str = "assetcheck.toml";

#[derive(Parser)]
#[command(name = "assetcheck")]
#[command(about = "Round-trip verification for game-asset codec tools", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Verify every entry of a hashes manifest against the game dump
    Check {
        /// Directory containing the test executables (e.g. yaz0test)
        tool_dir: PathBuf,

        /// The dumped game's location
        game_dir: PathBuf,

        /// Directory to keep temporary files in
        work_dir: PathBuf,

        /// The hashes manifest (hashes.json)
        hashes_file: PathBuf,

        /// Path to harness config file (default: assetcheck.toml)
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,

        /// Attempt every entry instead of stopping at the first failure
        #[arg(long)]
        keep_going: bool,

        /// Delete each entry's artifacts after it completes
        #[arg(long)]
        clean: bool,

        /// Per-invocation tool timeout in seconds (overrides config)
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Codec round-trip self-test: decode, re-encode, re-decode, compare
    RoundtripCodec {
        /// Path to the codec test executable
        tool: PathBuf,

        /// Directory for intermediate files
        out_dir: PathBuf,

        /// Files to verify, or a single directory to enumerate
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Only verify files with this extension when enumerating
        #[arg(long)]
        ext: Option<String>,

        /// Keep intermediate files on disk
        #[arg(long)]
        no_clean: bool,

        /// Per-invocation tool timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Container repack round-trip: unpack, repack, compare archives
    RoundtripContainer {
        /// Path to the container test executable
        tool: PathBuf,

        /// An archive file, or a directory of archives to batch over
        input: PathBuf,

        /// Directory to keep temporary files in
        #[arg(long, default_value = ".")]
        work_dir: PathBuf,

        /// Only verify archives with this extension when batching
        #[arg(long)]
        ext: Option<String>,

        /// Keep unpacked members and the repacked archive on disk
        #[arg(long)]
        no_clean: bool,

        /// Per-invocation tool timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Print the effective harness configuration
    ShowConfig {
        /// Path to harness config file (default: assetcheck.toml)
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    let code = match cli.command {
        Commands::Check {
            tool_dir,
            game_dir,
            work_dir,
            hashes_file,
            config,
            keep_going,
            clean,
            timeout,
        } => run_check(
            &tool_dir,
            &game_dir,
            &work_dir,
            &hashes_file,
            config,
            keep_going,
            clean,
            timeout,
        ),
        Commands::RoundtripCodec {
            tool,
            out_dir,
            inputs,
            ext,
            no_clean,
            timeout,
        } => run_roundtrip_codec(&tool, &out_dir, inputs, ext, no_clean, timeout),
        Commands::RoundtripContainer {
            tool,
            input,
            work_dir,
            ext,
            no_clean,
            timeout,
        } => run_roundtrip_container(&tool, &input, &work_dir, ext, no_clean, timeout),
        Commands::ShowConfig { config } => run_show_config(config),
    };
    process::exit(code);
}

/// Load the harness config: an explicit path must parse, the default path
/// is optional.
fn load_config(path: Option<PathBuf>) -> Result<HarnessConfig, String> {
    match path {
        Some(path) => HarnessConfig::from_file(&path).map_err(|e| e.to_string()),
        None => {
            let default = Path::new(DEFAULT_CONFIG_PATH);
            if default.exists() {
                HarnessConfig::from_file(default).map_err(|e| e.to_string())
            } else {
                Ok(HarnessConfig::default())
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn run_check(
    tool_dir: &Path,
    game_dir: &Path,
    work_dir: &Path,
    hashes_file: &Path,
    config_path: Option<PathBuf>,
    keep_going: bool,
    clean: bool,
    timeout: Option<u64>,
) -> i32 {
    let config = match load_config(config_path) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Error loading config: {err}");
            return 1;
        }
    };

    let entries = match manifest::load_manifest(hashes_file) {
        Ok(entries) => entries,
        Err(err) => {
            eprintln!("{err}");
            return 1;
        }
    };

    let timeout = timeout.map(Duration::from_secs).unwrap_or(config.timeout());
    let tool_runner = ToolRunner::new(tool_dir, timeout);
    let runner = ManifestRunner::new(&tool_runner, &config.tools, game_dir);

    let options = RunOptions {
        mode: if keep_going {
            RunMode::KeepGoing
        } else {
            RunMode::AbortOnFailure
        },
        cleanup: clean,
    };

    match runner.run(&entries, work_dir, config.trusted_root.as_ref(), &options) {
        Ok(summary) => {
            println!(
                "{} passed, {} failed",
                summary.passed,
                summary.failures.len()
            );
            if summary.success() {
                0
            } else {
                1
            }
        }
        Err(err) => {
            eprintln!("{err}");
            1
        }
    }
}

fn run_roundtrip_codec(
    tool: &Path,
    out_dir: &Path,
    inputs: Vec<PathBuf>,
    ext: Option<String>,
    no_clean: bool,
    timeout: Option<u64>,
) -> i32 {
    let input = match batch_input(inputs) {
        Ok(input) => input,
        Err(err) => {
            eprintln!("{err}");
            return 1;
        }
    };
    let verifier = RoundTripVerifier::new(
        timeout_or_default(timeout),
        RoundTripOptions {
            extension_filter: ext,
            cleanup_on_exit: !no_clean,
        },
    );

    match verifier.run_codec_batch(tool, input, out_dir) {
        Ok(passed) => {
            println!("Success ({passed} files)");
            0
        }
        Err(batch) => {
            eprintln!("failed on file {}: {}", batch.file.display(), batch.failure);
            1
        }
    }
}

fn run_roundtrip_container(
    tool: &Path,
    input: &Path,
    work_dir: &Path,
    ext: Option<String>,
    no_clean: bool,
    timeout: Option<u64>,
) -> i32 {
    let verifier = RoundTripVerifier::new(
        timeout_or_default(timeout),
        RoundTripOptions {
            extension_filter: ext,
            cleanup_on_exit: !no_clean,
        },
    );

    if input.is_dir() {
        let outcomes = verifier.run_container_batch(
            tool,
            BatchInput::Directory(input.to_path_buf()),
            work_dir,
        );
        let mut failed = 0;
        for outcome in &outcomes {
            match &outcome.result {
                Ok(()) => println!("ok {}", outcome.file.display()),
                Err(failure) => {
                    eprintln!("failed {}: {}", outcome.file.display(), failure);
                    failed += 1;
                }
            }
        }
        println!("{} passed, {} failed", outcomes.len() - failed, failed);
        if failed == 0 {
            0
        } else {
            1
        }
    } else {
        let mut workspace = match Workspace::create(work_dir) {
            Ok(workspace) => workspace,
            Err(err) => {
                eprintln!("cannot create work directory: {err}");
                return 1;
            }
        };
        let result = verifier.verify_container_file(tool, input, &mut workspace);
        if !no_clean {
            workspace.clean();
        }
        match result {
            Ok(()) => {
                println!("success!");
                0
            }
            Err(failure) => {
                eprintln!("{failure}");
                1
            }
        }
    }
}

fn run_show_config(config_path: Option<PathBuf>) -> i32 {
    match load_config(config_path) {
        Ok(config) => {
            println!("Timeout: {}s", config.timeout().as_secs());
            println!("Tools:");
            println!("  extract:   {}", config.tools.extract);
            println!("  codec:     {}", config.tools.codec);
            println!("  container: {}", config.tools.container);
            match config.trusted_root {
                Some(root) => {
                    println!("Trusted root: {} ({})", root.path, root.sha256);
                }
                None => println!("Trusted root: (none)"),
            }
            0
        }
        Err(err) => {
            eprintln!("Configuration error: {err}");
            1
        }
    }
}

/// A single directory argument means "enumerate the directory"; anything
/// else is an explicit file list.
fn batch_input(inputs: Vec<PathBuf>) -> Result<BatchInput, String> {
    if inputs.len() == 1 && inputs[0].is_dir() {
        return Ok(BatchInput::Directory(inputs[0].clone()));
    }
    for input in &inputs {
        if input.is_dir() {
            return Err(format!(
                "{} is a directory; pass a single directory or only files",
                input.display()
            ));
        }
    }
    Ok(BatchInput::Files(inputs))
}

fn timeout_or_default(timeout: Option<u64>) -> Duration {
    Duration::from_secs(timeout.unwrap_or(assetcheck::invoke::DEFAULT_TIMEOUT_SECONDS))
}
