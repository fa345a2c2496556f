use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{exit, Command, ExitStatus};

use clap::{Parser, Subcommand, ValueEnum};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

const LAMBDA_PACKAGE: &str = "dcp_glue_lambda";
const DIST_DIR: &str = "dist";
const SCRIPT_TEMPLATE_SOURCE: &str = "assets/dcp-glue-script.py";
const SCRIPT_TEMPLATE_ENTRY: &str = "dcp-script.py";

// ── CLI definition ─────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "xtask",
    about = "Task runner for the DCP Glue automation workspace",
    long_about = "Builds and packages the Glue automation Lambdas and runs CI checks."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run CI checks (fmt, clippy, tests)
    Ci {
        /// Job to run
        #[arg(value_enum, default_value_t = CiJob::Check)]
        job: CiJob,
    },
    /// Build and package Rust Lambda artifacts for deployment
    ServerlessPackage {
        /// Compilation target triple for Lambda binaries
        #[arg(long, default_value = "x86_64-unknown-linux-gnu")]
        target: String,
        /// Build profile used for binaries
        #[arg(value_enum, long, default_value_t = BuildProfile::Release)]
        profile: BuildProfile,
    },
}

#[derive(Clone, ValueEnum)]
enum CiJob {
    /// Formatting, clippy, and tests
    Check,
    /// Check plus a release build of the Lambda binaries
    All,
}

#[derive(Clone, Copy, ValueEnum)]
enum BuildProfile {
    Debug,
    Release,
}

impl BuildProfile {
    fn dir_name(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Release => "release",
        }
    }

    fn as_cargo_flag(self) -> Option<&'static str> {
        match self {
            Self::Debug => None,
            Self::Release => Some("--release"),
        }
    }
}

/// One Lambda binary and the extra files zipped next to its `bootstrap`.
struct LambdaArtifact {
    bin_name: &'static str,
    extra_files: &'static [(&'static str, &'static str)],
}

const LAMBDA_ARTIFACTS: &[LambdaArtifact] = &[
    LambdaArtifact {
        bin_name: "create_glue_script",
        extra_files: &[(SCRIPT_TEMPLATE_SOURCE, SCRIPT_TEMPLATE_ENTRY)],
    },
    LambdaArtifact {
        bin_name: "start_glue_workflow",
        extra_files: &[],
    },
];

// ── helpers ────────────────────────────────────────────────────────

fn step(label: &str) {
    eprintln!("\n=== {label} ===");
}

fn cargo(args: &[&str]) -> ExitStatus {
    eprintln!("+ cargo {}", args.join(" "));
    Command::new("cargo")
        .args(args)
        .status()
        .expect("failed to execute cargo")
}

fn run_cargo(args: &[&str]) {
    let status = cargo(args);
    if !status.success() {
        exit(status.code().unwrap_or(1));
    }
}

fn package_serverless_lambdas(target: &str, profile: BuildProfile) {
    ensure_rust_target_installed(target);

    step("Build serverless lambda binaries");

    let mut cargo_args = vec!["build", "-p", LAMBDA_PACKAGE, "--target", target];
    for artifact in LAMBDA_ARTIFACTS {
        cargo_args.push("--bin");
        cargo_args.push(artifact.bin_name);
    }
    if let Some(flag) = profile.as_cargo_flag() {
        cargo_args.push(flag);
    }
    run_cargo(&cargo_args);

    step("Package lambda zip artifacts");
    let target_dir = Path::new("target").join(target).join(profile.dir_name());
    let dist_dir = Path::new(DIST_DIR);
    fs::create_dir_all(dist_dir).expect("failed to create lambda dist directory");

    let mut packaged = Vec::with_capacity(LAMBDA_ARTIFACTS.len());
    for artifact in LAMBDA_ARTIFACTS {
        let zip_path = dist_dir.join(format!("{}.zip", artifact.bin_name));
        package_lambda_zip(
            &target_dir.join(binary_name(artifact.bin_name, target)),
            artifact.extra_files,
            &zip_path,
        );
        packaged.push(zip_path);
    }

    eprintln!("\nPackaged artifacts:");
    for path in packaged {
        eprintln!("- {}", path.display());
    }
}

fn ensure_rust_target_installed(target: &str) {
    let output = Command::new("rustup")
        .args(["target", "list", "--installed"])
        .output();

    let output = match output {
        Ok(value) => value,
        Err(error) => {
            eprintln!(
                "warning: failed to run `rustup target list --installed` ({error}); continuing without target preflight"
            );
            return;
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        panic!(
            "failed to list installed rust targets; run `rustup target list --installed` manually. details: {}",
            stderr.trim()
        );
    }

    let installed = String::from_utf8_lossy(&output.stdout);
    if !installed.lines().any(|line| line.trim() == target) {
        panic!(
            "required rust target `{target}` is not installed. install it with `rustup target add {target}` and re-run `cargo run -p xtask -- serverless-package`"
        );
    }
}

fn binary_name(bin_name: &str, target: &str) -> String {
    if target.contains("windows") {
        format!("{bin_name}.exe")
    } else {
        bin_name.to_string()
    }
}

fn package_lambda_zip(binary_path: &Path, extra_files: &[(&str, &str)], zip_path: &Path) {
    if !binary_path.exists() {
        panic!("expected lambda binary at '{}'", binary_path.display());
    }

    let binary = fs::read(binary_path).expect("failed to read lambda binary");
    let file = fs::File::create(zip_path).expect("failed to create lambda zip");
    let mut zip = ZipWriter::new(file);
    let executable = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o755);
    zip.start_file("bootstrap", executable)
        .expect("failed to start bootstrap entry in lambda zip");
    zip.write_all(&binary)
        .expect("failed to write bootstrap entry");

    let readable = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o644);
    for (source, entry_name) in extra_files {
        let contents = fs::read(source)
            .unwrap_or_else(|error| panic!("failed to read bundled file '{source}': {error}"));
        zip.start_file(*entry_name, readable)
            .unwrap_or_else(|error| panic!("failed to start '{entry_name}' entry: {error}"));
        zip.write_all(&contents)
            .unwrap_or_else(|error| panic!("failed to write '{entry_name}' entry: {error}"));
    }

    zip.finish().expect("failed to finish lambda zip");
}

// ── CI jobs ────────────────────────────────────────────────────────

fn ci_check() {
    step("Check formatting");
    run_cargo(&["fmt", "--all", "--", "--check"]);

    step("Clippy");
    run_cargo(&[
        "clippy",
        "--all-targets",
        "--all-features",
        "--",
        "-D",
        "warnings",
    ]);

    step("Test dcp_glue_core");
    run_cargo(&["test", "-p", "dcp_glue_core"]);

    step("Test dcp_glue_lambda");
    run_cargo(&["test", "-p", LAMBDA_PACKAGE]);
}

fn ci_build() {
    step("Build lambda binaries");
    run_cargo(&["build", "-p", LAMBDA_PACKAGE, "--bins", "--release"]);
}

// ── main ───────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Ci { job } => match job {
            CiJob::Check => ci_check(),
            CiJob::All => {
                ci_check();
                ci_build();
            }
        },
        Commands::ServerlessPackage { target, profile } => {
            package_serverless_lambdas(&target, profile);
        }
    }
}
