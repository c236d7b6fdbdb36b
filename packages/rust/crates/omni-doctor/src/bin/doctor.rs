#![allow(missing_docs)]

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use omni_doctor::{
    Doctor, DoctorAction, DoctorOptions, FsNoteStore, LinkTarget, NoteKey, NoteStore, Workspace,
    load_workspace_config, parse_link_target,
};
use serde::Serialize;
use serde_json::json;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "doctor",
    about = "Corrective actions for hierarchical markdown note vaults",
    arg_required_else_help = true
)]
struct Cli {
    /// Workspace root directory (holds `workspace.yaml`).
    #[arg(
        long,
        short = 'r',
        value_name = "DIR",
        default_value = ".",
        global = true
    )]
    root: PathBuf,

    /// Extra config file deep-merged over `workspace.yaml`.
    ///
    /// Falls back to `$OMNI_DOCTOR_CONFIG` when omitted.
    #[arg(long = "conf", short = 'c', value_name = "FILE", global = true)]
    config_file: Option<PathBuf>,

    /// Output format.
    #[arg(long, short = 'o', value_enum, default_value_t = OutputFormat::Json, global = true)]
    output: OutputFormat,

    /// Debug logging on stderr (ignored when `RUST_LOG` is set).
    #[arg(long, short = 'v', default_value_t = false, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one doctor action.
    Run {
        /// heading-shift | title-extract | create-missing-links | find-broken-links
        #[arg(long, short = 'a')]
        action: DoctorAction,
        /// Candidate note (repeatable): `NAME` or `dendron://VAULT/NAME`.
        #[arg(long = "candidate", value_name = "NOTE")]
        candidates: Vec<String>,
        /// Report what would change without writing.
        #[arg(long, default_value_t = false)]
        dry_run: bool,
        /// Process at most this many candidates.
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// List configured vaults.
    Vaults,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum OutputFormat {
    Json,
    Pretty,
}

fn emit<T: Serialize>(value: &T, output: OutputFormat) -> Result<()> {
    let rendered = match output {
        OutputFormat::Json => serde_json::to_string(value),
        OutputFormat::Pretty => serde_json::to_string_pretty(value),
    }
    .context("failed to serialize CLI output as JSON")?;
    println!("{rendered}");
    Ok(())
}

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose {
            "omni_doctor=debug,doctor=debug"
        } else {
            "omni_doctor=info,doctor=info"
        })
    });
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Map a CLI candidate onto a note key without validating it; unknown vaults
/// and missing notes are reported as skipped by the runner.
fn parse_candidate(raw: &str, workspace: &Workspace, store: &dyn NoteStore) -> NoteKey {
    let fallback_vault = workspace
        .vaults()
        .first()
        .map(|vault| vault.name.clone())
        .unwrap_or_default();
    match parse_link_target(raw) {
        Some(LinkTarget::Qualified { vault, name }) => NoteKey::new(vault, name),
        Some(LinkTarget::Unqualified { name }) => workspace
            .vaults()
            .iter()
            .map(|vault| NoteKey::new(vault.name.clone(), name.clone()))
            .find(|key| match store.exists(key) {
                Ok(found) => found,
                Err(err) => {
                    log::debug!("lookup of candidate '{raw}' as {key} failed: {err}");
                    false
                }
            })
            .unwrap_or_else(|| NoteKey::new(fallback_vault, name)),
        None => NoteKey::new(fallback_vault, raw.trim()),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = load_workspace_config(&cli.root, cli.config_file.as_deref()).with_context(
        || format!("failed to load workspace config under {}", cli.root.display()),
    )?;
    let workspace = config.workspace;

    match cli.command {
        Command::Vaults => {
            let vaults: Vec<_> = workspace
                .vaults()
                .iter()
                .map(|vault| {
                    json!({
                        "name": vault.name,
                        "fs_path": vault.fs_path,
                        "dir": workspace.vault_dir(vault),
                    })
                })
                .collect();
            emit(&json!({ "root": workspace.root(), "vaults": vaults }), cli.output)
        }
        Command::Run {
            action,
            candidates,
            dry_run,
            limit,
        } => {
            let store = FsNoteStore::new(workspace.clone());
            let candidates: Vec<NoteKey> = candidates
                .iter()
                .map(|raw| parse_candidate(raw, &workspace, &store))
                .collect();
            let mut options = DoctorOptions::from_settings(action, &config.doctor)
                .with_dry_run(dry_run || config.doctor.dry_run);
            if limit.is_some() {
                options = options.with_limit(limit);
            }
            if !candidates.is_empty() {
                options = options.with_candidates(candidates);
            }
            let report = Doctor::new(&workspace, &store)
                .run(&options)
                .with_context(|| format!("doctor {action} failed"))?;
            emit(&report, cli.output)
        }
    }
}
