use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use doujin_archive_core::config::LogLevel;
use doujin_archive_core::logging::{init_console_logger, init_logger};
use doujin_archive_core::rename::RenameOutcome;
use doujin_archive_core::scan;
use doujin_archive_core::sync::CleanupReport;
use doujin_archive_core::{Archive, CleanupMode, Config, WorkStatus};
use log::info;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "doujin-archive")]
#[command(about = "Catalog, rename and tidy doujin work folders")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Catalog database (overrides the configuration)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Base directory holding work folders; repeatable (replaces the configured list)
    #[arg(long = "base-dir", global = true)]
    base_dirs: Vec<PathBuf>,

    /// Directory for the rolling log file
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan base directories and report (or export) the folders found
    Scan {
        /// Write the scan as JSON to this file
        #[arg(long, conflicts_with = "per_base")]
        export: Option<PathBuf>,

        /// Write scan_YYYYMMDD_HHMM.json into each base directory
        #[arg(long)]
        per_base: bool,
    },

    /// Classify works inside 【画像N枚以上】 folders and export JSON and CSV per base directory
    Classify {
        /// Image count threshold (overrides the configuration)
        #[arg(long)]
        threshold: Option<u32>,
    },

    /// Manage scan targets stored in the catalog
    Target {
        #[command(subcommand)]
        command: TargetCommand,
    },

    /// Register scanned folders as pending works
    Load {
        /// Scan export to load (defaults to the newest export in each base directory)
        file: Option<PathBuf>,
    },

    /// Parse the names of pending works into drafts
    Analyze,

    /// Resolve drafts into dictionary entries on the works
    Review,

    /// Mark works as confirmed for renaming
    Confirm {
        #[arg(required = true)]
        ids: Vec<i64>,
    },

    /// Set the status of works
    Mark {
        #[arg(value_enum)]
        status: StatusArg,

        #[arg(required = true)]
        ids: Vec<i64>,
    },

    /// Credit a circle (and optionally an author) to a work
    LinkCircle {
        id: i64,
        circle: String,

        #[arg(long)]
        author: Option<String>,
    },

    /// Attach a source to a work
    LinkSource { id: i64, source: String },

    /// Show the canonical name of a work without renaming
    Preview { id: i64 },

    /// Rename one work, or every confirmed work with an audit log
    Rename { id: Option<i64> },

    /// Compare the catalog with the folders on disk
    Sync,

    /// Delete works whose folder no longer exists
    CleanDb,

    /// Delete folders the catalog does not know
    CleanFs {
        /// Actually delete (default is a dry run)
        #[arg(long)]
        execute: bool,
    },

    /// Delete folders without images
    CleanZero {
        /// Actually delete (default is a dry run)
        #[arg(long)]
        execute: bool,
    },

    /// Delete relation rows left behind by deleted works
    CleanOrphan,

    /// Generate default configuration file
    GenerateConfig {
        /// Path to save configuration file
        #[arg(default_value = "doujin-archive.json")]
        path: PathBuf,
    },
}

#[derive(Subcommand)]
enum TargetCommand {
    /// Register a directory as an active scan target
    Add {
        path: PathBuf,

        #[arg(long)]
        note: Option<String>,
    },

    /// List every scan target
    List,

    /// Include a target in scans again
    Enable { id: i64 },

    /// Leave a target out of scans
    Disable { id: i64 },
}

#[derive(Clone, Copy, ValueEnum)]
enum StatusArg {
    Pending,
    Reviewed,
    Confirmed,
}

impl From<StatusArg> for WorkStatus {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::Pending => WorkStatus::Pending,
            StatusArg::Reviewed => WorkStatus::Reviewed,
            StatusArg::Confirmed => WorkStatus::Confirmed,
        }
    }
}

fn main() -> Result<(), anyhow::Error> {
    // Parse command line arguments
    let cli = Cli::parse();

    // Needs no catalog
    if let Commands::GenerateConfig { path } = &cli.command {
        return generate_config(path);
    }

    // Set up configuration
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("loading configuration {}", path.display()))?,
        None => Config::default(),
    };

    // Override config with command line arguments
    if let Some(db) = cli.db {
        config.database_path = db;
    }
    if !cli.base_dirs.is_empty() {
        config.base_dirs = cli.base_dirs;
    }
    if cli.log_dir.is_some() {
        config.log_dir = cli.log_dir;
    }
    if let Commands::Classify {
        threshold: Some(threshold),
    } = &cli.command
    {
        config.threshold = *threshold;
    }
    config.log_level = match cli.verbose {
        0 => config.log_level,
        1 => LogLevel::Debug,
        _ => LogLevel::Trace,
    };

    match &config.log_dir {
        Some(dir) => init_logger(dir, config.log_level)?,
        None => init_console_logger(config.log_level),
    }

    let mut archive = Archive::open(config)?;
    run(&mut archive, cli.command)
}

fn run(archive: &mut Archive, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Scan { export, per_base } => {
            let records = archive.scan()?;
            println!("Found {} folders", records.len());

            match export {
                _ if per_base => {
                    for (path, count) in archive.export_scan_per_base(&records)? {
                        println!(" - {} ({} records)", path.display(), count);
                    }
                }
                Some(path) => {
                    scan::export_records(&path, &records)?;
                    println!("Exported to {}", path.display());
                }
                None => {
                    for record in &records {
                        println!(
                            "{:>5}  {}",
                            record.image_count,
                            record.folder_path.display()
                        );
                    }
                }
            }
        }

        Commands::Classify { .. } => {
            let exports = archive.classify()?;
            if exports.is_empty() {
                println!("Nothing to classify");
            }
            for export in &exports {
                println!("Classified {} works", export.records);
                println!(" - JSON: {}", export.json_path.display());
                println!(" - CSV : {}", export.csv_path.display());
            }
        }

        Commands::Target { command } => run_target(archive, command)?,

        Commands::Load { file } => {
            let report = match file {
                Some(path) => archive.load(&scan::read_records(&path)?)?,
                None => archive.load_latest_exports()?,
            };
            println!(
                "Registered: {} (skipped: {})",
                report.inserted, report.skipped
            );
        }

        Commands::Analyze => {
            let report = archive.extract_drafts()?;
            println!(
                "Parsed {} works: {} drafted, {} unmatched",
                report.scanned, report.drafted, report.skipped
            );
        }

        Commands::Review => {
            let report = archive.merge_drafts()?;
            println!(
                "Merged {} of {} drafts ({} complete, {} failed)",
                report.merged, report.candidates, report.complete, report.failed
            );
        }

        Commands::Confirm { ids } => set_status(archive, &ids, WorkStatus::Confirmed)?,

        Commands::Mark { status, ids } => set_status(archive, &ids, status.into())?,

        Commands::LinkCircle { id, circle, author } => {
            let linked = archive.link_circle(id, &circle, author.as_deref())?;
            println!("{}", if linked { "Linked" } else { "Already linked" });
        }

        Commands::LinkSource { id, source } => {
            let linked = archive.link_source(id, &source)?;
            println!("{}", if linked { "Linked" } else { "Already linked" });
        }

        Commands::Preview { id } => println!("{}", archive.compose_name(id)?),

        Commands::Rename { id: Some(id) } => print_outcome(&archive.rename_one(id)?),

        Commands::Rename { id: None } => {
            let report = archive.rename_all_confirmed()?;
            println!(
                "Renamed: {}, skipped: {}, failed: {}",
                report.renamed, report.skipped, report.failed
            );
            println!("Audit log: {}", report.audit_log.display());
        }

        Commands::Sync => {
            let report = archive.diff()?;
            println!(
                "Catalog: {} / on disk: {}",
                report.recorded, report.on_disk
            );
            println!("Missing on disk: {}", report.missing_on_disk.len());
            for missing in &report.missing_on_disk {
                println!(
                    "  - id {} {} ({})",
                    missing.work_id,
                    missing.path.display(),
                    missing.original_name
                );
            }
            println!("Not in catalog: {}", report.unregistered.len());
            for path in &report.unregistered {
                println!("  - {}", path.display());
            }
        }

        Commands::CleanDb => {
            let removed = archive.clean_missing_works()?;
            println!("Deleted {} works without a folder", removed.len());
        }

        Commands::CleanFs { execute } => {
            let report = archive.clean_unregistered_folders(CleanupMode::from_execute_flag(execute))?;
            print_cleanup("unregistered", &report);
        }

        Commands::CleanZero { execute } => {
            let report = archive.clean_empty_folders(CleanupMode::from_execute_flag(execute))?;
            print_cleanup("image-less", &report);
        }

        Commands::CleanOrphan => {
            let sweep = archive.clean_orphan_relations()?;
            println!(
                "Deleted {} orphan rows (circles/authors: {}, sources: {}, completion: {}, drafts: {})",
                sweep.total(),
                sweep.circle_authors,
                sweep.sources,
                sweep.completion_states,
                sweep.drafts
            );
        }

        Commands::GenerateConfig { path } => generate_config(&path)?,
    }

    info!("Done");
    Ok(())
}

fn generate_config(path: &Path) -> anyhow::Result<()> {
    Config::default().save_to_file(path)?;
    println!("Configuration file generated at: {}", path.display());
    Ok(())
}

fn run_target(archive: &mut Archive, command: TargetCommand) -> anyhow::Result<()> {
    match command {
        TargetCommand::Add { path, note } => {
            let added = archive.add_scan_target(&path, note.as_deref())?;
            println!("{}", if added { "Added" } else { "Already registered" });
        }
        TargetCommand::List => {
            for target in archive.scan_targets()? {
                println!(
                    "{:>4}  {}  {}{}  (last scan: {})",
                    target.id,
                    if target.active { "active  " } else { "inactive" },
                    target.path.display(),
                    target
                        .note
                        .map(|note| format!(" ({})", note))
                        .unwrap_or_default(),
                    target.last_scanned_at.as_deref().unwrap_or("never")
                );
            }
        }
        TargetCommand::Enable { id } => set_target_active(archive, id, true)?,
        TargetCommand::Disable { id } => set_target_active(archive, id, false)?,
    }
    Ok(())
}

fn set_target_active(archive: &mut Archive, id: i64, active: bool) -> anyhow::Result<()> {
    if !archive.set_scan_target_active(id, active)? {
        anyhow::bail!("no scan target with id {}", id);
    }
    println!("Target {} {}", id, if active { "enabled" } else { "disabled" });
    Ok(())
}

fn set_status(archive: &mut Archive, ids: &[i64], status: WorkStatus) -> anyhow::Result<()> {
    let missing = archive.set_status(ids, status)?;
    println!("{} works set to {}", ids.len() - missing.len(), status);
    if !missing.is_empty() {
        println!("Not found: {:?}", missing);
    }
    Ok(())
}

fn print_outcome(outcome: &RenameOutcome) {
    match outcome {
        RenameOutcome::Renamed { from, to } => {
            println!("Renamed {} -> {}", from.display(), to.display())
        }
        RenameOutcome::Skipped { to, .. } => {
            println!("Skipped, destination already exists: {}", to.display())
        }
        RenameOutcome::Failed { from, reason, .. } => {
            println!("Failed {}: {}", from.display(), reason)
        }
    }
}

fn print_cleanup(label: &str, report: &CleanupReport) {
    for path in &report.candidates {
        println!("  - {}", path.display());
    }
    for (path, reason) in &report.failed {
        println!("  ! {}: {}", path.display(), reason);
    }

    if report.mode == Some(CleanupMode::DryRun) {
        println!(
            "Dry run: {} {} folders would be deleted (pass --execute to delete)",
            report.candidates.len(),
            label
        );
    } else {
        println!(
            "Deleted {} {} folders ({} failed, {} kept)",
            report.deleted.len(),
            label,
            report.failed.len(),
            report.kept
        );
    }
}
