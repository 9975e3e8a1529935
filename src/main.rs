use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use dialoguer::Confirm;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::time::Instant;

use snapcull::{AuditRecord, CurateConfig, CurationPlan, MetricKind, AUDIT_FILE};

#[derive(Parser, Debug)]
#[command(
    name = "snapcull",
    version,
    about = "Curate photo folders: keep the best shot per duplicate group"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Find duplicate groups and show which image would be kept
    Scan {
        #[command(flatten)]
        opts: RunOpts,
    },

    /// Move every non-representative duplicate into the removed store
    Curate {
        #[command(flatten)]
        opts: RunOpts,
        /// Only show what would be moved
        #[arg(long)]
        dry_run: bool,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Work with the curation audit log
    Audit {
        #[command(subcommand)]
        command: AuditCmd,
    },
}

#[derive(Args, Debug)]
struct RunOpts {
    /// Directory to curate
    #[arg(short, long, value_name = "DIR")]
    path: PathBuf,

    /// Similarity threshold in (0, 1]
    #[arg(long, default_value_t = 0.90)]
    threshold: f64,

    /// Metric priority order
    #[arg(
        long,
        value_delimiter = ',',
        default_values_t = vec![MetricKind::Hash, MetricKind::Histogram, MetricKind::Ssim]
    )]
    metrics: Vec<MetricKind>,

    /// Weight of the exposure penalty in the quality score
    #[arg(long, default_value_t = 1.0)]
    quality_weight: f64,

    /// Canonical square edge for SSIM comparison
    #[arg(long, default_value_t = 256)]
    ssim_size: u32,

    /// Directory to move duplicates into (default: `<dir>/removed`)
    #[arg(long, value_name = "DIR")]
    removed_dir: Option<PathBuf>,

    /// Print the result as JSON instead of the human summary
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum AuditCmd {
    /// List all audit records
    List {
        /// Directory containing the photos
        #[arg(short, long, value_name = "DIR")]
        path: PathBuf,
    },
}

impl RunOpts {
    fn config(&self) -> CurateConfig {
        CurateConfig {
            threshold: self.threshold,
            metric_order: self.metrics.clone(),
            quality_weight: self.quality_weight,
            ssim_size: self.ssim_size,
            ..CurateConfig::default()
        }
    }

    fn removed_dir(&self) -> PathBuf {
        self.removed_dir
            .clone()
            .unwrap_or_else(|| self.path.join("removed"))
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Scan { opts } => {
            println!("▶ Scanning for duplicates in: {}", opts.path.display());
            let plan = benchmark("planning", || {
                snapcull::plan(&opts.path, &opts.removed_dir(), &opts.config())
            })
            .with_context(|| format!("Failed to plan curation of {:?}", opts.path))?;

            if opts.json {
                println!("{}", serde_json::to_string_pretty(&plan)?);
            } else {
                print_plan(&plan);
            }
        }

        Commands::Curate { opts, dry_run, yes } => {
            println!("▶ Curating duplicates in: {}", opts.path.display());
            let removed_dir = opts.removed_dir();
            let config = opts.config();

            if dry_run {
                let plan = snapcull::plan(&opts.path, &removed_dir, &config)
                    .with_context(|| format!("Failed to plan curation of {:?}", opts.path))?;
                print_plan(&plan);
                println!("\n⚠️  Dry-run only; no files were changed.");
                return Ok(());
            }

            if !yes {
                let plan = snapcull::plan(&opts.path, &removed_dir, &config)
                    .with_context(|| format!("Failed to plan curation of {:?}", opts.path))?;
                print_plan(&plan);
                let count = plan.decision_count();
                if count == 0 {
                    return Ok(());
                }
                let confirmed = Confirm::new()
                    .with_prompt(format!(
                        "Move {} image(s) into {}?",
                        count,
                        removed_dir.display()
                    ))
                    .default(false)
                    .interact()?;
                if !confirmed {
                    println!("Aborted; no files were changed.");
                    return Ok(());
                }
            }

            let report = benchmark("curation", || {
                snapcull::curate(&opts.path, &removed_dir, &config)
            })
            .with_context(|| format!("Failed to curate {:?}", opts.path))?;

            if opts.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
                return Ok(());
            }

            for name in &report.removed {
                println!("   📦 Moved {} → {}", name, removed_dir.display());
            }
            for name in &report.already_curated {
                println!("   ⏭️  Already curated: {name}");
            }
            for (path, reason) in &report.failed {
                println!("   ⚠️  Failed to curate {}: {reason}", path.display());
            }
            if report.removed.is_empty() {
                println!("No duplicates to move.");
            } else {
                println!(
                    "\n✅ Moved {} image(s); audit log at {}",
                    report.removed.len(),
                    opts.path.join(AUDIT_FILE).display()
                );
            }
        }

        Commands::Audit { command } => match command {
            AuditCmd::List { path } => {
                let audit_file = path.join(AUDIT_FILE);
                let f = File::open(&audit_file)
                    .with_context(|| format!("Could not open audit log {:?}", audit_file))?;
                let reader = BufReader::new(f);

                println!("🗂️  Curation audit log:");
                for (i, line) in reader.lines().enumerate() {
                    let line = line?;
                    match serde_json::from_str::<AuditRecord>(&line) {
                        Ok(rec) => println!(
                            "[{}] {}\n     removed: {} (quality {:.3})\n     kept: {} (quality {:.3})\n     reason: {} (score {:.3})\n",
                            i,
                            rec.timestamp,
                            rec.image,
                            rec.quality,
                            rec.kept,
                            rec.kept_quality,
                            rec.reason,
                            rec.match_score
                        ),
                        Err(err) => eprintln!("⚠️  Skipping malformed entry {i}: {err}"),
                    }
                }
            }
        },
    }

    Ok(())
}

fn print_plan(plan: &CurationPlan) {
    if plan.groups.is_empty() {
        println!("No duplicates found.");
    } else {
        println!("Found {} duplicate group(s):", plan.groups.len());
        for (i, group) in plan.groups.iter().enumerate() {
            println!("\n✨ Group {}:", i + 1);
            println!(
                "   🏆 Keeping → {} (quality {:.3})",
                group.kept.display(),
                group.kept_quality.composite
            );
            for decision in &group.decisions {
                println!(
                    "   📦 {} (quality {:.3}, {} score {:.3})",
                    decision.image.display(),
                    decision.quality.composite,
                    decision.reason,
                    decision.match_score
                );
            }
        }
    }
    if !plan.skipped.is_empty() {
        println!("\n⚠️  Skipped {} unreadable file(s):", plan.skipped.len());
        for skip in &plan.skipped {
            println!("   {} ({})", skip.path.display(), skip.reason);
        }
    }
}

/// Run `f()`, print how long it took (with `label`), and return its result.
fn benchmark<T, F: FnOnce() -> T>(label: &str, f: F) -> T {
    let start = Instant::now();
    let result = f();
    println!("⏱ {} took {:.2?}", label, start.elapsed());
    result
}
