//! Command-line surface.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "baseops",
    version,
    about = "Workspace automation: bulk table ops, joins, templated reports, audits, schedules"
)]
pub struct Cli {
    /// Base (app) token for remote commands.
    #[arg(long, global = true, env = "BASEOPS_APP_TOKEN")]
    pub app: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Table operations: bulk writes, joins, stats, snapshots.
    #[command(subcommand)]
    Table(TableCmd),
    /// Template rendering and templated document generation.
    #[command(subcommand)]
    Template(TemplateCmd),
    /// Operational audits.
    #[command(subcommand)]
    Audit(AuditCmd),
    /// Scheduled report jobs.
    #[command(subcommand)]
    Schedule(ScheduleCmd),
}

#[derive(Debug, Subcommand)]
pub enum TableCmd {
    /// Bulk-create records from a JSON or CSV file.
    BatchCreate {
        #[arg(long)]
        table: String,
        /// Data file (.json or .csv).
        #[arg(long)]
        data: PathBuf,
        /// Preview without writing.
        #[arg(long)]
        dry_run: bool,
    },
    /// Bulk-update records from a JSON file of {record_id, fields} entries.
    BatchUpdate {
        #[arg(long)]
        table: String,
        #[arg(long)]
        data: PathBuf,
        #[arg(long)]
        dry_run: bool,
    },
    /// Left-outer join two tables on a field.
    Join {
        /// Left table id.
        #[arg(long)]
        left: String,
        /// Right table id.
        #[arg(long)]
        right: String,
        /// Join field name.
        #[arg(long)]
        on: String,
        /// Comma-separated output fields.
        #[arg(long)]
        select: Option<String>,
    },
    /// Per-field summary statistics for a table.
    Stats {
        #[arg(long)]
        table: String,
    },
    /// Export a timestamped JSON snapshot of a table.
    Snapshot {
        #[arg(long)]
        table: String,
        #[arg(long, default_value = "snapshots")]
        output_dir: PathBuf,
    },
    /// Load a data file; preview it, or create into a table when given.
    Import {
        #[arg(long)]
        data: PathBuf,
        #[arg(long)]
        table: Option<String>,
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Debug, Subcommand)]
pub enum TemplateCmd {
    /// Render a template file against a local JSON context.
    Render {
        #[arg(long)]
        template: PathBuf,
        /// Context JSON file; empty context when omitted.
        #[arg(long)]
        context: Option<PathBuf>,
        /// Output file, `-` for stdout.
        #[arg(long, default_value = "-")]
        output: String,
    },
    /// Render a template from table data and publish/save the document.
    Generate {
        #[arg(long)]
        table: String,
        #[arg(long)]
        template: PathBuf,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        group_by: Option<String>,
        /// Publish to the document platform.
        #[arg(long)]
        publish: bool,
        /// Folder token for the published document.
        #[arg(long)]
        folder: Option<String>,
        /// Also save the rendered text locally.
        #[arg(long)]
        local: Option<PathBuf>,
        /// Extra context entries as a JSON object string.
        #[arg(long)]
        extra: Option<String>,
    },
    /// Print the generated template context for a table (debugging).
    Context {
        #[arg(long)]
        table: String,
        #[arg(long)]
        group_by: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
pub enum AuditCmd {
    /// Audit a sales table and print/publish the report.
    Run {
        /// Sales table id.
        #[arg(long)]
        table: String,
        /// Target table to join on the store-name field (optional).
        #[arg(long)]
        target_table: Option<String>,
        /// Rule config YAML; bundled defaults when omitted.
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        publish: bool,
        #[arg(long)]
        folder: Option<String>,
        /// Save the markdown report to this path.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Run the audit against the seeded demo fleet.
    Demo {
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long, default_value_t = 50)]
        count: usize,
        #[arg(long)]
        publish: bool,
        #[arg(long)]
        folder: Option<String>,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// List available audit rule configs.
    ListConfigs {
        #[arg(long, default_value = "configs")]
        dir: PathBuf,
    },
}

#[derive(Debug, Subcommand)]
pub enum ScheduleCmd {
    /// Run all due jobs (or one specific job with --job).
    Run {
        /// Schedule YAML file.
        #[arg(long)]
        schedule: PathBuf,
        /// Force-run this job id, bypassing timing checks.
        #[arg(long)]
        job: Option<String>,
        /// Run-state file.
        #[arg(long, default_value = ".baseops_state.json")]
        state: PathBuf,
        /// JSON output.
        #[arg(long)]
        json: bool,
    },
    /// List jobs with due status and next-eligible times.
    List {
        #[arg(long)]
        schedule: PathBuf,
        #[arg(long, default_value = ".baseops_state.json")]
        state: PathBuf,
    },
    /// Show the persisted run-state.
    Status {
        #[arg(long, default_value = ".baseops_state.json")]
        state: PathBuf,
    },
}
