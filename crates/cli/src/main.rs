mod audit_cmd;
mod cli;
mod doc;
mod import;
mod remote;
mod sched_cmd;
mod table;

use anyhow::Result;
use clap::Parser;

use crate::cli::{AuditCmd, Cli, Command, ScheduleCmd, TableCmd, TemplateCmd};

#[tokio::main]
async fn main() -> Result<()> {
    // Diagnostics go to stderr; stdout is reserved for command output.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    baseops_core::config::load_dotenv();

    let args = Cli::parse();
    let app = args.app.as_deref();

    match args.command {
        Command::Table(cmd) => match cmd {
            TableCmd::BatchCreate {
                table,
                data,
                dry_run,
            } => table::batch_create(app, &table, &data, dry_run).await,
            TableCmd::BatchUpdate {
                table,
                data,
                dry_run,
            } => table::batch_update(app, &table, &data, dry_run).await,
            TableCmd::Join {
                left,
                right,
                on,
                select,
            } => table::join_tables(app, &left, &right, &on, select.as_deref()).await,
            TableCmd::Stats { table } => table::stats(app, &table).await,
            TableCmd::Snapshot { table, output_dir } => {
                table::snapshot(app, &table, &output_dir).await
            }
            TableCmd::Import {
                data,
                table,
                dry_run,
            } => table::import_file(app, &data, table.as_deref(), dry_run).await,
        },
        Command::Template(cmd) => match cmd {
            TemplateCmd::Render {
                template,
                context,
                output,
            } => doc::render(&template, context.as_deref(), &output),
            TemplateCmd::Generate {
                table,
                template,
                title,
                group_by,
                publish,
                folder,
                local,
                extra,
            } => {
                doc::generate(
                    app,
                    &table,
                    &template,
                    title.as_deref(),
                    group_by.as_deref(),
                    publish,
                    folder,
                    local.as_deref(),
                    extra.as_deref(),
                )
                .await
            }
            TemplateCmd::Context { table, group_by } => {
                doc::context(app, &table, group_by.as_deref()).await
            }
        },
        Command::Audit(cmd) => match cmd {
            AuditCmd::Run {
                table,
                target_table,
                config,
                publish,
                folder,
                output,
            } => {
                audit_cmd::run(
                    app,
                    &table,
                    target_table.as_deref(),
                    config.as_deref(),
                    publish,
                    folder,
                    output.as_deref(),
                )
                .await
            }
            AuditCmd::Demo {
                config,
                count,
                publish,
                folder,
                output,
            } => {
                audit_cmd::demo(config.as_deref(), count, publish, folder, output.as_deref())
                    .await
            }
            AuditCmd::ListConfigs { dir } => audit_cmd::list_configs(&dir),
        },
        Command::Schedule(cmd) => match cmd {
            ScheduleCmd::Run {
                schedule,
                job,
                state,
                json,
            } => sched_cmd::run(app, &schedule, job.as_deref(), &state, json).await,
            ScheduleCmd::List { schedule, state } => sched_cmd::list(&schedule, &state),
            ScheduleCmd::Status { state } => sched_cmd::status(&state),
        },
    }
}
