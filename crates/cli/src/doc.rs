//! `template` subcommand handlers.

use std::path::Path;

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde_json::json;

use baseops_compute::build_context;
use baseops_core::{DocumentPublisher, Value};
use baseops_template::Renderer;

use crate::remote;

pub fn render(template: &Path, context: Option<&Path>, output: &str) -> Result<()> {
    let template_text = std::fs::read_to_string(template)
        .with_context(|| format!("cannot read template {}", template.display()))?;
    let ctx: Value = match context {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("cannot read context {}", path.display()))?;
            serde_json::from_str(&text).context("context file must be JSON")?
        }
        None => Value::Map(IndexMap::new()),
    };

    let rendered = Renderer::new().render(&template_text, &ctx)?;
    if output == "-" {
        print!("{rendered}");
    } else {
        std::fs::write(output, &rendered)?;
        println!("saved: {output}");
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub async fn generate(
    app: Option<&str>,
    table: &str,
    template: &Path,
    title: Option<&str>,
    group_by: Option<&str>,
    publish: bool,
    folder: Option<String>,
    local: Option<&Path>,
    extra: Option<&str>,
) -> Result<()> {
    let template_text = std::fs::read_to_string(template)
        .with_context(|| format!("cannot read template {}", template.display()))?;
    let extra_ctx: Option<IndexMap<String, Value>> = extra
        .map(|text| serde_json::from_str(text).context("--extra must be a JSON object"))
        .transpose()?;

    let bitable = remote::bitable(app)?;
    let records = bitable.list_all_records(table).await?;
    let ctx = build_context(&records, group_by, extra_ctx.as_ref());
    let rendered = Renderer::new().render(&template_text, &ctx)?;

    let title = title
        .map(str::to_string)
        .or_else(|| first_heading(&rendered))
        .unwrap_or_else(|| {
            format!("Report {}", chrono::Utc::now().format("%Y-%m-%d %H:%M"))
        });

    let mut result = json!({ "title": title, "template": template.display().to_string() });
    if let Some(path) = local {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, &rendered)?;
        result["local_path"] = json!(path.display().to_string());
    }
    if publish {
        let docs = remote::docs(folder)?;
        let doc = docs.publish_document(&title, &rendered).await?;
        result["doc_token"] = json!(doc.token);
        result["url"] = json!(doc.url);
    } else if local.is_none() {
        result["content"] = json!(rendered);
    }

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

pub async fn context(app: Option<&str>, table: &str, group_by: Option<&str>) -> Result<()> {
    let bitable = remote::bitable(app)?;
    let records = bitable.list_all_records(table).await?;
    let ctx = build_context(&records, group_by, None);
    println!("{}", serde_json::to_string_pretty(&ctx)?);
    Ok(())
}

/// Title from the first markdown heading of rendered output.
fn first_heading(rendered: &str) -> Option<String> {
    let first = rendered.lines().find(|l| !l.trim().is_empty())?;
    let trimmed = first.trim();
    trimmed
        .starts_with('#')
        .then(|| trimmed.trim_start_matches('#').trim().to_string())
}
