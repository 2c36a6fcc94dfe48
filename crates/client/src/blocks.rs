//! Markdown → document block conversion.
//!
//! The document API takes structured blocks, not markdown. This covers
//! the subset the report renderers emit: headings, paragraphs, bullet
//! items, dividers, quotes, and `**bold**` runs. Table rows are kept as
//! plain text lines (native table blocks need a multi-step create flow).

use serde_json::{json, Value as Json};

/// Convert markdown text into document blocks.
pub fn markdown_to_blocks(markdown: &str) -> Vec<Json> {
    let mut blocks = Vec::new();

    for line in markdown.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if matches!(trimmed, "---" | "***" | "___") {
            blocks.push(json!({ "block_type": 22, "divider": {} }));
            continue;
        }

        if let Some((level, text)) = heading_of(trimmed) {
            blocks.push(heading_block(level, text));
            continue;
        }

        if let Some(text) = trimmed
            .strip_prefix("- ")
            .or_else(|| trimmed.strip_prefix("* "))
        {
            blocks.push(json!({
                "block_type": 12,
                "bullet": { "elements": inline_elements(text) },
            }));
            continue;
        }

        if let Some(text) = trimmed.strip_prefix("> ") {
            blocks.push(text_block(text));
            continue;
        }

        // Table rows and ordinary paragraphs become plain text blocks.
        blocks.push(text_block(trimmed));
    }

    blocks
}

fn heading_of(line: &str) -> Option<(usize, &str)> {
    let hashes = line.bytes().take_while(|&b| b == b'#').count();
    if (1..=6).contains(&hashes) {
        let rest = line[hashes..].strip_prefix(' ')?;
        return Some((hashes, rest));
    }
    None
}

fn heading_block(level: usize, text: &str) -> Json {
    // Heading block types start at 3 for h1; the payload key carries the
    // level too (`heading1`, `heading2`, ...).
    let mut map = serde_json::Map::new();
    map.insert("block_type".to_string(), json!(level + 2));
    map.insert(
        format!("heading{level}"),
        json!({ "elements": inline_elements(text) }),
    );
    Json::Object(map)
}

fn text_block(text: &str) -> Json {
    json!({
        "block_type": 2,
        "text": { "elements": inline_elements(text) },
    })
}

/// Split `**bold**` runs into styled text elements.
fn inline_elements(text: &str) -> Vec<Json> {
    let mut elements = Vec::new();
    for (i, part) in text.split("**").enumerate() {
        if part.is_empty() {
            continue;
        }
        if i % 2 == 1 {
            elements.push(json!({
                "text_run": {
                    "content": part,
                    "text_element_style": { "bold": true },
                }
            }));
        } else {
            elements.push(json!({ "text_run": { "content": part } }));
        }
    }
    if elements.is_empty() {
        elements.push(json!({ "text_run": { "content": text } }));
    }
    elements
}

// ── Tests ───────────────────────────────────────────────────────────
