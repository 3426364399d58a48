//! Block projection.
//!
//! Reduces a raw [`Block`] to the few fields the API exposes: text content for
//! paragraphs and headings, dimensions for tables, and nothing at all for any
//! other kind. Projection never fails; unknown kinds pass through bare. Text
//! blocks with no text are omitted from `content` the same way.

use anyhow::Context;
use serde::Serialize;

use crate::client::DocumentApi;
use crate::error::Result;
use crate::models::{kind, Block, BlockContent, RichText};

/// A block as returned by the HTTP API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedBlock {
    pub block_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub has_children: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_info: Option<TableInfo>,
}

impl NormalizedBlock {
    pub fn is_table(&self) -> bool {
        self.kind == kind::TABLE
    }
}

/// Declared shape of a table block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TableInfo {
    pub table_width: u32,
    pub has_column_header: bool,
    pub has_row_header: bool,
}

/// Project a raw block, dispatching on its payload.
pub fn project(block: &Block) -> NormalizedBlock {
    let mut normalized = NormalizedBlock {
        block_id: block.id.clone(),
        kind: block.kind.clone(),
        has_children: block.has_children,
        content: None,
        table_info: None,
    };

    match &block.content {
        BlockContent::Table(meta) => {
            normalized.table_info = Some(TableInfo {
                table_width: meta.table_width,
                has_column_header: meta.has_column_header,
                has_row_header: meta.has_row_header,
            });
        }
        BlockContent::Paragraph(body) | BlockContent::Heading(body) => {
            normalized.content = Some(plain_text(&body.rich_text)).filter(|s| !s.is_empty());
        }
        BlockContent::TableRow(_) | BlockContent::Unknown => {}
    }

    normalized
}

/// Concatenate the plain text of every run, in order, with no separator.
pub fn plain_text(runs: &[RichText]) -> String {
    runs.iter().map(|rt| rt.plain_text.as_str()).collect()
}

/// All direct children of a page, projected.
pub async fn get_page_blocks(
    api: &dyn DocumentApi,
    page_id: &str,
) -> Result<Vec<NormalizedBlock>> {
    let children = api.list_children(page_id).await?;
    Ok(children.iter().map(project).collect())
}

/// Only the table children of a page, projected.
pub async fn get_table_blocks(
    api: &dyn DocumentApi,
    page_id: &str,
) -> Result<Vec<NormalizedBlock>> {
    let mut blocks = get_page_blocks(api, page_id).await?;
    blocks.retain(NormalizedBlock::is_table);
    Ok(blocks)
}

/// A single block, projected.
pub async fn get_block_details(
    api: &dyn DocumentApi,
    block_id: &str,
) -> Result<NormalizedBlock> {
    let block = api.get_block(block_id).await?;
    Ok(project(&block))
}

/// `ntc block <id>`: print one projected block as JSON.
pub async fn run_block(api: &dyn DocumentApi, block_id: &str) -> anyhow::Result<()> {
    let block = get_block_details(api, block_id)
        .await
        .with_context(|| format!("Failed to get block details for {}", block_id))?;
    println!("{}", serde_json::to_string_pretty(&block)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn block(value: serde_json::Value) -> Block {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_paragraph_concatenates_runs() {
        let b = block(json!({
            "id": "p1",
            "type": "paragraph",
            "paragraph": { "rich_text": [ { "plain_text": "Hello" }, { "plain_text": " world" } ] }
        }));
        let n = project(&b);
        assert_eq!(n.content.as_deref(), Some("Hello world"));
        assert!(n.table_info.is_none());
    }

    #[test]
    fn test_empty_paragraph_omits_content() {
        let b = block(json!({ "id": "p2", "type": "paragraph", "paragraph": { "rich_text": [] } }));
        let n = project(&b);
        assert!(n.content.is_none());
        assert_eq!(
            serde_json::to_value(&n).unwrap(),
            json!({ "block_id": "p2", "type": "paragraph", "has_children": false })
        );

        let b = block(json!({
            "id": "p3",
            "type": "paragraph",
            "paragraph": { "rich_text": [ { "plain_text": "" } ] }
        }));
        assert!(project(&b).content.is_none());
    }

    #[test]
    fn test_headings() {
        for tag in ["heading_1", "heading_2", "heading_3"] {
            let mut raw = json!({ "id": "h", "type": tag });
            raw[tag] = json!({ "rich_text": [ { "plain_text": "Steps" } ] });
            let n = project(&block(raw));
            assert_eq!(n.kind, tag);
            assert_eq!(n.content.as_deref(), Some("Steps"));
        }
    }

    #[test]
    fn test_table_info() {
        let b = block(json!({
            "id": "t1",
            "type": "table",
            "has_children": true,
            "table": { "table_width": 4, "has_column_header": true, "has_row_header": true }
        }));
        let n = project(&b);
        assert!(n.is_table());
        assert_eq!(
            n.table_info,
            Some(TableInfo {
                table_width: 4,
                has_column_header: true,
                has_row_header: true
            })
        );
        assert!(n.content.is_none());
    }

    #[test]
    fn test_unknown_kind_is_bare() {
        let b = block(json!({
            "id": "c1",
            "type": "callout",
            "has_children": true,
            "callout": { "rich_text": [ { "plain_text": "note" } ] }
        }));
        let n = project(&b);
        assert_eq!(n.kind, "callout");
        assert!(n.has_children);
        assert!(n.content.is_none());
        assert!(n.table_info.is_none());
    }

    #[test]
    fn test_serialized_shape() {
        let b = block(json!({
            "id": "p1",
            "type": "divider",
            "divider": {}
        }));
        let value = serde_json::to_value(project(&b)).unwrap();
        assert_eq!(
            value,
            json!({ "block_id": "p1", "type": "divider", "has_children": false })
        );
    }
}
