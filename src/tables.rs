//! Table reconstruction.
//!
//! A table block carries only its dimensions; the data lives in its
//! `table_row` children, one rich-text sequence per cell. Rows are returned in
//! the order the upstream lists the children, and children of any other kind
//! are skipped.

use anyhow::Context;
use serde::Serialize;

use crate::blocks::{plain_text, project};
use crate::client::DocumentApi;
use crate::error::{Error, Result};
use crate::models::{kind, Block, BlockContent};

/// Plain-text contents of one table block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableSnapshot {
    pub block_id: String,
    pub table_width: u32,
    pub has_column_header: bool,
    pub has_row_header: bool,
    pub rows: Vec<TableRow>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableRow {
    pub cells: Vec<String>,
}

/// Fetch a table block and all of its rows.
///
/// Fails with [`Error::NotATable`] if the block is not a table or carries no
/// table payload. Cell counts are not checked against `table_width`.
pub async fn get_table_data(
    api: &dyn DocumentApi,
    table_block_id: &str,
) -> Result<TableSnapshot> {
    let block = project(&api.get_block(table_block_id).await?);
    let info = match block.table_info {
        Some(info) if block.is_table() => info,
        _ => return Err(Error::NotATable(table_block_id.to_string())),
    };

    let children = api.list_children(table_block_id).await?;

    Ok(TableSnapshot {
        block_id: table_block_id.to_string(),
        table_width: info.table_width,
        has_column_header: info.has_column_header,
        has_row_header: info.has_row_header,
        rows: rows_from_children(&children),
    })
}

/// Flatten the `table_row` children into plain-text rows.
pub fn rows_from_children(children: &[Block]) -> Vec<TableRow> {
    children
        .iter()
        .filter(|child| child.kind == kind::TABLE_ROW)
        .filter_map(|child| match &child.content {
            BlockContent::TableRow(row) => Some(TableRow {
                cells: row.cells.iter().map(|cell| plain_text(cell)).collect(),
            }),
            _ => None,
        })
        .collect()
}

/// `ntc table <id>`: print a reconstructed table as JSON.
pub async fn run_table(api: &dyn DocumentApi, table_block_id: &str) -> anyhow::Result<()> {
    let table = get_table_data(api, table_block_id)
        .await
        .with_context(|| format!("Failed to get table data for {}", table_block_id))?;
    println!("{}", serde_json::to_string_pretty(&table)?);
    Ok(())
}
