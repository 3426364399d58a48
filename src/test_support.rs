#![allow(dead_code)]

//! In-memory [`DocumentApi`] for unit tests.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use crate::client::{DocumentApi, SearchRequest};
use crate::error::{Error, Result};
use crate::models::{Block, Document};

#[derive(Default)]
pub(crate) struct FakeApi {
    documents: Vec<Document>,
    children: HashMap<String, Vec<Block>>,
    blocks: HashMap<String, Block>,
    failing: HashSet<String>,
    calls: Mutex<Vec<String>>,
}

impl FakeApi {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_document(mut self, doc: Value) -> Self {
        self.documents.push(serde_json::from_value(doc).unwrap());
        self
    }

    pub(crate) fn with_children(mut self, parent: &str, children: Vec<Value>) -> Self {
        let blocks: Vec<Block> = children
            .into_iter()
            .map(|v| serde_json::from_value(v).unwrap())
            .collect();
        for b in &blocks {
            self.blocks.insert(b.id.clone(), b.clone());
        }
        self.children.insert(parent.to_string(), blocks);
        self
    }

    /// Every call touching `id` fails with a 503.
    pub(crate) fn failing_on(mut self, id: &str) -> Self {
        self.failing.insert(id.to_string());
        self
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn check(&self, id: &str) -> Result<()> {
        if self.failing.contains(id) {
            return Err(Error::Remote {
                status: 503,
                body: format!("simulated failure for {}", id),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentApi for FakeApi {
    async fn search(&self, _request: &SearchRequest) -> Result<Vec<Document>> {
        self.record("search".to_string());
        Ok(self.documents.clone())
    }

    async fn list_children(&self, block_id: &str) -> Result<Vec<Block>> {
        self.record(format!("children:{}", block_id));
        self.check(block_id)?;
        Ok(self.children.get(block_id).cloned().unwrap_or_default())
    }

    async fn get_block(&self, block_id: &str) -> Result<Block> {
        self.record(format!("block:{}", block_id));
        self.check(block_id)?;
        self.blocks.get(block_id).cloned().ok_or_else(|| Error::Remote {
            status: 404,
            body: format!("no block {}", block_id),
        })
    }
}

/// A page whose title property holds `title`.
pub(crate) fn page(id: &str, title: &str, status: Option<&str>, date: Option<&str>) -> Value {
    let mut properties = json!({
        "Test Case Name": {
            "id": "title",
            "type": "title",
            "title": [ { "type": "text", "plain_text": title } ]
        }
    });
    if let Some(name) = status {
        properties["Status"] = json!({ "type": "status", "status": { "name": name } });
    }
    if let Some(start) = date {
        properties["Test Date"] = json!({ "type": "date", "date": { "start": start, "end": null } });
    }
    json!({
        "object": "page",
        "id": id,
        "created_time": "2024-05-01T09:00:00.000Z",
        "last_edited_time": "2024-05-02T10:15:00.000Z",
        "parent": { "type": "database_id", "database_id": "db-1" },
        "properties": properties,
        "url": format!("https://www.notion.so/{}", id)
    })
}

pub(crate) fn table(id: &str, width: u32) -> Value {
    json!({
        "id": id,
        "type": "table",
        "has_children": true,
        "table": { "table_width": width, "has_column_header": true, "has_row_header": false }
    })
}

pub(crate) fn row(id: &str, cells: &[&str]) -> Value {
    let cells: Vec<Value> = cells
        .iter()
        .map(|text| json!([ { "type": "text", "plain_text": text } ]))
        .collect();
    json!({ "id": id, "type": "table_row", "table_row": { "cells": cells } })
}

pub(crate) fn paragraph(id: &str, text: &str) -> Value {
    json!({
        "id": id,
        "type": "paragraph",
        "paragraph": { "rich_text": [ { "type": "text", "plain_text": text } ] }
    })
}
