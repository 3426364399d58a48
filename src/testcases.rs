//! Test-case discovery and aggregation.
//!
//! A test case is any searched page whose title property contains
//! `TC_<digits>`; the digits, kept as a string so leading zeros survive, are
//! its key. Nothing is cached or indexed: every call re-runs the search,
//! which assumes result sets of tens of pages rather than thousands.
//!
//! Used by both the `ntc` CLI commands and the HTTP routes.

use anyhow::Context;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;
use tracing::{debug, info, warn};

use crate::blocks::{get_page_blocks, get_table_blocks, NormalizedBlock};
use crate::client::{DocumentApi, SearchRequest};
use crate::config::CatalogConfig;
use crate::error::{Error, Result};
use crate::models::Document;
use crate::properties::{extract_date, extract_status, extract_title};
use crate::tables::{get_table_data, TableSnapshot};

static TEST_CASE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"TC_(\d+)").expect("static regex is valid"));

/// A page recognised as a test case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestCase {
    pub test_case_key: String,
    pub page_id: String,
    pub title: String,
    pub status: String,
    pub test_date: String,
    pub url: String,
    pub last_edited: Option<DateTime<Utc>>,
}

/// A test case together with the contents of every table on its page.
#[derive(Debug, Clone, Serialize)]
pub struct DetailedTestCase {
    #[serde(flatten)]
    pub test_case: TestCase,
    pub tables: Vec<TableSnapshot>,
}

/// Extract the key from a title, e.g. `"01001"` from `"TC_01001 Login"`.
pub fn test_case_key(title: &str) -> Option<String> {
    TEST_CASE_PATTERN
        .captures(title)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Keep the documents whose title matches the naming convention.
pub fn extract_test_cases(documents: &[Document], catalog: &CatalogConfig) -> Vec<TestCase> {
    documents
        .iter()
        .filter_map(|doc| {
            let title = extract_title(&doc.properties, &catalog.title_property)?;
            let key = test_case_key(&title)?;
            Some(TestCase {
                test_case_key: key,
                page_id: doc.id.clone(),
                title,
                status: extract_status(&doc.properties, &catalog.status_property),
                test_date: extract_date(&doc.properties, &catalog.date_property),
                url: doc.url.clone(),
                last_edited: doc.last_edited_time,
            })
        })
        .collect()
}

/// Search upstream and return every test case, in search order.
pub async fn search_test_cases(
    api: &dyn DocumentApi,
    catalog: &CatalogConfig,
) -> Result<Vec<TestCase>> {
    let documents = api.search(&SearchRequest::for_catalog(catalog)).await?;
    let test_cases = extract_test_cases(&documents, catalog);
    info!(
        documents = documents.len(),
        test_cases = test_cases.len(),
        "extracted test cases"
    );
    Ok(test_cases)
}

/// Find a test case by exact key (linear scan over a fresh search).
pub async fn get_test_case_by_key(
    api: &dyn DocumentApi,
    catalog: &CatalogConfig,
    key: &str,
) -> Result<TestCase> {
    search_test_cases(api, catalog)
        .await?
        .into_iter()
        .find(|tc| tc.test_case_key == key)
        .ok_or_else(|| Error::NotFound(format!("test case with key {}", key)))
}

/// A test case and the blocks on its page, optionally only the tables.
#[derive(Debug, Clone, Serialize)]
pub struct TestCaseBlocks {
    pub test_case: TestCase,
    pub blocks: Vec<NormalizedBlock>,
}

pub async fn get_test_case_blocks(
    api: &dyn DocumentApi,
    catalog: &CatalogConfig,
    key: &str,
    tables_only: bool,
) -> Result<TestCaseBlocks> {
    let test_case = get_test_case_by_key(api, catalog, key).await?;
    let blocks = if tables_only {
        get_table_blocks(api, &test_case.page_id).await?
    } else {
        get_page_blocks(api, &test_case.page_id).await?
    };
    Ok(TestCaseBlocks { test_case, blocks })
}

/// Every test case with its tables.
///
/// Only the search itself can fail the call. A page whose blocks cannot be
/// listed gets an empty table list; a table that cannot be read is left out.
/// Both are logged.
pub async fn get_detailed_test_cases(
    api: &dyn DocumentApi,
    catalog: &CatalogConfig,
) -> Result<Vec<DetailedTestCase>> {
    let test_cases = search_test_cases(api, catalog).await?;
    let mut detailed = Vec::with_capacity(test_cases.len());

    for tc in test_cases {
        let tables = collect_tables(api, &tc).await;
        detailed.push(DetailedTestCase {
            test_case: tc,
            tables,
        });
    }

    Ok(detailed)
}

async fn collect_tables(api: &dyn DocumentApi, tc: &TestCase) -> Vec<TableSnapshot> {
    let blocks: Vec<NormalizedBlock> = match get_table_blocks(api, &tc.page_id).await {
        Ok(blocks) => blocks,
        Err(e) => {
            warn!(
                test_case = %tc.test_case_key,
                error = %e,
                category = e.category(),
                "failed to get table blocks"
            );
            return Vec::new();
        }
    };

    let mut tables = Vec::with_capacity(blocks.len());
    for block in blocks {
        match get_table_data(api, &block.block_id).await {
            Ok(table) => tables.push(table),
            Err(e) => warn!(
                test_case = %tc.test_case_key,
                block_id = %block.block_id,
                error = %e,
                category = e.category(),
                "failed to get table data"
            ),
        }
    }
    debug!(test_case = %tc.test_case_key, tables = tables.len(), "collected tables");
    tables
}

// ============ CLI output ============

/// `ntc list`: print the test cases as an aligned table.
pub async fn run_list(api: &dyn DocumentApi, catalog: &CatalogConfig) -> anyhow::Result<()> {
    let test_cases = search_test_cases(api, catalog)
        .await
        .context("Failed to search test cases")?;

    if test_cases.is_empty() {
        println!("No test cases.");
        return Ok(());
    }

    println!(
        "{:<10} {:<14} {:<12} {:<36} TITLE",
        "KEY", "STATUS", "DATE", "PAGE"
    );
    for tc in &test_cases {
        println!(
            "{:<10} {:<14} {:<12} {:<36} {}",
            tc.test_case_key, tc.status, tc.test_date, tc.page_id, tc.title
        );
    }
    println!();
    println!("{} test case(s)", test_cases.len());
    Ok(())
}

/// `ntc blocks <key>`: print a test case's blocks, one per line.
pub async fn run_blocks(
    api: &dyn DocumentApi,
    catalog: &CatalogConfig,
    key: &str,
    tables_only: bool,
) -> anyhow::Result<()> {
    let TestCaseBlocks { test_case, blocks } =
        get_test_case_blocks(api, catalog, key, tables_only)
            .await
            .with_context(|| format!("Failed to get blocks for test case {}", key))?;

    println!("TC_{}: {}", test_case.test_case_key, test_case.title);
    println!("  page: {}", test_case.page_id);
    if !test_case.status.is_empty() {
        println!("  status: {}", test_case.status);
    }
    println!();

    if blocks.is_empty() {
        println!("No blocks.");
        return Ok(());
    }

    for (i, block) in blocks.iter().enumerate() {
        print!("{:>3}. {:<12} {}", i + 1, block.kind, block.block_id);
        if let Some(info) = &block.table_info {
            print!(
                "  (width {}, column header: {}, row header: {})",
                info.table_width, info.has_column_header, info.has_row_header
            );
        }
        if let Some(content) = block.content.as_deref().filter(|c| !c.is_empty()) {
            print!("  {}", content);
        }
        println!();
    }
    Ok(())
}

/// `ntc detailed`: print every test case with its tables as JSON.
pub async fn run_detailed(api: &dyn DocumentApi, catalog: &CatalogConfig) -> anyhow::Result<()> {
    let detailed = get_detailed_test_cases(api, catalog)
        .await
        .context("Failed to get detailed test cases")?;
    println!("{}", serde_json::to_string_pretty(&detailed)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{page, paragraph, row, table, FakeApi};

    fn catalog() -> CatalogConfig {
        CatalogConfig::default()
    }

    #[test]
    fn test_key_extraction() {
        assert_eq!(test_case_key("TC_01001").as_deref(), Some("01001"));
        assert_eq!(test_case_key("TC_7 smoke").as_deref(), Some("7"));
        assert_eq!(test_case_key("Regression TC_0042").as_deref(), Some("0042"));
        assert_eq!(test_case_key("TC_"), None);
        assert_eq!(test_case_key("tc_123"), None);
        assert_eq!(test_case_key("Meeting notes"), None);
    }

    #[tokio::test]
    async fn test_search_filters_by_title() {
        let api = FakeApi::new()
            .with_document(page("p1", "TC_01001 Login", Some("Done"), Some("2024-06-01")))
            .with_document(page("p2", "Meeting notes", Some("Done"), None))
            .with_document(page("p3", "TC_00002", None, None))
            .with_document(serde_json::json!({ "object": "page", "id": "p4", "properties": {} }));

        let cases = search_test_cases(&api, &catalog()).await.unwrap();

        assert_eq!(cases.len(), 2);
        assert_eq!(cases[0].test_case_key, "01001");
        assert_eq!(cases[0].title, "TC_01001 Login");
        assert_eq!(cases[0].status, "Done");
        assert_eq!(cases[0].test_date, "2024-06-01");
        assert_eq!(cases[0].url, "https://www.notion.so/p1");
        assert!(cases[0].last_edited.is_some());

        assert_eq!(cases[1].test_case_key, "00002");
        assert_eq!(cases[1].status, "");
        assert_eq!(cases[1].test_date, "");
    }

    #[tokio::test]
    async fn test_unparseable_timestamp_still_listed() {
        let mut doc = page("p1", "TC_0100 Checkout", Some("Done"), None);
        doc["last_edited_time"] = serde_json::json!("not a date");
        let api = FakeApi::new().with_document(doc);

        let cases = search_test_cases(&api, &catalog()).await.unwrap();
        assert_eq!(cases.len(), 1);
        assert_eq!(cases[0].test_case_key, "0100");
        assert!(cases[0].last_edited.is_none());
    }

    #[tokio::test]
    async fn test_custom_property_names() {
        let doc = serde_json::json!({
            "object": "page",
            "id": "p1",
            "properties": {
                "Name": { "title": [ { "plain_text": "TC_9" } ] },
                "State": { "status": { "name": "Blocked" } }
            }
        });
        let api = FakeApi::new().with_document(doc);
        let catalog = CatalogConfig {
            title_property: "Name".to_string(),
            status_property: "State".to_string(),
            ..CatalogConfig::default()
        };

        let cases = search_test_cases(&api, &catalog).await.unwrap();
        assert_eq!(cases.len(), 1);
        assert_eq!(cases[0].status, "Blocked");
    }

    #[tokio::test]
    async fn test_get_by_key() {
        let api = FakeApi::new()
            .with_document(page("p1", "TC_1001", None, None))
            .with_document(page("p2", "TC_01001", None, None));

        let tc = get_test_case_by_key(&api, &catalog(), "01001").await.unwrap();
        assert_eq!(tc.page_id, "p2");

        let err = get_test_case_by_key(&api, &catalog(), "999").await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_detailed_isolates_failures() {
        let api = FakeApi::new()
            .with_document(page("p1", "TC_001", Some("Done"), None))
            .with_document(page("p2", "TC_002", Some("Failed"), None))
            .with_document(page("p3", "TC_003", None, None))
            .with_children("p1", vec![paragraph("intro", "Setup"), table("t1", 2)])
            .with_children("t1", vec![row("r1", &["a", "b"]), row("r2", &["c", "d"])])
            .with_children("p2", vec![table("t2", 1), table("t3", 1)])
            .with_children("t3", vec![row("r3", &["ok"])])
            .failing_on("t2")
            .failing_on("p3");

        let detailed = get_detailed_test_cases(&api, &catalog()).await.unwrap();
        assert_eq!(detailed.len(), 3);

        assert_eq!(detailed[0].test_case.test_case_key, "001");
        assert_eq!(detailed[0].tables.len(), 1);
        assert_eq!(detailed[0].tables[0].rows.len(), 2);

        // t2 fails, t3 still read
        assert_eq!(detailed[1].tables.len(), 1);
        assert_eq!(detailed[1].tables[0].block_id, "t3");

        // page listing fails entirely
        assert!(detailed[2].tables.is_empty());
    }

    #[tokio::test]
    async fn test_detailed_is_sequential() {
        let api = FakeApi::new()
            .with_document(page("p1", "TC_1", None, None))
            .with_children("p1", vec![table("t1", 1)])
            .with_children("t1", vec![row("r1", &["x"])]);

        get_detailed_test_cases(&api, &catalog()).await.unwrap();
        assert_eq!(
            api.calls(),
            vec!["search", "children:p1", "block:t1", "children:t1"]
        );
    }

    #[tokio::test]
    async fn test_case_blocks_filtering() {
        let api = FakeApi::new()
            .with_document(page("p1", "TC_01001", None, None))
            .with_children("p1", vec![paragraph("b1", "Intro"), table("t1", 2)]);

        let all = get_test_case_blocks(&api, &catalog(), "01001", false)
            .await
            .unwrap();
        assert_eq!(all.test_case.page_id, "p1");
        assert_eq!(all.blocks.len(), 2);
        assert_eq!(all.blocks[0].content.as_deref(), Some("Intro"));

        let tables = get_test_case_blocks(&api, &catalog(), "01001", true)
            .await
            .unwrap();
        assert_eq!(tables.blocks.len(), 1);
        assert!(tables.blocks[0].is_table());

        let err = get_test_case_blocks(&api, &catalog(), "404", true)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_detailed_serializes_flat() {
        let detailed = DetailedTestCase {
            test_case: TestCase {
                test_case_key: "01001".into(),
                page_id: "p1".into(),
                title: "TC_01001".into(),
                status: String::new(),
                test_date: String::new(),
                url: "https://www.notion.so/p1".into(),
                last_edited: None,
            },
            tables: vec![],
        };
        let value = serde_json::to_value(&detailed).unwrap();
        assert_eq!(value["test_case_key"], "01001");
        assert_eq!(value["tables"], serde_json::json!([]));
        assert!(value.get("test_case").is_none());
    }
}
