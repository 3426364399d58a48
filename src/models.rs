//! Raw upstream document model.
//!
//! These types mirror the JSON envelopes returned by the document API
//! closely enough to decode them, and no further. Page properties stay a
//! generic JSON map (see [`crate::properties`]); block payloads are decoded
//! into the [`BlockContent`] sum type keyed by the block's `type` tag.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

/// Schema-less property bag of a page: property name → arbitrary JSON.
pub type PropertyBag = Map<String, Value>;

/// Envelope of `POST /search`.
///
/// `next_cursor` and `has_more` are decoded but never followed; only the
/// first page of results is ever used.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub object: String,
    #[serde(default)]
    pub results: Vec<Document>,
    #[serde(default)]
    pub next_cursor: Option<String>,
    #[serde(default)]
    pub has_more: bool,
}

/// Envelope of `GET /blocks/{id}/children`.
#[derive(Debug, Clone, Deserialize)]
pub struct BlockList {
    #[serde(default)]
    pub object: String,
    #[serde(default)]
    pub results: Vec<Block>,
    #[serde(default)]
    pub next_cursor: Option<String>,
    #[serde(default)]
    pub has_more: bool,
}

/// A page-like object returned by search.
#[derive(Debug, Clone, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub object: String,
    pub id: String,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_time: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub last_edited_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_by: Option<UserRef>,
    #[serde(default)]
    pub last_edited_by: Option<UserRef>,
    #[serde(default)]
    pub parent: Option<Parent>,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub in_trash: bool,
    #[serde(default)]
    pub properties: PropertyBag,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub public_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserRef {
    #[serde(default)]
    pub object: String,
    pub id: String,
}

/// Owning parent reference. Only the id matching `kind` is populated.
#[derive(Debug, Clone, Deserialize)]
pub struct Parent {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub database_id: Option<String>,
    #[serde(default)]
    pub data_source_id: Option<String>,
    #[serde(default)]
    pub page_id: Option<String>,
    #[serde(default)]
    pub block_id: Option<String>,
}

/// One styled fragment of text.
///
/// Styling and link metadata are decoded but only [`plain_text`](Self::plain_text)
/// is used downstream.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RichText {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub text: Option<TextContent>,
    #[serde(default)]
    pub annotations: Annotations,
    #[serde(default)]
    pub plain_text: String,
    #[serde(default)]
    pub href: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TextContent {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub link: Option<Link>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Link {
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Annotations {
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    #[serde(default)]
    pub strikethrough: bool,
    #[serde(default)]
    pub underline: bool,
    #[serde(default)]
    pub code: bool,
    #[serde(default)]
    pub color: String,
}

/// Block kind tags the projector understands.
pub mod kind {
    pub const TABLE: &str = "table";
    pub const TABLE_ROW: &str = "table_row";
    pub const PARAGRAPH: &str = "paragraph";
    pub const HEADING_1: &str = "heading_1";
    pub const HEADING_2: &str = "heading_2";
    pub const HEADING_3: &str = "heading_3";
}

/// An atomic content unit within a page.
///
/// `kind` keeps the upstream tag verbatim, including tags this crate does not
/// know; `content` holds the payload selected by that tag.
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "RawBlock")]
pub struct Block {
    pub id: String,
    pub kind: String,
    pub has_children: bool,
    pub created_time: Option<DateTime<Utc>>,
    pub last_edited_time: Option<DateTime<Utc>>,
    pub archived: bool,
    pub content: BlockContent,
}

/// Kind-specific block payload.
#[derive(Debug, Clone)]
pub enum BlockContent {
    Table(TableMeta),
    TableRow(TableRowCells),
    Paragraph(RichTextBody),
    Heading(RichTextBody),
    /// Unrecognised kind, or a recognised kind whose payload was absent.
    Unknown,
}

/// Payload of a `table` block.
#[derive(Debug, Clone, Deserialize)]
pub struct TableMeta {
    #[serde(default)]
    pub table_width: u32,
    #[serde(default)]
    pub has_column_header: bool,
    #[serde(default)]
    pub has_row_header: bool,
}

/// Payload of a `table_row` block: one rich-text sequence per cell.
#[derive(Debug, Clone, Deserialize)]
pub struct TableRowCells {
    #[serde(default)]
    pub cells: Vec<Vec<RichText>>,
}

/// Payload shared by paragraph and heading blocks.
#[derive(Debug, Clone, Deserialize)]
pub struct RichTextBody {
    #[serde(default)]
    pub rich_text: Vec<RichText>,
}

/// RFC 3339 timestamp, or `None` when the value is missing, null, or unparseable.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw
        .as_ref()
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc)))
}

/// Wire shape of a block before the payload is selected.
#[derive(Deserialize)]
struct RawBlock {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    has_children: bool,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    created_time: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    last_edited_time: Option<DateTime<Utc>>,
    #[serde(default)]
    archived: bool,
    #[serde(flatten)]
    rest: Map<String, Value>,
}

impl TryFrom<RawBlock> for Block {
    type Error = serde_json::Error;

    fn try_from(mut raw: RawBlock) -> Result<Self, Self::Error> {
        let payload = raw.rest.remove(&raw.kind).filter(|v| !v.is_null());

        let content = match (raw.kind.as_str(), payload) {
            (kind::TABLE, Some(v)) => BlockContent::Table(serde_json::from_value(v)?),
            (kind::TABLE_ROW, Some(v)) => BlockContent::TableRow(serde_json::from_value(v)?),
            (kind::PARAGRAPH, Some(v)) => BlockContent::Paragraph(serde_json::from_value(v)?),
            (kind::HEADING_1 | kind::HEADING_2 | kind::HEADING_3, Some(v)) => {
                BlockContent::Heading(serde_json::from_value(v)?)
            }
            _ => BlockContent::Unknown,
        };

        Ok(Block {
            id: raw.id,
            kind: raw.kind,
            has_children: raw.has_children,
            created_time: raw.created_time,
            last_edited_time: raw.last_edited_time,
            archived: raw.archived,
            content,
        })
    }
}
