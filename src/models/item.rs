//! Remote item payload, parsed loosely.

use serde_json::Value;

use super::Record;

/// An item as returned by `GET /item/{id}.json`.
///
/// Every field is optional: the API returns `null` for unknown IDs and omits
/// fields freely, so a field that is absent or of the wrong type is treated
/// as missing rather than failing the item.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Item {
    pub id: Option<u64>,
    pub kind: Option<String>,
    pub url: Option<String>,
    pub title: Option<String>,
    pub text: Option<String>,
    pub time: Option<i64>,
}

impl Item {
    /// Parse an item from a JSON value. Returns `None` unless it is an object.
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;

        let string = |key: &str| obj.get(key).and_then(Value::as_str).map(str::to_string);
        let time = obj.get("time").and_then(|v| {
            v.as_i64()
                .or_else(|| v.as_str().and_then(|s| s.trim().parse().ok()))
        });

        Some(Self {
            id: obj.get("id").and_then(Value::as_u64),
            kind: string("type"),
            url: string("url"),
            title: string("title"),
            text: string("text"),
            time,
        })
    }

    pub fn is_story(&self) -> bool {
        self.kind.as_deref() == Some("story")
    }

    /// Convert to a record if this is a story linking to an external URL.
    ///
    /// Only the item's title is carried over. The record's text is the linked
    /// page's body, so it stays empty until enrichment; the submitter's own
    /// `text` is dropped.
    pub fn into_record(self) -> Option<Record> {
        if !self.is_story() {
            return None;
        }
        let url = self.url.map(|u| u.trim().to_string())?;
        if url.is_empty() {
            return None;
        }

        Some(Record::new(
            url,
            self.title.unwrap_or_default(),
            String::new(),
            self.time,
        ))
    }
}
