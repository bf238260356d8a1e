//! Backing-store row shape and its normalization into [`ArtworkRecord`].
//!
//! Hosted tables name the image column `image_url`, older rows and local
//! exports may carry `imageUrl`, ids may be numeric, `year` may be stored as
//! a number and `price` may be missing entirely. Everything is reconciled
//! here so nothing past the backend boundary sees more than one shape.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use folio_types::{ArtworkFields, ArtworkId, ArtworkRecord, Category, FieldPatch};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A row as returned by a backing store.
#[derive(Clone, Debug, Deserialize)]
pub struct ArtworkRow {
    pub id: Scalar,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub medium: Option<String>,
    #[serde(default)]
    pub year: Option<Scalar>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default, rename = "imageUrl")]
    pub image_url_camel: Option<String>,
    #[serde(default)]
    pub featured: Option<bool>,
    #[serde(default)]
    pub available: Option<bool>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default, alias = "createdAt")]
    pub created_at: Option<DateTime<Utc>>,
}

/// A column that may hold text or a number.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Text(String),
    Int(i64),
    Float(f64),
}

impl Scalar {
    fn into_text(self) -> String {
        match self {
            Self::Text(s) => s,
            Self::Int(n) => n.to_string(),
            Self::Float(f) => f.to_string(),
        }
    }
}

impl ArtworkRow {
    /// Canonical record: one image field, missing price as `None`.
    pub fn normalize(self) -> ArtworkRecord {
        let image_url = self
            .image_url
            .filter(|s| !s.is_empty())
            .or(self.image_url_camel)
            .unwrap_or_default();
        ArtworkRecord {
            id: ArtworkId::new(self.id.into_text()),
            title: self.title.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            category: Category::from(self.category.unwrap_or_default()),
            medium: self.medium.unwrap_or_default(),
            year: self.year.map(Scalar::into_text).unwrap_or_default(),
            image_url,
            featured: self.featured.unwrap_or(false),
            available: self.available.unwrap_or(true),
            price: self.price.filter(|p| p.is_finite()),
            created_at: self.created_at,
        }
    }
}

/// Normalize a batch of rows and order them newest first.
pub fn normalize_rows(rows: Vec<ArtworkRow>) -> Vec<ArtworkRecord> {
    let mut records: Vec<ArtworkRecord> = rows.into_iter().map(ArtworkRow::normalize).collect();
    sort_newest_first(&mut records);
    records
}

/// Stable sort by `created_at` descending; undated records keep their
/// relative order after all dated ones.
pub fn sort_newest_first(records: &mut [ArtworkRecord]) {
    records.sort_by(|a, b| match (a.created_at, b.created_at) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}

/// Insert payload in backing-store column names.
#[derive(Clone, Debug, Serialize)]
pub struct InsertRow<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub category: &'a str,
    pub medium: &'a str,
    pub year: &'a str,
    pub image_url: &'a str,
    pub featured: bool,
    pub available: bool,
    pub price: Option<f64>,
}

impl<'a> From<&'a ArtworkFields> for InsertRow<'a> {
    fn from(fields: &'a ArtworkFields) -> Self {
        Self {
            title: &fields.title,
            description: &fields.description,
            category: fields.category.label(),
            medium: &fields.medium,
            year: &fields.year,
            image_url: &fields.image_url,
            featured: fields.featured,
            available: fields.available,
            price: fields.price,
        }
    }
}

/// Patch payload holding only the columns being changed.
///
/// A cleared price is sent as an explicit `null`.
pub fn patch_columns(patch: &FieldPatch) -> Map<String, Value> {
    let mut columns = Map::new();
    let mut text = |key: &str, value: &Option<String>| {
        if let Some(v) = value {
            columns.insert(key.to_string(), Value::String(v.clone()));
        }
    };
    text("title", &patch.title);
    text("description", &patch.description);
    text("medium", &patch.medium);
    text("year", &patch.year);
    if let Some(category) = &patch.category {
        columns.insert("category".into(), Value::String(category.label().to_string()));
    }
    if let Some(image) = &patch.image {
        columns.insert("image_url".into(), Value::String(image.as_str().to_string()));
    }
    if let Some(featured) = patch.featured {
        columns.insert("featured".into(), Value::Bool(featured));
    }
    if let Some(available) = patch.available {
        columns.insert("available".into(), Value::Bool(available));
    }
    if let Some(price) = patch.price {
        let value = price
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::Null);
        columns.insert("price".into(), value);
    }
    columns
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_types::ImageSource;

    fn rows(json: &str) -> Vec<ArtworkRow> {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn snake_case_image_column() {
        let records = normalize_rows(rows(
            r#"[{"id":"a","title":"T","category":"Portrait","image_url":"https://x/a.jpg"}]"#,
        ));
        assert_eq!(records[0].image_url, "https://x/a.jpg");
        assert_eq!(records[0].category, Category::Portrait);
    }

    #[test]
    fn camel_case_image_column() {
        let records = normalize_rows(rows(r#"[{"id":"a","imageUrl":"/images/a.jpg"}]"#));
        assert_eq!(records[0].image_url, "/images/a.jpg");
    }

    #[test]
    fn missing_price_is_none() {
        let records = normalize_rows(rows(r#"[{"id":"a"},{"id":"b","price":null}]"#));
        assert!(records.iter().all(|r| r.price.is_none()));
    }

    #[test]
    fn numeric_id_and_year_become_text() {
        let records = normalize_rows(rows(r#"[{"id":17,"year":2024}]"#));
        assert_eq!(records[0].id.as_str(), "17");
        assert_eq!(records[0].year, "2024");
    }

    #[test]
    fn unknown_category_is_kept() {
        let records = normalize_rows(rows(r#"[{"id":"a","category":"Sculpture"}]"#));
        assert_eq!(records[0].category, Category::Unrecognized("Sculpture".into()));
    }

    #[test]
    fn sorted_newest_first_with_undated_last() {
        let records = normalize_rows(rows(
            r#"[
                {"id":"undated-1"},
                {"id":"old","created_at":"2024-01-01T00:00:00Z"},
                {"id":"undated-2"},
                {"id":"new","created_at":"2025-06-01T12:00:00Z"}
            ]"#,
        ));
        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "old", "undated-1", "undated-2"]);
    }

    #[test]
    fn insert_row_uses_store_column_names() {
        let fields = ArtworkFields {
            title: "Dusk".into(),
            description: String::new(),
            category: Category::MixedMedia,
            medium: "Oil".into(),
            year: "2025".into(),
            image_url: "https://x/a.jpg".into(),
            featured: true,
            available: true,
            price: None,
        };
        let json = serde_json::to_value(InsertRow::from(&fields)).unwrap();
        assert_eq!(json["image_url"], "https://x/a.jpg");
        assert_eq!(json["category"], "Mixed Media");
        assert!(json["price"].is_null());
    }

    #[test]
    fn patch_columns_only_changed() {
        let patch = FieldPatch {
            title: Some("New".into()),
            image: Some(ImageSource::Reference("https://x/b.jpg".into())),
            price: Some(None),
            ..Default::default()
        };
        let cols = patch_columns(&patch);
        assert_eq!(cols.len(), 3);
        assert_eq!(cols["image_url"], "https://x/b.jpg");
        assert!(cols["price"].is_null());
        assert!(!cols.contains_key("featured"));
    }
}
