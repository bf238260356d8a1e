use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::category::Category;
use crate::id::ArtworkId;
use crate::image::ImageSource;
use crate::price::{parse_price, PriceInput};

/// A single artwork listing.
///
/// `image_url` always holds a fetchable reference once a record exists;
/// raw upload payloads are resolved before a record is written. `price` of
/// `None` means the price is withheld or the work is not for sale.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtworkRecord {
    pub id: ArtworkId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub category: Category,
    #[serde(default)]
    pub medium: String,
    #[serde(default)]
    pub year: String,
    pub image_url: String,
    #[serde(default)]
    pub featured: bool,
    #[serde(default = "default_available")]
    pub available: bool,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl ArtworkRecord {
    /// Assemble a record from resolved fields and backend-assigned metadata.
    pub fn from_fields(
        id: ArtworkId,
        created_at: Option<DateTime<Utc>>,
        fields: ArtworkFields,
    ) -> Self {
        Self {
            id,
            title: fields.title,
            description: fields.description,
            category: fields.category,
            medium: fields.medium,
            year: fields.year,
            image_url: fields.image_url,
            featured: fields.featured,
            available: fields.available,
            price: fields.price,
            created_at,
        }
    }

    /// Apply a resolved patch in place. The id and creation time never change.
    pub fn apply(&mut self, patch: &FieldPatch) {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(description) = &patch.description {
            self.description = description.clone();
        }
        if let Some(category) = &patch.category {
            self.category = category.clone();
        }
        if let Some(medium) = &patch.medium {
            self.medium = medium.clone();
        }
        if let Some(year) = &patch.year {
            self.year = year.clone();
        }
        if let Some(image) = &patch.image {
            self.image_url = image.as_str().to_string();
        }
        if let Some(featured) = patch.featured {
            self.featured = featured;
        }
        if let Some(available) = patch.available {
            self.available = available;
        }
        if let Some(price) = patch.price {
            self.price = price;
        }
    }

    /// "Sold" badge condition.
    pub fn is_sold(&self) -> bool {
        !self.available
    }
}

fn default_available() -> bool {
    true
}

fn current_year() -> String {
    Utc::now().year().to_string()
}

/// Input for adding an artwork, as submitted by the admin form.
///
/// `image_url` may be an inline `data:` payload (a freshly picked file) or
/// an existing reference. `price` is raw and parsed by [`parse_price`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewArtwork {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub medium: String,
    #[serde(default = "current_year")]
    pub year: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub featured: bool,
    #[serde(default = "default_available")]
    pub available: bool,
    #[serde(default)]
    pub price: Option<PriceInput>,
}

impl NewArtwork {
    /// A blank form: empty text, current year, available, no price.
    pub fn new(title: impl Into<String>, image_url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            category: Category::default(),
            medium: String::new(),
            year: current_year(),
            image_url: image_url.into(),
            featured: false,
            available: true,
            price: None,
        }
    }

    pub fn image(&self) -> ImageSource {
        ImageSource::parse(self.image_url.clone())
    }

    /// Resolve into storable fields given the final image reference.
    pub fn into_fields(self, image_url: String) -> ArtworkFields {
        let price = parse_price(self.price.as_ref());
        ArtworkFields {
            title: self.title,
            description: self.description,
            category: self.category,
            medium: self.medium,
            year: self.year,
            image_url,
            featured: self.featured,
            available: self.available,
            price,
        }
    }
}

/// Partial update input, as submitted by the admin form.
///
/// `price` distinguishes an absent key (leave the price alone) from an
/// explicit `null` (clear it).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtworkPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medium: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub featured: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available: Option<bool>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub price: Option<Option<PriceInput>>,
}

impl ArtworkPatch {
    /// Parse the price and classify the image, leaving upload to the store.
    pub fn to_field_patch(&self) -> FieldPatch {
        FieldPatch {
            title: self.title.clone(),
            description: self.description.clone(),
            category: self.category.clone(),
            medium: self.medium.clone(),
            year: self.year.clone(),
            image: self.image_url.clone().map(ImageSource::parse),
            featured: self.featured,
            available: self.available,
            price: self.price.as_ref().map(|raw| parse_price(raw.as_ref())),
        }
    }
}

/// Keeps `Some(None)` for an explicit `null` instead of collapsing it.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Every stored field except the backend-assigned id and creation time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArtworkFields {
    pub title: String,
    pub description: String,
    pub category: Category,
    pub medium: String,
    pub year: String,
    pub image_url: String,
    pub featured: bool,
    pub available: bool,
    pub price: Option<f64>,
}

/// A partial update with the price already parsed.
///
/// `image` may still be inline; backends upload it before patching.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FieldPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<Category>,
    pub medium: Option<String>,
    pub year: Option<String>,
    pub image: Option<ImageSource>,
    pub featured: Option<bool>,
    pub available: Option<bool>,
    pub price: Option<Option<f64>>,
}

impl FieldPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Returns `true` if the image still needs uploading.
    pub fn has_inline_image(&self) -> bool {
        self.image.as_ref().is_some_and(ImageSource::is_inline)
    }
}
