//! Derived views over a catalog snapshot.
//!
//! Everything here is a pure function of the slice it is given: nothing is
//! mutated, nothing is re-sorted, and results borrow from the snapshot.

use folio_types::{ArtworkRecord, CategoryFilter};

/// Number of featured works highlighted on the home page.
pub const HOME_FEATURED_LIMIT: usize = 3;

/// Records in the given category; [`CategoryFilter::All`] keeps everything.
pub fn filter_by_category<'a>(
    records: &'a [ArtworkRecord],
    category: &CategoryFilter,
) -> Vec<&'a ArtworkRecord> {
    records.iter().filter(|r| in_category(r, category)).collect()
}

/// Records still for sale when `available_only`, otherwise everything.
pub fn filter_by_availability(
    records: &[ArtworkRecord],
    available_only: bool,
) -> Vec<&ArtworkRecord> {
    records.iter().filter(|r| on_sale(r, available_only)).collect()
}

/// Up to `limit` featured records in catalog order.
pub fn featured(records: &[ArtworkRecord], limit: usize) -> Vec<&ArtworkRecord> {
    records.iter().filter(|r| r.featured).take(limit).collect()
}

/// The gallery page's filter bar.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GalleryQuery {
    pub category: CategoryFilter,
    pub available_only: bool,
}

impl GalleryQuery {
    /// Category filter then availability filter, in catalog order.
    pub fn apply<'a>(&self, records: &'a [ArtworkRecord]) -> Vec<&'a ArtworkRecord> {
        records
            .iter()
            .filter(|r| in_category(r, &self.category) && on_sale(r, self.available_only))
            .collect()
    }
}

fn in_category(record: &ArtworkRecord, category: &CategoryFilter) -> bool {
    category.matches(&record.category)
}

fn on_sale(record: &ArtworkRecord, available_only: bool) -> bool {
    !available_only || record.available
}
