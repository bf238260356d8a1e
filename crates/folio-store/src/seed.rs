//! Baked-in catalog used when the local slot is missing or unreadable.

use folio_types::{ArtworkId, ArtworkRecord, Category};

struct Seed {
    id: &'static str,
    title: &'static str,
    description: &'static str,
    category: Category,
    medium: &'static str,
    year: &'static str,
    image: &'static str,
    featured: bool,
    available: bool,
    price: Option<f64>,
}

/// The default set, newest first.
pub fn default_artworks() -> Vec<ArtworkRecord> {
    let seeds = [
        Seed {
            id: "seed-4",
            title: "Golden Hour Bloom",
            description: "Layered petals caught in late afternoon light.",
            category: Category::Botanical,
            medium: "Acrylic on canvas",
            year: "2024",
            image: "/images/seed/golden-hour-bloom.jpg",
            featured: true,
            available: true,
            price: Some(85000.0),
        },
        Seed {
            id: "seed-3",
            title: "Quiet Rivers",
            description: "Movement and stillness in blue and ochre.",
            category: Category::Abstract,
            medium: "Oil on canvas",
            year: "2024",
            image: "/images/seed/quiet-rivers.jpg",
            featured: true,
            available: false,
            price: None,
        },
        Seed {
            id: "seed-2",
            title: "Her Gaze",
            description: "A study in charcoal and gold leaf.",
            category: Category::Portrait,
            medium: "Charcoal and gold leaf",
            year: "2023",
            image: "/images/seed/her-gaze.jpg",
            featured: true,
            available: true,
            price: Some(120000.0),
        },
        Seed {
            id: "seed-1",
            title: "Fragments of Home",
            description: "Fabric, paper and paint from the studio floor.",
            category: Category::MixedMedia,
            medium: "Mixed media on board",
            year: "2023",
            image: "/images/seed/fragments-of-home.jpg",
            featured: false,
            available: true,
            price: Some(45000.0),
        },
    ];

    seeds
        .into_iter()
        .map(|s| ArtworkRecord {
            id: ArtworkId::new(s.id),
            title: s.title.into(),
            description: s.description.into(),
            category: s.category,
            medium: s.medium.into(),
            year: s.year.into(),
            image_url: s.image.into(),
            featured: s.featured,
            available: s.available,
            price: s.price,
            created_at: None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn seed_ids_are_unique() {
        let records = default_artworks();
        let ids: HashSet<_> = records.iter().map(|r| r.id.clone()).collect();
        assert_eq!(ids.len(), records.len());
    }

    #[test]
    fn seeds_are_valid_records() {
        for record in default_artworks() {
            assert!(!record.title.is_empty());
            assert!(!record.image_url.is_empty());
            assert!(record.category.is_known());
        }
    }
}
