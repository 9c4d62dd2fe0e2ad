use serde::{Deserialize, Serialize};

use crate::model::ids::PlaceId;

//
// ─── PLACE ─────────────────────────────────────────────────────────────────────
//

/// A regency or city in the learner's progression catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Place {
    id: PlaceId,
    name: String,
}

impl Place {
    #[must_use]
    pub fn new(id: PlaceId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    #[must_use]
    pub fn id(&self) -> PlaceId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

//
// ─── CATALOG ───────────────────────────────────────────────────────────────────
//

/// Ordered, immutable catalog of places.
///
/// The position of a place in the catalog is the unit of unlock progress: a
/// learner with progress `n` may visit every place whose index is `<= n`.
#[derive(Debug, Clone)]
pub struct PlaceCatalog {
    places: Vec<Place>,
}

impl PlaceCatalog {
    #[must_use]
    pub fn new(places: Vec<Place>) -> Self {
        Self { places }
    }

    /// The 18 regencies and 9 cities of West Java, in unlock order.
    #[must_use]
    pub fn west_java() -> Self {
        let names = [
            "Kabupaten Bogor",
            "Kabupaten Sukabumi",
            "Kabupaten Cianjur",
            "Kabupaten Bandung",
            "Kabupaten Garut",
            "Kabupaten Tasikmalaya",
            "Kabupaten Ciamis",
            "Kabupaten Kuningan",
            "Kabupaten Cirebon",
            "Kabupaten Majalengka",
            "Kabupaten Sumedang",
            "Kabupaten Indramayu",
            "Kabupaten Subang",
            "Kabupaten Purwakarta",
            "Kabupaten Karawang",
            "Kabupaten Bekasi",
            "Kabupaten Bandung Barat",
            "Kabupaten Pangandaran",
            "Kota Bogor",
            "Kota Sukabumi",
            "Kota Bandung",
            "Kota Cirebon",
            "Kota Bekasi",
            "Kota Depok",
            "Kota Cimahi",
            "Kota Tasikmalaya",
            "Kota Banjar",
        ];
        let places = names
            .iter()
            .enumerate()
            .map(|(i, name)| Place::new(PlaceId::new(i as u64 + 1), *name))
            .collect();
        Self { places }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.places.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }

    /// Returns the place at the given catalog index.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Place> {
        self.places.get(index)
    }

    /// Looks up a place by id, returning its catalog index alongside it.
    #[must_use]
    pub fn find(&self, id: PlaceId) -> Option<(usize, &Place)> {
        self.places
            .iter()
            .enumerate()
            .find(|(_, place)| place.id() == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Place> {
        self.places.iter()
    }
}
