//! Fixed topic catalog used to vary the generated questions.

use rand::seq::IndexedRandom;

/// Topics the question source can be asked about for any place.
pub const TOPICS: &[&str] = &[
    "sejarah",
    "makanan khas",
    "tempat wisata ikonik",
    "fakta menarik",
    "tarian daerah",
    "lagu daerah",
    "pakaian adat",
    "rumah adat",
    "bahasa daerah",
    "tokoh terkenal",
    "flora khas",
    "fauna khas",
    "perayaan adat",
    "alat musik tradisional",
    "geografi",
    "sungai dan danau",
    "gunung dan pegunungan",
    "hasil bumi",
    "mata pencaharian",
    "transportasi tradisional",
    "kerajinan tangan",
    "permainan tradisional",
    "simbol daerah",
    "kuliner unik",
    "adat istiadat",
    "festival daerah",
    "cerita rakyat",
    "olahraga tradisional",
    "kegiatan ekonomi",
];

/// Picks one topic uniformly at random.
#[must_use]
pub fn random_topic() -> &'static str {
    let mut rng = rand::rng();
    TOPICS.choose(&mut rng).copied().unwrap_or("sejarah")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_topic_comes_from_the_catalog() {
        for _ in 0..50 {
            assert!(TOPICS.contains(&random_topic()));
        }
    }
}
