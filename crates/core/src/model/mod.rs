mod ids;
mod place;
mod profile;
mod question;

pub use ids::PlaceId;
pub use place::{Place, PlaceCatalog};
pub use profile::{LearnerProfile, ProfileError};
pub use question::{BLANK_MARKER, QuestionError, QuestionPackage, SubmittedAnswer};
