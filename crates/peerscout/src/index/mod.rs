//! In-memory lookup structures built once from the snapshot.

mod keywords;
mod relationships;
mod roles;
mod subject_areas;

pub use keywords::KeywordIndex;
pub use relationships::{AssignedReviewer, RelationshipIndex};
pub use roles::RoleIndex;
pub use subject_areas::SubjectAreaIndex;
