pub mod changes;
pub mod indels;
pub mod summary;

pub use changes::{SubstitutionMatrix, aggregate_changes, substitution_records};
pub use indels::{IndelLengthProfile, aggregate_indel_sizes, indel_records};
