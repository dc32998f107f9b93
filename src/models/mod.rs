pub mod id_index;
pub mod movie;
pub mod rating;

pub use id_index::IdIndex;
pub use movie::Movie;
pub use rating::Rating;
