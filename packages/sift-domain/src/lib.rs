pub mod decision;
pub mod merge;
pub mod passage;
pub mod scoring;

pub use decision::{CollectionDescriptor, Decision, RetrievalQuery};
pub use passage::{Passage, PassageKey};
