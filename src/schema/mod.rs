pub mod actor;
pub mod candidate;
pub mod subject;
pub mod tag;
