//! The key-value store and the backing file it is persisted to.

mod file;
mod properties;

pub use file::PropertiesFile;
pub use properties::{Iter, Properties};
