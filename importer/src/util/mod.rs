mod deserialize;
pub mod load;

pub use deserialize::*;
pub use load::{load_document, parse_document, DocumentFormat, LoadError};
