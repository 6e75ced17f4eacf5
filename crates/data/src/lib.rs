//! Loading and validation of the declarative catalog and engine configuration.

pub mod load;
pub mod schema;

pub use load::*;
pub use schema::*;
