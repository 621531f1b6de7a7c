//! Bar-table pipeline: canonicalize raw rates, compute returns, align symbols

pub mod align;
pub mod canonicalize;
pub mod returns;
pub mod schema;

pub use align::{align_returns, AlignedReturns};
pub use canonicalize::Canonicalizer;
pub use returns::{log_returns, BarRow, BarTable, DataError};
pub use schema::{ReturnSchema, SchemaError};
