// DataFrame implementations module
mod base;
mod coerce;

pub use base::DataFrame;
pub(crate) use base::first_duplicate;
pub(crate) use coerce::parse_column;
