//! Turns raw text from system inspection commands into typed, renderable
//! results: tables, progress rows, key/value listings or numbered lines.

pub mod parsers;
pub mod shape;
pub mod sort;
pub mod summary;

pub use parsers::{interpret, OutputParser, ParserChain};
pub use shape::{Interpretation, ResultShape, StructuredResult, NO_DATA_PARSED};
pub use sort::{sort_rows, SortDirection};
pub use summary::SummaryData;
