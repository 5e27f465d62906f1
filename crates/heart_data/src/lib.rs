//! Heart-disease dataset handling
//!
//! Downloads the UCI archive, reads headerless raw tables and turns them into
//! the clean, fully numeric 14-column table the trainer consumes.

pub mod acquisition;
pub mod cleaner;
pub mod errors;
pub mod table;

pub use acquisition::{download_dataset, extract_archive, materialize_csv, select_data_file};
pub use cleaner::{clean_dataset, CleanTable, LabelEncoder};
pub use errors::{DataError, Result};
pub use table::{RawTable, MISSING_PLACEHOLDER};
