pub mod extract;
pub mod merge;
pub mod predicate;

pub use extract::{extract_files, Extraction, Extractor};
pub use merge::merge_files;
pub use predicate::{is_file_like, FileClassifier, FileTypes};
