pub mod core;
pub mod files;
pub mod utils;

pub use crate::core::{
    ExtractConfig, ExtractConfigBuilder, FileMap, GqlError, Handle, Result, Upload, Variables,
};

pub use crate::files::{
    extract_files, is_file_like, merge_files, Extraction, Extractor, FileClassifier, FileTypes,
};

pub use crate::utils::to_camel_case;

pub mod prelude {
    pub use crate::core::{Handle, Result, Upload, Variables};
    pub use crate::files::{extract_files, Extractor, FileTypes};
    pub use crate::utils::to_camel_case;
}
