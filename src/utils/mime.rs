use mime_guess::MimeGuess;
use std::path::Path;

pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

pub fn detect_content_type<P: AsRef<Path>>(path: P) -> Option<String> {
    let guess = MimeGuess::from_path(path.as_ref());
    guess.first().map(|m| m.to_string())
}

pub fn content_type_or_default<P: AsRef<Path>>(path: P) -> String {
    detect_content_type(path).unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string())
}
