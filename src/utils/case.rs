/// Empty segments (from `__` or a leading/trailing `_`) are written back as `_`.
pub fn to_camel_case(snake: &str) -> String {
    let mut segments = snake.split('_');
    let mut result = String::with_capacity(snake.len());

    if let Some(first) = segments.next() {
        result.push_str(first);
    }

    for segment in segments {
        let mut chars = segment.chars();
        match chars.next() {
            Some(first) => {
                push_titlecase(&mut result, first);
                result.push_str(chars.as_str());
            }
            None => result.push('_'),
        }
    }

    result
}

// Latin digraphs have a distinct titlecase form; everything else uses the
// uppercase mapping.
fn push_titlecase(out: &mut String, ch: char) {
    match ch {
        '\u{01C4}'..='\u{01C6}' => out.push('\u{01C5}'),
        '\u{01C7}'..='\u{01C9}' => out.push('\u{01C8}'),
        '\u{01CA}'..='\u{01CC}' => out.push('\u{01CB}'),
        '\u{01F1}'..='\u{01F3}' => out.push('\u{01F2}'),
        _ => out.extend(ch.to_uppercase()),
    }
}
