// src/utils/html.rs

/// Clean question or explanation content using the ammonia library.
///
/// Authors sometimes embed simple markup (<b>, <i>, <sub>) in question text.
/// Safe tags are preserved while scripts, frames and event attributes are
/// stripped before the content is placed into a rendered page.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}

/// Escapes every HTML-significant character. Used for attribute values
/// (image URLs) and math source, which must never be interpreted as markup.
pub fn escape_text(input: &str) -> String {
    ammonia::clean_text(input)
}
