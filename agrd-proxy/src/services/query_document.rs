//! Catalog query document builder
//!
//! Produces one line of the catalog's query language:
//!
//! ```text
//! search "<term>"; fields name,cover.image_id,first_release_date,genres.name; limit 10;
//! ```
//!
//! The term is user text, so it is escaped before it lands between the quotes:
//! backslash and double quote get a backslash, control characters become spaces.

use agrd_common::{Error, Result};

/// Results per search
pub const PAGE_SIZE: usize = 10;

/// Fields requested for every game
pub const FIELD_PROJECTION: &str = "name,cover.image_id,first_release_date,genres.name";

/// Build the search document for `query`
///
/// Blank queries are `InvalidInput`: callers filter them out before this point.
pub fn build_search_document(query: &str) -> Result<String> {
    let term = query.trim();
    if term.is_empty() {
        return Err(Error::InvalidInput(
            "blank query reached the catalog document builder".to_string(),
        ));
    }

    Ok(format!(
        "search \"{}\"; fields {}; limit {};",
        escape_search_term(term),
        FIELD_PROJECTION,
        PAGE_SIZE
    ))
}

/// Escape a term for use inside a double-quoted string of the query language
pub fn escape_search_term(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            c if c.is_control() => escaped.push(' '),
            c => escaped.push(c),
        }
    }
    escaped
}
