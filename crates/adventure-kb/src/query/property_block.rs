//! Decoder for the flattened `.property('key', value)` text format.
//!
//! Some console tools and older records carry vertex properties as the text
//! of the property-setting calls instead of as a map, e.g.
//!
//! ```text
//! .property('name', 'Vigil'), .property('strength', 12)
//! ```
//!
//! Interop contract:
//! - a fragment is `.property('<key>', <value>)`, where `<value>` is either a
//!   single-quoted string or a signed decimal integer;
//! - fragments are separated by commas (whitespace and missing separators
//!   between fragments are tolerated);
//! - strings are taken verbatim between the quotes, there are no escapes, so
//!   a value cannot contain a single quote;
//! - a key that repeats keeps its first position and takes its last value.
//!
//! Parsing is best effort: each fragment is matched on its own and anything
//! that does not form a complete fragment is skipped.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use crate::data::types::{GraphValue, Row};

lazy_static! {
    static ref PROPERTY_FRAGMENT_REGEX: Regex = Regex::new(
        r"\.property\(\s*'([^']+)'\s*,\s*(?:'([^']*)'|(-?[0-9]+))\s*\)"
    ).unwrap();
}

/// Ordered key/value pairs decoded from a property block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyBlock {
    entries: Vec<(String, GraphValue)>,
}

impl PropertyBlock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes every well-formed fragment in `input`.
    pub fn parse(input: &str) -> Self {
        let mut block = Self::new();
        let mut skipped = 0usize;

        for captures in PROPERTY_FRAGMENT_REGEX.captures_iter(input) {
            let key = captures[1].to_string();

            let value = if let Some(text) = captures.get(2) {
                GraphValue::String(text.as_str().to_string())
            } else if let Some(number) = captures.get(3) {
                match number.as_str().parse::<i64>() {
                    Ok(n) => GraphValue::Integer(n),
                    Err(_) => {
                        // Out of i64 range
                        skipped += 1;
                        continue;
                    }
                }
            } else {
                skipped += 1;
                continue;
            };

            block.insert(key, value);
        }

        if skipped > 0 {
            debug!("Skipped {} unparsable property fragments", skipped);
        }
        block
    }

    /// Sets `key`, replacing the value in place when it already exists.
    pub fn insert(&mut self, key: impl Into<String>, value: GraphValue) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&GraphValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(GraphValue::as_str)
    }

    pub fn get_int(&self, key: &str) -> Option<i64> {
        match self.get(key) {
            Some(GraphValue::Integer(i)) => Some(*i),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &GraphValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Converts into a result row. Order is lost, values are kept.
    pub fn into_row(self) -> Row {
        self.entries.into_iter().collect()
    }

    /// Encodes the block in the canonical textual form.
    ///
    /// Only strings and integers are representable. Other values are left
    /// out, as are strings containing a single quote.
    pub fn render(&self) -> String {
        self.entries
            .iter()
            .filter_map(|(key, value)| match value {
                GraphValue::String(s) if !s.contains('\'') => {
                    Some(format!(".property('{}', '{}')", key, s))
                }
                GraphValue::Integer(i) => Some(format!(".property('{}', {})", key, i)),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl FromIterator<(String, GraphValue)> for PropertyBlock {
    fn from_iter<T: IntoIterator<Item = (String, GraphValue)>>(iter: T) -> Self {
        let mut block = Self::new();
        for (key, value) in iter {
            block.insert(key, value);
        }
        block
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_string_value() {
        let block = PropertyBlock::parse(".property('name', 'Vertex1')");
        assert_eq!(block.len(), 1);
        assert_eq!(block.get_str("name"), Some("Vertex1"));
    }

    #[test]
    fn test_parse_negative_integer() {
        let block = PropertyBlock::parse(".property('score', -3)");
        assert_eq!(block.get("score"), Some(&GraphValue::Integer(-3)));
    }

    #[test]
    fn test_malformed_fragment_between_two_good_ones_is_skipped() {
        let input = ".property('name', 'Vigil'), .property('broken', abc), .property('strength', 12)";
        let block = PropertyBlock::parse(input);

        assert_eq!(
            block.iter().collect::<Vec<_>>(),
            vec![
                ("name", &GraphValue::from("Vigil")),
                ("strength", &GraphValue::Integer(12)),
            ]
        );
    }

    #[test]
    fn test_unterminated_quote_is_skipped() {
        let input = ".property('title', 'unfinished), .property('level', 3)";
        let block = PropertyBlock::parse(input);

        assert_eq!(block.len(), 1);
        assert_eq!(block.get_int("level"), Some(3));
        assert!(block.get("title").is_none());
    }

    #[test]
    fn test_missing_comma_inside_fragment_is_skipped() {
        let block = PropertyBlock::parse(".property('a' 1), .property('b', 2)");
        assert!(block.get("a").is_none());
        assert_eq!(block.get_int("b"), Some(2));
    }

    #[test]
    fn test_whitespace_is_ignored() {
        let compact = PropertyBlock::parse(".property('name','Vigil'),.property('wisdom',11)");
        let spaced = PropertyBlock::parse(
            "  .property(  'name' ,  'Vigil'  ) ,\n\t.property( 'wisdom',11 )  ",
        );
        assert_eq!(compact, spaced);
    }

    #[test]
    fn test_repeated_key_last_write_wins_in_first_position() {
        let block = PropertyBlock::parse(
            ".property('hp', 10), .property('name', 'Vigil'), .property('hp', 7)",
        );
        let keys: Vec<&str> = block.iter().map(|(k, _)| k).collect();

        assert_eq!(keys, vec!["hp", "name"]);
        assert_eq!(block.get_int("hp"), Some(7));
    }

    #[test]
    fn test_string_content_is_verbatim() {
        let block = PropertyBlock::parse(r".property('note', ' spaced \n and, (parens) ')");
        assert_eq!(block.get_str("note"), Some(r" spaced \n and, (parens) "));
    }

    #[test]
    fn test_gremlin_statement_text() {
        let input = "g.addV('Character').property('character_id', '42').property('level', 1)";
        let block = PropertyBlock::parse(input);
        assert_eq!(block.get_str("character_id"), Some("42"));
        assert_eq!(block.get_int("level"), Some(1));
    }

    #[test]
    fn test_garbage_yields_empty_block() {
        assert!(PropertyBlock::parse("").is_empty());
        assert!(PropertyBlock::parse("not a block at all").is_empty());
        assert!(PropertyBlock::parse(".property('x', 99999999999999999999)").is_empty());
    }

    #[test]
    fn test_render_is_readable_by_parse() {
        let mut block = PropertyBlock::new();
        block.insert("name", GraphValue::from("Vigil"));
        block.insert("strength", GraphValue::Integer(-2));
        block.insert("flag", GraphValue::Bool(true));

        let text = block.render();
        assert_eq!(text, ".property('name', 'Vigil'), .property('strength', -2)");
        assert_eq!(PropertyBlock::parse(&text).len(), 2);
    }
}
