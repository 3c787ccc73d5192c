//! Quote-aware splitting of report lines.
//!
//! Report lines are tab-delimited. A field wrapped in double quotes may contain
//! tabs, and a doubled quote inside a quoted field is a literal quote.

pub const FIELD_DELIMITER: char = '\t';
const QUOTE: char = '"';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Unquoted,
    Quoted,
}

/// Splits one line into fields. The last field is always emitted, so an empty
/// line yields one empty field and a trailing delimiter yields a trailing
/// empty field.
pub fn parse_line(line: &str) -> Vec<String> {
    let line = line.strip_suffix('\r').unwrap_or(line);
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut state = State::Unquoted;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match (state, c) {
            (State::Quoted, QUOTE) if chars.peek() == Some(&QUOTE) => {
                current.push(QUOTE);
                chars.next();
            }
            (State::Quoted, QUOTE) => state = State::Unquoted,
            (State::Unquoted, QUOTE) => state = State::Quoted,
            (State::Unquoted, FIELD_DELIMITER) => {
                fields.push(std::mem::take(&mut current));
            }
            (_, other) => current.push(other),
        }
    }
    fields.push(current);

    fields
}

/// True for lines that carry no data (blank or whitespace only).
pub fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_fields() {
        assert_eq!(parse_line("a\tb\tc"), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_quoted_delimiter_does_not_split() {
        assert_eq!(
            parse_line("\"Jane\tDoe\"\tTITLE\t5"),
            vec!["Jane\tDoe", "TITLE", "5"]
        );
    }

    #[test]
    fn test_quoted_field_count_matches_header() {
        let header = parse_line("Provider\tTitle\tUnits\tDeveloper Proceeds");
        let row = parse_line("APPLE\t\"Blush: Dating\tCoach\"\t1\t8.49");
        assert_eq!(row.len(), header.len());
        assert_eq!(row[1], "Blush: Dating\tCoach");
        assert_eq!(row[3], "8.49");
    }

    #[test]
    fn test_escaped_quote_inside_quoted_field() {
        assert_eq!(
            parse_line("\"The \"\"Best\"\" App\"\t2"),
            vec!["The \"Best\" App", "2"]
        );
    }

    #[test]
    fn test_empty_fields_are_preserved() {
        assert_eq!(parse_line("a\t\tc"), vec!["a", "", "c"]);
        assert_eq!(parse_line("a\tb\t"), vec!["a", "b", ""]);
        assert_eq!(parse_line(""), vec![""]);
    }

    #[test]
    fn test_empty_quoted_field() {
        assert_eq!(parse_line("\"\"\tx"), vec!["", "x"]);
    }

    #[test]
    fn test_carriage_return_is_stripped() {
        assert_eq!(parse_line("1\t9.99\r"), vec!["1", "9.99"]);
    }

    #[test]
    fn test_blank_lines() {
        assert!(is_blank(""));
        assert!(is_blank("  \r"));
        assert!(!is_blank("a\tb"));
    }
}
