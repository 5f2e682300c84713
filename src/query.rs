//! Query string decoding.

use std::collections::HashMap;

/// Decodes a raw query string (`a=1&b=two`, no leading `?`) into a map.
///
/// Pieces split on `&`, then on the first `=`. A key without `=` maps to the
/// empty string and empty pieces are skipped. Keys and values are
/// percent-decoded with `+` read as a space; malformed escapes are kept as
/// written. When a key repeats, the last value wins.
pub fn parse(raw: &str) -> HashMap<String, String> {
    url::form_urlencoded::parse(raw.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input() {
        assert!(parse("").is_empty());
    }

    #[test]
    fn pairs_and_bare_keys() {
        let q = parse("search=ana&page=2&flag");
        assert_eq!(q.len(), 3);
        assert_eq!(q["search"], "ana");
        assert_eq!(q["page"], "2");
        assert_eq!(q["flag"], "");
    }

    #[test]
    fn splits_on_first_equals_only() {
        assert_eq!(parse("expr=a=b")["expr"], "a=b");
    }

    #[test]
    fn skips_empty_pieces() {
        let q = parse("a=1&&b=2&");
        assert_eq!(q.len(), 2);
    }

    #[test]
    fn decodes_escapes() {
        let q = parse("name=Ana%20Maria&email=a%40x.com&q=a+b");
        assert_eq!(q["name"], "Ana Maria");
        assert_eq!(q["email"], "a@x.com");
        assert_eq!(q["q"], "a b");
    }

    #[test]
    fn malformed_escapes_pass_through() {
        assert_eq!(parse("pct=100%&bad=%zz")["pct"], "100%");
        assert_eq!(parse("bad=%zz")["bad"], "%zz");
    }

    #[test]
    fn last_duplicate_wins() {
        assert_eq!(parse("a=1&a=2")["a"], "2");
    }
}
