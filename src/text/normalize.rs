// Article text normalization.
//
// Lowercases, removes URLs (anything from "http" or "www" to the next
// whitespace) and email addresses, strips everything that isn't a
// lowercase Latin letter or whitespace, then filters stopwords and tokens of
// two characters or fewer. The output is a fixed point: normalizing it again
// returns it unchanged.

use std::sync::LazyLock;

use regex_lite::Regex;

use super::stopwords::is_stopword;

/// Tokens at or below this length are dropped.
pub const MIN_TOKEN_LEN: usize = 3;

static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"http\S+|www\S+").expect("valid url regex"));

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\S+@\S+").expect("valid email regex"));

static NON_ALPHA_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z\s]").expect("valid character class"));

/// Normalize raw article text into space-separated content tokens.
///
/// Never fails. The result may be empty, and callers drop such documents.
pub fn normalize(raw: &str) -> String {
    let lower = raw.to_lowercase();

    let without_urls = URL_RE.replace_all(&lower, "");
    let without_emails = EMAIL_RE.replace_all(&without_urls, "");
    let letters_only = NON_ALPHA_RE.replace_all(&without_emails, "");
    // Stripping can reassemble a URL prefix ("ht-tp..."); remove it so a
    // second pass has nothing left to remove.
    let letters_only = URL_RE.replace_all(&letters_only, "");

    letters_only
        .split_whitespace()
        .filter(|token| token.len() >= MIN_TOKEN_LEN)
        .filter(|token| !is_stopword(token))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Normalize an optional field, treating a missing value as empty text.
pub fn normalize_opt(raw: Option<&str>) -> String {
    raw.map(normalize).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowercases_and_strips_punctuation() {
        assert_eq!(normalize("Hello, World!"), "hello world");
    }

    #[test]
    fn test_strips_urls_and_emails() {
        let raw = "Visit https://bbc.co.uk/news or www.example.com and mail editor@bbc.co.uk today";
        assert_eq!(normalize(raw), "visit mail today");
    }

    #[test]
    fn test_strips_urls_inside_tokens() {
        assert_eq!(normalize("see:http://x.y/z markets"), "see markets");
        assert_eq!(normalize("(via www.bbc.co.uk) rates"), "via rates");
    }

    #[test]
    fn test_strips_digits() {
        assert_eq!(normalize("Profits rose 25% in 2004"), "profits rose");
    }

    #[test]
    fn test_removes_stopwords_and_short_tokens() {
        assert_eq!(normalize("the cat sat on the mat"), "cat sat mat");
        assert_eq!(normalize("an ox is by me"), "");
    }

    #[test]
    fn test_collapses_whitespace() {
        assert_eq!(normalize("  market \t\n  shares   fell  "), "market shares fell");
    }

    #[test]
    fn test_missing_input_is_empty() {
        assert_eq!(normalize_opt(None), "");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn test_reassembled_url_prefix_is_dropped() {
        assert_eq!(normalize("ht-tpserver crashed"), "crashed");
    }

    #[test]
    fn test_idempotent() {
        let samples = [
            "Tony Blair's government faced 3 defeats, see http://x.y for details.",
            "ht.tp-www e-mail: a@b, c @ d; q&a",
            "source:https://news.example/a?b=1 broadband",
            "Ünïcödé café -- naïve résumé",
            "",
        ];
        for s in samples {
            let once = normalize(s);
            assert_eq!(normalize(&once), once, "not a fixed point for {s:?}");
        }
    }
}
