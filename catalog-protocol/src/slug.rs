/// Catalog keys derived from source URLs.
///
/// Entries are announced under a short slug taken from the URL path, e.g.
/// `https://forum.example/t/big-buck-bunny/1234` → `big-buck-bunny`. The
/// announce hash is the content id of `slug_timestamp`.
///
/// URLs are parsed with WHATWG rules, so backslashes, percent-encoding and
/// dot segments behave as they do in a browser. Input that does not parse
/// takes the fallback path of each function.
use url::Url;

use crate::crdt::entry::Entry;
use crate::hashing::content_id;

/// Title used when the input is not a URL.
pub const UNTITLED: &str = "Untitled";

const STRIPPED_EXTENSIONS: [&str; 3] = [".html", ".htm", ".php"];

/// Non-empty path segments. Opaque URLs such as `magnet:` have none.
fn path_segments(url: &Url) -> Vec<&str> {
    url.path_segments()
        .map(|segments| segments.filter(|s| !s.is_empty()).collect())
        .unwrap_or_default()
}

fn host(url: &Url) -> String {
    url.host_str().unwrap_or_default().to_string()
}

/// Pick the slug segment: the last one, or the one before a trailing
/// numeric id (`/t/{slug}/{id}`).
fn slug_segment<'a>(segments: &[&'a str]) -> Option<&'a str> {
    match segments {
        [] => None,
        [.., slug, id] if id.bytes().all(|b| b.is_ascii_digit()) => Some(*slug),
        [.., last] => Some(*last),
    }
}

fn clean_slug(segment: &str) -> String {
    let slug = STRIPPED_EXTENSIONS
        .iter()
        .find_map(|ext| segment.strip_suffix(ext))
        .unwrap_or(segment);
    slug.to_lowercase()
}

fn slug_to_title(segment: &str) -> String {
    segment
        .replace(&['-', '_'][..], " ")
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Short lower-case slug for a source URL.
///
/// A URL without path segments yields its host. Input that is not a URL is
/// returned trimmed and lower-cased.
pub fn extract_slug(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) => match slug_segment(&path_segments(&parsed)) {
            Some(segment) => clean_slug(segment),
            None => host(&parsed),
        },
        Err(_) => url.trim().to_lowercase(),
    }
}

/// Human-readable title guessed from a source URL.
pub fn extract_title(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) => match slug_segment(&path_segments(&parsed)) {
            Some(segment) => slug_to_title(segment),
            None => host(&parsed),
        },
        Err(_) => UNTITLED.to_string(),
    }
}

/// Normalize a free-text query to slug form: `"Big  Buck!"` → `"big-buck"`.
pub fn normalize_search_query(query: &str) -> String {
    let kept: String = query
        .to_lowercase()
        .trim()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace() || *c == '-')
        .collect();

    let mut out = String::with_capacity(kept.len());
    let mut in_space = false;
    for c in kept.chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push('-');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

/// `slug_timestamp` for announcing an entry.
pub fn announce_key(entry: &Entry) -> String {
    format!("{}_{}", extract_slug(&entry.source_url), entry.timestamp)
}

/// Content id of [`announce_key`].
pub fn announce_hash(entry: &Entry) -> String {
    content_id(&announce_key(entry))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_forum_pattern() {
        assert_eq!(
            extract_slug("https://forum.example/t/Big-Buck-Bunny/1234"),
            "big-buck-bunny"
        );
        assert_eq!(
            extract_slug("https://forum.example/t/sintel/42?page=2#post-3"),
            "sintel"
        );
    }

    #[test]
    fn test_slug_last_segment() {
        assert_eq!(extract_slug("https://a.example/films/Tears_of_Steel.html"), "tears_of_steel");
        assert_eq!(extract_slug("https://a.example/watch.php?v=1"), "watch");
        assert_eq!(extract_slug("https://a.example/only/"), "only");
        // A single numeric segment has no slug before it.
        assert_eq!(extract_slug("https://a.example/1234"), "1234");
    }

    #[test]
    fn test_slug_without_path_is_host() {
        assert_eq!(extract_slug("https://Tracker.Example:8080"), "tracker.example");
        assert_eq!(extract_slug("https://user@host.example/"), "host.example");
    }

    #[test]
    fn test_slug_fallback_for_non_url() {
        assert_eq!(extract_slug("  Just Some Text "), "just some text");
        assert_eq!(extract_slug("://nohost"), "://nohost");
    }

    #[test]
    fn test_slug_follows_browser_parsing() {
        // Backslashes separate path segments in http(s) URLs.
        assert_eq!(extract_slug("https://forum.example\\t\\sintel\\42"), "sintel");
        assert_eq!(extract_slug("https://forum.example/t/My Film/42"), "my%20film");
        assert_eq!(extract_slug("https://forum.example/t/sintel/42/.."), "sintel");
        // Extra slashes after the scheme are skipped, so `path` is the host.
        assert_eq!(extract_slug("https:///path"), "path");
    }

    #[test]
    fn test_slug_opaque_url_has_empty_host() {
        assert_eq!(extract_slug("magnet:?xt=urn:btih:dd82"), "");
        assert_eq!(extract_title("magnet:?xt=urn:btih:dd82"), "");
    }

    #[test]
    fn test_title_extraction() {
        assert_eq!(
            extract_title("https://forum.example/t/big-buck_bunny/99"),
            "Big Buck Bunny"
        );
        assert_eq!(extract_title("https://a.example/"), "a.example");
        assert_eq!(extract_title("not a url"), UNTITLED);
    }

    #[test]
    fn test_normalize_search_query() {
        assert_eq!(normalize_search_query("  Big   Buck Bunny! "), "big-buck-bunny");
        assert_eq!(normalize_search_query("C++ & Rust-2024"), "c-rust-2024");
        assert_eq!(normalize_search_query(""), "");
    }

    #[test]
    fn test_announce_key_and_hash() {
        let entry = Entry::new("https://forum.example/t/sintel/42", "m", 1700);
        assert_eq!(announce_key(&entry), "sintel_1700");
        assert_eq!(announce_hash(&entry), content_id("sintel_1700"));
        assert_eq!(announce_hash(&entry).len(), 8);
    }
}
