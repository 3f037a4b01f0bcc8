//! Deterministic slug generation for post URLs.
//!
//! Titles are written in Turkish as often as not, so the pipeline starts with
//! an explicit transliteration table before the usual lowercase/filter/
//! collapse steps. The function is total: any input produces a (possibly
//! empty) slug, and it never guarantees uniqueness — the posts table carries
//! a unique constraint and callers surface that failure instead.

/// Turkish characters and their closest ASCII equivalents.
const TURKISH_MAP: [(char, char); 12] = [
    ('ç', 'c'),
    ('ğ', 'g'),
    ('ı', 'i'),
    ('ö', 'o'),
    ('ş', 's'),
    ('ü', 'u'),
    ('Ç', 'C'),
    ('Ğ', 'G'),
    ('İ', 'I'),
    ('Ö', 'O'),
    ('Ş', 'S'),
    ('Ü', 'U'),
];

/// Derive a URL-safe identifier from a post title.
///
/// Steps, in order: transliterate the Turkish table (other non-ASCII is left
/// untouched here), lowercase, keep only lowercase ASCII letters, digits,
/// whitespace and hyphens, trim, turn whitespace runs into single hyphens,
/// collapse hyphen runs, and strip hyphens from both ends.
///
/// The result may be empty when the title contains no convertible
/// characters; callers that need an addressable slug must reject that case
/// themselves.
pub fn generate_slug(title: &str) -> String {
    let transliterated: String = title
        .chars()
        .map(|ch| {
            TURKISH_MAP
                .iter()
                .find(|(from, _)| *from == ch)
                .map_or(ch, |(_, to)| *to)
        })
        .collect();

    let filtered: String = transliterated
        .to_lowercase()
        .chars()
        .filter(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch.is_whitespace() || *ch == '-')
        .collect();

    let mut slug = String::with_capacity(filtered.len());
    let mut pending_hyphen = false;
    for ch in filtered.trim().chars() {
        if ch.is_whitespace() || ch == '-' {
            pending_hyphen = !slug.is_empty();
        } else {
            if pending_hyphen {
                slug.push('-');
                pending_hyphen = false;
            }
            slug.push(ch);
        }
    }

    slug
}
