//! URL-safe, case-insensitive slugs for facet values.
//!
//! `to_slug` lowercases and collapses every run of non-alphanumeric characters
//! into a single `-`. `from_slug` maps a slug back onto a known universe of values;
//! when several candidates share a slug the first one in iteration order wins, so
//! callers that need run-to-run determinism pass a sorted universe.

pub const SEPARATOR: char = '-';

/// Donor slug meaning "every currently known donor".
pub const ALL_DONORS_SLUG: &str = "all";

/// Composite donor slugs, rewritten into literal country slugs before resolution.
pub const DONOR_MACROS: &[(&str, &[&str])] = &[(
    "crafd-donors",
    &["germany", "netherlands", "united-kingdom", "usa"],
)];

pub fn to_slug(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    let mut pending_separator = false;
    for ch in value.trim().chars() {
        if ch.is_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push(SEPARATOR);
            }
            pending_separator = false;
            slug.extend(ch.to_lowercase());
        } else {
            pending_separator = true;
        }
    }
    slug
}

/// Resolve `slug` to the first candidate whose slug matches, ignoring case and separators.
pub fn from_slug<'a, I>(slug: &str, candidates: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let wanted = to_slug(slug);
    if wanted.is_empty() {
        return None;
    }
    candidates.into_iter().find(|c| to_slug(c) == wanted)
}

/// The literal expansion of a composite donor slug, if `slug` names one.
pub fn donor_macro(slug: &str) -> Option<&'static [&'static str]> {
    let slug = to_slug(slug);
    DONOR_MACROS
        .iter()
        .find(|(name, _)| *name == slug)
        .map(|(_, expansion)| *expansion)
}

/// Rewrite `all` and composite donor slugs into plain country slugs.
///
/// `all` expands to the slug of every known donor. Output keeps first-seen order
/// and contains no duplicates.
pub fn expand_donor_slugs<S: AsRef<str>>(slugs: &[S], known_donors: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let mut push = |s: String| {
        if !s.is_empty() && !out.contains(&s) {
            out.push(s);
        }
    };
    for slug in slugs {
        let slug = slug.as_ref();
        if to_slug(slug) == ALL_DONORS_SLUG {
            for donor in known_donors {
                push(to_slug(donor));
            }
        } else if let Some(expansion) = donor_macro(slug) {
            for country in expansion {
                push((*country).to_string());
            }
        } else {
            push(to_slug(slug));
        }
    }
    out
}
