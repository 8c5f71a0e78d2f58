use std::fmt;

use sha2::{Digest, Sha256};

use crafd_common::FacetSelection;

/// Content hash of an effective facet selection, used to skip redundant fetches.
///
/// Facet lists are sorted (and deduplicated) before hashing, so selections that
/// differ only in value order share a signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FilterSignature(String);

impl FilterSignature {
    pub fn of(selection: &FacetSelection, include_member_states: bool) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(canonical_form(selection, include_member_states).as_bytes());
        Self(hex::encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FilterSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Short form is enough to tell fetches apart in logs.
        write!(f, "{}", &self.0[..12.min(self.0.len())])
    }
}

fn canonical_form(selection: &FacetSelection, include_member_states: bool) -> String {
    let sorted = |values: &[String]| {
        let mut v: Vec<&str> = values.iter().map(|s| s.trim()).collect();
        v.sort_unstable();
        v.dedup();
        v.join("\u{1f}")
    };
    format!(
        "donors:{}\ntypes:{}\nthemes:{}\nsearch:{}\nmember_states:{}",
        sorted(&selection.donors),
        sorted(&selection.investment_types),
        sorted(&selection.investment_themes),
        selection.search_text().unwrap_or(""),
        include_member_states,
    )
}
