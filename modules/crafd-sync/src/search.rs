/// Local buffer for the search box. Keystrokes only touch the draft; the filter
/// channel sees the text when it is committed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchBuffer {
    draft: String,
    committed: Option<String>,
}

impl SearchBuffer {
    pub fn new(committed: Option<String>) -> Self {
        let mut buffer = Self::default();
        buffer.reset_to(committed);
        buffer
    }

    pub fn input(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn committed(&self) -> Option<&str> {
        self.committed.as_deref()
    }

    /// Promote the draft. Returns the new committed value when it changed, `None`
    /// when committing would be a no-op. Blank text commits as "no search".
    pub fn commit(&mut self) -> Option<Option<String>> {
        let next = Some(self.draft.trim().to_string()).filter(|s| !s.is_empty());
        if next == self.committed {
            return None;
        }
        self.committed = next.clone();
        Some(next)
    }

    /// Adopt a committed value that arrived from elsewhere (back/forward navigation).
    pub fn reset_to(&mut self, committed: Option<String>) {
        self.draft = committed.clone().unwrap_or_default();
        self.committed = committed;
    }
}
