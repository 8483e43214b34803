//! Diagnostic collection and rendering.
//!
//! Grammar-authoring mistakes are never fatal: every stage reports into a
//! shared [`Diagnostics`] sink and keeps going with a locally patched result.
//! Callers inspect or render the sink once the pipeline finishes.

mod message;
mod printer;

use rowan::TextRange;

pub use message::{DiagnosticKind, RelatedInfo, Severity};
pub use printer::DiagnosticsPrinter;

use message::DiagnosticMessage;

#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    messages: Vec<DiagnosticMessage>,
}

#[must_use = "diagnostic not emitted, call .emit()"]
pub struct DiagnosticBuilder<'a> {
    diagnostics: &'a mut Diagnostics,
    message: DiagnosticMessage,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a diagnostic with the given kind and span.
    ///
    /// Uses the kind's default message; call `.message()` on the builder to
    /// supply detail.
    pub fn report(&mut self, kind: DiagnosticKind, range: TextRange) -> DiagnosticBuilder<'_> {
        DiagnosticBuilder {
            diagnostics: self,
            message: DiagnosticMessage::with_default_message(kind, range),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn has_errors(&self) -> bool {
        self.messages.iter().any(|d| d.is_error())
    }

    pub fn has_warnings(&self) -> bool {
        self.messages.iter().any(|d| d.is_warning())
    }

    pub fn error_count(&self) -> usize {
        self.messages.iter().filter(|d| d.is_error()).count()
    }

    /// Diagnostics with cascading errors suppressed: when a higher-priority
    /// diagnostic's span contains another's (or both start at the same
    /// offset), the lower-priority one is dropped.
    pub(crate) fn filtered(&self) -> Vec<DiagnosticMessage> {
        if self.messages.is_empty() {
            return Vec::new();
        }

        let mut suppressed = vec![false; self.messages.len()];

        // O(n²) but n stays small in practice
        for (i, a) in self.messages.iter().enumerate() {
            for (j, b) in self.messages.iter().enumerate() {
                if i == j || suppressed[i] || suppressed[j] {
                    continue;
                }
                let same_start = a.range.start() == b.range.start();
                if (span_strictly_contains(a.range, b.range) || same_start)
                    && a.kind.suppresses(&b.kind)
                {
                    suppressed[j] = true;
                }
            }
        }

        self.messages
            .iter()
            .enumerate()
            .filter(|(i, _)| !suppressed[*i])
            .map(|(_, m)| m.clone())
            .collect()
    }

    pub fn printer<'a>(&self, source: &'a str) -> DiagnosticsPrinter<'a> {
        DiagnosticsPrinter::new(self.filtered(), source)
    }

    pub fn render(&self, source: &str) -> String {
        self.printer(source).render()
    }

    pub fn render_colored(&self, source: &str, colored: bool) -> String {
        self.printer(source).colored(colored).render()
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.messages.extend(other.messages);
    }
}

impl<'a> DiagnosticBuilder<'a> {
    /// Provide custom detail, rendered through the kind's message template.
    pub fn message(mut self, msg: impl Into<String>) -> Self {
        let detail = msg.into();
        self.message.message = self.message.kind.message(Some(&detail));
        self
    }

    pub fn related_to(mut self, msg: impl Into<String>, range: TextRange) -> Self {
        self.message.related.push(RelatedInfo::new(range, msg));
        self
    }

    pub fn emit(self) {
        self.diagnostics.messages.push(self.message);
    }
}

/// Outer span strictly contains inner (different start positions).
fn span_strictly_contains(outer: TextRange, inner: TextRange) -> bool {
    outer.start() < inner.start() && inner.end() <= outer.end()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(start: u32, end: u32) -> TextRange {
        TextRange::new(start.into(), end.into())
    }

    #[test]
    fn builder_emits() {
        let mut diagnostics = Diagnostics::new();
        diagnostics
            .report(DiagnosticKind::DuplicateRule, range(4, 8))
            .message("Word")
            .related_to("first defined here", range(0, 4))
            .emit();
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics.has_errors());
    }

    #[test]
    fn severity_split() {
        let mut diagnostics = Diagnostics::new();
        diagnostics
            .report(DiagnosticKind::FragmentOnParserRule, range(0, 8))
            .emit();
        assert!(diagnostics.has_warnings());
        assert!(!diagnostics.has_errors());
        assert_eq!(diagnostics.error_count(), 0);
    }

    #[test]
    fn containment_suppression() {
        let mut diagnostics = Diagnostics::new();
        diagnostics
            .report(DiagnosticKind::UnclosedGroup, range(0, 20))
            .emit();
        diagnostics
            .report(DiagnosticKind::UnexpectedToken, range(5, 6))
            .emit();
        assert_eq!(diagnostics.filtered().len(), 1);
        assert_eq!(diagnostics.filtered()[0].kind, DiagnosticKind::UnclosedGroup);
    }

    #[test]
    fn disjoint_spans_not_suppressed() {
        let mut diagnostics = Diagnostics::new();
        diagnostics
            .report(DiagnosticKind::UnclosedGroup, range(0, 4))
            .emit();
        diagnostics
            .report(DiagnosticKind::UnexpectedToken, range(10, 12))
            .emit();
        assert_eq!(diagnostics.filtered().len(), 2);
    }
}
