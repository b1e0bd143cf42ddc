use std::ops::Range;

use codespan_reporting::diagnostic::{Diagnostic, Label, Severity};

/// A finding about region markers, with its location in the source.
#[derive(Debug, Clone)]
pub struct MarkerDiagnostic {
    pub message: String,
    pub span: Range<usize>,
    pub file_id: usize,
    pub severity: Severity,
    pub notes: Vec<String>,
    /// Secondary location, e.g. the first definition of a duplicate name.
    pub related: Option<(Range<usize>, String)>,
}

impl MarkerDiagnostic {
    fn new(severity: Severity, message: impl Into<String>, span: Range<usize>, file_id: usize) -> Self {
        MarkerDiagnostic {
            message: message.into(),
            span,
            file_id,
            severity,
            notes: Vec::new(),
            related: None,
        }
    }

    pub fn error(message: impl Into<String>, span: Range<usize>, file_id: usize) -> Self {
        Self::new(Severity::Error, message, span, file_id)
    }

    pub fn warning(message: impl Into<String>, span: Range<usize>, file_id: usize) -> Self {
        Self::new(Severity::Warning, message, span, file_id)
    }

    pub fn note(message: impl Into<String>, span: Range<usize>, file_id: usize) -> Self {
        Self::new(Severity::Note, message, span, file_id)
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn with_related(mut self, span: Range<usize>, label: impl Into<String>) -> Self {
        self.related = Some((span, label.into()));
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity >= Severity::Error
    }

    /// Convert to a codespan-reporting Diagnostic for display.
    pub fn to_diagnostic(&self) -> Diagnostic<usize> {
        let mut labels = vec![Label::primary(self.file_id, self.span.clone())];
        if let Some((span, label)) = &self.related {
            labels.push(Label::secondary(self.file_id, span.clone()).with_message(label));
        }
        Diagnostic::new(self.severity)
            .with_message(&self.message)
            .with_labels(labels)
            .with_notes(self.notes.clone())
    }
}
