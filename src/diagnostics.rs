//! Collects non-fatal messages produced while encoding or decoding.
//!
//! Nothing in this crate prints. Anything worth telling the user that does
//! not abort the operation is pushed here, and also forwarded to the `log`
//! facade so applications with a logger installed still see it.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.severity {
            Severity::Info => write!(f, "info: {}", self.message),
            Severity::Warning => write!(f, "warning: {}", self.message),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn info(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::info!("{}", message);
        self.entries.push(Diagnostic {
            severity: Severity::Info,
            message,
        });
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::warn!("{}", message);
        self.entries.push(Diagnostic {
            severity: Severity::Warning,
            message,
        });
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries
            .iter()
            .filter(|d| d.severity == Severity::Warning)
    }

    pub fn has_warnings(&self) -> bool {
        self.warnings().next().is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_order_and_severity() {
        let mut diag = Diagnostics::new();
        diag.info("first");
        diag.warn("second");
        diag.info("third");
        assert_eq!(diag.len(), 3);
        assert!(diag.has_warnings());
        let warnings: Vec<_> = diag.warnings().map(|d| d.message.as_str()).collect();
        assert_eq!(warnings, ["second"]);
        assert_eq!(diag.iter().next().unwrap().to_string(), "info: first");
    }
}
