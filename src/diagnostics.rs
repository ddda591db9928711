use crate::source::{SourcePosition, Table};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Notice,
    Progress,
}

/// A message raised while consuming a row source, tagged with where it happened
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub table: Table,
    pub position: SourcePosition,
    pub message: String,
}

/// Receives loader diagnostics as they happen; the loader keeps no copy.
pub trait DiagnosticSink {
    fn report(&mut self, diagnostic: Diagnostic);
}

/// Forwards diagnostics to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&mut self, d: Diagnostic) {
        match d.severity {
            Severity::Error => error!(table = %d.table, position = %d.position, "{}", d.message),
            Severity::Warning => warn!(table = %d.table, position = %d.position, "{}", d.message),
            Severity::Notice => info!(table = %d.table, position = %d.position, "{}", d.message),
            Severity::Progress => debug!(table = %d.table, line = d.position.line, "{}", d.message),
        }
    }
}

impl DiagnosticSink for Vec<Diagnostic> {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}

/// Lets a caller keep a handle on a sink it hands to the engine.
impl<S: DiagnosticSink> DiagnosticSink for Rc<RefCell<S>> {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.borrow_mut().report(diagnostic);
    }
}
