//! Statement stream input.
//!
//! The reactor consumes statements through a push interface: a parser (or
//! any other producer) drives a [`StatementWriter`] with start/argument/end
//! calls. Each phase replays the stream; the writer makes replay idempotent,
//! so a producer may simply re-emit everything each time.
//!
//! [`RecordedStream`] is the reference producer: an event list captured from
//! a parser, replayed verbatim every phase.
//!
//! [`StatementWriter`]: crate::writer::StatementWriter

use std::sync::Arc;

use lattice_foundation::{Phase, Result, SourceRef};

use crate::writer::StatementWriter;

/// A producer of one source's statement stream.
pub trait StatementSource {
    /// The source name used in diagnostics (e.g. a file name).
    fn name(&self) -> &str;

    /// Emits the statements appropriate for `phase` into the writer.
    ///
    /// Called once per phase, in phase order. Producers that distinguish
    /// phases (e.g. to use `resume_statement` instead of re-emitting a
    /// prefix) inspect `phase`; most simply replay everything.
    ///
    /// # Errors
    /// Returns an error if the producer itself fails; writer errors should
    /// be propagated as-is.
    fn replay(&mut self, phase: Phase, writer: &mut StatementWriter<'_>) -> Result<()>;
}

/// One recorded statement event.
#[derive(Clone, Debug)]
pub enum StatementEvent {
    /// `start_statement(keyword)` at a location.
    Start {
        /// The statement keyword.
        keyword: Arc<str>,
        /// Where the statement begins.
        at: SourceRef,
    },
    /// `set_argument(value)` at a location.
    Argument {
        /// The raw argument.
        value: Arc<str>,
        /// Where the argument appears.
        at: SourceRef,
    },
    /// `end_statement()` at a location.
    End {
        /// Where the statement ends.
        at: SourceRef,
    },
}

/// An in-memory statement stream, replayed identically every phase.
#[derive(Clone, Debug)]
pub struct RecordedStream {
    name: Arc<str>,
    events: Vec<StatementEvent>,
}

impl RecordedStream {
    /// Creates an empty stream for the named source.
    #[must_use]
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            events: Vec::new(),
        }
    }

    fn here(&self, line: u32, column: u32) -> SourceRef {
        SourceRef::new(Arc::clone(&self.name), line, column)
    }

    /// Records a `start_statement` event.
    #[must_use]
    pub fn start(mut self, keyword: &str, line: u32, column: u32) -> Self {
        let at = self.here(line, column);
        self.events.push(StatementEvent::Start {
            keyword: Arc::from(keyword),
            at,
        });
        self
    }

    /// Records a `set_argument` event.
    #[must_use]
    pub fn argument(mut self, value: &str, line: u32, column: u32) -> Self {
        let at = self.here(line, column);
        self.events.push(StatementEvent::Argument {
            value: Arc::from(value),
            at,
        });
        self
    }

    /// Records an `end_statement` event.
    #[must_use]
    pub fn end(mut self, line: u32, column: u32) -> Self {
        let at = self.here(line, column);
        self.events.push(StatementEvent::End { at });
        self
    }

    /// Records a complete statement with no substatements.
    #[must_use]
    pub fn complete(self, keyword: &str, argument: Option<&str>, line: u32, column: u32) -> Self {
        let stream = self.start(keyword, line, column);
        let stream = match argument {
            Some(value) => stream.argument(value, line, column),
            None => stream,
        };
        stream.end(line, column)
    }

    /// Returns the recorded events.
    #[must_use]
    pub fn events(&self) -> &[StatementEvent] {
        &self.events
    }
}

impl StatementSource for RecordedStream {
    fn name(&self) -> &str {
        &self.name
    }

    fn replay(&mut self, _phase: Phase, writer: &mut StatementWriter<'_>) -> Result<()> {
        for event in &self.events {
            match event {
                StatementEvent::Start { keyword, at } => {
                    writer.start_statement(keyword, at.clone())?;
                }
                StatementEvent::Argument { value, at } => {
                    writer.set_argument(value, at.clone())?;
                }
                StatementEvent::End { at } => {
                    writer.end_statement(at.clone())?;
                }
            }
        }
        Ok(())
    }
}
