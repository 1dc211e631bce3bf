//! Logger hierarchies and the handlers attached to them
//!
//! A [`Hierarchy`] is a named logger holding an ordered, inspectable sequence
//! of handlers. The process-root hierarchy and the per-run hierarchy are both
//! plain values shared through `Arc`, so whoever owns the process wires them
//! into the coordinator explicitly instead of reaching for globals.

use std::fmt;
use std::io::{self, Write};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use log::LevelFilter;
use thiserror::Error;
use tracing::debug;

use crate::format::FormatSpec;
use crate::record::Record;
use crate::sink::SinkError;

/// Marker identifying a family of handlers
///
/// The coordinator recognises the slots it owns by tag equality, never by
/// position or pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerTag(&'static str);

impl HandlerTag {
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for HandlerTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Errors raised while a handler processes a record
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Sink(#[from] SinkError),
}

/// Destination for records
pub trait Handler: Send + Sync + fmt::Debug {
    /// Process one record
    fn handle(&self, record: &Record) -> Result<(), HandlerError>;

    /// Tag used for find-and-replace binding; untagged handlers are never replaced
    fn tag(&self) -> Option<HandlerTag> {
        None
    }

    /// Flush buffered output
    fn flush(&self) {}
}

/// Result of binding a tagged handler into a hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindOutcome {
    /// No handler with the same tag was attached; the new one went last
    Appended { index: usize },
    /// A handler with the same tag was swapped out at the same position
    Replaced { index: usize },
}

impl BindOutcome {
    pub fn index(&self) -> usize {
        match self {
            Self::Appended { index } | Self::Replaced { index } => *index,
        }
    }

    pub fn is_replaced(&self) -> bool {
        matches!(self, Self::Replaced { .. })
    }
}

/// Named logger with a level gate and an ordered handler list
pub struct Hierarchy {
    name: String,
    level: RwLock<LevelFilter>,
    handlers: RwLock<Vec<Arc<dyn Handler>>>,
}

impl Hierarchy {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            level: RwLock::new(LevelFilter::Info),
            handlers: RwLock::new(Vec::new()),
        }
    }

    pub fn with_level(self, level: LevelFilter) -> Self {
        self.set_level(level);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn level(&self) -> LevelFilter {
        *self.level.read().unwrap_or_else(|e| e.into_inner())
    }

    pub fn set_level(&self, level: LevelFilter) {
        *self.level.write().unwrap_or_else(|e| e.into_inner()) = level;
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<Arc<dyn Handler>>> {
        self.handlers.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Arc<dyn Handler>>> {
        self.handlers.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Ordered snapshot of the attached handlers
    pub fn handlers(&self) -> Vec<Arc<dyn Handler>> {
        self.read().clone()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Append a handler
    pub fn add_handler(&self, handler: Arc<dyn Handler>) {
        debug!(hierarchy = %self.name, ?handler, "Hierarchy::add_handler");
        self.write().push(handler);
    }

    /// Detach a handler by identity; returns whether it was attached
    pub fn remove_handler(&self, handler: &Arc<dyn Handler>) -> bool {
        let mut handlers = self.write();
        match handlers.iter().position(|h| Arc::ptr_eq(h, handler)) {
            Some(index) => {
                handlers.remove(index);
                debug!(hierarchy = %self.name, index, "Hierarchy::remove_handler: removed");
                true
            }
            None => false,
        }
    }

    /// Swap the handler at `index`, returning the previous one
    pub fn replace_handler(&self, index: usize, handler: Arc<dyn Handler>) -> Option<Arc<dyn Handler>> {
        let mut handlers = self.write();
        let slot = handlers.get_mut(index)?;
        Some(std::mem::replace(slot, handler))
    }

    /// Position of the first handler carrying `tag`
    pub fn position_of_tag(&self, tag: HandlerTag) -> Option<usize> {
        self.read().iter().position(|h| h.tag() == Some(tag))
    }

    /// Number of attached handlers carrying `tag`
    pub fn count_tagged(&self, tag: HandlerTag) -> usize {
        self.read().iter().filter(|h| h.tag() == Some(tag)).count()
    }

    /// Replace the first handler sharing the new handler's tag, else append
    ///
    /// Handlers with other tags, or no tag, keep their positions.
    pub fn bind_tagged(&self, handler: Arc<dyn Handler>) -> BindOutcome {
        let tag = handler.tag();
        let (outcome, previous) = {
            let mut handlers = self.write();
            let existing = tag.and_then(|tag| handlers.iter().position(|h| h.tag() == Some(tag)));
            match existing {
                Some(index) => {
                    let previous = std::mem::replace(&mut handlers[index], handler);
                    (BindOutcome::Replaced { index }, Some(previous))
                }
                None => {
                    handlers.push(handler);
                    (BindOutcome::Appended { index: handlers.len() - 1 }, None)
                }
            }
        };

        if let Some(previous) = previous {
            previous.flush();
        }
        debug!(hierarchy = %self.name, ?tag, ?outcome, "Hierarchy::bind_tagged");
        outcome
    }

    /// Dispatch a record to every handler in order
    ///
    /// A failing handler is reported on stderr and does not stop the rest.
    pub fn log(&self, record: &Record) {
        if record.level > self.level() {
            return;
        }
        for handler in self.handlers() {
            if let Err(e) = handler.handle(record) {
                eprintln!("runlog: handler {:?} on '{}' failed: {}", handler, self.name, e);
            }
        }
    }

    pub fn flush(&self) {
        for handler in self.handlers() {
            handler.flush();
        }
    }
}

impl fmt::Debug for Hierarchy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hierarchy")
            .field("name", &self.name)
            .field("level", &self.level())
            .field("handlers", &self.len())
            .finish()
    }
}

/// Writes formatted records to stderr
#[derive(Debug, Default)]
pub struct ConsoleHandler {
    formatter: FormatSpec,
}

impl ConsoleHandler {
    pub fn new(formatter: FormatSpec) -> Self {
        Self { formatter }
    }
}

impl Handler for ConsoleHandler {
    fn handle(&self, record: &Record) -> Result<(), HandlerError> {
        let line = self.formatter.render(record);
        let mut stderr = io::stderr().lock();
        writeln!(stderr, "{}", line)?;
        Ok(())
    }

    fn flush(&self) {
        let _ = io::stderr().flush();
    }
}

/// Adapter exposing a hierarchy as the `log` crate backend
struct GlobalBridge(Arc<Hierarchy>);

impl log::Log for GlobalBridge {
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        metadata.level() <= self.0.level()
    }

    fn log(&self, record: &log::Record<'_>) {
        if self.enabled(record.metadata()) {
            self.0.log(&Record::from(record));
        }
    }

    fn flush(&self) {
        self.0.flush();
    }
}

/// Route the `log` facade into `root`
///
/// The facade's max level is taken from the hierarchy once, at install time.
pub fn install_global(root: Arc<Hierarchy>) -> Result<(), log::SetLoggerError> {
    let level = root.level();
    log::set_boxed_logger(Box::new(GlobalBridge(root)))?;
    log::set_max_level(level);
    Ok(())
}
