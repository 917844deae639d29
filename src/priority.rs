use std::collections::HashMap;
use std::fmt;

use lazy_static::lazy_static;

/// Priority of a log or of a single message.
///
/// Priorities are stored on disk as a single byte. Bytes outside the four
/// defined values are legal and render with the "undefined" label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Priority {
    Normal = 0,
    Notice = 1,
    High = 2,
    Catastrophic = 3,
}

impl Priority {
    pub const ALL: [Priority; 4] = [
        Priority::Normal,
        Priority::Notice,
        Priority::High,
        Priority::Catastrophic,
    ];

    /// Returns the priority stored in `byte`, if it is one of the defined values.
    pub fn from_byte(byte: u8) -> Option<Priority> {
        Self::ALL.into_iter().find(|p| *p as u8 == byte)
    }
}

impl From<Priority> for u8 {
    fn from(priority: Priority) -> u8 {
        priority as u8
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", DEFAULT_LABELS.label(*self as u8))
    }
}

lazy_static! {
    /// The label table used when no other table is supplied.
    pub static ref DEFAULT_LABELS: PriorityLabels = PriorityLabels::default();
}

/// Maps priority bytes to the labels used when rendering a dump.
///
/// Replace the table to localize dumps without touching the codec.
///
/// ```
/// # use framelog::{Priority, PriorityLabels};
/// let labels = PriorityLabels::new("UNDEFINED")
///     .with(Priority::Normal, "NORMAL")
///     .with(Priority::High, "HIGH");
/// assert_eq!(labels.label(2), "HIGH");
/// assert_eq!(labels.label(9), "UNDEFINED");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriorityLabels {
    labels: HashMap<u8, String>,
    undefined: String,
}

impl PriorityLabels {
    /// Creates an empty table where every byte renders as `undefined`.
    pub fn new(undefined: impl Into<String>) -> Self {
        Self {
            labels: HashMap::new(),
            undefined: undefined.into(),
        }
    }

    /// Sets the label for a priority byte.
    pub fn with(mut self, priority: impl Into<u8>, label: impl Into<String>) -> Self {
        self.labels.insert(priority.into(), label.into());
        self
    }

    pub fn label(&self, priority: u8) -> &str {
        self.labels
            .get(&priority)
            .map(String::as_str)
            .unwrap_or(&self.undefined)
    }
}

impl Default for PriorityLabels {
    fn default() -> Self {
        PriorityLabels::new("N.DEFINIDO")
            .with(Priority::Normal, "NORMAL")
            .with(Priority::Notice, "AVISO")
            .with(Priority::High, "ALTA")
            .with(Priority::Catastrophic, "CATASTRÓFICA")
    }
}
