//! # framelog
//!
//! An append-only binary log made of fixed-size frames.
//!
//! A log file holds one header frame (creation time, owner, process id,
//! format version, overall priority) followed by message frames of exactly
//! [`MESSAGE_SIZE`] bytes each. Every message carries its own timestamp,
//! priority byte and channel tag. Messages longer than [`TEXT_CAPACITY`] are
//! split across consecutive frames.
//!
//! ## Main Components
//!
//! * `Log`: creates a log without overwriting older runs, appends messages,
//!   reads records back by index and dumps the file as text
//! * `LogReader`: sequential decoder for any byte source holding a log
//! * `record_format`: the on-disk layout and its encode/decode functions
//! * `PriorityLabels`: replaceable priority → label table used by dumps
//!
//! ## Quick Start
//!
//! ```no_run
//! # fn main() -> framelog::Result<()> {
//! use framelog::{Log, Priority};
//!
//! let mut log = Log::create("worker.flog", Priority::High)?;
//! log.send("starting batch", Priority::Normal)?;
//! let last = log.send("x".repeat(1500), Priority::Notice)?;
//! assert_eq!(last, 3);
//!
//! log.dump("worker.txt")?;
//! log.send("dump does not disturb appends", Priority::Normal)?;
//! log.close()?;
//! # Ok(())
//! # }
//! ```

pub mod clock;
pub mod error;
pub mod identity;
pub mod log_reader;
pub mod log_writer;
pub mod priority;
pub mod record_format;

pub use error::{Error, Result};
pub use identity::ProcessIdentity;
pub use log_reader::{dump_file, DumpStyle, LogReader};
pub use log_writer::{Log, LogOptions, MessageIndex};
pub use priority::{Priority, PriorityLabels};
pub use record_format::{LogHeader, LogMessage, HEADER_SIZE, MESSAGE_SIZE, TEXT_CAPACITY};
