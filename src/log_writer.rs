use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info, trace};

use crate::clock::{Clock, SystemClock};
use crate::error::{Error, Result};
use crate::identity::ProcessIdentity;
use crate::log_reader::{open_dump_target, read_frame, render_log, DumpStyle};
use crate::record_format::{
    decode_message, encode_header, encode_message, message_offset, LogHeader, LogMessage,
    FORMAT_VERSION, MESSAGE_SIZE, TEXT_CAPACITY,
};

/// Index of a physical message record, starting at 0.
pub type MessageIndex = u64;

/// How many numbered alternatives `Log::create` tries after the bare name.
pub const DEFAULT_PROBE_LIMIT: usize = 128;

/// Settings for creating a log.
pub struct LogOptions {
    /// Number of numbered names (`name.1` .. `name.N`) tried after `name`.
    pub probe_limit: usize,
    pub clock: Box<dyn Clock>,
    pub identity: ProcessIdentity,
}

impl Default for LogOptions {
    fn default() -> Self {
        Self {
            probe_limit: DEFAULT_PROBE_LIMIT,
            clock: Box::new(SystemClock),
            identity: ProcessIdentity::current(),
        }
    }
}

impl LogOptions {
    pub fn with_probe_limit(mut self, probe_limit: usize) -> Self {
        self.probe_limit = probe_limit;
        self
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn with_identity(mut self, identity: ProcessIdentity) -> Self {
        self.identity = identity;
        self
    }
}

/// An open, append-only frame log.
///
/// The file starts with a single header frame followed by fixed-size message
/// frames. Messages longer than one frame are split across consecutive frames.
///
/// A `Log` is meant to be the only writer of its file; the format has no
/// locking, so two writers on the same file corrupt the frame alignment.
///
/// # Examples
///
/// ```no_run
/// # fn main() -> framelog::Result<()> {
/// use framelog::{Log, Priority};
///
/// let mut log = Log::create("service.flog", Priority::Notice)?;
/// log.send("service started", Priority::Normal)?;
/// log.dump("service.txt")?;
/// log.close()?;
/// # Ok(())
/// # }
/// ```
pub struct Log {
    file: File,
    path: PathBuf,
    header: LogHeader,
    next_index: MessageIndex,
    clock: Box<dyn Clock>,
}

impl Log {
    /// Creates a new log next to `name` without overwriting an existing file.
    ///
    /// Tries `name`, then `name.1`, `name.2`, ... up to `name.128` and uses
    /// the first one that cannot be opened for reading.
    pub fn create(name: impl AsRef<Path>, priority: impl Into<u8>) -> Result<Log> {
        Self::create_with(name, priority, LogOptions::default())
    }

    /// Like [`Log::create`] with explicit options.
    pub fn create_with(
        name: impl AsRef<Path>,
        priority: impl Into<u8>,
        options: LogOptions,
    ) -> Result<Log> {
        let path = free_name(name.as_ref(), options.probe_limit)?;

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)?;

        let header = LogHeader {
            created_at: options.clock.now(),
            owner: options.identity.owner,
            process_id: options.identity.process_id,
            format_version: FORMAT_VERSION.to_string(),
            priority: priority.into(),
        };
        file.write_all(&encode_header(&header))?;

        info!(path = %path.display(), priority = header.priority, "created log");

        Ok(Log {
            file,
            path,
            header,
            next_index: 0,
            clock: options.clock,
        })
    }

    /// Appends `text` on channel 0 and returns the index of its last record.
    pub fn send(&mut self, text: impl AsRef<[u8]>, priority: impl Into<u8>) -> Result<MessageIndex> {
        self.send_on_channel(text, priority, 0)
    }

    /// Appends `text` tagged with `channel`.
    ///
    /// Text longer than [`TEXT_CAPACITY`] is written as consecutive full
    /// records followed by one record holding the remainder; each record gets
    /// its own timestamp. Empty text still produces one record. Returns the
    /// index of the last record written.
    pub fn send_on_channel(
        &mut self,
        text: impl AsRef<[u8]>,
        priority: impl Into<u8>,
        channel: u8,
    ) -> Result<MessageIndex> {
        let priority = priority.into();
        let mut remaining = text.as_ref();

        if remaining.len() > TEXT_CAPACITY {
            debug!(
                len = remaining.len(),
                records = remaining.len().div_ceil(TEXT_CAPACITY),
                "splitting oversized message"
            );
        }

        while remaining.len() > TEXT_CAPACITY {
            let (chunk, rest) = remaining.split_at(TEXT_CAPACITY);
            self.append_record(chunk, priority, channel)?;
            remaining = rest;
        }
        self.append_record(remaining, priority, channel)
    }

    fn append_record(&mut self, text: &[u8], priority: u8, channel: u8) -> Result<MessageIndex> {
        let message = LogMessage {
            sent_at: self.clock.now(),
            priority,
            channel,
            text: text.to_vec(),
        };
        self.file.write_all(&encode_message(&message))?;

        let index = self.next_index;
        self.next_index += 1;
        trace!(index, priority, channel, len = text.len(), "appended record");
        Ok(index)
    }

    /// Renders the whole log as text, appending to `output`.
    pub fn dump(&mut self, output: impl AsRef<Path>) -> Result<()> {
        self.dump_with(output, &DumpStyle::default())
    }

    /// Renders the whole log as text with a custom style.
    ///
    /// The write position is restored afterwards, even when rendering fails,
    /// so later sends continue right after the last record. A partial
    /// trailing frame is reported as [`Error::DecodeTruncated`] once every
    /// complete record has been rendered.
    pub fn dump_with(&mut self, output: impl AsRef<Path>, style: &DumpStyle) -> Result<()> {
        let output = output.as_ref();
        let mut out = BufWriter::new(open_dump_target(output)?);

        let saved = self.file.stream_position()?;
        self.file.seek(SeekFrom::Start(0))?;
        let rendered = render_log(BufReader::new(&mut self.file), &mut out, style);
        let restored = self.file.seek(SeekFrom::Start(saved));
        let flushed = out.flush();

        let records = rendered?;
        restored?;
        flushed?;

        debug!(path = %self.path.display(), output = %output.display(), records, "dumped log");
        Ok(())
    }

    /// Reads back the record with the given index without moving the write
    /// position. Returns `None` for indices that were never written.
    pub fn read_message(&mut self, index: MessageIndex) -> Result<Option<LogMessage>> {
        if index >= self.next_index {
            return Ok(None);
        }

        let saved = self.file.stream_position()?;
        self.file.seek(SeekFrom::Start(message_offset(index)))?;
        let mut frame = [0u8; MESSAGE_SIZE];
        let read = read_frame(&mut self.file, &mut frame);
        self.file.seek(SeekFrom::Start(saved))?;

        decode_message(&frame[..read?]).map(Some)
    }

    /// Flushes and closes the log file.
    pub fn close(mut self) -> Result<()> {
        self.file.flush()?;
        info!(path = %self.path.display(), records = self.next_index, "closed log");
        Ok(())
    }

    /// The file name actually chosen at creation.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn header(&self) -> &LogHeader {
        &self.header
    }

    /// Number of physical records written so far.
    pub fn message_count(&self) -> u64 {
        self.next_index
    }
}

fn free_name(base: &Path, probe_limit: usize) -> Result<PathBuf> {
    for attempt in 0..=probe_limit {
        let candidate = candidate_name(base, attempt);
        if File::open(&candidate).is_err() {
            return Ok(candidate);
        }
        debug!(candidate = %candidate.display(), "log name taken");
    }

    Err(Error::NameSpaceExhausted {
        base: base.to_path_buf(),
        attempts: probe_limit + 1,
    })
}

fn candidate_name(base: &Path, attempt: usize) -> PathBuf {
    if attempt == 0 {
        return base.to_path_buf();
    }
    let mut name = base.as_os_str().to_owned();
    name.push(format!(".{attempt}"));
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_names() {
        let base = Path::new("/tmp/app.flog");
        assert_eq!(candidate_name(base, 0), PathBuf::from("/tmp/app.flog"));
        assert_eq!(candidate_name(base, 1), PathBuf::from("/tmp/app.flog.1"));
        assert_eq!(candidate_name(base, 128), PathBuf::from("/tmp/app.flog.128"));
    }
}
