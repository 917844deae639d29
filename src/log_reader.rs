//! Reading frame logs back and rendering them as text.

use std::fmt::Write as _;
use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use chrono::{Local, TimeZone, Utc};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::priority::{PriorityLabels, DEFAULT_LABELS};
use crate::record_format::{
    decode_header, decode_message, LogHeader, LogMessage, HEADER_SIZE, MESSAGE_SIZE,
};

#[cfg(windows)]
pub const LINE_ENDING: &str = "\r\n";
#[cfg(not(windows))]
pub const LINE_ENDING: &str = "\n";

/// Sequential reader over the frames of a log.
///
/// The header is decoded on construction; messages are then read one frame
/// at a time. A clean end of input at a frame boundary ends the stream, while
/// a partial trailing frame is reported as [`Error::DecodeTruncated`].
///
/// ```no_run
/// # fn main() -> framelog::Result<()> {
/// use framelog::LogReader;
///
/// let reader = LogReader::open("service.flog")?;
/// println!("created at {}", reader.header().created_at);
/// for message in reader {
///     println!("{}", message?.text_lossy());
/// }
/// # Ok(())
/// # }
/// ```
pub struct LogReader<R> {
    reader: R,
    header: LogHeader,
    next_index: u64,
}

impl LogReader<BufReader<File>> {
    /// Opens a log file for reading from the start.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        LogReader::new(BufReader::new(File::open(path)?))
    }
}

impl<R: Read> LogReader<R> {
    /// Reads and validates the header from `reader`.
    pub fn new(mut reader: R) -> Result<Self> {
        let mut frame = [0u8; HEADER_SIZE];
        let read = read_frame(&mut reader, &mut frame)?;
        let header = decode_header(&frame[..read])?;

        Ok(Self {
            reader,
            header,
            next_index: 0,
        })
    }

    pub fn header(&self) -> &LogHeader {
        &self.header
    }

    /// Reads the next message, or `None` at the end of the log.
    pub fn read_message(&mut self) -> Result<Option<LogMessage>> {
        let mut frame = [0u8; MESSAGE_SIZE];
        let read = read_frame(&mut self.reader, &mut frame)?;

        match read {
            0 => Ok(None),
            MESSAGE_SIZE => {
                self.next_index += 1;
                decode_message(&frame).map(Some)
            }
            partial => {
                warn!(index = self.next_index, bytes = partial, "truncated message frame");
                Err(Error::DecodeTruncated {
                    expected: MESSAGE_SIZE,
                    found: partial,
                })
            }
        }
    }
}

impl<R: Read> Iterator for LogReader<R> {
    type Item = Result<LogMessage>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_message().transpose()
    }
}

/// Reads until `buf` is full or the input ends; returns the bytes read.
pub(crate) fn read_frame<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}

/// Controls how a dump renders priorities and timestamps.
#[derive(Debug, Clone)]
pub struct DumpStyle {
    pub labels: PriorityLabels,
    /// A `chrono` strftime format string.
    pub time_format: String,
    /// Render times in UTC instead of the local time zone.
    pub utc: bool,
}

impl Default for DumpStyle {
    fn default() -> Self {
        Self {
            labels: DEFAULT_LABELS.clone(),
            time_format: "%c".to_string(),
            utc: false,
        }
    }
}

impl DumpStyle {
    pub fn with_labels(mut self, labels: PriorityLabels) -> Self {
        self.labels = labels;
        self
    }

    pub fn with_time_format(mut self, time_format: impl Into<String>) -> Self {
        self.time_format = time_format.into();
        self
    }

    pub fn utc(mut self) -> Self {
        self.utc = true;
        self
    }

    /// Formats a timestamp, falling back to the raw seconds when it cannot
    /// be represented or the format string is invalid.
    pub fn format_time(&self, seconds: i64) -> String {
        let mut rendered = String::new();
        let ok = if self.utc {
            Utc.timestamp_opt(seconds, 0)
                .single()
                .map(|t| write!(rendered, "{}", t.format(&self.time_format)).is_ok())
        } else {
            Local
                .timestamp_opt(seconds, 0)
                .single()
                .map(|t| write!(rendered, "{}", t.format(&self.time_format)).is_ok())
        };

        match ok {
            Some(true) => rendered,
            _ => seconds.to_string(),
        }
    }

    fn header_line(&self, header: &LogHeader) -> String {
        let mut line = format!(
            "Log de prioridade {}, gerado na data {}. Usando a versão {}. \
             Identificação do processo na hora era {}.",
            self.labels.label(header.priority),
            self.format_time(header.created_at),
            header.format_version,
            header.process_id,
        );
        if let Some(owner) = &header.owner {
            line.push_str(&format!(" Usuário: {}.", owner));
        }
        line
    }

    fn message_line(&self, message: &LogMessage) -> String {
        format!(
            "[{}] ({}) {}",
            self.labels.label(message.priority),
            self.format_time(message.sent_at),
            message.text_lossy(),
        )
    }
}

/// Renders a whole log from `input` into `out`; returns the message count.
///
/// Complete records are written before a truncation error is returned.
pub fn render_log<R: Read, W: Write>(input: R, out: &mut W, style: &DumpStyle) -> Result<u64> {
    let mut reader = LogReader::new(input)?;
    write!(out, "{}{}", style.header_line(reader.header()), LINE_ENDING)?;

    let mut records = 0;
    while let Some(message) = reader.read_message()? {
        write!(out, "{}{}", style.message_line(&message), LINE_ENDING)?;
        records += 1;
    }
    Ok(records)
}

/// Dumps a log file that is not open for writing, appending to `output`.
pub fn dump_file(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    style: &DumpStyle,
) -> Result<u64> {
    let mut out = BufWriter::new(open_dump_target(output.as_ref())?);
    let source = BufReader::new(File::open(input.as_ref())?);

    let rendered = render_log(source, &mut out, style);
    let flushed = out.flush();
    let records = rendered?;
    flushed?;

    debug!(input = %input.as_ref().display(), records, "dumped log file");
    Ok(records)
}

pub(crate) fn open_dump_target(path: &Path) -> Result<File> {
    Ok(OpenOptions::new().create(true).append(true).open(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record_format::{encode_header, encode_message};

    fn header() -> LogHeader {
        LogHeader {
            created_at: 0,
            owner: None,
            process_id: 7,
            format_version: "1.0.0".to_string(),
            priority: 1,
        }
    }

    #[test]
    fn test_format_time_utc() {
        let style = DumpStyle::default()
            .utc()
            .with_time_format("%Y-%m-%d %H:%M:%S");
        assert_eq!(style.format_time(0), "1970-01-01 00:00:00");
        assert_eq!(style.format_time(86_400 + 61), "1970-01-02 00:01:01");
    }

    #[test]
    fn test_format_time_out_of_range() {
        let style = DumpStyle::default().utc();
        assert_eq!(style.format_time(i64::MAX), i64::MAX.to_string());
    }

    #[test]
    fn test_format_time_invalid_format() {
        let style = DumpStyle::default().utc().with_time_format("%Q %");
        assert_eq!(style.format_time(1000), "1000");
    }

    #[test]
    fn test_header_line() {
        let style = DumpStyle::default().utc().with_time_format("%s");
        assert_eq!(
            style.header_line(&header()),
            "Log de prioridade AVISO, gerado na data 0. Usando a versão 1.0.0. \
             Identificação do processo na hora era 7."
        );

        let mut owned = header();
        owned.owner = Some("bob".to_string());
        assert!(style.header_line(&owned).ends_with(" Usuário: bob."));
    }

    #[test]
    fn test_reader_stops_at_frame_boundary() {
        let mut data = encode_header(&header()).to_vec();
        for i in 0..3u8 {
            data.extend_from_slice(&encode_message(&LogMessage {
                sent_at: i as i64,
                priority: i,
                channel: 0,
                text: vec![b'a' + i],
            }));
        }

        let reader = LogReader::new(&data[..]).unwrap();
        let messages: Vec<_> = reader.collect::<Result<_>>().unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[2].text, b"c");
    }

    #[test]
    fn test_reader_reports_partial_frame() {
        let mut data = encode_header(&header()).to_vec();
        data.extend_from_slice(&encode_message(&LogMessage {
            sent_at: 1,
            priority: 0,
            channel: 0,
            text: b"whole".to_vec(),
        }));
        data.extend_from_slice(&[1, 2, 3]);

        let mut reader = LogReader::new(&data[..]).unwrap();
        assert!(reader.read_message().unwrap().is_some());
        assert!(matches!(
            reader.read_message(),
            Err(Error::DecodeTruncated { expected: MESSAGE_SIZE, found: 3 })
        ));
    }

    #[test]
    fn test_empty_input_is_truncated_header() {
        assert!(matches!(
            LogReader::new(&[0u8; 0][..]),
            Err(Error::DecodeTruncated { expected: HEADER_SIZE, found: 0 })
        ));
    }
}
