//! Streaming decoder from raw bytes to [`RawRecord`]s.

use std::{
    borrow::Cow,
    collections::VecDeque,
    fs::File,
    io::{self, BufRead, BufReader, Chain, Cursor, ErrorKind, Read},
    mem,
    path::Path,
};

use chardetng::EncodingDetector;
use encoding_rs::{CoderResult, Decoder as Transcoder, Encoding, ISO_2022_JP, UTF_8};
use serde::Deserialize;
use tracing::{debug, warn};

use super::tags::{EOH, EOR, RawRecord};

/// Decoder tuning.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DecoderOptions {
    /// Keep field values as written. When false, record chunks are
    /// upper-cased before scanning, matching exports from older tools.
    pub preserve_value_case: bool,
    /// Bytes inspected for encoding detection.
    pub sniff_bytes: usize,
}

impl Default for DecoderOptions {
    fn default() -> Self {
        Self {
            preserve_value_case: true,
            sniff_bytes: 1024,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Free-form header text, held until `<EOH>`, the first `<EOR>`, or
    /// end of input.
    Header,
    /// Record data; an `<EOH>` ahead of the first record still ends a
    /// tag-only header.
    Body { header_closed: bool },
}

/// Lazy, single-pass sequence of raw records read from a byte source.
///
/// The decoder owns the source and transcodes one buffered chunk per step,
/// so records are yielded as soon as their `<EOR>` has been read. It is not
/// restartable; dropping it releases the source.
pub struct Decoder<R> {
    reader: BufReader<Chain<Cursor<Vec<u8>>, R>>,
    encoding: &'static Encoding,
    transcoder: Transcoder,
    options: DecoderOptions,
    phase: Phase,
    header: String,
    text: String,
    buf: String,
    ready: VecDeque<RawRecord>,
    lossy: bool,
    done: bool,
}

impl Decoder<File> {
    /// Opens `path` with default options.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        Self::new(File::open(path)?)
    }
}

impl<R: Read> Decoder<R> {
    /// Wraps `source` with default options.
    pub fn new(source: R) -> io::Result<Self> {
        Self::with_options(source, DecoderOptions::default())
    }

    /// Wraps `source`, sniffing its first `options.sniff_bytes` bytes to
    /// pick a text encoding. A UTF-8 or UTF-16 byte order mark decides the
    /// encoding outright and is dropped.
    pub fn with_options(mut source: R, options: DecoderOptions) -> io::Result<Self> {
        let mut prefix = Vec::with_capacity(options.sniff_bytes);
        source
            .by_ref()
            .take(options.sniff_bytes as u64)
            .read_to_end(&mut prefix)?;

        let encoding = match Encoding::for_bom(&prefix) {
            Some((encoding, bom_len)) => {
                prefix.drain(..bom_len);
                debug!(encoding = encoding.name(), "byte order mark found");
                encoding
            }
            None => detect_encoding(&prefix),
        };

        let (sniffed, _) = encoding.decode_without_bom_handling(&prefix);
        let phase = match sniffed.trim_start().chars().next() {
            Some('<') => Phase::Body {
                header_closed: false,
            },
            _ => Phase::Header,
        };

        Ok(Self {
            reader: BufReader::new(Cursor::new(prefix).chain(source)),
            encoding,
            transcoder: encoding.new_decoder_without_bom_handling(),
            options,
            phase,
            header: String::new(),
            text: String::new(),
            buf: String::new(),
            ready: VecDeque::new(),
            lossy: false,
            done: false,
        })
    }

    /// Encoding used to transcode the source.
    pub fn encoding(&self) -> &'static Encoding {
        self.encoding
    }

    /// Transcodes the next buffered chunk and feeds its complete lines on.
    fn read_chunk(&mut self) -> io::Result<()> {
        let (read, eof) = loop {
            match self.reader.fill_buf() {
                Ok(chunk) => {
                    let last = chunk.is_empty();
                    if let Some(needed) = self.transcoder.max_utf8_buffer_length(chunk.len()) {
                        self.text.reserve(needed);
                    }
                    let (result, read, had_errors) =
                        self.transcoder.decode_to_string(chunk, &mut self.text, last);
                    if had_errors && !self.lossy {
                        self.lossy = true;
                        warn!(
                            encoding = self.encoding.name(),
                            "input contained byte sequences invalid for the detected encoding"
                        );
                    }
                    break (read, last && result == CoderResult::InputEmpty);
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => {}
                Err(err) => return Err(err),
            }
        };
        self.reader.consume(read);

        if let Some(end) = self.text.rfind('\n') {
            let complete: String = self.text.drain(..=end).collect();
            for line in complete.split_inclusive('\n') {
                self.push_line(line);
            }
        }
        if eof {
            let rest = mem::take(&mut self.text);
            if !rest.is_empty() {
                self.push_line(&rest);
            }
            self.finish();
        }
        Ok(())
    }

    fn push_line(&mut self, text: &str) {
        match self.phase {
            Phase::Header => match (find_tag(text, EOH), find_tag(text, EOR)) {
                (Some(eoh), eor) if eor.is_none_or(|eor| eoh < eor) => {
                    self.header.clear();
                    self.phase = Phase::Body {
                        header_closed: true,
                    };
                    self.push_body(&text[eoh + EOH.len()..]);
                }
                (_, Some(_)) => {
                    debug!("record data before any <EOH>; reading the leading text as records");
                    let mut pending = mem::take(&mut self.header);
                    pending.push_str(text);
                    self.phase = Phase::Body {
                        header_closed: true,
                    };
                    self.push_body(&pending);
                }
                _ => self.header.push_str(text),
            },
            Phase::Body { .. } => self.push_body(text),
        }
    }

    fn push_body(&mut self, text: &str) {
        self.buf.push_str(text);

        if let Phase::Body {
            header_closed: false,
        } = self.phase
        {
            match (find_tag(&self.buf, EOH), find_tag(&self.buf, EOR)) {
                (Some(eoh), eor) if eor.is_none_or(|eor| eoh < eor) => {
                    self.buf.drain(..eoh + EOH.len());
                    self.phase = Phase::Body {
                        header_closed: true,
                    };
                }
                (_, Some(_)) => {
                    self.phase = Phase::Body {
                        header_closed: true,
                    };
                }
                _ => {}
            }
        }

        while let Some(pos) = find_tag(&self.buf, EOR) {
            let chunk: String = self.buf.drain(..pos + EOR.len()).collect();
            self.emit(&chunk[..pos]);
        }
    }

    fn emit(&mut self, chunk: &str) {
        let chunk = if self.options.preserve_value_case {
            Cow::Borrowed(chunk)
        } else {
            Cow::Owned(chunk.to_uppercase())
        };
        if let Some(record) = RawRecord::from_chunk(&chunk) {
            self.ready.push_back(record);
        }
    }

    fn finish(&mut self) {
        if self.phase == Phase::Header {
            debug!("no <EOH> found; treating the whole input as record data");
            let header = mem::take(&mut self.header);
            self.phase = Phase::Body {
                header_closed: true,
            };
            self.push_body(&header);
        }

        let tail = mem::take(&mut self.buf);
        if !tail.trim().is_empty() {
            debug!("input ended inside a record without <EOR>");
            self.emit(&tail);
        }
        self.done = true;
    }
}

impl<R: Read> Iterator for Decoder<R> {
    type Item = io::Result<RawRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(record) = self.ready.pop_front() {
                return Some(Ok(record));
            }
            if self.done {
                return None;
            }
            if let Err(err) = self.read_chunk() {
                self.done = true;
                return Some(Err(err));
            }
        }
    }
}

/// Picks the text encoding of a byte prefix.
///
/// Seven-bit input, valid UTF-8, and detector guesses that are not
/// ASCII-compatible or are themselves 7-bit all resolve to UTF-8.
pub fn detect_encoding(prefix: &[u8]) -> &'static Encoding {
    if prefix.is_ascii() {
        return UTF_8;
    }
    match std::str::from_utf8(prefix) {
        Ok(_) => return UTF_8,
        // Cut mid-character at the end of the sniffed window.
        Err(err) if err.error_len().is_none() => return UTF_8,
        Err(_) => {}
    }

    let mut detector = EncodingDetector::new();
    detector.feed(prefix, false);
    let guess = detector.guess(None, true);
    if !guess.is_ascii_compatible() || guess == ISO_2022_JP {
        warn!(
            guess = guess.name(),
            "encoding detection inconclusive; falling back to UTF-8"
        );
        return UTF_8;
    }
    debug!(encoding = guess.name(), "detected input encoding");
    guess
}

fn find_tag(haystack: &str, tag: &str) -> Option<usize> {
    let needle = tag.as_bytes();
    haystack
        .as_bytes()
        .windows(needle.len())
        .position(|window| window.eq_ignore_ascii_case(needle))
}
