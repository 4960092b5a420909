//! Streaming JSON emitter.
//!
//! Binary→JSON conversion streams straight into this writer rather than
//! building a DOM. The compact variant emits no whitespace at all; the
//! pretty variant indents by four spaces per nesting level. Escaping
//! follows the wire tooling: `"` and `\` get their two-character
//! escapes, every other control byte (and DEL) is emitted as `\u00XX`,
//! and invalid UTF-8 is replaced byte-wise with `?`.

use std::fmt::Write as _;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameKind {
    Object,
    Array,
}

#[derive(Debug)]
struct Frame {
    kind: FrameKind,
    count: usize,
}

/// Incremental writer over an owned `String`.
#[derive(Debug)]
pub struct JsonWriter {
    out: String,
    pretty: bool,
    frames: Vec<Frame>,
    after_key: bool,
}

impl JsonWriter {
    /// A writer that emits no whitespace.
    pub fn compact() -> Self {
        Self::new(false)
    }

    /// A writer that indents by four spaces per level.
    pub fn pretty() -> Self {
        Self::new(true)
    }

    fn new(pretty: bool) -> Self {
        Self {
            out: String::new(),
            pretty,
            frames: Vec::new(),
            after_key: false,
        }
    }

    /// Consumes the writer, returning the accumulated text.
    #[must_use]
    pub fn finish(self) -> String {
        self.out
    }

    fn newline_indent(&mut self, depth: usize) {
        self.out.push('\n');
        for _ in 0..depth {
            self.out.push_str("    ");
        }
    }

    /// Separator/indent handling before a value in array or root
    /// position; a value following a key needs none.
    fn value_prelude(&mut self) {
        if self.after_key {
            self.after_key = false;
            return;
        }
        if let Some(frame) = self.frames.last_mut() {
            if frame.count > 0 {
                self.out.push(',');
            }
            frame.count += 1;
            if self.pretty {
                let depth = self.frames.len();
                self.newline_indent(depth);
            }
        }
    }

    pub fn begin_object(&mut self) {
        self.value_prelude();
        self.out.push('{');
        self.frames.push(Frame {
            kind: FrameKind::Object,
            count: 0,
        });
    }

    pub fn begin_array(&mut self) {
        self.value_prelude();
        self.out.push('[');
        self.frames.push(Frame {
            kind: FrameKind::Array,
            count: 0,
        });
    }

    pub fn end(&mut self) {
        let frame = match self.frames.pop() {
            Some(frame) => frame,
            None => return,
        };
        if self.pretty && frame.count > 0 {
            let depth = self.frames.len();
            self.newline_indent(depth);
        }
        self.out.push(match frame.kind {
            FrameKind::Object => '}',
            FrameKind::Array => ']',
        });
    }

    /// Emits an object member key; the next emitted value belongs to it.
    pub fn key(&mut self, name: &str) {
        if let Some(frame) = self.frames.last_mut() {
            debug_assert_eq!(frame.kind, FrameKind::Object);
            if frame.count > 0 {
                self.out.push(',');
            }
            frame.count += 1;
        }
        if self.pretty {
            let depth = self.frames.len();
            self.newline_indent(depth);
        }
        escape_str(&mut self.out, name);
        self.out.push(':');
        if self.pretty {
            self.out.push(' ');
        }
        self.after_key = true;
    }

    /// Emits pre-rendered token text (numbers, literals).
    pub fn raw(&mut self, token: &str) {
        self.value_prelude();
        self.out.push_str(token);
    }

    pub fn number(&mut self, value: impl std::fmt::Display) {
        self.value_prelude();
        let _ = write!(self.out, "{}", value);
    }

    pub fn boolean(&mut self, value: bool) {
        self.raw(if value { "true" } else { "false" });
    }

    pub fn null(&mut self) {
        self.raw("null");
    }

    pub fn string(&mut self, value: &str) {
        self.value_prelude();
        escape_str(&mut self.out, value);
    }

    /// Emits raw bytes as a string, replacing each invalid UTF-8 byte
    /// with `?`.
    pub fn string_bytes(&mut self, value: &[u8]) {
        self.value_prelude();
        self.out.push('"');
        let mut rest = value;
        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    escape_body(&mut self.out, valid);
                    break;
                }
                Err(err) => {
                    let (valid, after) = rest.split_at(err.valid_up_to());
                    // str::from_utf8 guarantees the prefix is valid
                    escape_body(&mut self.out, unsafe {
                        std::str::from_utf8_unchecked(valid)
                    });
                    self.out.push('?');
                    rest = &after[1..];
                }
            }
        }
        self.out.push('"');
    }
}

fn escape_str(out: &mut String, s: &str) {
    out.push('"');
    escape_body(out, s);
    out.push('"');
}

fn escape_body(out: &mut String, s: &str) {
    const HEX: &[u8; 16] = b"0123456789ABCDEF";
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\u{00}'..='\u{1f}' | '\u{7f}' => {
                out.push_str("\\u00");
                out.push(HEX[(c as usize) >> 4] as char);
                out.push(HEX[(c as usize) & 0x0f] as char);
            }
            _ => out.push(c),
        }
    }
}
