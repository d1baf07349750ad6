//! Single-pass keypath tracking over udiff text.
//!
//! [`KeyTracker`] scans JSON-like text (udiff content with the sigils still
//! in place) and yields a [`Breakpoint`] after every structural token,
//! carrying the keypath that is active from that offset onwards.

use crate::{DeltaError, Key, KeyPath};

/// One level of the keypath stack.
///
/// `Pending` marks an object whose next member name has not been read
/// yet.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum Frame {
    Pending,
    Member(String),
    Index(usize),
}

/// Indicates whether the innermost frame addresses an array element.
pub(crate) fn in_array(stack: &[Frame]) -> bool {
    matches!(stack.last(), Some(Frame::Index(_)))
}

/// A stack is settled when it addresses a concrete node: it is the root or
/// its innermost frame is not awaiting a member name.
pub(crate) fn is_settled(stack: &[Frame]) -> bool {
    !matches!(stack.last(), Some(Frame::Pending))
}

/// Converts a settled stack into a keypath.
pub(crate) fn to_key_path(stack: &[Frame], offset: usize) -> Result<KeyPath, DeltaError> {
    stack
        .iter()
        .map(|frame| match frame {
            Frame::Member(name) => Ok(Key::Member(name.clone())),
            Frame::Index(index) => Ok(Key::Index(*index)),
            Frame::Pending => Err(DeltaError::malformed_at(offset, "value without a member name")),
        })
        .collect()
}

/// Offset just past a structural token, with the keypath active there.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Breakpoint {
    /// Relative to the start of the scanned text.
    pub(crate) offset: usize,
    pub(crate) stack: Vec<Frame>,
}

pub(crate) struct KeyTracker<'t> {
    text: &'t str,
    pos: usize,
    base: usize,
    stack: Vec<Frame>,
    max_depth: usize,
    done: bool,
}

impl<'t> KeyTracker<'t> {
    /// Scans `text`, which starts `base` bytes into the full udiff, with
    /// `stack` as the keypath active at its first byte.
    pub(crate) fn new(text: &'t str, base: usize, stack: Vec<Frame>, max_depth: usize) -> Self {
        Self { text, pos: 0, base, stack, max_depth, done: false }
    }

    /// Consumes every remaining token and returns the final stack.
    pub(crate) fn run_to_end(mut self) -> Result<Vec<Frame>, DeltaError> {
        while let Some(breakpoint) = self.next() {
            breakpoint?;
        }
        Ok(self.stack)
    }

    fn fail(&mut self, at: usize, reason: &str) -> DeltaError {
        self.done = true;
        DeltaError::malformed_at(self.base + at, reason)
    }

    fn push(&mut self, frame: Frame) -> Result<(), DeltaError> {
        if self.stack.len() >= self.max_depth {
            self.done = true;
            return Err(DeltaError::StackDepth { limit: self.max_depth });
        }
        self.stack.push(frame);
        Ok(())
    }

    fn breakpoint(&self) -> Breakpoint {
        Breakpoint { offset: self.pos, stack: self.stack.clone() }
    }

    /// Returns the offset just past the closing quote of the string that
    /// opens at `start`.
    fn skip_string(&mut self, start: usize) -> Result<usize, DeltaError> {
        let text = self.text;
        let bytes = text.as_bytes();
        let mut at = start + 1;
        loop {
            match bytes.get(at) {
                None => return Err(self.fail(start, "unterminated string")),
                Some(b'\\') => at += 2,
                Some(b'"') => return Ok(at + 1),
                Some(_) => at += 1,
            }
        }
    }

    /// Handles `...` and `...(N)`. Inside arrays they advance the index
    /// without yielding; elsewhere they are ignored.
    fn skip_ellipsis(&mut self, start: usize) -> Result<(), DeltaError> {
        let text = self.text;
        let rest = &text[start..];
        if !rest.starts_with("...") {
            return Ok(());
        }
        self.pos = start + 3;
        let Some(Frame::Index(_)) = self.stack.last() else {
            return Ok(());
        };

        let mut advance = 1;
        if rest[3..].starts_with('(') {
            let digits_start = start + 4;
            let Some(close) = text[digits_start..].find(')') else {
                return Err(self.fail(start, "unterminated elision count"));
            };
            let digits = &text[digits_start..digits_start + close];
            advance = match digits.parse::<usize>() {
                Ok(count) if count > 0 && digits.bytes().all(|b| b.is_ascii_digit()) => count - 1,
                _ => return Err(self.fail(start, "invalid elision count")),
            };
            self.pos = digits_start + close + 1;
        }
        if let Some(Frame::Index(index)) = self.stack.last_mut() {
            *index += advance;
        }
        Ok(())
    }

    fn step(&mut self) -> Result<Option<Breakpoint>, DeltaError> {
        let text = self.text;
        let bytes = text.as_bytes();
        while let Some(&byte) = bytes.get(self.pos) {
            let start = self.pos;
            self.pos += 1;
            match byte {
                b'{' => {
                    self.push(Frame::Pending)?;
                    return Ok(Some(self.breakpoint()));
                }
                b'[' => {
                    self.push(Frame::Index(0))?;
                    return Ok(Some(self.breakpoint()));
                }
                b'}' | b']' => {
                    let matches = match self.stack.pop() {
                        Some(Frame::Index(_)) => byte == b']',
                        Some(_) => byte == b'}',
                        None => false,
                    };
                    if !matches {
                        return Err(self.fail(start, "unbalanced closing bracket"));
                    }
                    return Ok(Some(self.breakpoint()));
                }
                b',' => {
                    match self.stack.last_mut() {
                        Some(Frame::Index(index)) => *index += 1,
                        Some(frame) => *frame = Frame::Pending,
                        None => return Err(self.fail(start, "separator outside of a container")),
                    }
                    return Ok(Some(self.breakpoint()));
                }
                b'"' => {
                    let end = self.skip_string(start)?;
                    self.pos = end;
                    if let Some(Frame::Pending) = self.stack.last() {
                        let name: String = serde_json::from_str(&text[start..end])
                            .map_err(|err| self.fail(start, &format!("invalid member name: {err}")))?;
                        if let Some(frame) = self.stack.last_mut() {
                            *frame = Frame::Member(name);
                        }
                        while matches!(bytes.get(self.pos), Some(b' ' | b'\r' | b'\n' | b'\t' | b':')) {
                            self.pos += 1;
                        }
                        return Ok(Some(self.breakpoint()));
                    }
                }
                b'.' => self.skip_ellipsis(start)?,
                _ => {}
            }
        }
        Ok(None)
    }
}

impl Iterator for KeyTracker<'_> {
    type Item = Result<Breakpoint, DeltaError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.step() {
            Ok(Some(breakpoint)) => Some(Ok(breakpoint)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}
