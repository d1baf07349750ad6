use std::collections::BTreeSet;

use super::tracker::{in_array, is_settled, to_key_path, Frame, KeyTracker};
use crate::delta::sort_stanzas;
use crate::{Delta, DeltaError, Key, KeyPath, ParseConfig, Stanza, Value};

/// Which document a sigil run describes.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Side {
    Delete,
    Add,
}

struct Span {
    path: KeyPath,
    value: Option<Value>,
    /// The span was cut at a separating comma, so more elements follow it
    /// on its side.
    comma_terminated: bool,
}

struct Parser<'t> {
    text: &'t str,
    del_sigil: u8,
    add_sigil: u8,
    max_depth: usize,
    del_key: Vec<Frame>,
    add_key: Vec<Frame>,
    adds: Vec<Span>,
    deletes: Vec<KeyPath>,
}

pub(super) fn parse_udiff(text: &str, config: &ParseConfig) -> Result<Delta, DeltaError> {
    let (del_sigil, add_sigil) = if config.reverse() { (b'+', b'-') } else { (b'-', b'+') };
    let mut parser = Parser {
        text,
        del_sigil,
        add_sigil,
        max_depth: config.max_depth(),
        del_key: Vec::new(),
        add_key: Vec::new(),
        adds: Vec::new(),
        deletes: Vec::new(),
    };
    parser.run()?;
    let delta = parser.finish();
    tracing::debug!(stanzas = delta.len(), reverse = config.reverse(), "parsed udiff");
    Ok(delta)
}

/// Returns the offset of the first line after the optional `---` and
/// `+++` header lines.
fn skip_headers(text: &str) -> usize {
    let mut point = 0;
    for header in ["---", "+++"] {
        if text[point..].starts_with(header) {
            point = text[point..].find('\n').map_or(text.len(), |newline| point + newline + 1);
        }
    }
    point
}

impl Parser<'_> {
    fn run(&mut self) -> Result<(), DeltaError> {
        let text = self.text;
        let bytes = text.as_bytes();
        let mut point = skip_headers(text);

        while let Some(&sigil) = bytes.get(point) {
            point = match sigil {
                b'\n' | b'\r' => point + 1,
                b' ' => self.shared_run(point)?,
                s if s == self.del_sigil => self.sigil_run(point, Side::Delete)?,
                s if s == self.add_sigil => self.sigil_run(point, Side::Add)?,
                other => {
                    return Err(DeltaError::malformed_at(
                        point,
                        format!("unexpected line prefix {:?}", char::from(other)),
                    ));
                }
            };
        }
        Ok(())
    }

    /// Finds the newline that ends the run starting at `point`: the first
    /// one followed by any of `stops`. Returns the content end and the
    /// start of the next run.
    fn run_end(&self, point: usize, stops: [u8; 2]) -> (usize, usize) {
        let bytes = self.text.as_bytes();
        let mut at = point;
        while let Some(offset) = self.text[at..].find('\n') {
            let newline = at + offset;
            if bytes.get(newline + 1).is_some_and(|next| stops.contains(next)) {
                return (newline, newline + 1);
            }
            at = newline + 1;
        }
        (self.text.len(), self.text.len())
    }

    fn shared_run(&mut self, point: usize) -> Result<usize, DeltaError> {
        if in_array(&self.del_key) != in_array(&self.add_key) {
            return Err(DeltaError::malformed_at(point, "sides disagree on the enclosing container"));
        }
        if in_array(&self.del_key) {
            let synced = self.del_key.clone().max(self.add_key.clone());
            self.del_key.clone_from(&synced);
            self.add_key = synced;
        }

        let (_, next) = self.run_end(point, [self.del_sigil, self.add_sigil]);
        let text = self.text;
        let slice = &text[point..next];
        let del_key = std::mem::take(&mut self.del_key);
        self.del_key = KeyTracker::new(slice, point, del_key, self.max_depth).run_to_end()?;
        let add_key = std::mem::take(&mut self.add_key);
        self.add_key = KeyTracker::new(slice, point, add_key, self.max_depth).run_to_end()?;
        Ok(next)
    }

    /// Cuts the spans at the starting depth out of a `-` or `+` run.
    fn sigil_run(&mut self, point: usize, side: Side) -> Result<usize, DeltaError> {
        let (sigil, other) = match side {
            Side::Delete => (self.del_sigil, self.add_sigil),
            Side::Add => (self.add_sigil, self.del_sigil),
        };
        let (content_end, next) = self.run_end(point, [other, b' ']);
        let origin = point + 1;
        let start_key = match side {
            Side::Delete => std::mem::take(&mut self.del_key),
            Side::Add => std::mem::take(&mut self.add_key),
        };

        let mut top = is_settled(&start_key).then_some(start_key.len());
        let mut span_start = origin;
        let mut current = start_key.clone();
        let mut spans = Vec::new();

        let text = self.text;
        let tracker = KeyTracker::new(&text[origin..next], origin, start_key, self.max_depth);
        for breakpoint in tracker {
            let breakpoint = breakpoint?;
            let at = origin + breakpoint.offset;
            if top.is_none() && is_settled(&breakpoint.stack) {
                top = Some(breakpoint.stack.len());
                span_start = at;
            }
            if is_settled(&current)
                && top == Some(current.len())
                && current.len() == breakpoint.stack.len()
            {
                let comma_terminated = text.as_bytes().get(at - 1) == Some(&b',');
                spans.extend(self.cut(span_start, at - 1, &current, sigil, side, comma_terminated)?);
                span_start = at;
            }
            current = breakpoint.stack;
        }
        if is_settled(&current) && top == Some(current.len()) {
            spans.extend(self.cut(span_start, content_end, &current, sigil, side, false)?);
        }

        match side {
            Side::Delete => {
                self.deletes.extend(spans.into_iter().map(|span| span.path));
                self.del_key = current;
            }
            Side::Add => {
                self.adds.extend(spans);
                self.add_key = current;
            }
        }
        Ok(next)
    }

    /// Extracts the literal text of one node, stripped of continuation
    /// sigils and surrounding whitespace. Empty spans yield nothing.
    fn cut(
        &self,
        start: usize,
        end: usize,
        stack: &[Frame],
        sigil: u8,
        side: Side,
        comma_terminated: bool,
    ) -> Result<Option<Span>, DeltaError> {
        let continuation = format!("\n{}", char::from(sigil));
        let raw = self.text.get(start..end).unwrap_or_default().replace(&continuation, "");
        let span = raw.trim_matches(['\r', '\n', '\t', ' ']);
        if span.is_empty() {
            return Ok(None);
        }
        let path = to_key_path(stack, start)?;
        let value = match side {
            Side::Delete => None,
            Side::Add => Some(
                Value::from_json_str(span)
                    .map_err(|err| DeltaError::malformed_at(start, format!("undecodable span: {err}")))?,
            ),
        };
        Ok(Some(Span { path, value, comma_terminated }))
    }

    fn finish(self) -> Delta {
        let delete_paths: BTreeSet<&KeyPath> = self.deletes.iter().collect();
        let add_paths: BTreeSet<&KeyPath> = self.adds.iter().map(|span| &span.path).collect();

        let mut stanzas = Vec::with_capacity(self.adds.len() + self.deletes.len());
        for span in &self.adds {
            let Some(value) = span.value.clone() else { continue };
            let mut stanza = Stanza::set(span.path.clone(), value);
            if let Some(Key::Index(index)) = span.path.last() {
                let trailing = !span.comma_terminated
                    && !delete_paths.iter().any(|path| deletes_at_or_after(path, &span.path, *index));
                if !delete_paths.contains(&span.path) && !trailing {
                    stanza.mark_insert();
                }
            }
            stanzas.push(stanza);
        }
        stanzas.extend(
            self.deletes
                .iter()
                .filter(|path| !add_paths.contains(path))
                .map(|path| Stanza::delete(path.clone())),
        );
        Delta::from_stanzas(sort_stanzas(stanzas))
    }
}

/// Indicates whether `delete` removes an element of the array holding
/// `add`, at `index` or later.
fn deletes_at_or_after(delete: &KeyPath, add: &KeyPath, index: usize) -> bool {
    let (Some((Key::Index(other), parent)), Some((_, add_parent))) =
        (delete.keys().split_last(), add.keys().split_last())
    else {
        return false;
    };
    parent == add_parent && *other >= index
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> String {
        parse_udiff(text, &ParseConfig::default()).unwrap().to_json_string()
    }

    fn parse_reverse(text: &str) -> String {
        parse_udiff(text, &ParseConfig::default().with_reverse(true)).unwrap().to_json_string()
    }

    #[test]
    fn headers_are_optional() {
        let body = "-false\n+true";
        assert_eq!(parse(body), "[[[],true]]");
        assert_eq!(parse(&format!("--- a.json\n+++ b.json\n{body}")), "[[[],true]]");
        assert_eq!(parse_reverse(&format!("--- a.json\n+++ b.json\n{body}")), "[[[],false]]");
    }

    #[test]
    fn member_modification() {
        let text = " {\n  \"foo\":\n-  \"bar\"\n+  \"baz\"\n }";
        assert_eq!(parse(text), "[[[\"foo\"],\"baz\"]]");
        assert_eq!(parse_reverse(text), "[[[\"foo\"],\"bar\"]]");
    }

    #[test]
    fn array_deletion_and_its_inverse() {
        let text = " [\n  1,\n- 2,\n  3\n ]";
        assert_eq!(parse(text), "[[[1]]]");
        assert_eq!(parse_reverse(text), "[[[1],2,\"i\"]]");
    }

    #[test]
    fn trailing_appends_follow_the_first_insert() {
        let text = " [\n  1,\n  2\n+ ,\n+ 3,\n+ 4\n ]";
        assert_eq!(parse(text), "[[[2],3,\"i\"],[[3],4]]");
        assert_eq!(parse_reverse(text), "[[[3]],[[2]]]");
    }

    #[test]
    fn object_members_across_runs() {
        let text = " {\n  \"c\": 0,\n- \"a\": 1,\n  \n+ \"b\": [1, \"x\"]\n }";
        assert_eq!(parse(text), "[[[\"b\"],[1,\"x\"]],[[\"a\"]]]");
    }

    #[test]
    fn elided_runs_keep_indices_aligned() {
        let text = " [\n  ...(3),\n- 4,\n+ 5,\n  6\n ]";
        assert_eq!(parse(text), "[[[3],5]]");
    }

    #[test]
    fn crlf_and_blank_lines_are_tolerated() {
        let text = "\r\n {\r\n  \"foo\":\r\n-  \"bar\"\r\n+  \"baz\"\r\n }\r\n";
        assert_eq!(parse(text), "[[[\"foo\"],\"baz\"]]");
    }

    #[test]
    fn faults() {
        for text in [" [\n  1,\n- 2]]", "*oops", "+{\"a\": nope}", " {\n- \"unterminated"] {
            let result = parse_udiff(text, &ParseConfig::default());
            assert!(
                matches!(result, Err(DeltaError::MalformedUdiff { .. })),
                "{text:?} gave {result:?}"
            );
        }
    }

    #[test]
    fn shared_runs_need_matching_containers() {
        for text in ["-[\n+{\n  1\n", "-{\n+[\n  1\n"] {
            let result = parse_udiff(text, &ParseConfig::default());
            assert!(
                matches!(&result, Err(DeltaError::MalformedUdiff { reason }) if reason.starts_with("sides disagree")),
                "{text:?} gave {result:?}"
            );
        }
    }

    #[test]
    fn nesting_limit_applies_to_the_tracker() {
        let config = ParseConfig::default().with_max_depth(2).unwrap();
        let err = parse_udiff(" [[[\n-1\n ]]]", &config).unwrap_err();
        assert_eq!(err, DeltaError::StackDepth { limit: 2 });
    }
}
