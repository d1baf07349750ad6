use std::collections::{BTreeMap, BTreeSet};

use super::alignment::{Alignment, Slot};
use crate::{Delta, DeltaError, Key, KeyPath, RenderConfig, Stanza, Value};

/// A stanza seen from some node of the structure: `keys` is what remains
/// of its path below that node.
#[derive(Clone, Copy)]
struct Edit<'d> {
    keys: &'d [Key],
    value: Option<&'d Value>,
    insert: bool,
}

impl<'d> Edit<'d> {
    fn of(stanza: &'d Stanza) -> Self {
        Self { keys: stanza.path().keys(), value: stanza.value(), insert: stanza.is_insert() }
    }

    fn is_root_delete(&self) -> bool {
        self.keys.is_empty() && self.value.is_none()
    }
}

/// Groups edits by their first key, in order of first appearance, with
/// that key stripped.
fn group<'d>(edits: &[Edit<'d>]) -> Vec<(&'d Key, Vec<Edit<'d>>)> {
    let mut slots: BTreeMap<&Key, usize> = BTreeMap::new();
    let mut groups: Vec<(&Key, Vec<Edit<'d>>)> = Vec::new();
    for edit in edits {
        let Some((first, rest)) = edit.keys.split_first() else { continue };
        let slot = *slots.entry(first).or_insert_with(|| {
            groups.push((first, Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(Edit { keys: rest, ..*edit });
    }
    groups
}

fn band(sigil: char, indent: usize, text: &str) -> String {
    let mut line = String::with_capacity(1 + indent + text.len());
    line.push(sigil);
    line.push_str(&" ".repeat(indent));
    line.push_str(text);
    line
}

fn with_comma(mut text: String, comma: bool) -> String {
    if comma && !text.ends_with(',') {
        text.push(',');
    }
    text
}

/// One-line stand-in for a value whose contents the delta never touches.
fn summary(value: &Value) -> String {
    match value {
        Value::Object(members) if members.is_empty() => "{}".to_owned(),
        Value::Object(_) => "{...}".to_owned(),
        Value::Array(items) if items.is_empty() => "[]".to_owned(),
        Value::Array(items) => format!("[...({})]", items.len()),
        terminal => terminal.to_json_string(),
    }
}

/// Parallel left and right renderings. Each slot holds the lines one
/// fragment contributes to each side; shared slots hold identical lines.
#[derive(Default)]
struct Views {
    left: Vec<Vec<String>>,
    right: Vec<Vec<String>>,
}

impl Views {
    fn common(&mut self, text: &str, indent: usize) {
        let line = band(' ', indent, text);
        self.left.push(vec![line.clone()]);
        self.right.push(vec![line]);
    }

    fn differing(&mut self, left: Vec<String>, right: Vec<String>) {
        self.left.push(left);
        self.right.push(right);
    }

    fn append(&mut self, other: Views) {
        self.left.extend(other.left);
        self.right.extend(other.right);
    }

    fn last_is_shared(&self) -> bool {
        self.left.last().and_then(|slot| slot.first()).is_some_and(|line| line.starts_with(' '))
    }

    fn commafy_last(&mut self, left: bool, right: bool) {
        for (slots, comma) in [(&mut self.left, left), (&mut self.right, right)] {
            if !comma {
                continue;
            }
            if let Some(line) = slots.last_mut().and_then(|slot| slot.last_mut()) {
                if !line.ends_with(',') {
                    line.push(',');
                }
            }
        }
    }

    /// Adds the separators that follow a nested rendering. When only one
    /// side continues and the rendering ended on a shared line, the comma
    /// goes on a line of its own for that side.
    fn separate(&mut self, left: bool, right: bool, indent: usize) {
        if left == right || !self.last_is_shared() {
            self.commafy_last(left, right);
        } else if left {
            self.differing(vec![band('-', indent, ",")], Vec::new());
        } else {
            self.differing(Vec::new(), vec![band('+', indent, ",")]);
        }
    }

    fn merge(self) -> Result<Vec<String>, DeltaError> {
        let mut lines = Vec::new();
        for (left, right) in self.left.into_iter().zip(self.right) {
            if left.first().is_some_and(|line| line.starts_with(' ')) {
                if left != right {
                    return Err(DeltaError::malformed(format!(
                        "shared line {:?} renders differently on each side",
                        left[0]
                    )));
                }
                lines.extend(left);
                continue;
            }
            if let Some(line) = left.iter().find(|line| !line.starts_with('-')) {
                return Err(DeltaError::malformed(format!("left-only line {line:?} is not a deletion")));
            }
            if let Some(line) = right.iter().find(|line| !line.starts_with('+')) {
                return Err(DeltaError::malformed(format!("right-only line {line:?} is not an addition")));
            }
            lines.extend(left);
            lines.extend(right);
        }
        Ok(lines)
    }
}

struct Renderer {
    max_depth: usize,
}

pub(super) fn render_udiff(
    left: &Value,
    right: &Value,
    delta: &Delta,
    config: &RenderConfig,
) -> Result<Vec<String>, DeltaError> {
    let edits: Vec<Edit<'_>> = delta.iter().map(Edit::of).collect();
    let renderer = Renderer { max_depth: config.max_depth() };
    let views = renderer.node(left, right, &edits, &KeyPath::root(), config.indent(), 0, true)?;
    let lines = views.merge()?;
    tracing::debug!(stanzas = delta.len(), lines = lines.len(), "rendered udiff");
    Ok(lines)
}

impl Renderer {
    #[allow(clippy::too_many_arguments)]
    fn node(
        &self,
        left: &Value,
        right: &Value,
        edits: &[Edit<'_>],
        path: &KeyPath,
        indent: usize,
        depth: usize,
        entry: bool,
    ) -> Result<Views, DeltaError> {
        if depth > self.max_depth {
            return Err(DeltaError::StackDepth { limit: self.max_depth });
        }
        let mut views = Views::default();
        match edits.first() {
            None if !left.is_container() => {
                if left != right {
                    return Err(DeltaError::malformed(format!(
                        "values at {path} differ but no stanza touches them"
                    )));
                }
                if !entry {
                    views.common(&left.to_json_string(), indent);
                }
                return Ok(views);
            }
            Some(edit) if edit.keys.is_empty() => {
                let added = match edit.value {
                    Some(value) if value != right => {
                        return Err(DeltaError::malformed(format!(
                            "replacement at {path} does not match the right value"
                        )));
                    }
                    Some(value) => vec![band('+', indent, &value.to_json_string())],
                    None => Vec::new(),
                };
                views.differing(vec![band('-', indent, &left.to_json_string())], added);
                return Ok(views);
            }
            _ => {}
        }

        match (left, right) {
            (Value::Object(l), Value::Object(r)) => self.object(l, r, edits, path, indent, depth),
            (Value::Array(l), Value::Array(r)) => self.array(l, r, edits, path, indent, depth),
            _ => Err(DeltaError::TypeMismatch {
                path: path.clone(),
                expected: left.kind(),
                found: right.kind(),
            }),
        }
    }

    fn object(
        &self,
        l: &BTreeMap<String, Value>,
        r: &BTreeMap<String, Value>,
        edits: &[Edit<'_>],
        path: &KeyPath,
        indent: usize,
        depth: usize,
    ) -> Result<Views, DeltaError> {
        let mut views = Views::default();
        if l.is_empty() && r.is_empty() && edits.is_empty() {
            views.common("{}", indent);
            return Ok(views);
        }

        let mut touched = Vec::new();
        for (key, sub) in group(edits) {
            let Key::Member(name) = key else {
                return Err(DeltaError::TypeMismatch {
                    path: path.clone(),
                    expected: "array",
                    found: "object",
                });
            };
            if !l.contains_key(name) && !r.contains_key(name) {
                return Err(DeltaError::malformed(format!(
                    "member {key} of {path} is on neither side"
                )));
            }
            touched.push((name.as_str(), key, sub));
        }

        let is_touched = |name: &str| touched.iter().any(|(touched, ..)| *touched == name);
        let untouched: BTreeSet<&str> = l
            .keys()
            .chain(r.keys())
            .map(String::as_str)
            .filter(|name| !is_touched(name))
            .collect();
        for name in &untouched {
            match (l.get(*name), r.get(*name)) {
                (Some(lv), Some(rv)) if lv == rv => {}
                _ => {
                    return Err(DeltaError::malformed(format!(
                        "member {} of {path} differs but no stanza touches it",
                        Key::member(*name)
                    )));
                }
            }
        }

        if touched.is_empty() {
            views.common(if l.is_empty() { "{}" } else { "{...}" }, indent);
            return Ok(views);
        }

        views.common("{", indent);
        let inner = indent + 1;
        let mut names = untouched.iter();
        match (names.next(), names.next()) {
            (None, _) => {}
            (Some(name), None) => {
                let line = format!("{}: {},", Key::member(*name), summary(&l[*name]));
                views.common(&line, inner);
            }
            (Some(_), Some(_)) => {
                let lc = touched.iter().any(|(name, ..)| l.contains_key(*name));
                let rc = touched.iter().any(|(name, ..)| r.contains_key(*name));
                match (lc, rc) {
                    (true, false) => {
                        views.differing(vec![band('-', inner, "...,")], vec![band('+', inner, "...")]);
                    }
                    (false, true) => {
                        views.differing(vec![band('-', inner, "...")], vec![band('+', inner, "...,")]);
                    }
                    _ => views.common("...,", inner),
                }
            }
        }

        for (position, (name, key, sub)) in touched.iter().enumerate() {
            let later = &touched[position + 1..];
            let lc = later.iter().any(|(name, ..)| l.contains_key(*name));
            let rc = later.iter().any(|(name, ..)| r.contains_key(*name));
            let deleted = matches!(sub.as_slice(), [edit] if edit.is_root_delete());

            match (l.get(*name), r.get(*name)) {
                (Some(lv), None) if deleted => {
                    let line = with_comma(format!("{key}: {lv}"), lc);
                    views.differing(vec![band('-', inner, &line)], Vec::new());
                }
                (None, Some(rv)) => {
                    let line = with_comma(format!("{key}: {rv}"), rc);
                    views.differing(Vec::new(), vec![band('+', inner, &line)]);
                }
                (Some(lv), Some(rv)) if !deleted => {
                    views.common(&format!("{key}:"), inner);
                    let child = path.child((*key).clone());
                    views.append(self.node(lv, rv, sub, &child, inner + 1, depth + 1, false)?);
                    views.separate(lc, rc, inner);
                }
                _ => {
                    return Err(DeltaError::malformed(format!(
                        "stanzas for member {key} of {path} disagree with the values"
                    )));
                }
            }
            if position + 1 < touched.len() {
                views.common("", inner);
            }
        }

        views.common("}", indent);
        Ok(views)
    }

    fn array(
        &self,
        l: &[Value],
        r: &[Value],
        edits: &[Edit<'_>],
        path: &KeyPath,
        indent: usize,
        depth: usize,
    ) -> Result<Views, DeltaError> {
        let mut views = Views::default();
        if l.is_empty() && r.is_empty() && edits.is_empty() {
            views.common("[]", indent);
            return Ok(views);
        }
        if edits.is_empty() {
            if l != r {
                return Err(DeltaError::malformed(format!(
                    "arrays at {path} differ but no stanza touches them"
                )));
            }
            views.common(&format!("[...({})]", r.len()), indent);
            return Ok(views);
        }

        let mut groups: BTreeMap<usize, Vec<Edit<'_>>> = BTreeMap::new();
        let mut inserts = BTreeSet::new();
        let mut deletes = BTreeSet::new();
        for edit in edits {
            let Some((first, rest)) = edit.keys.split_first() else { continue };
            let Key::Index(index) = first else {
                return Err(DeltaError::TypeMismatch {
                    path: path.clone(),
                    expected: "object",
                    found: "array",
                });
            };
            if rest.is_empty() {
                if edit.insert {
                    inserts.insert(*index);
                } else if edit.value.is_none() {
                    deletes.insert(*index);
                }
            }
            groups.entry(*index).or_default().push(Edit { keys: rest, ..*edit });
        }

        let max_touched = groups.keys().next_back().copied();
        let alignment = Alignment::reconstruct(l, r, &inserts, &deletes, max_touched);
        views.common("[", indent);
        let inner = indent + 1;
        let mut pos = 0;

        for (&index, sub) in &groups {
            if index > pos {
                self.untouched_run(&mut views, &alignment, pos, index, path, inner, depth)?;
                match alignment.commas_from(index) {
                    (true, true) => views.commafy_last(true, true),
                    (true, false) => views.differing(vec![band('-', indent, ",")], Vec::new()),
                    (false, true) => views.differing(Vec::new(), vec![band('+', indent, ",")]),
                    (false, false) => {}
                }
            }

            let (lc, rc) = alignment.commas_from(index + 1);
            match (alignment.left[index], alignment.right[index]) {
                (Slot::Present(lv), Slot::Gap) => {
                    let line = with_comma(lv.to_json_string(), lc);
                    views.differing(vec![band('-', inner, &line)], Vec::new());
                }
                (Slot::Gap, Slot::Present(rv)) => {
                    let line = with_comma(rv.to_json_string(), rc);
                    views.differing(Vec::new(), vec![band('+', inner, &line)]);
                }
                (Slot::Present(lv), Slot::Present(rv)) => {
                    let child = path.child(Key::Index(index));
                    views.append(self.node(lv, rv, sub, &child, inner, depth + 1, false)?);
                    views.separate(lc, rc, indent);
                }
                (Slot::Gap, Slot::Gap) => {
                    return Err(DeltaError::malformed(format!(
                        "index {index} of {path} is on neither side"
                    )));
                }
            }
            pos = index + 1;
        }

        if pos < alignment.len() {
            self.untouched_run(&mut views, &alignment, pos, alignment.len(), path, inner, depth)?;
        }
        views.common("]", indent);
        Ok(views)
    }

    /// Renders positions `from..to` that no stanza touches. Short runs are
    /// shown verbatim, longer ones collapse to `...(N)`.
    #[allow(clippy::too_many_arguments)]
    fn untouched_run(
        &self,
        views: &mut Views,
        alignment: &Alignment<'_>,
        from: usize,
        to: usize,
        path: &KeyPath,
        inner: usize,
        depth: usize,
    ) -> Result<(), DeltaError> {
        let mut pairs = Vec::with_capacity(to - from);
        for index in from..to {
            match (alignment.left[index], alignment.right[index]) {
                (Slot::Present(lv), Slot::Present(rv)) if lv == rv => pairs.push((index, lv, rv)),
                _ => {
                    return Err(DeltaError::malformed(format!(
                        "index {index} of {path} differs but no stanza touches it"
                    )));
                }
            }
        }

        if pairs.len() > 2 {
            views.common(&format!("...({})", pairs.len()), inner);
            return Ok(());
        }
        for (position, (index, lv, rv)) in pairs.into_iter().enumerate() {
            if position > 0 {
                views.commafy_last(true, true);
            }
            let child = path.child(Key::Index(index));
            views.append(self.node(lv, rv, &[], &child, inner, depth + 1, false)?);
        }
        Ok(())
    }
}
