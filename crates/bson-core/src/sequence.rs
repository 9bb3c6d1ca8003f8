//! Sequence-style operations on [`Document`].
//!
//! Each operation makes one pass over the source document and writes the
//! retained elements into a fresh document. Elements that survive unchanged
//! are copied as encoded bytes; only [`Document::map_values`] re-encodes.
//! Order is preserved and, since the source keys are unique, so is key
//! uniqueness.
//!
//! Counts are `usize`, so a negative count cannot be expressed.

use tracing::error;

use crate::decoder::RawElement;
use crate::document::Document;
use crate::types::Value;

impl Document {
    /// All values, in order.
    #[must_use]
    pub fn values(&self) -> Vec<Value> {
        self.iter().map(|(_, value)| value).collect()
    }

    /// Keep the pairs for which `is_included` returns `true`.
    pub fn filter<F>(&self, mut is_included: F) -> Document
    where
        F: FnMut(&str, &Value) -> bool,
    {
        let mut out = Document::new();
        for (element, value) in self.decoded() {
            if is_included(element.key(), &value) {
                out.append_raw(&element);
            }
        }
        out
    }

    /// Replace every value with `transform(value)`, keeping keys and order.
    pub fn map_values<F>(&self, mut transform: F) -> Document
    where
        F: FnMut(Value) -> Value,
    {
        let mut out = Document::new();
        for (key, value) in self.iter() {
            out.insert(key, transform(value));
        }
        out
    }

    /// Everything but the first `n` pairs.
    #[must_use]
    pub fn drop_first(&self, n: usize) -> Document {
        if n == 0 {
            return self.clone();
        }
        collect_raw(self.elements().skip(n))
    }

    /// Everything but the last `n` pairs.
    #[must_use]
    pub fn drop_last(&self, n: usize) -> Document {
        if n == 0 {
            return self.clone();
        }
        let keep = self.len().saturating_sub(n);
        collect_raw(self.elements().take(keep))
    }

    /// Skip leading pairs while `predicate` holds, keep the rest.
    pub fn drop_while<F>(&self, mut predicate: F) -> Document
    where
        F: FnMut(&str, &Value) -> bool,
    {
        let mut dropping = true;
        self.filter(|key, value| {
            if dropping && predicate(key, value) {
                return false;
            }
            dropping = false;
            true
        })
    }

    /// The first `max_len` pairs.
    #[must_use]
    pub fn prefix(&self, max_len: usize) -> Document {
        if max_len >= self.len() {
            return self.clone();
        }
        collect_raw(self.elements().take(max_len))
    }

    /// Leading pairs while `predicate` holds.
    pub fn prefix_while<F>(&self, mut predicate: F) -> Document
    where
        F: FnMut(&str, &Value) -> bool,
    {
        let mut out = Document::new();
        for (element, value) in self.decoded() {
            if !predicate(element.key(), &value) {
                break;
            }
            out.append_raw(&element);
        }
        out
    }

    /// The last `max_len` pairs.
    #[must_use]
    pub fn suffix(&self, max_len: usize) -> Document {
        let start = self.len().saturating_sub(max_len);
        if start == 0 {
            return self.clone();
        }
        collect_raw(self.elements().skip(start))
    }

    /// Split into sub-documents around pairs for which `is_separator`
    /// returns `true`. Separators are not included in the output.
    ///
    /// At most `max_splits` splits are made; after that the remaining pairs,
    /// separators included, form the last sub-document. When
    /// `omit_empty` is set, empty sub-documents are dropped and do not
    /// count towards `max_splits`.
    pub fn split<F>(&self, max_splits: usize, omit_empty: bool, mut is_separator: F) -> Vec<Document>
    where
        F: FnMut(&str, &Value) -> bool,
    {
        let mut out = Vec::new();
        let mut current = Document::new();
        for (element, value) in self.decoded() {
            if out.len() < max_splits && is_separator(element.key(), &value) {
                if !(omit_empty && current.is_empty()) {
                    out.push(std::mem::take(&mut current));
                }
                continue;
            }
            current.append_raw(&element);
        }
        if !(omit_empty && current.is_empty()) {
            out.push(current);
        }
        out
    }

    /// Raw elements paired with their decoded values.
    fn decoded(&self) -> impl Iterator<Item = (RawElement<'_>, Value)> + '_ {
        self.elements().map_while(|element| match element.value() {
            Ok(value) => Some((element, value)),
            Err(err) => {
                error!(%err, key = element.key(), "stored element failed to decode");
                None
            }
        })
    }
}

fn collect_raw<'a>(elements: impl Iterator<Item = RawElement<'a>>) -> Document {
    let mut out = Document::new();
    for element in elements {
        out.append_raw(&element);
    }
    out
}
