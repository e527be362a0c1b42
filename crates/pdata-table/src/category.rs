use std::collections::HashMap;
use std::io::{Read, Write};
use std::sync::Arc;

use crate::error::Result;
use crate::snapshot::{SnapshotReader, SnapshotWriter};

/// Bidirectional label <-> index mapping backing a category column.
///
/// Indices are handed out first-come-first-served. Deserialization may assign labels out of
/// order, so an index can exist without a label.
#[derive(Clone, Debug, Default)]
pub struct CategoryDictionary {
    labels: Vec<Option<Arc<str>>>,
    indices: HashMap<Arc<str>, i32>,
}

impl CategoryDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of index slots, including slots without a label.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Look up `label`, assigning the next free index if it hasn't been seen before.
    pub fn index(&mut self, label: &str) -> i32 {
        if let Some(idx) = self.indices.get(label) {
            return *idx;
        }

        let idx = self.labels.len() as i32;
        let label: Arc<str> = Arc::from(label);
        self.labels.push(Some(label.clone()));
        self.indices.insert(label, idx);
        idx
    }

    /// Look up `label` without inserting it.
    pub fn get(&self, label: &str) -> Option<i32> {
        self.indices.get(label).copied()
    }

    pub fn label(&self, index: i32) -> Option<&str> {
        let idx = usize::try_from(index).ok()?;
        self.labels.get(idx)?.as_deref()
    }

    pub fn has_label(&self, index: i32) -> bool {
        self.label(index).is_some()
    }

    /// Assign `label` to a specific index, growing the index space as needed.
    pub fn set_category(&mut self, index: usize, label: &str) {
        if index >= self.labels.len() {
            self.labels.resize(index + 1, None);
        }
        if let Some(old) = self.labels[index].take() {
            if self.indices.get(&old) == Some(&(index as i32)) {
                self.indices.remove(&old);
            }
        }
        let label: Arc<str> = Arc::from(label);
        self.indices.insert(label.clone(), index as i32);
        self.labels[index] = Some(label);
    }

    /// Labels in index order; unassigned slots yield `None`.
    pub fn labels(&self) -> impl Iterator<Item = Option<&str>> + '_ {
        self.labels.iter().map(|l| l.as_deref())
    }

    pub fn write_to<W: Write>(&self, output: W) -> Result<()> {
        let mut out = SnapshotWriter::new(output);
        self.write_snapshot(&mut out)?;
        out.flush()
    }

    pub fn read_from<R: Read>(input: R) -> Result<Self> {
        let mut input = SnapshotReader::new(input);
        Self::read_snapshot(&mut input)
    }

    pub(crate) fn read_snapshot<R: Read>(input: &mut SnapshotReader<R>) -> Result<Self> {
        let count = input.read_u32("category count")? as usize;
        let mut dictionary = Self::new();
        for idx in 0..count {
            match input.read_opt_str("category label")? {
                Some(label) => dictionary.set_category(idx, &label),
                None => dictionary.labels.push(None),
            }
        }
        Ok(dictionary)
    }

    pub(crate) fn write_snapshot<W: Write>(&self, out: &mut SnapshotWriter<W>) -> Result<()> {
        out.write_u32(self.labels.len() as u32)?;
        for label in &self.labels {
            out.write_opt_str(label.as_deref())?;
        }
        Ok(())
    }

    /// One label per line in index order (the `.categories` sidecar format).
    pub fn write_lines<W: Write>(&self, mut output: W) -> Result<()> {
        for label in &self.labels {
            writeln!(output, "{}", label.as_deref().unwrap_or(""))?;
        }
        output.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_is_idempotent_and_fresh_labels_get_new_indices() {
        let mut dict = CategoryDictionary::new();
        let foo = dict.index("foo");
        assert_eq!(dict.index("foo"), foo);

        let bar = dict.index("bar");
        assert_ne!(bar, foo);
        assert_eq!(dict.label(foo), Some("foo"));
        assert_eq!(dict.label(bar), Some("bar"));
        assert_eq!(dict.len(), 2);
    }

    #[test]
    fn out_of_order_assignment_leaves_holes() {
        let mut dict = CategoryDictionary::new();
        dict.set_category(3, "late");
        assert_eq!(dict.len(), 4);
        assert!(dict.has_label(3));
        assert!(!dict.has_label(0));
        assert!(!dict.has_label(-1));
        assert_eq!(dict.get("late"), Some(3));

        // The next unseen label goes after the highest assigned slot.
        assert_eq!(dict.index("next"), 4);
    }

    #[test]
    fn relabelling_an_index_drops_the_old_label() {
        let mut dict = CategoryDictionary::new();
        dict.index("a");
        dict.set_category(0, "b");
        assert_eq!(dict.get("a"), None);
        assert_eq!(dict.get("b"), Some(0));
    }

    #[test]
    fn persistence_roundtrip_keeps_holes() {
        let mut dict = CategoryDictionary::new();
        dict.index("x");
        dict.set_category(2, "z");

        let mut bytes = Vec::new();
        dict.write_to(&mut bytes).unwrap();
        let back = CategoryDictionary::read_from(bytes.as_slice()).unwrap();

        assert_eq!(
            back.labels().collect::<Vec<_>>(),
            vec![Some("x"), None, Some("z")]
        );
        assert_eq!(back.get("z"), Some(2));
    }

    #[test]
    fn write_lines_emits_one_label_per_line() {
        let mut dict = CategoryDictionary::new();
        dict.index("red");
        dict.index("green");
        let mut out = Vec::new();
        dict.write_lines(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "red\ngreen\n");
    }
}
