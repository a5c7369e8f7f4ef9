use crate::dom::Dom;
use std::ops::{Deref, DerefMut};

/// Marks every write made through it as self-inflicted.
///
/// The observer drops records produced while the flag is set, so derived UI
/// written by the reconciler never re-enters classification. Dropping the
/// guard restores the previous flag, which keeps nested guards correct.
pub struct WriteIntent<'a> {
    dom: &'a mut dyn Dom,
    previous: bool,
}

impl<'a> WriteIntent<'a> {
    pub fn begin(dom: &'a mut dyn Dom) -> Self {
        let previous = dom.write_intent();
        dom.set_write_intent(true);
        Self { dom, previous }
    }
}

impl<'a> Deref for WriteIntent<'a> {
    type Target = dyn Dom + 'a;

    fn deref(&self) -> &Self::Target {
        self.dom
    }
}

impl<'a> DerefMut for WriteIntent<'a> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.dom
    }
}

impl Drop for WriteIntent<'_> {
    fn drop(&mut self) {
        self.dom.set_write_intent(self.previous);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DomExt, MemoryDocument};

    #[test]
    fn test_writes_are_tagged_and_flag_restored() {
        let mut doc = MemoryDocument::new("https://example.test/b/abc/board");
        let root = doc.root();
        let node = doc.create_element(&["card"]);
        {
            let mut dom = WriteIntent::begin(&mut doc);
            dom.append_child(root, node).unwrap();
            {
                let mut inner = WriteIntent::begin(&mut *dom);
                inner.add_class(node, "inner").unwrap();
            }
            assert!(dom.write_intent());
            dom.add_class(node, "outer").unwrap();
        }
        assert!(!doc.write_intent());
        doc.add_class(node, "page").unwrap();

        let records = doc.take_records();
        let tags: Vec<bool> = records.iter().map(|r| r.self_inflicted).collect();
        assert_eq!(tags, vec![true, true, true, false]);
    }
}
