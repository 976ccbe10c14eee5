use crate::models::{AttendanceRecord, Session, Student, Subject};

/// Anything stored in a [`Registry`] under a string id.
pub trait Keyed {
    fn id(&self) -> &str;
}

impl Keyed for Student {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Keyed for Subject {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Keyed for Session {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Keyed for AttendanceRecord {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Ordered in-memory collection with sequential, prefixed ids (`S001`, `SUB002`, ...).
#[derive(Debug, Clone)]
pub struct Registry<T> {
    prefix: &'static str,
    width: usize,
    items: Vec<T>,
}

impl<T: Keyed> Registry<T> {
    pub fn new(prefix: &'static str, width: usize) -> Self {
        Self {
            prefix,
            width,
            items: Vec::new(),
        }
    }

    pub fn with_items(prefix: &'static str, width: usize, items: Vec<T>) -> Self {
        Self {
            prefix,
            width,
            items,
        }
    }

    /// One past the highest numeric suffix in use, so ids are never reused
    /// after a delete.
    pub fn next_id(&self) -> String {
        let highest = self
            .items
            .iter()
            .filter_map(|item| item.id().strip_prefix(self.prefix))
            .filter_map(|suffix| suffix.parse::<u32>().ok())
            .max()
            .unwrap_or(0);
        format!("{}{:0width$}", self.prefix, highest + 1, width = self.width)
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.items.iter().find(|item| item.id() == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut T> {
        self.items.iter_mut().find(|item| item.id() == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn push(&mut self, item: T) {
        self.items.push(item);
    }

    /// Swaps in `item` for the entry with the same id. Returns false when
    /// no such entry exists.
    pub fn replace(&mut self, item: T) -> bool {
        match self.items.iter_mut().find(|existing| existing.id() == item.id()) {
            Some(slot) => {
                *slot = item;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: &str) -> Option<T> {
        let index = self.items.iter().position(|item| item.id() == id)?;
        Some(self.items.remove(index))
    }

    pub fn retain(&mut self, keep: impl FnMut(&T) -> bool) {
        self.items.retain(keep);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.items.iter_mut()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
