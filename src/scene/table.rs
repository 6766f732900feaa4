use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::ops::{Index, IndexMut};

use crate::HashMap;

/// Typed index of an entry in a [`Table`].
pub struct Id<T> {
    index: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Id<T> {
    pub const fn from_index(index: u32) -> Self {
        Self {
            index,
            _marker: PhantomData,
        }
    }

    pub const fn index(self) -> usize {
        self.index as usize
    }

    pub const fn raw(self) -> u32 {
        self.index
    }
}

impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Id<T> {}

impl<T> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl<T> Eq for Id<T> {}

impl<T> Hash for Id<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
    }
}

impl<T> fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id({})", self.index)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("The name '{name}' is already taken")]
pub struct DuplicateName {
    pub name: String,
}

/// Named entries of one resource kind, in insertion order.
///
/// Names are unique within a table.
#[derive(Debug, Clone)]
pub struct Table<T> {
    entries: Vec<(String, T)>,
    by_name: HashMap<String, u32>,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            by_name: HashMap::default(),
        }
    }
}

impl<T: PartialEq> PartialEq for Table<T> {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl<T> Table<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: T) -> Result<Id<T>, DuplicateName> {
        let name = name.into();
        if self.by_name.contains_key(&name) {
            return Err(DuplicateName { name });
        }
        let index = self.entries.len() as u32;
        self.by_name.insert(name.clone(), index);
        self.entries.push((name, value));
        Ok(Id::from_index(index))
    }

    pub fn get(&self, id: Id<T>) -> Option<&T> {
        self.entries.get(id.index()).map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, id: Id<T>) -> Option<&mut T> {
        self.entries.get_mut(id.index()).map(|(_, v)| v)
    }

    pub fn name(&self, id: Id<T>) -> Option<&str> {
        self.entries.get(id.index()).map(|(n, _)| n.as_str())
    }

    pub fn find(&self, name: &str) -> Option<Id<T>> {
        self.by_name.get(name).map(|&i| Id::from_index(i))
    }

    pub fn contains(&self, id: Id<T>) -> bool {
        id.index() < self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Id<T>, &str, &T)> {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, (n, v))| (Id::from_index(i as u32), n.as_str(), v))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Id<T>, &str, &mut T)> {
        self.entries
            .iter_mut()
            .enumerate()
            .map(|(i, (n, v))| (Id::from_index(i as u32), n.as_str(), v))
    }
}

impl<T> Index<Id<T>> for Table<T> {
    type Output = T;

    fn index(&self, id: Id<T>) -> &T {
        &self.entries[id.index()].1
    }
}

impl<T> IndexMut<Id<T>> for Table<T> {
    fn index_mut(&mut self, id: Id<T>) -> &mut T {
        &mut self.entries[id.index()].1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_unique() {
        let mut table = Table::new();
        let a = table.insert("a", 1).unwrap();
        let b = table.insert("b", 2).unwrap();
        assert_eq!(table.insert("a", 3), Err(DuplicateName { name: "a".into() }));
        assert_eq!(table.find("b"), Some(b));
        assert_eq!(table[a], 1);
        assert_eq!(table.name(a), Some("a"));
        let names: Vec<_> = table.iter().map(|(_, n, _)| n).collect();
        assert_eq!(names, ["a", "b"]);
    }
}
