#![forbid(unsafe_code)]

use crate::ids::RowId;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_sql(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Rows keyed by primary key, kept in result order.
///
/// Filtering and ordering take typed accessor closures instead of field names, so a
/// combinator can only read what the item type actually exposes.
#[derive(Clone, Debug, PartialEq)]
pub struct Collection<T> {
    items: Vec<(RowId, T)>,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T> Collection<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces `id`. A replaced entry keeps its original position.
    pub fn insert(&mut self, id: RowId, item: T) {
        match self.items.iter_mut().find(|(key, _)| *key == id) {
            Some(slot) => slot.1 = item,
            None => self.items.push((id, item)),
        }
    }

    pub fn get(&self, id: &RowId) -> Option<&T> {
        self.items
            .iter()
            .find(|(key, _)| key == id)
            .map(|(_, item)| item)
    }

    pub fn contains(&self, id: &RowId) -> bool {
        self.get(id).is_some()
    }

    pub fn ids(&self) -> Vec<RowId> {
        self.items.iter().map(|(key, _)| key.clone()).collect()
    }

    pub fn first(&self) -> Option<&T> {
        self.items.first().map(|(_, item)| item)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RowId, &T)> {
        self.items.iter().map(|(key, item)| (key, item))
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.items.iter().map(|(_, item)| item)
    }

    pub fn into_values(self) -> Vec<T> {
        self.items.into_iter().map(|(_, item)| item).collect()
    }

    pub fn map<U>(self, mut func: impl FnMut(T) -> U) -> Collection<U> {
        Collection {
            items: self
                .items
                .into_iter()
                .map(|(key, item)| (key, func(item)))
                .collect(),
        }
    }

    pub fn filter(self, mut keep: impl FnMut(&T) -> bool) -> Self {
        Self {
            items: self.items.into_iter().filter(|(_, item)| keep(item)).collect(),
        }
    }

    /// Keeps items whose accessor value equals `expected`.
    pub fn filter_by<A: PartialEq>(self, accessor: impl Fn(&T) -> A, expected: &A) -> Self {
        self.filter(|item| accessor(item) == *expected)
    }

    /// Stable sort on the accessor value.
    pub fn sorted_by_key<K: Ord>(mut self, accessor: impl Fn(&T) -> K, order: SortOrder) -> Self {
        self.items.sort_by(|(_, a), (_, b)| {
            let ordering = accessor(a).cmp(&accessor(b));
            match order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });
        self
    }

    pub fn limit(mut self, n: usize) -> Self {
        self.items.truncate(n);
        self
    }

    /// Union keyed by id; entries already present in `self` win.
    pub fn merge(mut self, other: Collection<T>) -> Self {
        for (key, item) in other.items {
            if !self.contains(&key) {
                self.items.push((key, item));
            }
        }
        self
    }

    pub fn reduce<A>(&self, init: A, func: impl FnMut(A, &T) -> A) -> A {
        self.values().fold(init, func)
    }
}

impl<T> FromIterator<(RowId, T)> for Collection<T> {
    fn from_iter<I: IntoIterator<Item = (RowId, T)>>(iter: I) -> Self {
        let mut out = Collection::new();
        for (key, item) in iter {
            out.insert(key, item);
        }
        out
    }
}
