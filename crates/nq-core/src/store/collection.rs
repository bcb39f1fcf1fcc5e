//! Indexed in-memory collection of named queries
//!
//! Documents are kept in insertion order. A unique index on `name` and
//! multikey indexes on `tags` and `categories` are maintained on every
//! mutation.

use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::error::{QueryError, QueryResult};
use crate::filter::{Condition, ListField, QueryFilter};
use crate::model::{NamedQuery, NamedQueryDraft, QueryPatch};

pub(crate) type Seq = u64;

#[derive(Debug, Default)]
pub struct Collection {
    next_seq: Seq,
    docs: BTreeMap<Seq, NamedQuery>,
    ids: HashMap<String, Seq>,
    names: HashMap<String, Seq>,
    tags: HashMap<String, BTreeSet<Seq>>,
    categories: HashMap<String, BTreeSet<Seq>>,
}

impl Collection {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Rebuild a collection from records in insertion order
    pub(crate) fn from_records(records: Vec<NamedQuery>) -> QueryResult<Self> {
        let mut collection = Self::new();
        for record in records {
            if collection.ids.contains_key(&record.id) {
                return Err(QueryError::store(format!("duplicate id in collection: {}", record.id)));
            }
            if collection.names.contains_key(&record.name) {
                return Err(QueryError::DuplicateName(record.name));
            }
            let seq = collection.next_seq;
            collection.next_seq += 1;
            collection.index(seq, &record);
            collection.docs.insert(seq, record);
        }
        Ok(collection)
    }

    /// Drop and rebuild all secondary indexes, checking name uniqueness
    pub(crate) fn rebuild_indexes(&mut self) -> QueryResult<()> {
        let records: Vec<NamedQuery> = self.docs.values().cloned().collect();
        *self = Self::from_records(records)?;
        Ok(())
    }

    pub(crate) fn len(&self) -> usize {
        self.docs.len()
    }

    /// Records in insertion order
    pub(crate) fn records(&self) -> impl Iterator<Item = &NamedQuery> {
        self.docs.values()
    }

    pub(crate) fn get(&self, id: &str) -> Option<&NamedQuery> {
        self.ids.get(id).and_then(|seq| self.docs.get(seq))
    }

    /// Matching records, newest first
    pub(crate) fn find(&self, filter: &QueryFilter) -> Vec<NamedQuery> {
        let mut matches: Vec<(Seq, &NamedQuery)> = self
            .candidates(filter)
            .into_iter()
            .filter_map(|seq| self.docs.get(&seq).map(|doc| (seq, doc)))
            .filter(|(_, doc)| filter.matches(doc))
            .collect();

        matches.sort_by(|(seq_a, a), (seq_b, b)| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| seq_b.cmp(seq_a))
        });

        matches.into_iter().map(|(_, doc)| doc.clone()).collect()
    }

    pub(crate) fn insert(
        &mut self,
        id: String,
        draft: NamedQueryDraft,
        now: DateTime<Utc>,
    ) -> QueryResult<NamedQuery> {
        if self.names.contains_key(&draft.name) {
            return Err(QueryError::DuplicateName(draft.name));
        }
        if self.ids.contains_key(&id) {
            return Err(QueryError::store(format!("duplicate id: {}", id)));
        }

        let record = NamedQuery::from_draft(id, draft, now);
        let seq = self.next_seq;
        self.next_seq += 1;
        self.index(seq, &record);
        self.docs.insert(seq, record.clone());
        Ok(record)
    }

    /// Apply a patch; `Ok(None)` when the id is unknown
    pub(crate) fn update(
        &mut self,
        id: &str,
        patch: QueryPatch,
        now: DateTime<Utc>,
    ) -> QueryResult<Option<NamedQuery>> {
        let Some(&seq) = self.ids.get(id) else {
            return Ok(None);
        };

        if let Some(name) = patch.name.as_ref() {
            if let Some(&owner) = self.names.get(name) {
                if owner != seq {
                    return Err(QueryError::DuplicateName(name.clone()));
                }
            }
        }

        let Some(current) = self.docs.get(&seq) else {
            return Err(QueryError::store(format!("index points at missing document: {}", id)));
        };
        let mut updated = current.clone();
        patch.apply_to(&mut updated, now);

        let previous = current.clone();
        self.unindex(seq, &previous);
        self.index(seq, &updated);
        self.docs.insert(seq, updated.clone());
        Ok(Some(updated))
    }

    pub(crate) fn remove(&mut self, id: &str) -> Option<NamedQuery> {
        self.take(id).map(|(_, record)| record)
    }

    /// Remove a record, keeping its position so it can be restored
    pub(crate) fn take(&mut self, id: &str) -> Option<(Seq, NamedQuery)> {
        let seq = *self.ids.get(id)?;
        let record = self.docs.remove(&seq)?;
        self.unindex(seq, &record);
        Some((seq, record))
    }

    /// Put a record returned by [`Collection::take`] back where it was
    pub(crate) fn restore(&mut self, seq: Seq, record: NamedQuery) {
        self.index(seq, &record);
        self.docs.insert(seq, record);
    }

    /// Overwrite the stored record with the same id, reindexing it
    pub(crate) fn replace(&mut self, record: NamedQuery) {
        let Some(&seq) = self.ids.get(&record.id) else {
            return;
        };
        if let Some(current) = self.docs.remove(&seq) {
            self.unindex(seq, &current);
        }
        self.restore(seq, record);
    }

    /// Narrow the scan with the first indexed condition, if any
    fn candidates(&self, filter: &QueryFilter) -> Vec<Seq> {
        let indexed = filter.conditions().iter().find_map(|condition| match condition {
            Condition::AnyOf { field, values } => Some((*field, values)),
            Condition::Search(_) => None,
        });

        match indexed {
            Some((field, values)) => {
                let index = self.list_index(field);
                let mut seqs = BTreeSet::new();
                for value in values {
                    if let Some(entries) = index.get(value) {
                        seqs.extend(entries.iter().copied());
                    }
                }
                seqs.into_iter().collect()
            }
            None => self.docs.keys().copied().collect(),
        }
    }

    fn list_index(&self, field: ListField) -> &HashMap<String, BTreeSet<Seq>> {
        match field {
            ListField::Tags => &self.tags,
            ListField::Categories => &self.categories,
        }
    }

    fn index(&mut self, seq: Seq, record: &NamedQuery) {
        self.ids.insert(record.id.clone(), seq);
        self.names.insert(record.name.clone(), seq);
        for tag in &record.tags {
            self.tags.entry(tag.clone()).or_default().insert(seq);
        }
        for category in &record.categories {
            self.categories
                .entry(category.clone())
                .or_default()
                .insert(seq);
        }
    }

    fn unindex(&mut self, seq: Seq, record: &NamedQuery) {
        self.ids.remove(&record.id);
        if self.names.get(&record.name) == Some(&seq) {
            self.names.remove(&record.name);
        }
        remove_entries(&mut self.tags, &record.tags, seq);
        remove_entries(&mut self.categories, &record.categories, seq);
    }
}

fn remove_entries(index: &mut HashMap<String, BTreeSet<Seq>>, keys: &[String], seq: Seq) {
    for key in keys {
        if let Some(entries) = index.get_mut(key) {
            entries.remove(&seq);
            if entries.is_empty() {
                index.remove(key);
            }
        }
    }
}
