use crate::models::Record;

/// In-memory mirror of the `names` table as of the last successful sync.
#[derive(Debug, Default, Clone)]
pub struct RecordList {
    records: Vec<Record>,
}

impl RecordList {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    pub fn replace_all(&mut self, records: Vec<Record>) {
        self.records = records;
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn append(&mut self, record: Record) {
        self.records.push(record);
    }

    /// Update the displayed name in place. Returns `false` for unknown ids.
    pub fn rename(&mut self, id: i64, name: &str) -> bool {
        match self.records.iter_mut().find(|record| record.id == id) {
            Some(record) => {
                record.name = name.to_string();
                true
            }
            None => false,
        }
    }

    /// Drop the entry with `id`. Returns `false` for unknown ids.
    pub fn remove(&mut self, id: i64) -> bool {
        match self.position(id) {
            Some(idx) => {
                self.records.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: i64) -> Option<&Record> {
        self.records.iter().find(|record| record.id == id)
    }

    pub fn position(&self, id: i64) -> Option<usize> {
        self.records.iter().position(|record| record.id == id)
    }

    pub fn at(&self, idx: usize) -> Option<&Record> {
        self.records.get(idx)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.records.iter()
    }

    pub fn as_slice(&self) -> &[Record] {
        &self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RecordList {
        RecordList::new(vec![
            Record::new(1, "Ada"),
            Record::new(2, "Grace"),
            Record::new(3, "Linus"),
        ])
    }

    #[test]
    fn rename_keeps_position_and_id() {
        let mut list = sample();
        assert!(list.rename(2, "Grace Hopper"));
        assert_eq!(list.at(1), Some(&Record::new(2, "Grace Hopper")));
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn remove_only_drops_matching_id() {
        let mut list = sample();
        assert!(list.remove(2));
        let ids: Vec<i64> = list.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn unknown_ids_are_ignored() {
        let mut list = sample();
        assert!(!list.remove(42));
        assert!(!list.rename(42, "nobody"));
        assert_eq!(list.as_slice(), sample().as_slice());
    }
}
