use crate::ids::SourceRecord;

/// An ordered group of identifiers sent in a single request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    members: Vec<SourceRecord>,
}

impl Batch {
    pub fn new(members: Vec<SourceRecord>) -> Self {
        Self { members }
    }

    pub fn members(&self) -> &[SourceRecord] {
        &self.members
    }

    pub fn into_members(self) -> Vec<SourceRecord> {
        self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Identifiers joined the way vectorized Stack Exchange routes expect
    pub fn joined_ids(&self) -> String {
        self.members
            .iter()
            .map(|m| m.identifier.as_str())
            .collect::<Vec<_>>()
            .join(";")
    }
}

/// Splits pending records into batches of at most `max_size`, preserving order
///
/// A `max_size` of zero is treated as one.
pub fn into_batches(pending: Vec<SourceRecord>, max_size: usize) -> Vec<Batch> {
    let max_size = max_size.max(1);
    let mut batches = Vec::with_capacity(pending.len().div_ceil(max_size));
    let mut current = Vec::with_capacity(max_size.min(pending.len()));

    for record in pending {
        current.push(record);
        if current.len() == max_size {
            batches.push(Batch::new(std::mem::take(&mut current)));
        }
    }

    if !current.is_empty() {
        batches.push(Batch::new(current));
    }

    batches
}
