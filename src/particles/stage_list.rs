//! Ordered, id-addressed list of pipeline stages.

use std::fmt;

/// Handle returned when a stage is added to an effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StageId(pub u64);

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stage#{}", self.0)
    }
}

/// Stages in registration order. Execution order is insertion order.
pub struct StageList<S: ?Sized> {
    entries: Vec<(StageId, Box<S>)>,
}

impl<S: ?Sized> StageList<S> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn push(&mut self, id: StageId, stage: Box<S>) {
        self.entries.push((id, stage));
    }

    /// Remove a stage, keeping the order of the rest
    pub fn remove(&mut self, id: StageId) -> Option<Box<S>> {
        let index = self.entries.iter().position(|(entry, _)| *entry == id)?;
        Some(self.entries.remove(index).1)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &S> {
        self.entries.iter().map(|(_, stage)| stage.as_ref())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut S> {
        self.entries.iter_mut().map(|(_, stage)| stage.as_mut())
    }
}

impl<S: ?Sized> Default for StageList<S> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remove_keeps_order() {
        let mut list: StageList<str> = StageList::new();
        list.push(StageId(0), "a".into());
        list.push(StageId(1), "b".into());
        list.push(StageId(2), "c".into());

        assert_eq!(list.remove(StageId(1)).as_deref(), Some("b"));
        assert!(list.remove(StageId(1)).is_none());
        assert_eq!(list.iter().collect::<Vec<_>>(), vec!["a", "c"]);
        assert_eq!(list.len(), 2);

        list.clear();
        assert!(list.is_empty());
    }
}
