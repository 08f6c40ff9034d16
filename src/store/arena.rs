/// Handle to a record owned by an [Arena]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub(crate) struct Handle(usize);

#[derive(Debug, Clone)]
struct Slot<A> {
    record: A,
    /// Number of index positions referencing this slot
    refs: usize,
}

/// Owns every record of the store. Indexes only hold [Handle]s,
/// a slot is freed once no index references it anymore.
#[derive(Debug, Clone)]
pub(crate) struct Arena<A> {
    slots: Vec<Option<Slot<A>>>,
    vacant: Vec<usize>,
}

impl<A> Default for Arena<A> {
    fn default() -> Self {
        Self {
            slots: Vec::with_capacity(64),
            vacant: Vec::new(),
        }
    }
}

impl<A> Arena<A> {
    /// Stores a new record, referenced `refs` times
    pub fn insert(&mut self, record: A, refs: usize) -> Handle {
        let slot = Some(Slot { record, refs });
        match self.vacant.pop() {
            Some(index) => {
                self.slots[index] = slot;
                Handle(index)
            },
            None => {
                self.slots.push(slot);
                Handle(self.slots.len() - 1)
            },
        }
    }
    /// Returns record referenced by this [Handle].
    /// Panics on a released handle, which would mean an index is corrupt.
    pub fn get(&self, handle: Handle) -> &A {
        match self.slots.get(handle.0) {
            Some(Some(slot)) => &slot.record,
            _ => panic!("almanac arena: dangling handle #{}", handle.0),
        }
    }
    /// Drops one reference to this record, which is destroyed
    /// when the last reference goes away.
    pub fn release(&mut self, handle: Handle) {
        let freed = match self.slots.get_mut(handle.0) {
            Some(Some(slot)) => {
                slot.refs = slot.refs.saturating_sub(1);
                slot.refs == 0
            },
            _ => panic!("almanac arena: double release of #{}", handle.0),
        };
        if freed {
            self.slots[handle.0] = None;
            self.vacant.push(handle.0);
        }
    }
    /// Number of live records
    pub fn len(&self) -> usize {
        self.slots.len() - self.vacant.len()
    }
    pub fn clear(&mut self) {
        self.slots.clear();
        self.vacant.clear();
    }
}
