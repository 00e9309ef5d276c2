/// Generational key into a [`SlotTable`].
///
/// The slot is stable for the lifetime of the entry; the generation is bumped
/// when the entry is removed so an old key can never reach a newer entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Key {
    slot: u32,
    generation: u32,
}

impl Key {
    pub fn slot(&self) -> u32 {
        self.slot
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Rebuild a key a host handed out as its two parts. The table still
    /// checks the generation, so a forged or outdated key finds nothing.
    pub fn from_parts(slot: u32, generation: u32) -> Self {
        Self { slot, generation }
    }
}

#[derive(Debug, Clone, Copy)]
struct Sparse {
    generation: u32,
    /// Position of the live entry in `dense`, `None` while the slot is free.
    index: Option<u32>,
}

#[derive(Debug)]
struct Entry<T> {
    key: Key,
    value: T,
}

/// Densely packed table of live records addressed by generational keys.
///
/// Live records are contiguous. Removing one swaps the last record into the
/// hole and rewrites the moved record's index, so `index_of` always points
/// inside `0..len()`. Capacity grows in fixed steps once the table is full.
#[derive(Debug)]
pub struct SlotTable<T> {
    dense: Vec<Entry<T>>,
    sparse: Vec<Sparse>,
    free: Vec<u32>,
    capacity: usize,
    step: usize,
}

impl<T> SlotTable<T> {
    /// Create a table whose capacity starts at, and grows by, `step`.
    pub fn with_step(step: usize) -> Self {
        let step = step.max(1);
        Self {
            dense: Vec::with_capacity(step),
            sparse: Vec::with_capacity(step),
            free: Vec::new(),
            capacity: step,
            step,
        }
    }

    pub fn insert(&mut self, value: T) -> Key {
        if self.dense.len() == self.capacity {
            self.capacity += self.step;
            self.dense.reserve_exact(self.capacity - self.dense.len());
        }

        let slot = match self.free.pop() {
            Some(slot) => slot,
            None => {
                self.sparse.push(Sparse {
                    generation: 0,
                    index: None,
                });
                (self.sparse.len() - 1) as u32
            }
        };

        let sparse = &mut self.sparse[slot as usize];
        sparse.index = Some(self.dense.len() as u32);
        let key = Key {
            slot,
            generation: sparse.generation,
        };
        self.dense.push(Entry { key, value });
        key
    }

    /// Remove by swap-with-last. Returns `None` for stale keys.
    pub fn remove(&mut self, key: Key) -> Option<T> {
        let index = self.index_of(key)?;

        let sparse = &mut self.sparse[key.slot as usize];
        sparse.index = None;
        sparse.generation = sparse.generation.wrapping_add(1);
        self.free.push(key.slot);

        let removed = self.dense.swap_remove(index);
        if let Some(moved) = self.dense.get(index) {
            self.sparse[moved.key.slot as usize].index = Some(index as u32);
        }
        Some(removed.value)
    }

    /// Current dense position of a live key.
    pub fn index_of(&self, key: Key) -> Option<usize> {
        let sparse = self.sparse.get(key.slot as usize)?;
        if sparse.generation != key.generation {
            return None;
        }
        sparse.index.map(|i| i as usize)
    }

    pub fn contains(&self, key: Key) -> bool {
        self.index_of(key).is_some()
    }

    pub fn get(&self, key: Key) -> Option<&T> {
        let index = self.index_of(key)?;
        Some(&self.dense[index].value)
    }

    pub fn get_mut(&mut self, key: Key) -> Option<&mut T> {
        let index = self.index_of(key)?;
        Some(&mut self.dense[index].value)
    }

    /// Number of live records.
    pub fn len(&self) -> usize {
        self.dense.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }

    /// Logical capacity; always a multiple of the growth step.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Iterate live records in dense order.
    pub fn iter(&self) -> impl Iterator<Item = (Key, &T)> {
        self.dense.iter().map(|e| (e.key, &e.value))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Key, &mut T)> {
        self.dense.iter_mut().map(|e| (e.key, &mut e.value))
    }

    pub fn keys(&self) -> impl Iterator<Item = Key> + '_ {
        self.dense.iter().map(|e| e.key)
    }
}
