//! Long-term memory for experience replay.
use crate::error::SolverError;
use rand::Rng;

/// A fixed-capacity ring buffer of experiences.
///
/// Items are appended until `capacity` is reached; after that each new item
/// overwrites the oldest one. Items are sampled uniformly with replacement.
#[derive(Debug, Clone)]
pub struct ReplayMemory<T> {
    /// Maximum number of items.
    capacity: usize,

    /// Slot written by the next push.
    i: usize,

    /// Storage.
    items: Vec<T>,
}

impl<T> ReplayMemory<T> {
    /// Creates an empty memory holding at most `capacity` items.
    pub fn new(capacity: usize) -> Result<Self, SolverError> {
        if capacity == 0 {
            return Err(SolverError::InvalidConfig(
                "capacity of replay memory must be positive".to_string(),
            ));
        }

        Ok(Self {
            capacity,
            i: 0,
            // Grows on demand, capacities may be large.
            items: Vec::new(),
        })
    }

    /// Stores an item, overwriting the oldest one when full.
    pub fn push(&mut self, item: T) {
        if self.items.len() < self.capacity {
            self.items.push(item);
        } else {
            self.items[self.i] = item;
        }
        self.i = (self.i + 1) % self.capacity;
    }

    /// Samples an item uniformly at random.
    ///
    /// Returns `None` if the memory is empty.
    pub fn sample<R: Rng>(&self, rng: &mut R) -> Option<&T> {
        if self.items.is_empty() {
            None
        } else {
            self.items.get(rng.gen_range(0..self.items.len()))
        }
    }

    /// Returns the item stored in slot `ix`.
    pub fn get(&self, ix: usize) -> Option<&T> {
        self.items.get(ix)
    }

    /// Slot written by the next push, always in `[0, capacity)`.
    pub fn index(&self) -> usize {
        self.i
    }

    /// Number of stored items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if no item is stored.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Removes all items.
    pub fn clear(&mut self) {
        self.items.clear();
        self.i = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::ReplayMemory;
    use crate::error::SolverError;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_zero_capacity_is_rejected() {
        assert!(matches!(
            ReplayMemory::<u32>::new(0),
            Err(SolverError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_wraparound_overwrites_oldest() {
        let capacity = 5;
        for k in 1..=12 {
            let mut memory = ReplayMemory::new(capacity).unwrap();
            for item in 0..(capacity + k) {
                memory.push(item);
                assert!(memory.len() <= capacity);
                assert!(memory.index() < capacity);
            }
            assert_eq!(memory.len(), capacity);
            assert_eq!(memory.index(), k % capacity);

            let latest = (k + capacity - 1) % capacity;
            assert_eq!(memory.get(latest), Some(&(capacity + k - 1)));

            // The cursor points at the oldest surviving item.
            let oldest = *memory.get(memory.index()).unwrap();
            assert_eq!(oldest, k);
        }
    }

    #[test]
    fn test_sample_from_stored_items() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut memory = ReplayMemory::new(3).unwrap();
        assert!(memory.sample(&mut rng).is_none());

        for item in [10, 20, 30, 40] {
            memory.push(item);
        }
        for _ in 0..100 {
            let x = *memory.sample(&mut rng).unwrap();
            assert!([20, 30, 40].contains(&x));
        }

        memory.clear();
        assert!(memory.is_empty());
        assert_eq!(memory.index(), 0);
    }
}
