use std::fmt;
use std::sync::Arc;

use log::trace;
use rayon::prelude::*;

/// Per-worker scratch storage for lock-free accumulation.
///
/// [`ThreadLocal::fan_out`] splits a range of work items into one contiguous
/// block per worker of the pool it runs in and runs every block as its own
/// rayon task holding exclusive access to one slot, so the hot loop needs
/// neither locks nor atomics. Slots are added on demand when a larger pool
/// runs the fan-out, and merged afterwards by the owner in slot order.
#[derive(Clone)]
pub struct ThreadLocal<S> {
    slots: Vec<S>,
    make: Arc<dyn Fn() -> S + Send + Sync>,
}

impl<S: Send> ThreadLocal<S> {
    /// One slot per worker of the current rayon pool.
    pub fn new(make: impl Fn() -> S + Send + Sync + 'static) -> Self {
        Self::with_slots(rayon::current_num_threads(), make)
    }

    /// Starts with `n` slots (at least one).
    pub fn with_slots(n: usize, make: impl Fn() -> S + Send + Sync + 'static) -> Self {
        let make: Arc<dyn Fn() -> S + Send + Sync> = Arc::new(make);
        ThreadLocal {
            slots: (0..n.max(1)).map(|_| make()).collect(),
            make,
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slots(&self) -> &[S] {
        &self.slots
    }

    /// Applies `f` to every slot, e.g. to zero them.
    pub fn for_each_mut(&mut self, f: impl FnMut(&mut S)) {
        self.slots.iter_mut().for_each(f);
    }

    /// Adds fresh slots until there are at least `n`.
    pub fn grow_to(&mut self, n: usize) {
        while self.slots.len() < n {
            self.slots.push((self.make)());
        }
    }

    /// Calls `f(slot, item)` for every `item` in `0..n_items`, in parallel.
    ///
    /// The slot count is first raised to the worker count of the current
    /// pool. Items are assigned to slots in contiguous blocks; within a block
    /// they are processed in increasing order.
    pub fn fan_out<F>(&mut self, n_items: usize, f: F)
    where
        F: Fn(&mut S, usize) + Sync,
    {
        self.grow_to(rayon::current_num_threads());
        let n_slots = self.slots.len();
        let block = n_items.div_ceil(n_slots).max(1);
        trace!("fan out {} items over {} slots (block size {})", n_items, n_slots, block);

        self.slots.par_iter_mut().enumerate().for_each(|(slot_idx, slot)| {
            let start = (slot_idx * block).min(n_items);
            let end = (start + block).min(n_items);
            for item in start..end {
                f(slot, item);
            }
        });
    }
}

impl<S: fmt::Debug> fmt::Debug for ThreadLocal<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThreadLocal").field("slots", &self.slots).finish_non_exhaustive()
    }
}

impl<T: Copy + Send + Sync + std::ops::AddAssign + Default> ThreadLocal<Vec<T>> {
    /// Element-wise sum of all slots into `out`, parallel over elements.
    ///
    /// Every element is summed over the slots in slot order, so the result
    /// is reproducible for a fixed slot count.
    pub fn reduce_into(&self, out: &mut [T]) {
        out.par_iter_mut().enumerate().for_each(|(i, o)| {
            let mut total = T::default();
            for slot in &self.slots {
                total += slot[i];
            }
            *o = total;
        });
    }

    /// Zeroes every slot.
    pub fn reset(&mut self) {
        self.for_each_mut(|slot| slot.iter_mut().for_each(|v| *v = T::default()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fan_out_visits_each_item_once() {
        let mut local = ThreadLocal::with_slots(3, || vec![0u64; 10]);
        local.fan_out(10, |slot, i| slot[i] += 1);

        let mut total = vec![0u64; 10];
        local.reduce_into(&mut total);
        assert_eq!(total, vec![1u64; 10]);

        // each item landed in exactly one slot
        for i in 0..10 {
            let owners = local.slots().iter().filter(|s| s[i] == 1).count();
            assert_eq!(owners, 1);
        }
    }

    #[test]
    fn test_fan_out_more_slots_than_items() {
        let mut local = ThreadLocal::with_slots(8, || vec![0.0f64; 2]);
        local.fan_out(2, |slot, i| slot[i] += 0.5);
        let mut total = vec![0.0; 2];
        local.reduce_into(&mut total);
        assert_eq!(total, vec![0.5, 0.5]);

        local.reset();
        local.reduce_into(&mut total);
        assert_eq!(total, vec![0.0, 0.0]);
    }

    #[test]
    fn test_fan_out_grows_to_pool_size() {
        let one = rayon::ThreadPoolBuilder::new().num_threads(1).build().unwrap();
        let four = rayon::ThreadPoolBuilder::new().num_threads(4).build().unwrap();

        let mut local = one.install(|| ThreadLocal::new(|| 0usize));
        assert_eq!(local.len(), 1);

        four.install(|| local.fan_out(4000, |n, _| *n += 1));
        assert_eq!(local.len(), 4);
        assert_eq!(local.slots(), &[1000, 1000, 1000, 1000]);

        // a smaller pool later keeps the existing slots
        one.install(|| local.fan_out(10, |n, _| *n += 1));
        assert_eq!(local.len(), 4);
        assert_eq!(local.slots().iter().sum::<usize>(), 4010);
    }

    #[test]
    fn test_grown_slots_start_fresh() {
        let mut local = ThreadLocal::with_slots(1, || vec![0u64; 3]);
        local.for_each_mut(|s| s[0] = 7);
        local.grow_to(3);
        assert_eq!(local.len(), 3);
        assert_eq!(local.slots()[1], vec![0, 0, 0]);
        assert_eq!(local.slots()[2], vec![0, 0, 0]);

        let mut total = vec![0u64; 3];
        local.reduce_into(&mut total);
        assert_eq!(total, vec![7, 0, 0]);
    }

    #[test]
    fn test_zero_slots_clamped() {
        let local = ThreadLocal::with_slots(0, || 0u8);
        assert_eq!(local.len(), 1);
        assert!(!local.is_empty());
    }
}
