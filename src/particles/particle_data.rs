//! Structure-of-arrays particle storage.
//!
//! `ParticleData` is the component store of an effect: one dense array per
//! attribute kind, every array exactly `capacity` long and indexed by the same
//! slot. Slots `[0, alive)` are live; the rest are dead and get reused by later
//! emissions. Arrays are allocated lazily the first time a stage requests them.

use std::any::{Any, TypeId};
use std::fmt;

use rustc_hash::FxHashMap;

use super::attributes::Attribute;

/// Type-erased view of one attribute array
trait AnyAttributeArray: Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn swap(&mut self, a: usize, b: usize);
    fn len(&self) -> usize;
    fn name(&self) -> &'static str;
}

/// Dense storage for a single attribute kind
struct AttributeArray<T> {
    values: Vec<T>,
}

impl<T: Attribute> AnyAttributeArray for AttributeArray<T> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    #[inline]
    fn swap(&mut self, a: usize, b: usize) {
        self.values.swap(a, b);
    }

    fn len(&self) -> usize {
        self.values.len()
    }

    fn name(&self) -> &'static str {
        T::NAME
    }
}

/// Fixed-capacity, lazily allocated per-attribute particle arrays
pub struct ParticleData {
    capacity: usize,
    alive: usize,
    arrays: FxHashMap<TypeId, Box<dyn AnyAttributeArray>>,
}

impl ParticleData {
    /// Create an empty store; no attribute array is allocated yet
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            alive: 0,
            arrays: FxHashMap::default(),
        }
    }

    /// Number of slots in every attribute array
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of live particles, always the prefix `[0, alive_count)`
    pub fn alive_count(&self) -> usize {
        self.alive
    }

    pub fn is_empty(&self) -> bool {
        self.alive == 0
    }

    /// Number of attribute arrays allocated so far
    pub fn allocated_arrays(&self) -> usize {
        self.arrays.len()
    }

    /// Names of the allocated attribute arrays, sorted
    pub fn array_names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.arrays.values().map(|a| a.name()).collect();
        names.sort_unstable();
        names
    }

    pub fn has_array<T: Attribute>(&self) -> bool {
        self.arrays.contains_key(&TypeId::of::<T>())
    }

    /// Return the full-length array for `T`, allocating it on first request
    ///
    /// A new array is filled with one `default()` per slot. Repeated calls
    /// return the same storage and never touch its contents.
    pub fn request_array<T: Attribute>(&mut self, mut default: impl FnMut() -> T) -> &mut [T] {
        let capacity = self.capacity;
        let array = self.arrays.entry(TypeId::of::<T>()).or_insert_with(|| {
            log::debug!(
                "[ParticleData::request_array] allocating '{}' x {}",
                T::NAME,
                capacity
            );
            let mut values = Vec::with_capacity(capacity);
            values.resize_with(capacity, &mut default);
            Box::new(AttributeArray { values }) as Box<dyn AnyAttributeArray>
        });

        // Arrays are keyed by their own TypeId, so the downcast always succeeds
        array
            .as_any_mut()
            .downcast_mut::<AttributeArray<T>>()
            .map(|a| a.values.as_mut_slice())
            .unwrap_or_default()
    }

    /// `request_array` using `T::default()` for new slots
    pub fn request_default_array<T: Attribute + Default>(&mut self) -> &mut [T] {
        self.request_array(T::default)
    }

    /// Full-length array for `T` if it was ever allocated; never allocates
    pub fn try_get_array<T: Attribute>(&self) -> Option<&[T]> {
        self.arrays
            .get(&TypeId::of::<T>())?
            .as_any()
            .downcast_ref::<AttributeArray<T>>()
            .map(|a| a.values.as_slice())
    }

    /// Mutable full-length array for `T` if it was ever allocated; never allocates
    pub fn try_get_array_mut<T: Attribute>(&mut self) -> Option<&mut [T]> {
        self.arrays
            .get_mut(&TypeId::of::<T>())?
            .as_any_mut()
            .downcast_mut::<AttributeArray<T>>()
            .map(|a| a.values.as_mut_slice())
    }

    /// The live prefix of the array for `T`, if allocated
    pub fn alive<T: Attribute>(&self) -> Option<&[T]> {
        let alive = self.alive;
        self.try_get_array::<T>().map(|values| &values[..alive])
    }

    /// Borrow several attribute arrays mutably at once
    pub fn split(&mut self) -> AttributeSplit<'_> {
        AttributeSplit {
            alive: self.alive,
            arrays: self
                .arrays
                .iter_mut()
                .map(|(id, array)| (*id, &mut **array))
                .collect(),
        }
    }

    /// Remove the particle in `index` by swapping it with the last live slot
    ///
    /// Every allocated array is swapped in lockstep so slot `i` keeps
    /// describing one particle. Killing the last live slot only moves the
    /// alive boundary. Out-of-range indices are ignored.
    pub fn kill(&mut self, index: usize) {
        if index >= self.alive {
            log::warn!(
                "[ParticleData::kill] index {} outside alive range {}",
                index,
                self.alive
            );
            return;
        }

        let last = self.alive - 1;
        if index != last {
            let capacity = self.capacity;
            for array in self.arrays.values_mut() {
                debug_assert_eq!(array.len(), capacity);
                array.swap(index, last);
            }
        }
        self.alive = last;
    }

    /// Move the alive boundary forward over `count` freshly initialized slots
    ///
    /// Returns the number of slots actually activated, clamped to capacity.
    pub fn activate(&mut self, count: usize) -> usize {
        let activated = count.min(self.capacity - self.alive);
        if activated < count {
            log::debug!(
                "[ParticleData::activate] clamped {} -> {} (capacity {})",
                count,
                activated,
                self.capacity
            );
        }
        self.alive += activated;
        activated
    }

    /// Mark every slot dead; arrays keep their storage for reuse
    pub fn reset(&mut self) {
        self.alive = 0;
    }
}

impl fmt::Debug for ParticleData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParticleData")
            .field("capacity", &self.capacity)
            .field("alive", &self.alive)
            .field("arrays", &self.array_names())
            .finish()
    }
}

/// Disjoint mutable borrows of the live prefix of several attribute arrays
///
/// Each kind can be taken at most once; a second `take` of the same kind, or a
/// kind that was never allocated, yields `None`.
pub struct AttributeSplit<'a> {
    alive: usize,
    arrays: FxHashMap<TypeId, &'a mut (dyn AnyAttributeArray + 'static)>,
}

impl<'a> AttributeSplit<'a> {
    pub fn alive_count(&self) -> usize {
        self.alive
    }

    /// Take the live prefix of the array for `T`
    pub fn take<T: Attribute>(&mut self) -> Option<&'a mut [T]> {
        let alive = self.alive;
        let array = self.arrays.remove(&TypeId::of::<T>())?;
        array
            .as_any_mut()
            .downcast_mut::<AttributeArray<T>>()
            .map(|a| &mut a.values[..alive])
    }
}
