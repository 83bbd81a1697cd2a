use std::collections::VecDeque;
use std::sync::RwLock;

use crate::error::HandleError;
use crate::handle::{Handle, HandleKind, MAX_GENERATION};

/// Recycling is delayed until at least this many slots are free. Keeps
/// handle indices from being reused immediately, which makes use-after-free
/// show up as an `InvalidHandle` instead of silently aliasing a new
/// resource.
const MIN_FREE_HANDLES: usize = 1024;

struct Entry<T> {
    payload: Option<T>,
    generation: u16,
}

struct Inner<T> {
    entries: Vec<Entry<T>>,
    free_list: VecDeque<Handle<T>>,
}

/// Insertion-order bag of resources addressed by generational handles.
///
/// `HandleTable` never hands out references to its payloads; access goes
/// through [`HandleTable::with`]/[`HandleTable::with_mut`] closures so
/// borrows cannot escape the lock.
///
/// Thread safe.
pub struct HandleTable<T: HandleKind> {
    inner: RwLock<Inner<T>>,
    name: &'static str,
}

impl<T: HandleKind> HandleTable<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            inner: RwLock::new(Inner {
                entries: Vec::new(),
                free_list: VecDeque::new(),
            }),
            name,
        }
    }

    pub fn add(&self, payload: T) -> Handle<T> {
        let mut inner = self.inner.write().unwrap();

        if inner.free_list.len() < MIN_FREE_HANDLES {
            let index = inner.entries.len() as u64;
            inner.entries.push(Entry {
                payload: Some(payload),
                generation: 0,
            });
            Handle::new(index, 0)
        } else {
            let old_handle = inner.free_list.pop_front().unwrap();
            let new_handle = Handle::new(old_handle.index(), old_handle.generation() + 1);
            let entry = &mut inner.entries[new_handle.index() as usize];
            debug_assert_eq!(entry.generation as u64, new_handle.generation());
            entry.payload = Some(payload);
            new_handle
        }
    }

    /// Returns the payload if the handle was live, otherwise `None`.
    pub fn destroy(&self, handle: Handle<T>) -> Option<T> {
        let mut inner = self.inner.write().unwrap();

        let index = handle.index() as usize;
        assert!(index < inner.entries.len());

        let entry = &mut inner.entries[index];
        let is_valid =
            (entry.generation as u64) == handle.generation() && entry.payload.is_some();
        if is_valid {
            let payload = entry.payload.take();
            entry.generation = entry.generation.wrapping_add(1);

            // Slots whose generation is about to saturate are retired.
            if (handle.generation() + 1) < (MAX_GENERATION - 1) {
                inner.free_list.push_back(handle);
            }

            payload
        } else {
            None
        }
    }

    /// Returns true if the handle addresses a live payload.
    pub fn is_valid(&self, handle: Handle<T>) -> bool {
        if handle.is_null() {
            return false;
        }

        let inner = self.inner.read().unwrap();
        inner
            .entries
            .get(handle.index() as usize)
            .map(|entry| {
                (entry.generation as u64) == handle.generation() && entry.payload.is_some()
            })
            .unwrap_or(false)
    }

    /// Executes `func` with the payload behind `handle`. The closure only
    /// runs when the handle is live.
    ///
    /// ```ignore
    /// buffers.with(handle, |buffer| buffer.size())?;
    /// ```
    pub fn with<R, F: FnOnce(&T) -> R>(
        &self,
        handle: Handle<T>,
        func: F,
    ) -> Result<R, HandleError> {
        if handle.is_null() {
            return Err(HandleError::NullHandle);
        }

        let inner = self.inner.read().unwrap();
        let entry = inner
            .entries
            .get(handle.index() as usize)
            .ok_or(HandleError::InvalidHandle)?;

        if (entry.generation as u64) == handle.generation() {
            if let Some(payload) = entry.payload.as_ref() {
                return Ok(func(payload));
            }
        }
        Err(HandleError::InvalidHandle)
    }

    /// @see [`HandleTable::with`]
    pub fn with_mut<R, F: FnOnce(&mut T) -> R>(
        &self,
        handle: Handle<T>,
        func: F,
    ) -> Result<R, HandleError> {
        if handle.is_null() {
            return Err(HandleError::NullHandle);
        }

        let mut inner = self.inner.write().unwrap();
        let entry = inner
            .entries
            .get_mut(handle.index() as usize)
            .ok_or(HandleError::InvalidHandle)?;

        if (entry.generation as u64) == handle.generation() {
            if let Some(payload) = entry.payload.as_mut() {
                return Ok(func(payload));
            }
        }
        Err(HandleError::InvalidHandle)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn count_live(&self) -> usize {
        let inner = self.inner.read().unwrap();
        inner
            .entries
            .iter()
            .filter(|entry| entry.payload.is_some())
            .count()
    }
}

impl<T: HandleKind> Drop for HandleTable<T> {
    fn drop(&mut self) {
        let count = self.count_live();
        if count > 0 {
            tracing::warn!("Leaked {} `{}` resources.", count, self.name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::HandleType;

    #[derive(Debug, PartialEq)]
    struct TestData {
        value: i32,
    }
    impl HandleKind for TestData {
        const HANDLE_TYPE: HandleType = HandleType::Buffer;
    }

    #[test]
    fn test_add_is_valid() {
        let table = HandleTable::new("test");
        let handle = table.add(TestData { value: 42 });
        assert!(table.is_valid(handle));
        assert_eq!(table.with(handle, |data| data.value).unwrap(), 42);
    }

    #[test]
    fn test_destroy_invalidates() {
        let table = HandleTable::new("test");
        let handle = table.add(TestData { value: 42 });
        assert_eq!(table.destroy(handle), Some(TestData { value: 42 }));
        assert!(!table.is_valid(handle));
        assert_eq!(
            table.with(handle, |data| data.value),
            Err(HandleError::InvalidHandle)
        );
        // Second destroy of the same handle is a no-op.
        assert_eq!(table.destroy(handle), None);
    }

    #[test]
    fn test_destroy_leaves_others_alive() {
        let table = HandleTable::new("test");
        let a = table.add(TestData { value: 1 });
        let b = table.add(TestData { value: 2 });
        table.destroy(a);
        assert!(!table.is_valid(a));
        assert!(table.is_valid(b));
        assert_eq!(table.with(b, |data| data.value).unwrap(), 2);
    }

    #[test]
    fn test_null_handle_rejected() {
        let table: HandleTable<TestData> = HandleTable::new("test");
        let null = Handle::<TestData>::null();
        assert!(!table.is_valid(null));
        assert_eq!(
            table.with(null, |data| data.value),
            Err(HandleError::NullHandle)
        );
    }

    #[test]
    fn test_no_reuse_below_min_free() {
        let table = HandleTable::new("test");
        let handles: Vec<_> = (0..100).map(|i| table.add(TestData { value: i })).collect();
        for handle in &handles {
            table.destroy(*handle);
        }
        // Fewer than MIN_FREE_HANDLES destroys: indices keep appending.
        let fresh = table.add(TestData { value: -1 });
        assert_eq!(fresh.index(), 100);
        assert_eq!(fresh.generation(), 0);
    }

    #[test]
    fn test_reuse_after_min_free_bumps_generation() {
        let table = HandleTable::new("test");
        let handles: Vec<_> = (0..MIN_FREE_HANDLES as i32)
            .map(|i| table.add(TestData { value: i }))
            .collect();
        for handle in &handles {
            table.destroy(*handle);
        }
        // The free list reached the threshold: inserts now recycle FIFO.
        let recycled = table.add(TestData { value: -1 });
        assert_eq!(recycled.index(), handles[0].index());
        assert_eq!(recycled.generation(), handles[0].generation() + 1);
        assert!(table.is_valid(recycled));
        assert!(!table.is_valid(handles[0]));
    }
}
