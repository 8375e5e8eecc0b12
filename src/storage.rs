//! Append-only side storage for captured call data too large (or too
//! variable in length) to live inline in a [`crate::closure::Closure`].

use crate::backend::Backend;

/// Index into an [`ExternalStorage`] pool. The sentinel value refers to "no
/// data was registered" so callers never need an `Option<StorageId>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StorageId(i32);

impl StorageId {
    pub const NONE: StorageId = StorageId(-1);

    pub fn is_none(&self) -> bool {
        self.0 < 0
    }
}

/// Holds the out-of-line data referenced by captured closures: deduplicated
/// wait-event lists, fill patterns, copy regions, and cloned kernel
/// extension chains.
///
/// Registration is append-only: once a `StorageId` is handed out, the data
/// behind it never moves or is mutated, so closures may freely copy the id
/// around without invalidating earlier references.
pub struct ExternalStorage<B: Backend> {
    wait_events: Vec<Vec<B::Event>>,
    byte_blobs: Vec<Vec<u8>>,
    kernel_clones: Vec<Vec<B::Kernel>>,
}

impl<B: Backend> ExternalStorage<B> {
    pub fn new() -> Self {
        ExternalStorage {
            wait_events: Vec::new(),
            byte_blobs: Vec::new(),
            kernel_clones: Vec::new(),
        }
    }

    /// Registers a wait-event list, deduplicating against every list already
    /// registered. An empty slice never touches storage and always returns
    /// [`StorageId::NONE`].
    pub fn register_wait_events(&mut self, waits: &[B::Event]) -> StorageId {
        if waits.is_empty() {
            return StorageId::NONE;
        }
        if let Some(idx) = self
            .wait_events
            .iter()
            .position(|existing| existing.as_slice() == waits)
        {
            return StorageId(idx as i32);
        }
        self.wait_events.push(waits.to_vec());
        StorageId((self.wait_events.len() - 1) as i32)
    }

    pub fn wait_events(&self, id: StorageId) -> &[B::Event] {
        if id.is_none() {
            &[]
        } else {
            &self.wait_events[id.0 as usize]
        }
    }

    /// Registers a raw byte blob (fill patterns, packed region descriptors).
    /// Not deduplicated: identical patterns captured at different call
    /// sites are expected to be common and cheap to store twice rather than
    /// compared on every append.
    pub fn register_bytes(&mut self, data: &[u8]) -> StorageId {
        if data.is_empty() {
            return StorageId::NONE;
        }
        self.byte_blobs.push(data.to_vec());
        StorageId((self.byte_blobs.len() - 1) as i32)
    }

    pub fn bytes(&self, id: StorageId) -> &[u8] {
        if id.is_none() {
            &[]
        } else {
            &self.byte_blobs[id.0 as usize]
        }
    }

    /// Registers a clone of a kernel's extension chain taken at capture
    /// time, so replay observes the kernel state as it was when appended
    /// rather than however it has mutated since.
    pub fn register_kernel_clones(&mut self, kernels: &[B::Kernel]) -> StorageId {
        if kernels.is_empty() {
            return StorageId::NONE;
        }
        self.kernel_clones.push(kernels.to_vec());
        StorageId((self.kernel_clones.len() - 1) as i32)
    }

    pub fn kernel_clones(&self, id: StorageId) -> &[B::Kernel] {
        if id.is_none() {
            &[]
        } else {
            &self.kernel_clones[id.0 as usize]
        }
    }
}

impl<B: Backend> Default for ExternalStorage<B> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::support::MockBackend;

    #[test]
    fn empty_wait_list_never_touches_storage() {
        let mut storage = ExternalStorage::<MockBackend>::new();
        let id = storage.register_wait_events(&[]);
        assert!(id.is_none());
        assert!(storage.wait_events(id).is_empty());
    }

    #[test]
    fn identical_wait_lists_deduplicate() {
        let mut storage = ExternalStorage::<MockBackend>::new();
        let a = storage.register_wait_events(&[1, 2]);
        let b = storage.register_wait_events(&[1, 2]);
        let c = storage.register_wait_events(&[2, 1]);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
