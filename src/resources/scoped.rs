//! Owning slot for GPU resources with deterministic release.

use crate::types::ResourceId;

/// Common surface of resources that can live in a [`ScopedGpuResource`].
pub trait GpuResource {
    /// Short resource kind used in log lines.
    const KIND: &'static str;

    /// Device-unique identifier.
    fn id(&self) -> ResourceId;

    /// Debug label, if any.
    fn label(&self) -> Option<&str>;
}

/// A slot that owns at most one GPU resource.
///
/// The previous occupant is released *before* a new one is stored, and the
/// slot releases whatever it holds when dropped. Releasing an empty slot is a
/// no-op, so teardown paths can call [`release`](Self::release) freely.
pub struct ScopedGpuResource<T: GpuResource> {
    inner: Option<T>,
}

impl<T: GpuResource> ScopedGpuResource<T> {
    /// An empty slot.
    pub fn empty() -> Self {
        Self { inner: None }
    }

    /// A slot holding `resource`.
    pub fn new(resource: T) -> Self {
        Self {
            inner: Some(resource),
        }
    }

    /// Whether the slot currently holds a resource.
    pub fn is_allocated(&self) -> bool {
        self.inner.is_some()
    }

    /// Borrow the held resource.
    pub fn get(&self) -> Option<&T> {
        self.inner.as_ref()
    }

    /// Release the current occupant, then store `resource`.
    pub fn replace(&mut self, resource: T) -> &T {
        let _ = self.release();
        self.inner.insert(resource)
    }

    /// Release the held resource now.
    ///
    /// Returns `true` if something was released.
    pub fn release(&mut self) -> bool {
        match self.inner.take() {
            Some(resource) => {
                log::trace!(
                    "ScopedGpuResource: releasing {} {} {:?}",
                    T::KIND,
                    resource.id(),
                    resource.label()
                );
                drop(resource);
                true
            }
            None => false,
        }
    }

    /// Exchange occupants with another slot without touching GPU memory.
    pub fn swap(&mut self, other: &mut Self) {
        std::mem::swap(&mut self.inner, &mut other.inner);
    }
}

impl<T: GpuResource> Default for ScopedGpuResource<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: GpuResource> Drop for ScopedGpuResource<T> {
    fn drop(&mut self) {
        let _ = self.release();
    }
}

impl<T: GpuResource + std::fmt::Debug> std::fmt::Debug for ScopedGpuResource<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ScopedGpuResource").field(&self.inner).finish()
    }
}
