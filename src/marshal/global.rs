//! Exclusively-owned global references.

use std::fmt;
use std::sync::Arc;

use tracing::trace;

use super::runtime::ForeignRuntime;
use super::value::ObjectRef;

/// A global reference to a foreign object, released exactly once on drop.
///
/// `GlobalRef` is deliberately not `Clone`: ownership moves, it is never
/// duplicated.
pub struct GlobalRef {
    runtime: Arc<dyn ForeignRuntime>,
    obj: ObjectRef,
}

impl GlobalRef {
    /// Take ownership of an existing global reference.
    pub fn from_raw(runtime: Arc<dyn ForeignRuntime>, obj: ObjectRef) -> Self {
        Self { runtime, obj }
    }

    /// Promote a local reference to a global one.
    ///
    /// The local reference is left untouched; the caller still releases it.
    ///
    /// # Errors
    ///
    /// Returns the runtime's error if the reference cannot be promoted.
    pub fn promote(runtime: Arc<dyn ForeignRuntime>, local: ObjectRef) -> crate::Result<Self> {
        let obj = runtime.new_global_ref(local)?;
        Ok(Self { runtime, obj })
    }

    /// The referenced object, valid for as long as `self` lives.
    #[must_use]
    pub fn as_object(&self) -> ObjectRef {
        self.obj
    }
}

impl Drop for GlobalRef {
    fn drop(&mut self) {
        trace!(obj = %self.obj, "releasing global reference");
        self.runtime.delete_global_ref(self.obj);
    }
}

impl fmt::Debug for GlobalRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("GlobalRef").field(&self.obj).finish()
    }
}
