//! The seam between the bridge and the foreign runtime.
//!
//! Everything the bridge needs from the other side of the boundary goes
//! through [`ForeignRuntime`]. A production build implements it over the
//! host VM's native interface; [`LoopbackRuntime`](crate::loopback::LoopbackRuntime)
//! implements it in-process.

use super::value::{ArrayArg, ForeignValue, ObjectRef, ReturnKind};
use crate::error::Result;

/// How a method is looked up and invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MethodKind {
    /// Method invoked on an object.
    Instance,
    /// Class-level method.
    Static,
    /// Constructor (`<init>`).
    Constructor,
}

/// Opaque method identifier handed out by the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MethodId(u64);

impl MethodId {
    /// Wrap a raw runtime method identifier.
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw runtime method identifier.
    #[must_use]
    pub const fn as_raw(self) -> u64 {
        self.0
    }
}

/// Result of resolving a `(class, method, signature)` triple.
///
/// `class` is a local reference; the caller releases it once the call is
/// done.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedMethod {
    /// Local reference to the class that declares the method.
    pub class: ObjectRef,
    /// Method identifier.
    pub method: MethodId,
    /// Lookup kind the method was resolved with.
    pub kind: MethodKind,
}

/// Receiver of a non-constructor call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallTarget {
    /// Call on an object.
    Instance(ObjectRef),
    /// Call on the class itself.
    Static,
}

impl CallTarget {
    /// Lookup kind matching this target.
    #[must_use]
    pub const fn method_kind(&self) -> MethodKind {
        match self {
            CallTarget::Instance(_) => MethodKind::Instance,
            CallTarget::Static => MethodKind::Static,
        }
    }
}

/// Operations the bridge requires from the foreign runtime.
///
/// Implementations must be callable from any thread. References returned by
/// the `new_*` and `construct` methods are local references owned by the
/// caller until passed to [`delete_local_ref`](Self::delete_local_ref).
pub trait ForeignRuntime: Send + Sync {
    /// Resolve a method.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MethodNotFound`](crate::Error::MethodNotFound) when
    /// the class or method does not exist with this signature.
    fn resolve(
        &self,
        class: &str,
        method: &str,
        signature: &str,
        kind: MethodKind,
    ) -> Result<ResolvedMethod>;

    /// Create a foreign string.
    ///
    /// # Errors
    ///
    /// Returns an error if the runtime cannot allocate the string.
    fn new_string(&self, value: &str) -> Result<ObjectRef>;

    /// Create a primitive array and copy `array` into it.
    ///
    /// # Errors
    ///
    /// Returns an error if the runtime cannot allocate the array.
    fn new_array(&self, array: &ArrayArg<'_>) -> Result<ObjectRef>;

    /// Create a string array.
    ///
    /// # Errors
    ///
    /// Returns an error if the runtime cannot allocate the array.
    fn new_string_array(&self, items: &[String]) -> Result<ObjectRef>;

    /// Invoke a constructor and return the new object.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Invocation`](crate::Error::Invocation) if the
    /// constructor throws.
    fn construct(&self, method: &ResolvedMethod, args: &[ForeignValue]) -> Result<ObjectRef>;

    /// Invoke a method.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Invocation`](crate::Error::Invocation) if the method
    /// throws.
    fn invoke(
        &self,
        target: CallTarget,
        method: &ResolvedMethod,
        ret: ReturnKind,
        args: &[ForeignValue],
    ) -> Result<ForeignValue>;

    /// Decode a foreign string.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidObject`](crate::Error::InvalidObject) if `obj`
    /// is not a string.
    fn read_string(&self, obj: ObjectRef) -> Result<String>;

    /// Copy the contents of a foreign byte array.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidObject`](crate::Error::InvalidObject) if `obj`
    /// is not a byte array.
    fn read_byte_array(&self, obj: ObjectRef) -> Result<Vec<u8>>;

    /// Promote a reference to a global one that outlives the current call.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidObject`](crate::Error::InvalidObject) if `obj`
    /// is not a live reference.
    fn new_global_ref(&self, obj: ObjectRef) -> Result<ObjectRef>;

    /// Release a local reference.
    fn delete_local_ref(&self, obj: ObjectRef);

    /// Release a global reference.
    fn delete_global_ref(&self, obj: ObjectRef);
}
