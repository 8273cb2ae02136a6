//! Call marshaling across the runtime boundary.
//!
//! This module turns a statically-typed argument list into a foreign method
//! invocation:
//!
//! 1. **Signature** - derived from the argument types and return type
//!    ([`method_signature`]).
//! 2. **Resolution** - `(class, method, signature)` looked up fresh on every
//!    call.
//! 3. **Conversion** - each [`Arg`] becomes a [`ForeignValue`]; strings and
//!    arrays allocate foreign objects tracked by a [`LocalFrame`].
//! 4. **Cleanup** - the frame releases every transient reference when the
//!    call ends, whatever the outcome.
//!
//! ## Example
//!
//! ```rust,ignore
//! use wsbridge::marshal::{Arg, CallMarshaler};
//!
//! let marshaler = CallMarshaler::new(runtime);
//! let socket = marshaler.try_new_object(CLASS, &[Arg::from(id), Arg::from(&headers)])?;
//! ```

mod frame;
mod global;
mod marshaler;
mod runtime;
mod signature;
mod value;

pub use frame::LocalFrame;
pub use global::GlobalRef;
pub use marshaler::{CallMarshaler, ReturnType};
pub use runtime::{CallTarget, ForeignRuntime, MethodId, MethodKind, ResolvedMethod};
pub use signature::{
    CONSTRUCTOR_NAME, STRING_ARRAY_CODE, STRING_CODE, method_signature, parameter_signature,
};
pub use value::{Arg, ArrayArg, ArrayElement, ForeignValue, ObjectRef, ReturnKind};
