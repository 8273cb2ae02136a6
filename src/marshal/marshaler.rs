//! Typed remote invocation.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, error};

use super::frame::LocalFrame;
use super::global::GlobalRef;
use super::runtime::{CallTarget, ForeignRuntime, MethodKind};
use super::signature::{CONSTRUCTOR_NAME, method_signature};
use super::value::{Arg, ForeignValue, ObjectRef, ReturnKind};
use crate::error::{Error, Result};

mod sealed {
    pub trait Sealed {}
}

/// Native types a marshaled call can return.
///
/// The implementing type picks the return code of the derived signature.
/// Its `Default` value is the neutral result reported when a call fails.
pub trait ReturnType: Default + sealed::Sealed + Sized {
    /// Return kind used for signature derivation and invocation.
    const KIND: ReturnKind;

    /// Decode the raw foreign result. Object results are tracked in `frame`
    /// so they are released with the call's other references.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Conversion`] if the runtime produced a value of the
    /// wrong kind.
    fn decode(value: ForeignValue, frame: &mut LocalFrame<'_>) -> Result<Self>;
}

fn unexpected(expected: ReturnKind, got: ForeignValue) -> Error {
    Error::Conversion(format!(
        "expected {expected:?} result, runtime returned {}",
        got.kind_name()
    ))
}

macro_rules! primitive_return {
    ($ty:ty, $kind:ident, $variant:ident) => {
        impl sealed::Sealed for $ty {}
        impl ReturnType for $ty {
            const KIND: ReturnKind = ReturnKind::$kind;

            fn decode(value: ForeignValue, _frame: &mut LocalFrame<'_>) -> Result<Self> {
                match value {
                    ForeignValue::$variant(v) => Ok(v),
                    other => Err(unexpected(Self::KIND, other)),
                }
            }
        }
    };
}

primitive_return!(bool, Bool, Bool);
primitive_return!(i32, Int, Int);
primitive_return!(i64, Long, Long);
primitive_return!(f32, Float, Float);
primitive_return!(f64, Double, Double);

impl sealed::Sealed for () {}
impl ReturnType for () {
    const KIND: ReturnKind = ReturnKind::Void;

    fn decode(_value: ForeignValue, _frame: &mut LocalFrame<'_>) -> Result<Self> {
        Ok(())
    }
}

impl sealed::Sealed for String {}
impl ReturnType for String {
    const KIND: ReturnKind = ReturnKind::String;

    fn decode(value: ForeignValue, frame: &mut LocalFrame<'_>) -> Result<Self> {
        match value {
            ForeignValue::Object(None) => Ok(String::new()),
            ForeignValue::Object(Some(obj)) => {
                let obj = frame.track(obj);
                frame.runtime().read_string(obj)
            }
            other => Err(unexpected(Self::KIND, other)),
        }
    }
}

impl sealed::Sealed for Vec<u8> {}
impl ReturnType for Vec<u8> {
    const KIND: ReturnKind = ReturnKind::ByteArray;

    fn decode(value: ForeignValue, frame: &mut LocalFrame<'_>) -> Result<Self> {
        match value {
            ForeignValue::Object(None) => Ok(Vec::new()),
            ForeignValue::Object(Some(obj)) => {
                let obj = frame.track(obj);
                frame.runtime().read_byte_array(obj)
            }
            other => Err(unexpected(Self::KIND, other)),
        }
    }
}

macro_rules! named_calls {
    ($($instance:ident, $static:ident => $ret:ty;)*) => {
        $(
            #[doc = concat!("Instance call returning `", stringify!($ret), "`, or neutral.")]
            pub fn $instance(
                &self,
                obj: ObjectRef,
                class: &str,
                method: &str,
                args: &[Arg<'_>],
            ) -> $ret {
                self.call::<$ret>(CallTarget::Instance(obj), class, method, args)
            }

            #[doc = concat!("Static call returning `", stringify!($ret), "`, or neutral.")]
            pub fn $static(&self, class: &str, method: &str, args: &[Arg<'_>]) -> $ret {
                self.call::<$ret>(CallTarget::Static, class, method, args)
            }
        )*
    };
}

/// Invokes foreign methods from statically-typed argument lists.
///
/// Each call derives the signature from its arguments and return type,
/// resolves the method fresh, converts the arguments, invokes, decodes the
/// result and releases every transient reference it created.
///
/// The `try_*` methods report failures as [`Error`]. The plain methods log
/// the failure with its class, method and signature and return the neutral
/// value (`false`, `0`, empty string, `None`) instead.
///
/// # Example
///
/// ```rust,ignore
/// let marshaler = CallMarshaler::new(runtime);
/// let queued: i64 = marshaler.call(CallTarget::Instance(obj), CLASS, "_getBufferedAmountID", &[]);
/// marshaler.call::<()>(CallTarget::Instance(obj), CLASS, "_send", &[Arg::from("hello")]);
/// ```
#[derive(Clone)]
pub struct CallMarshaler {
    runtime: Arc<dyn ForeignRuntime>,
}

impl CallMarshaler {
    /// Create a marshaler over `runtime`.
    pub fn new(runtime: Arc<dyn ForeignRuntime>) -> Self {
        Self { runtime }
    }

    /// The runtime calls are issued against.
    #[must_use]
    pub fn runtime(&self) -> &Arc<dyn ForeignRuntime> {
        &self.runtime
    }

    /// Invoke `class.method` on `target`, returning `R`.
    ///
    /// # Errors
    ///
    /// - [`Error::MethodNotFound`] if resolution fails; nothing is invoked.
    /// - [`Error::Invocation`] if the foreign method fails.
    /// - [`Error::Conversion`] if an argument or the result cannot be converted.
    pub fn try_call<R: ReturnType>(
        &self,
        target: CallTarget,
        class: &str,
        method: &str,
        args: &[Arg<'_>],
    ) -> Result<R> {
        let signature = method_signature(args, R::KIND);
        let mut frame = LocalFrame::new(self.runtime.as_ref());

        let resolved = self
            .runtime
            .resolve(class, method, &signature, target.method_kind())?;
        frame.track(resolved.class);

        let values = frame.convert_all(args)?;
        let raw = self.runtime.invoke(target, &resolved, R::KIND, &values)?;
        R::decode(raw, &mut frame)
    }

    /// Invoke `class.method` on `target`, logging failures and returning the
    /// neutral value for `R`.
    pub fn call<R: ReturnType>(
        &self,
        target: CallTarget,
        class: &str,
        method: &str,
        args: &[Arg<'_>],
    ) -> R {
        self.try_call(target, class, method, args).unwrap_or_else(|err| {
            report(class, method, &method_signature(args, R::KIND), &err);
            R::default()
        })
    }

    /// Invoke the static method `class.method`.
    ///
    /// # Errors
    ///
    /// Same as [`try_call`](Self::try_call).
    pub fn try_call_static<R: ReturnType>(
        &self,
        class: &str,
        method: &str,
        args: &[Arg<'_>],
    ) -> Result<R> {
        self.try_call(CallTarget::Static, class, method, args)
    }

    /// Invoke the static method `class.method`, returning the neutral value
    /// on failure.
    pub fn call_static<R: ReturnType>(&self, class: &str, method: &str, args: &[Arg<'_>]) -> R {
        self.call(CallTarget::Static, class, method, args)
    }

    named_calls! {
        call_void, call_static_void => ();
        call_bool, call_static_bool => bool;
        call_int, call_static_int => i32;
        call_long, call_static_long => i64;
        call_float, call_static_float => f32;
        call_double, call_static_double => f64;
        call_string, call_static_string => String;
        call_byte_array, call_static_byte_array => Vec<u8>;
    }

    /// Construct a `class` instance and take a global reference to it.
    ///
    /// # Errors
    ///
    /// - [`Error::MethodNotFound`] if no constructor matches the arguments.
    /// - [`Error::Invocation`] if the constructor fails.
    pub fn try_new_object(&self, class: &str, args: &[Arg<'_>]) -> Result<GlobalRef> {
        let signature = method_signature(args, ReturnKind::Void);
        let mut frame = LocalFrame::new(self.runtime.as_ref());

        let resolved =
            self.runtime
                .resolve(class, CONSTRUCTOR_NAME, &signature, MethodKind::Constructor)?;
        frame.track(resolved.class);

        let values = frame.convert_all(args)?;
        let local = frame.track(self.runtime.construct(&resolved, &values)?);
        let global = GlobalRef::promote(Arc::clone(&self.runtime), local)?;
        debug!(
            class,
            signature = %signature,
            obj = %global.as_object(),
            "constructed foreign object"
        );
        Ok(global)
    }

    /// Construct a `class` instance, returning `None` on failure.
    pub fn new_object(&self, class: &str, args: &[Arg<'_>]) -> Option<GlobalRef> {
        self.try_new_object(class, args)
            .map_err(|err| {
                report(
                    class,
                    CONSTRUCTOR_NAME,
                    &method_signature(args, ReturnKind::Void),
                    &err,
                );
            })
            .ok()
    }
}

fn report(class: &str, method: &str, signature: &str, err: &Error) {
    if err.is_resolution_failure() {
        error!(class, method, signature, "failed to find foreign method");
    } else {
        error!(class, method, signature, error = %err, "foreign call failed");
    }
}

impl fmt::Debug for CallMarshaler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallMarshaler").finish_non_exhaustive()
    }
}
