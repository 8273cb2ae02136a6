//! Call-scoped tracking of transient foreign references.

use tracing::trace;

use super::runtime::ForeignRuntime;
use super::value::{Arg, ForeignValue, ObjectRef};
use crate::error::Result;

/// Collects the local references created for a single call and releases
/// each of them exactly once when dropped.
///
/// Dropping is the only release path, so references are freed whether the
/// call succeeded, failed, or never reached the runtime.
pub struct LocalFrame<'r> {
    runtime: &'r dyn ForeignRuntime,
    refs: Vec<ObjectRef>,
}

impl<'r> LocalFrame<'r> {
    /// Create an empty frame.
    pub fn new(runtime: &'r dyn ForeignRuntime) -> Self {
        Self {
            runtime,
            refs: Vec::new(),
        }
    }

    /// Take ownership of a local reference until the frame drops.
    pub fn track(&mut self, obj: ObjectRef) -> ObjectRef {
        self.refs.push(obj);
        obj
    }

    /// Number of references currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.refs.len()
    }

    /// Check if the frame holds no references.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }

    /// Runtime the frame releases into.
    #[must_use]
    pub fn runtime(&self) -> &'r dyn ForeignRuntime {
        self.runtime
    }

    /// Convert one argument, tracking any object it allocates.
    ///
    /// # Errors
    ///
    /// Returns the runtime's error if allocating a string or array fails.
    pub fn convert(&mut self, arg: &Arg<'_>) -> Result<ForeignValue> {
        let value = match arg {
            Arg::Bool(v) => ForeignValue::Bool(*v),
            Arg::Char(v) => ForeignValue::Char(u16::from(*v)),
            Arg::Byte(v) => ForeignValue::Byte(*v as i8),
            Arg::Short(v) => ForeignValue::Short(*v),
            Arg::Int(v) => ForeignValue::Int(*v),
            Arg::Long(v) => ForeignValue::Long(*v),
            Arg::Float(v) => ForeignValue::Float(*v),
            Arg::Double(v) => ForeignValue::Double(*v),
            Arg::Text(s) => {
                let obj = self.runtime.new_string(s)?;
                ForeignValue::Object(Some(self.track(obj)))
            }
            Arg::StringList(items) => {
                let obj = self.runtime.new_string_array(items)?;
                ForeignValue::Object(Some(self.track(obj)))
            }
            Arg::Array(array) => {
                let obj = self.runtime.new_array(array)?;
                ForeignValue::Object(Some(self.track(obj)))
            }
        };
        Ok(value)
    }

    /// Convert a whole argument list in order.
    ///
    /// # Errors
    ///
    /// Stops at the first failed conversion. References created before the
    /// failure stay tracked and are released with the frame.
    pub fn convert_all(&mut self, args: &[Arg<'_>]) -> Result<Vec<ForeignValue>> {
        args.iter().map(|arg| self.convert(arg)).collect()
    }
}

impl Drop for LocalFrame<'_> {
    fn drop(&mut self) {
        if !self.refs.is_empty() {
            trace!(count = self.refs.len(), "releasing call-scoped references");
        }
        for obj in self.refs.drain(..) {
            self.runtime.delete_local_ref(obj);
        }
    }
}

impl std::fmt::Debug for LocalFrame<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalFrame").field("refs", &self.refs).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loopback::LoopbackRuntime;

    #[test]
    fn test_scalars_allocate_nothing() {
        let runtime = LoopbackRuntime::new();
        let mut frame = LocalFrame::new(&runtime);
        let values = frame
            .convert_all(&[Arg::from(1i32), Arg::from(true), Arg::Char(b'x')])
            .unwrap();
        assert_eq!(
            values,
            vec![
                ForeignValue::Int(1),
                ForeignValue::Bool(true),
                ForeignValue::Char(u16::from(b'x')),
            ]
        );
        assert!(frame.is_empty());
    }

    #[test]
    fn test_references_released_on_drop() {
        let runtime = LoopbackRuntime::new();
        let list = vec!["a".to_string(), "b".to_string()];
        {
            let mut frame = LocalFrame::new(&runtime);
            frame
                .convert_all(&[
                    Arg::from("text"),
                    Arg::from(&list),
                    Arg::array(&[1u8, 2][..]),
                ])
                .unwrap();
            assert_eq!(frame.len(), 3);
            assert_eq!(runtime.live_local_refs(), 3);
        }
        assert_eq!(runtime.live_local_refs(), 0);
    }

    #[test]
    fn test_partial_conversion_still_released() {
        let runtime = LoopbackRuntime::new();
        runtime.fail_allocations_after(1);
        {
            let mut frame = LocalFrame::new(&runtime);
            let result = frame.convert_all(&[Arg::from("first"), Arg::from("second")]);
            assert!(result.is_err());
            assert_eq!(frame.len(), 1);
        }
        assert_eq!(runtime.live_local_refs(), 0);
    }
}
