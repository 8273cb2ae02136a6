//! In-process foreign runtime.
//!
//! [`LoopbackRuntime`] implements [`ForeignRuntime`] without a VM. It keeps
//! a table of declared methods, records every invocation with its decoded
//! arguments, and counts live local and global references so callers can
//! check that nothing leaks.
//!
//! ```rust,ignore
//! let runtime = Arc::new(LoopbackRuntime::new());
//! runtime.define_socket_class(DEFAULT_COUNTERPART_CLASS);
//! runtime.stub(DEFAULT_COUNTERPART_CLASS, "_getBufferedAmountID", StubReturn::Long(12));
//! ```

use std::collections::HashMap;

use parking_lot::Mutex;
use tracing::warn;

use crate::error::{Error, Result};
use crate::marshal::{
    ArrayArg, CallTarget, ForeignRuntime, ForeignValue, MethodId, MethodKind, ObjectRef,
    ResolvedMethod, ReturnKind,
};

/// Canned result for a stubbed method.
#[derive(Debug, Clone, PartialEq)]
pub enum StubReturn {
    /// Boolean result.
    Bool(bool),
    /// Int result.
    Int(i32),
    /// Long result.
    Long(i64),
    /// Float result.
    Float(f32),
    /// Double result.
    Double(f64),
    /// String result, returned as a fresh local reference.
    Text(String),
    /// Byte array result, returned as a fresh local reference.
    Bytes(Vec<u8>),
    /// Null object result.
    Null,
    /// Make the call fail as if the method threw.
    Fail(String),
}

/// An argument as the loopback runtime saw it.
#[derive(Debug, Clone, PartialEq)]
pub enum Recorded {
    /// Boolean.
    Bool(bool),
    /// Char.
    Char(u16),
    /// Byte.
    Byte(i8),
    /// Short.
    Short(i16),
    /// Int.
    Int(i32),
    /// Long.
    Long(i64),
    /// Float.
    Float(f32),
    /// Double.
    Double(f64),
    /// Null reference.
    Null,
    /// String object.
    Text(String),
    /// Byte array object.
    Bytes(Vec<u8>),
    /// Int array object.
    Ints(Vec<i32>),
    /// Long array object.
    Longs(Vec<i64>),
    /// Float array object.
    Floats(Vec<f32>),
    /// Double array object.
    Doubles(Vec<f64>),
    /// String array object.
    Strings(Vec<String>),
    /// Constructed instance, by object id.
    Instance(u64),
    /// Class object.
    Class(String),
    /// Reference that was already released.
    Dangling(u64),
}

/// One recorded call.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    /// Class the method was resolved on.
    pub class: String,
    /// Method name.
    pub method: String,
    /// Full signature the method was resolved with.
    pub signature: String,
    /// Lookup kind.
    pub kind: MethodKind,
    /// Object id of the receiver for instance calls.
    pub instance: Option<u64>,
    /// Object id created by a constructor call.
    pub created: Option<u64>,
    /// Decoded arguments.
    pub args: Vec<Recorded>,
}

#[derive(Debug)]
struct MethodDef {
    class: String,
    name: String,
    signature: String,
    kind: MethodKind,
}

#[derive(Debug)]
enum Object {
    Class(String),
    Text(String),
    Bytes(Vec<u8>),
    Ints(Vec<i32>),
    Longs(Vec<i64>),
    Floats(Vec<f32>),
    Doubles(Vec<f64>),
    Strings(Vec<String>),
    Instance,
}

#[derive(Debug, Clone, Copy)]
struct RefEntry {
    object: u64,
    global: bool,
}

#[derive(Debug, Default)]
struct LoopbackState {
    next_id: u64,
    methods: Vec<MethodDef>,
    stubs: HashMap<(String, String), StubReturn>,
    objects: HashMap<u64, Object>,
    refs: HashMap<u64, RefEntry>,
    invocations: Vec<Invocation>,
    allocation_budget: Option<usize>,
    released_globals: usize,
    invalid_releases: usize,
}

impl LoopbackState {
    fn next(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn alloc(&mut self, object: Object) -> ObjectRef {
        let id = self.next();
        self.objects.insert(id, object);
        self.new_ref(id, false)
    }

    fn new_ref(&mut self, object: u64, global: bool) -> ObjectRef {
        let raw = self.next();
        self.refs.insert(raw, RefEntry { object, global });
        ObjectRef::from_raw(raw)
    }

    fn take_allocation(&mut self) -> Result<()> {
        match self.allocation_budget.as_mut() {
            Some(0) => Err(Error::Conversion("loopback allocation budget exhausted".into())),
            Some(left) => {
                *left -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }

    fn object(&self, obj: ObjectRef) -> Option<(u64, &Object)> {
        let entry = self.refs.get(&obj.as_raw())?;
        self.objects
            .get(&entry.object)
            .map(|object| (entry.object, object))
    }

    fn method(&self, resolved: &ResolvedMethod) -> Result<&MethodDef> {
        usize::try_from(resolved.method.as_raw())
            .ok()
            .and_then(|idx| self.methods.get(idx))
            .ok_or_else(|| Error::InvalidObject(format!("unknown method id {:?}", resolved.method)))
    }

    fn record(&self, value: &ForeignValue) -> Recorded {
        match *value {
            ForeignValue::Void | ForeignValue::Object(None) => Recorded::Null,
            ForeignValue::Bool(v) => Recorded::Bool(v),
            ForeignValue::Char(v) => Recorded::Char(v),
            ForeignValue::Byte(v) => Recorded::Byte(v),
            ForeignValue::Short(v) => Recorded::Short(v),
            ForeignValue::Int(v) => Recorded::Int(v),
            ForeignValue::Long(v) => Recorded::Long(v),
            ForeignValue::Float(v) => Recorded::Float(v),
            ForeignValue::Double(v) => Recorded::Double(v),
            ForeignValue::Object(Some(obj)) => match self.object(obj) {
                None => Recorded::Dangling(obj.as_raw()),
                Some((id, object)) => match object {
                    Object::Class(name) => Recorded::Class(name.clone()),
                    Object::Text(s) => Recorded::Text(s.clone()),
                    Object::Bytes(v) => Recorded::Bytes(v.clone()),
                    Object::Ints(v) => Recorded::Ints(v.clone()),
                    Object::Longs(v) => Recorded::Longs(v.clone()),
                    Object::Floats(v) => Recorded::Floats(v.clone()),
                    Object::Doubles(v) => Recorded::Doubles(v.clone()),
                    Object::Strings(v) => Recorded::Strings(v.clone()),
                    Object::Instance => Recorded::Instance(id),
                },
            },
        }
    }

    fn release(&mut self, obj: ObjectRef, global: bool) -> bool {
        match self.refs.get(&obj.as_raw()) {
            Some(entry) if entry.global == global => {
                self.refs.remove(&obj.as_raw());
                true
            }
            _ => {
                self.invalid_releases += 1;
                false
            }
        }
    }
}

/// A [`ForeignRuntime`] living entirely in this process.
#[derive(Debug, Default)]
pub struct LoopbackRuntime {
    state: Mutex<LoopbackState>,
}

impl LoopbackRuntime {
    /// Create an empty runtime with no declared methods.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a method so it can be resolved.
    pub fn define_method(&self, class: &str, name: &str, signature: &str, kind: MethodKind) {
        self.state.lock().methods.push(MethodDef {
            class: class.to_owned(),
            name: name.to_owned(),
            signature: signature.to_owned(),
            kind,
        });
    }

    /// Declare the socket counterpart surface on `class`.
    pub fn define_socket_class(&self, class: &str) {
        const STRING: &str = "Ljava/lang/String;";
        self.define_method(
            class,
            "<init>",
            "(JJ[Ljava/lang/String;ZZJ)V",
            MethodKind::Constructor,
        );
        self.define_method(
            class,
            "_connect",
            &format!("({STRING}{STRING}{STRING})V"),
            MethodKind::Instance,
        );
        self.define_method(class, "_send", &format!("({STRING})V"), MethodKind::Instance);
        self.define_method(class, "_send", "([B)V", MethodKind::Instance);
        self.define_method(class, "_close", &format!("(I{STRING})V"), MethodKind::Instance);
        self.define_method(class, "_getBufferedAmountID", "()J", MethodKind::Instance);
        self.define_method(class, "_removeHandler", "()V", MethodKind::Instance);
    }

    /// Set the result of every later call to `class.method`.
    pub fn stub(&self, class: &str, method: &str, result: StubReturn) {
        self.state
            .lock()
            .stubs
            .insert((class.to_owned(), method.to_owned()), result);
    }

    /// Let `count` more string or array allocations succeed, then fail the
    /// rest.
    pub fn fail_allocations_after(&self, count: usize) {
        self.state.lock().allocation_budget = Some(count);
    }

    /// All recorded invocations, in call order.
    #[must_use]
    pub fn invocations(&self) -> Vec<Invocation> {
        self.state.lock().invocations.clone()
    }

    /// Recorded invocations of methods named `method`.
    #[must_use]
    pub fn invocations_of(&self, method: &str) -> Vec<Invocation> {
        self.state
            .lock()
            .invocations
            .iter()
            .filter(|inv| inv.method == method)
            .cloned()
            .collect()
    }

    /// Number of recorded invocations of methods named `method`.
    #[must_use]
    pub fn count(&self, method: &str) -> usize {
        self.state
            .lock()
            .invocations
            .iter()
            .filter(|inv| inv.method == method)
            .count()
    }

    /// Forget recorded invocations.
    pub fn clear_invocations(&self) {
        self.state.lock().invocations.clear();
    }

    /// Object id behind a live reference, if it is a constructed instance.
    #[must_use]
    pub fn instance_of(&self, obj: ObjectRef) -> Option<u64> {
        let state = self.state.lock();
        match state.object(obj) {
            Some((id, Object::Instance)) => Some(id),
            _ => None,
        }
    }

    /// Number of live local references.
    #[must_use]
    pub fn live_local_refs(&self) -> usize {
        self.state.lock().refs.values().filter(|e| !e.global).count()
    }

    /// Number of live global references.
    #[must_use]
    pub fn live_global_refs(&self) -> usize {
        self.state.lock().refs.values().filter(|e| e.global).count()
    }

    /// Number of global references released so far.
    #[must_use]
    pub fn released_global_refs(&self) -> usize {
        self.state.lock().released_globals
    }

    /// Number of release calls for references that were not live.
    #[must_use]
    pub fn invalid_releases(&self) -> usize {
        self.state.lock().invalid_releases
    }
}

impl ForeignRuntime for LoopbackRuntime {
    fn resolve(
        &self,
        class: &str,
        method: &str,
        signature: &str,
        kind: MethodKind,
    ) -> Result<ResolvedMethod> {
        let mut state = self.state.lock();
        let idx = state
            .methods
            .iter()
            .position(|m| {
                m.class == class && m.name == method && m.signature == signature && m.kind == kind
            })
            .ok_or_else(|| Error::MethodNotFound {
                class: class.to_owned(),
                method: method.to_owned(),
                signature: signature.to_owned(),
            })?;
        let class_ref = state.alloc(Object::Class(class.to_owned()));
        Ok(ResolvedMethod {
            class: class_ref,
            method: MethodId::from_raw(idx as u64),
            kind,
        })
    }

    fn new_string(&self, value: &str) -> Result<ObjectRef> {
        let mut state = self.state.lock();
        state.take_allocation()?;
        Ok(state.alloc(Object::Text(value.to_owned())))
    }

    fn new_array(&self, array: &ArrayArg<'_>) -> Result<ObjectRef> {
        let mut state = self.state.lock();
        state.take_allocation()?;
        let object = match array {
            ArrayArg::Byte(v) => Object::Bytes(v.to_vec()),
            ArrayArg::Int(v) => Object::Ints(v.to_vec()),
            ArrayArg::Long(v) => Object::Longs(v.to_vec()),
            ArrayArg::Float(v) => Object::Floats(v.to_vec()),
            ArrayArg::Double(v) => Object::Doubles(v.to_vec()),
        };
        Ok(state.alloc(object))
    }

    fn new_string_array(&self, items: &[String]) -> Result<ObjectRef> {
        let mut state = self.state.lock();
        state.take_allocation()?;
        Ok(state.alloc(Object::Strings(items.to_vec())))
    }

    fn construct(&self, method: &ResolvedMethod, args: &[ForeignValue]) -> Result<ObjectRef> {
        let mut state = self.state.lock();
        let def = state.method(method)?;
        if def.kind != MethodKind::Constructor {
            return Err(Error::InvalidObject(format!("{} is not a constructor", def.name)));
        }
        let (class, name, signature) = (def.class.clone(), def.name.clone(), def.signature.clone());
        let recorded = args.iter().map(|a| state.record(a)).collect();

        let obj = state.alloc(Object::Instance);
        let created = state.object(obj).map(|(id, _)| id);
        state.invocations.push(Invocation {
            class,
            method: name,
            signature,
            kind: MethodKind::Constructor,
            instance: None,
            created,
            args: recorded,
        });
        Ok(obj)
    }

    fn invoke(
        &self,
        target: CallTarget,
        method: &ResolvedMethod,
        ret: ReturnKind,
        args: &[ForeignValue],
    ) -> Result<ForeignValue> {
        let mut state = self.state.lock();
        let def = state.method(method)?;
        let (class, name, signature, kind) = (
            def.class.clone(),
            def.name.clone(),
            def.signature.clone(),
            def.kind,
        );

        let instance = match target {
            CallTarget::Static => None,
            CallTarget::Instance(obj) => match state.object(obj) {
                Some((id, Object::Instance)) => Some(id),
                _ => {
                    return Err(Error::InvalidObject(format!(
                        "{class}.{name} called on dead or non-instance reference {obj}"
                    )));
                }
            },
        };

        let recorded = args.iter().map(|a| state.record(a)).collect();
        state.invocations.push(Invocation {
            class: class.clone(),
            method: name.clone(),
            signature,
            kind,
            instance,
            created: None,
            args: recorded,
        });

        let stub = state.stubs.get(&(class.clone(), name.clone())).cloned();
        let value = match stub {
            Some(StubReturn::Fail(reason)) => {
                return Err(Error::Invocation {
                    class,
                    method: name,
                    reason,
                });
            }
            Some(StubReturn::Bool(v)) => ForeignValue::Bool(v),
            Some(StubReturn::Int(v)) => ForeignValue::Int(v),
            Some(StubReturn::Long(v)) => ForeignValue::Long(v),
            Some(StubReturn::Float(v)) => ForeignValue::Float(v),
            Some(StubReturn::Double(v)) => ForeignValue::Double(v),
            Some(StubReturn::Text(s)) => ForeignValue::Object(Some(state.alloc(Object::Text(s)))),
            Some(StubReturn::Bytes(b)) => ForeignValue::Object(Some(state.alloc(Object::Bytes(b)))),
            Some(StubReturn::Null) => ForeignValue::Object(None),
            None => match ret {
                ReturnKind::Void => ForeignValue::Void,
                ReturnKind::Bool => ForeignValue::Bool(false),
                ReturnKind::Int => ForeignValue::Int(0),
                ReturnKind::Long => ForeignValue::Long(0),
                ReturnKind::Float => ForeignValue::Float(0.0),
                ReturnKind::Double => ForeignValue::Double(0.0),
                ReturnKind::String | ReturnKind::ByteArray => ForeignValue::Object(None),
            },
        };
        Ok(value)
    }

    fn read_string(&self, obj: ObjectRef) -> Result<String> {
        match self.state.lock().object(obj) {
            Some((_, Object::Text(s))) => Ok(s.clone()),
            _ => Err(Error::InvalidObject(format!("{obj} is not a string"))),
        }
    }

    fn read_byte_array(&self, obj: ObjectRef) -> Result<Vec<u8>> {
        match self.state.lock().object(obj) {
            Some((_, Object::Bytes(b))) => Ok(b.clone()),
            _ => Err(Error::InvalidObject(format!("{obj} is not a byte array"))),
        }
    }

    fn new_global_ref(&self, obj: ObjectRef) -> Result<ObjectRef> {
        let mut state = self.state.lock();
        let object = state
            .refs
            .get(&obj.as_raw())
            .map(|entry| entry.object)
            .ok_or_else(|| Error::InvalidObject(format!("{obj} is not a live reference")))?;
        Ok(state.new_ref(object, true))
    }

    fn delete_local_ref(&self, obj: ObjectRef) {
        if !self.state.lock().release(obj, false) {
            warn!(obj = %obj, "release of unknown local reference");
        }
    }

    fn delete_global_ref(&self, obj: ObjectRef) {
        let mut state = self.state.lock();
        if state.release(obj, true) {
            state.released_globals += 1;
        } else {
            warn!(obj = %obj, "release of unknown global reference");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_requires_exact_signature() {
        let runtime = LoopbackRuntime::new();
        runtime.define_method("A", "f", "(I)V", MethodKind::Static);

        assert!(runtime.resolve("A", "f", "(I)V", MethodKind::Static).is_ok());
        assert!(runtime.resolve("A", "f", "(J)V", MethodKind::Static).is_err());
        assert!(runtime.resolve("A", "f", "(I)V", MethodKind::Instance).is_err());
        assert!(runtime.resolve("B", "f", "(I)V", MethodKind::Static).is_err());
    }

    #[test]
    fn test_double_release_is_counted() {
        let runtime = LoopbackRuntime::new();
        let s = runtime.new_string("x").unwrap();
        runtime.delete_local_ref(s);
        runtime.delete_local_ref(s);
        assert_eq!(runtime.invalid_releases(), 1);
        assert_eq!(runtime.live_local_refs(), 0);
    }

    #[test]
    fn test_global_survives_local_release() {
        let runtime = LoopbackRuntime::new();
        let local = runtime.new_string("x").unwrap();
        let global = runtime.new_global_ref(local).unwrap();
        runtime.delete_local_ref(local);
        assert_eq!(runtime.read_string(global).unwrap(), "x");
        runtime.delete_global_ref(global);
        assert_eq!(runtime.released_global_refs(), 1);
        assert!(runtime.read_string(global).is_err());
    }

    #[test]
    fn test_socket_class_surface() {
        let runtime = LoopbackRuntime::new();
        runtime.define_socket_class("S");
        for (name, sig, kind) in [
            ("<init>", "(JJ[Ljava/lang/String;ZZJ)V", MethodKind::Constructor),
            ("_send", "([B)V", MethodKind::Instance),
            ("_send", "(Ljava/lang/String;)V", MethodKind::Instance),
            ("_close", "(ILjava/lang/String;)V", MethodKind::Instance),
            ("_getBufferedAmountID", "()J", MethodKind::Instance),
            ("_removeHandler", "()V", MethodKind::Instance),
        ] {
            assert!(runtime.resolve("S", name, sig, kind).is_ok(), "{name}{sig}");
        }
    }

    #[test]
    fn test_unstubbed_returns_neutral() {
        let runtime = LoopbackRuntime::new();
        runtime.define_method("A", "n", "()J", MethodKind::Static);
        let m = runtime.resolve("A", "n", "()J", MethodKind::Static).unwrap();
        let value = runtime
            .invoke(CallTarget::Static, &m, ReturnKind::Long, &[])
            .unwrap();
        assert_eq!(value, ForeignValue::Long(0));
        runtime.delete_local_ref(m.class);
        assert_eq!(runtime.live_local_refs(), 0);
    }
}
