//! Native type declarations
//!
//! A host describes each native type it exposes with a `TypeDescriptor`:
//! its fully-qualified name, optional superclass and lexically enclosing
//! type, and the methods and fields it declares, in declaration order.
//! Declaration order matters: member lookup picks the first match.
//!
//! Members are plain closures over `(receiver, args)`. The receiver is the
//! resolved parent target: an `Object` for instance access, or the type's
//! own `Type` handle for static access.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{NativeError, NativeResult};
use crate::value::{TypeHandle, Value};

/// Native method implementation: `(receiver, args) -> result`
pub type MethodFn = Arc<dyn Fn(&Value, &[Value]) -> NativeResult<Value> + Send + Sync>;

/// Native field reader: `receiver -> value`
pub type FieldGetFn = Arc<dyn Fn(&Value) -> NativeResult<Value> + Send + Sync>;

/// Native field writer: `(receiver, value)`
pub type FieldSetFn = Arc<dyn Fn(&Value, Value) -> NativeResult<()> + Send + Sync>;

/// Declared visibility of a member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Visibility {
    /// Visible to everyone, inherited by subtypes
    #[default]
    Public,
    /// Visible to subtypes only
    Protected,
    /// Visible to the declaring type only
    Private,
}

impl Visibility {
    /// Whether the member is public
    pub fn is_public(self) -> bool {
        self == Visibility::Public
    }
}

fn downcast_receiver<'a, T: Any>(receiver: &'a Value, expected: &str) -> NativeResult<&'a T> {
    receiver
        .as_object()
        .and_then(|obj| obj.downcast_ref::<T>())
        .ok_or_else(|| NativeError::WrongReceiver {
            expected: expected.to_string(),
            got: receiver.type_name().to_string(),
        })
}

// ============================================================================
// Methods
// ============================================================================

/// A declared method
#[derive(Clone)]
pub struct MethodEntry {
    name: String,
    arity: usize,
    visibility: Visibility,
    is_static: bool,
    call: MethodFn,
}

impl MethodEntry {
    /// Declare a public method taking the raw receiver
    pub fn new(
        name: impl Into<String>,
        arity: usize,
        call: impl Fn(&Value, &[Value]) -> NativeResult<Value> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            arity,
            visibility: Visibility::Public,
            is_static: false,
            call: Arc::new(call),
        }
    }

    /// Declare a public instance method on native type `T`.
    ///
    /// The receiver must be an object wrapping a `T`; anything else fails
    /// with `NativeError::WrongReceiver`.
    pub fn instance<T: Any>(
        name: impl Into<String>,
        arity: usize,
        call: impl Fn(&T, &[Value]) -> NativeResult<Value> + Send + Sync + 'static,
    ) -> Self {
        let name = name.into();
        let expected = std::any::type_name::<T>().to_string();
        Self::new(name, arity, move |receiver, args| {
            let this = downcast_receiver::<T>(receiver, &expected)?;
            call(this, args)
        })
    }

    /// Declare a public static method (the receiver is ignored)
    pub fn static_fn(
        name: impl Into<String>,
        arity: usize,
        call: impl Fn(&[Value]) -> NativeResult<Value> + Send + Sync + 'static,
    ) -> Self {
        let mut entry = Self::new(name, arity, move |_receiver, args| call(args));
        entry.is_static = true;
        entry
    }

    /// Set the declared visibility
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Mark the method private
    pub fn private(self) -> Self {
        self.with_visibility(Visibility::Private)
    }

    /// Mark the method protected
    pub fn protected(self) -> Self {
        self.with_visibility(Visibility::Protected)
    }

    /// Method name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of parameters
    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Declared visibility
    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    /// Whether the method ignores its receiver
    pub fn is_static(&self) -> bool {
        self.is_static
    }

    /// Call the method
    pub fn invoke(&self, receiver: &Value, args: &[Value]) -> NativeResult<Value> {
        (self.call)(receiver, args)
    }
}

impl fmt::Debug for MethodEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodEntry")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .field("visibility", &self.visibility)
            .field("is_static", &self.is_static)
            .finish()
    }
}

// ============================================================================
// Fields
// ============================================================================

/// A declared field
#[derive(Clone)]
pub struct FieldEntry {
    name: String,
    visibility: Visibility,
    is_static: bool,
    get: FieldGetFn,
    set: Option<FieldSetFn>,
}

impl FieldEntry {
    /// Declare a public field from raw accessors
    pub fn new(
        name: impl Into<String>,
        get: impl Fn(&Value) -> NativeResult<Value> + Send + Sync + 'static,
        set: Option<FieldSetFn>,
    ) -> Self {
        Self {
            name: name.into(),
            visibility: Visibility::Public,
            is_static: false,
            get: Arc::new(get),
            set,
        }
    }

    /// Declare a writable instance field on native type `T`
    pub fn instance<T: Any>(
        name: impl Into<String>,
        get: impl Fn(&T) -> Value + Send + Sync + 'static,
        set: impl Fn(&T, Value) -> NativeResult<()> + Send + Sync + 'static,
    ) -> Self {
        let expected = std::any::type_name::<T>().to_string();
        let expected_set = expected.clone();
        let setter: FieldSetFn = Arc::new(move |receiver, value| {
            let this = downcast_receiver::<T>(receiver, &expected_set)?;
            set(this, value)
        });
        Self::new(
            name,
            move |receiver| downcast_receiver::<T>(receiver, &expected).map(&get),
            Some(setter),
        )
    }

    /// Declare a read-only instance field on native type `T`
    pub fn instance_readonly<T: Any>(
        name: impl Into<String>,
        get: impl Fn(&T) -> Value + Send + Sync + 'static,
    ) -> Self {
        let expected = std::any::type_name::<T>().to_string();
        Self::new(
            name,
            move |receiver| downcast_receiver::<T>(receiver, &expected).map(&get),
            None,
        )
    }

    /// Declare a writable static field holding its own storage
    pub fn stored(name: impl Into<String>, initial: Value) -> Self {
        let slot = Arc::new(RwLock::new(initial));
        let write_slot = Arc::clone(&slot);
        let setter: FieldSetFn = Arc::new(move |_receiver, value| {
            *write_slot.write() = value;
            Ok(())
        });
        let mut entry = Self::new(name, move |_receiver| Ok(slot.read().clone()), Some(setter));
        entry.is_static = true;
        entry
    }

    /// Declare a read-only static field
    pub fn constant(name: impl Into<String>, value: Value) -> Self {
        let mut entry = Self::new(name, move |_receiver| Ok(value.clone()), None);
        entry.is_static = true;
        entry
    }

    /// Set the declared visibility
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Mark the field private
    pub fn private(self) -> Self {
        self.with_visibility(Visibility::Private)
    }

    /// Mark the field protected
    pub fn protected(self) -> Self {
        self.with_visibility(Visibility::Protected)
    }

    /// Field name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared visibility
    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    /// Whether the field ignores its receiver
    pub fn is_static(&self) -> bool {
        self.is_static
    }

    /// Whether the field accepts writes
    pub fn is_writable(&self) -> bool {
        self.set.is_some()
    }

    /// Read the field
    pub fn read(&self, receiver: &Value) -> NativeResult<Value> {
        (self.get)(receiver)
    }

    /// Write the field
    pub fn write(&self, receiver: &Value, value: Value) -> NativeResult<()> {
        match &self.set {
            Some(set) => set(receiver, value),
            None => Err(NativeError::ReadOnlyField(self.name.clone())),
        }
    }
}

impl fmt::Debug for FieldEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldEntry")
            .field("name", &self.name)
            .field("visibility", &self.visibility)
            .field("is_static", &self.is_static)
            .field("writable", &self.is_writable())
            .finish()
    }
}

// ============================================================================
// TypeDescriptor
// ============================================================================

/// Declaration of a native type
#[derive(Debug, Clone)]
pub struct TypeDescriptor {
    name: String,
    superclass: Option<String>,
    enclosing: Option<String>,
    methods: Vec<MethodEntry>,
    fields: Vec<FieldEntry>,
}

impl TypeDescriptor {
    /// Start declaring a type with a fully-qualified name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            superclass: None,
            enclosing: None,
            methods: Vec::new(),
            fields: Vec::new(),
        }
    }

    /// Set the superclass (public members are inherited)
    pub fn extends(mut self, superclass: impl Into<String>) -> Self {
        self.superclass = Some(superclass.into());
        self
    }

    /// Set the lexically enclosing type
    pub fn enclosed_in(mut self, enclosing: impl Into<String>) -> Self {
        self.enclosing = Some(enclosing.into());
        self
    }

    /// Declare a method
    pub fn method(mut self, method: MethodEntry) -> Self {
        self.methods.push(method);
        self
    }

    /// Declare a field
    pub fn field(mut self, field: FieldEntry) -> Self {
        self.fields.push(field);
        self
    }

    /// Fully-qualified name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Handle naming this type
    pub fn handle(&self) -> TypeHandle {
        TypeHandle::new(self.name.as_str())
    }

    /// Superclass name, if any
    pub fn superclass(&self) -> Option<&str> {
        self.superclass.as_deref()
    }

    /// Enclosing type name, if any
    pub fn enclosing(&self) -> Option<&str> {
        self.enclosing.as_deref()
    }

    /// Declared methods in declaration order
    pub fn methods(&self) -> &[MethodEntry] {
        &self.methods
    }

    /// Declared fields in declaration order
    pub fn fields(&self) -> &[FieldEntry] {
        &self.fields
    }
}
