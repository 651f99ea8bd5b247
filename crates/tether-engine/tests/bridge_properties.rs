//! Bridge Behavior Tests
//!
//! End-to-end tests driving the dispatcher with wire-format descriptors:
//! - Validation of malformed descriptors
//! - Cache precedence over parent evaluation
//! - Root, method and field resolution
//! - Arity-based lookup, inheritance and enclosing-type fallback
//! - Access policy, native failures and panics
//! - Concurrent use of one dispatcher
//!
//! # Running Tests
//! ```bash
//! cargo test -p tether-engine --test bridge_properties
//! ```

use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;
use serde_json::json;
use tether_engine::{
    AccessFlags, AccessPolicy, BridgeError, CallResult, CollectingSink, Descriptor, Dispatcher,
    Engine, MethodCall, Outcome, RootRegistry, TypeRegistry,
};
use tether_sdk::{
    arg, FieldEntry, MethodEntry, NativeError, ObjectRef, TypeDescriptor, TypeHandle, Value,
};

const GLOBAL: i64 = 0;
const TYPE: i64 = 1;
const METHOD: i64 = 2;
const FIELD: i64 = 4;

struct Gadget {
    bar: Mutex<i64>,
}

fn types() -> TypeRegistry {
    TypeRegistry::builder()
        .register(
            TypeDescriptor::new("test.Base")
                .method(MethodEntry::static_fn("describe", 0, |_| Ok(Value::from("base"))))
                .method(MethodEntry::static_fn("internal", 0, |_| Ok(Value::Null)).private()),
        )
        .register(
            TypeDescriptor::new("test.Gadget")
                .extends("test.Base")
                .method(MethodEntry::instance::<Gadget>("foo", 1, |_, args| {
                    let x: i64 = arg(args, 0)?;
                    Ok(Value::Int(x + 1))
                }))
                .method(MethodEntry::instance::<Gadget>("child", 0, |_, _| {
                    Ok(Value::Object(ObjectRef::new(
                        "test.Gadget.Part",
                        Gadget { bar: Mutex::new(100) },
                    )))
                }))
                .method(MethodEntry::instance::<Gadget>("secret", 0, |_, _| Ok(Value::Int(7))).private())
                .method(MethodEntry::instance::<Gadget>("explode", 0, |_, _| {
                    panic!("gadget exploded")
                }))
                .method(MethodEntry::instance::<Gadget>("refuse", 0, |_, _| {
                    Err(NativeError::raised("refused", "Refusal"))
                }))
                .field(FieldEntry::instance::<Gadget>(
                    "bar",
                    |g| Value::Int(*g.bar.lock()),
                    |g, v| {
                        *g.bar.lock() = v
                            .as_int()
                            .ok_or_else(|| NativeError::ArgumentError("bar is an int".into()))?;
                        Ok(())
                    },
                )),
        )
        .register(
            TypeDescriptor::new("test.Gadget.Part")
                .enclosed_in("test.Gadget")
                .field(FieldEntry::instance_readonly::<Gadget>("weight", |g| Value::Int(*g.bar.lock()))),
        )
        .register(TypeDescriptor::new("pkg.TypeName"))
        .build()
        .unwrap()
}

fn dispatcher_with(policy: AccessPolicy) -> Dispatcher {
    let gadget = ObjectRef::new("test.Gadget", Gadget { bar: Mutex::new(0) });
    let roots = RootRegistry::builder()
        .insert("G", gadget)
        .insert("Registrar", Value::from("registrar"))
        .build()
        .unwrap();
    Dispatcher::new(Engine::new(Arc::new(types()), Arc::new(roots)).with_policy(policy))
}

fn dispatcher() -> Dispatcher {
    dispatcher_with(AccessPolicy::allow_all())
}

fn invoke(d: &Dispatcher, desc: serde_json::Value) -> CallResult {
    match Descriptor::from_json(desc) {
        Ok(desc) => d.invoke(&desc),
        Err(err) => err.into(),
    }
}

fn g() -> serde_json::Value {
    json!({"n": "G", "t": GLOBAL})
}

// ===== Validation =====

#[test]
fn test_empty_name_is_validation_error() {
    let d = dispatcher();
    let result = invoke(&d, json!({"n": "", "t": GLOBAL}));
    assert_eq!(result.detail(), Some("ValidationError"));

    // descriptors built in code skip decoding; resolution still rejects them
    let err = d
        .engine()
        .resolve(&Descriptor::method(Descriptor::global("G"), ""))
        .unwrap_err();
    assert!(matches!(err, BridgeError::Validation(_)));
}

// ===== Cache Precedence =====

#[test]
fn test_cached_id_skips_invalid_parent() {
    let d = dispatcher();
    d.engine().cache().put("x", Value::from("sentinel"));

    let result = invoke(
        &d,
        json!({"n": "anything", "t": METHOD, "id": "x", "p": {"n": "no.such.Global", "t": GLOBAL}}),
    );
    assert_eq!(result, CallResult::Success(Value::from("sentinel")));
}

#[test]
fn test_invoke_and_cache_then_changed_parent() {
    let d = dispatcher();
    let keep = Descriptor::from_json(json!({"n": "child", "t": METHOD, "id": "part", "p": g()})).unwrap();
    assert_eq!(d.invoke_and_cache(&keep), CallResult::empty());

    // same id, entirely different parent chain
    let later = invoke(
        &d,
        json!({"n": "child", "t": METHOD, "id": "part", "p": {"n": "pkg.TypeName", "t": TYPE}}),
    );
    let part = later.value().and_then(Value::as_object).unwrap();
    assert_eq!(part.type_name(), "test.Gadget.Part");

    let cached = d.engine().cache().get("part").unwrap();
    assert!(cached.as_object().unwrap().ptr_eq(part));
}

#[test]
fn test_cached_target_used_as_parent() {
    let d = dispatcher();
    d.call("keep", Some(Value::try_from(json!({"n": "child", "t": METHOD, "id": "p1", "p": g()})).unwrap()))
        .unwrap();

    let weight = invoke(&d, json!({"n": "weight", "t": FIELD, "p": {"n": "ignored", "t": GLOBAL, "id": "p1"}}));
    assert_eq!(weight, CallResult::Success(Value::Int(100)));
}

// ===== Roots =====

#[test]
fn test_type_root_handles_are_equal() {
    let d = dispatcher();
    let first = invoke(&d, json!({"n": "pkg.TypeName", "t": TYPE}));
    let second = invoke(&d, json!({"n": "pkg.TypeName", "t": TYPE}));
    assert_eq!(first, second);
    assert_eq!(first.value(), Some(&Value::Type(TypeHandle::new("pkg.TypeName"))));

    let missing = invoke(&d, json!({"n": "no.such.Type", "t": TYPE}));
    assert_eq!(missing.detail(), Some("TargetNotFound"));
}

#[test]
fn test_global_root() {
    let d = dispatcher();
    let registrar = invoke(&d, json!({"n": "Registrar", "t": GLOBAL}));
    assert_eq!(registrar.value(), Some(&Value::from("registrar")));
    assert_eq!(
        invoke(&d, json!({"n": "Nobody", "t": GLOBAL})).detail(),
        Some("TargetNotFound")
    );
}

#[test]
fn test_reserved_kind_rejected() {
    let d = dispatcher();
    assert_eq!(invoke(&d, json!({"n": "G", "t": 3})).detail(), Some("UnsupportedRoot"));
    assert_eq!(
        invoke(&d, json!({"n": "x", "t": 3, "p": g()})).detail(),
        Some("UnsupportedOperation")
    );
}

// ===== Methods and Fields =====

#[test]
fn test_method_chaining() {
    let d = dispatcher();
    let result = invoke(&d, json!({"n": "foo", "t": METHOD, "a": [41], "p": g()}));
    assert_eq!(result, CallResult::Success(Value::Int(42)));

    let single = invoke(&d, json!({"n": "foo", "t": METHOD, "a": 41, "p": g()}));
    assert_eq!(single, CallResult::Success(Value::Int(42)));
}

#[test]
fn test_field_read_write() {
    let d = dispatcher();
    let read = json!({"n": "bar", "t": FIELD, "p": g()});
    assert_eq!(invoke(&d, read.clone()), CallResult::Success(Value::Int(0)));

    let write = invoke(&d, json!({"n": "bar", "t": FIELD, "a": 7, "p": g()}));
    assert_eq!(write, CallResult::empty());
    assert_eq!(invoke(&d, read), CallResult::Success(Value::Int(7)));
}

#[test]
fn test_field_write_type_error_is_invocation_failure() {
    let d = dispatcher();
    let result = invoke(&d, json!({"n": "bar", "t": FIELD, "a": "seven", "p": g()}));
    assert_eq!(result.detail(), Some("ArgumentError"));
}

#[test]
fn test_read_only_field_write() {
    let d = dispatcher();
    let part = json!({"n": "child", "t": METHOD, "p": g()});
    let result = invoke(&d, json!({"n": "weight", "t": FIELD, "a": 1, "p": part}));
    assert_eq!(result.detail(), Some("ReadOnlyField"));
}

#[test]
fn test_arity_mismatch_is_member_not_found() {
    let d = dispatcher();
    let none = invoke(&d, json!({"n": "foo", "t": METHOD, "p": g()}));
    assert_eq!(none.detail(), Some("MemberNotFound"));
    let two = invoke(&d, json!({"n": "foo", "t": METHOD, "a": [1, 2], "p": g()}));
    assert_eq!(two.detail(), Some("MemberNotFound"));
}

#[test]
fn test_inherited_public_member() {
    let d = dispatcher();
    let result = invoke(&d, json!({"n": "describe", "t": METHOD, "p": g()}));
    assert_eq!(result, CallResult::Success(Value::from("base")));

    let private = invoke(&d, json!({"n": "internal", "t": METHOD, "p": g()}));
    assert_eq!(private.detail(), Some("MemberNotFound"));
}

#[test]
fn test_enclosing_type_fallback() {
    let d = dispatcher();
    let part = json!({"n": "child", "t": METHOD, "p": g()});
    // `foo` is declared on the enclosing type, the receiver is still the part
    let result = invoke(&d, json!({"n": "foo", "t": METHOD, "a": 1, "p": part}));
    assert_eq!(result, CallResult::Success(Value::Int(2)));
}

#[test]
fn test_instance_member_on_type_handle() {
    let d = dispatcher();
    let result = invoke(
        &d,
        json!({"n": "foo", "t": METHOD, "a": 1, "p": {"n": "test.Gadget", "t": TYPE}}),
    );
    assert_eq!(result.detail(), Some("WrongReceiver"));
}

// ===== Access Policy =====

#[test]
fn test_private_member_allowed_by_default() {
    let d = dispatcher();
    let result = invoke(&d, json!({"n": "secret", "t": METHOD, "p": g()}));
    assert_eq!(result, CallResult::Success(Value::Int(7)));
}

#[test]
fn test_private_member_denied_by_policy() {
    let d = dispatcher_with(AccessPolicy::allow_all().with_rule("test.*", AccessFlags::PUBLIC_ONLY));
    let result = invoke(&d, json!({"n": "secret", "t": METHOD, "p": g()}));
    assert_eq!(result.detail(), Some("AccessDenied"));

    let public = invoke(&d, json!({"n": "foo", "t": METHOD, "a": 1, "p": g()}));
    assert!(public.is_success());
}

#[test]
fn test_field_write_denied_by_policy() {
    let policy = AccessPolicy::allow_all().with_rule(
        "test.Gadget",
        AccessFlags::READ_ALL.union(AccessFlags::INVOKE_ALL),
    );
    let d = dispatcher_with(policy);
    assert!(invoke(&d, json!({"n": "bar", "t": FIELD, "p": g()})).is_success());
    let write = invoke(&d, json!({"n": "bar", "t": FIELD, "a": 1, "p": g()}));
    assert_eq!(write.detail(), Some("AccessDenied"));
}

// ===== Native Failures =====

#[test]
fn test_native_error_forwarded() {
    let d = dispatcher();
    let result = invoke(&d, json!({"n": "refuse", "t": METHOD, "p": g()}));
    assert_eq!(result, CallResult::failure("refused", "Refusal"));
}

#[test]
fn test_panic_reported_as_failure() {
    let d = dispatcher();
    let result = invoke(&d, json!({"n": "explode", "t": METHOD, "p": g()}));
    match result {
        CallResult::Failure { message, detail } => {
            assert!(message.contains("gadget exploded"));
            assert_eq!(detail, "Panic");
        }
        other => panic!("expected failure, got {:?}", other),
    }
    // the dispatcher keeps working
    assert!(invoke(&d, json!({"n": "foo", "t": METHOD, "a": 1, "p": g()})).is_success());
}

// ===== Dispatch =====

#[test]
fn test_dispose_never_fails() {
    let d = dispatcher();
    d.dispose("nonexistent");
    let result = d.call("dispose", Some(Value::from("nonexistent"))).unwrap();
    assert_eq!(result, CallResult::empty());
}

#[test]
fn test_call_spreads_positional_list() {
    let d = dispatcher();
    let desc = Value::try_from(json!({"n": "foo", "t": METHOD, "a": 41, "p": g()})).unwrap();

    let result = d.call("invoke", Some(Value::List(vec![desc]))).unwrap();
    assert_eq!(result, CallResult::Success(Value::Int(42)));

    let keep = Value::try_from(json!({"n": "child", "t": METHOD, "id": "spread", "p": g()})).unwrap();
    let result = d.call("invokeAndCache", Some(Value::List(vec![keep]))).unwrap();
    assert_eq!(result, CallResult::empty());
    assert!(d.engine().cache().contains("spread"));

    let result = d.call("dispose", Some(Value::List(vec![Value::from("spread")]))).unwrap();
    assert_eq!(result, CallResult::empty());
    assert!(!d.engine().cache().contains("spread"));
}

#[test]
fn test_call_with_empty_list_has_no_operation() {
    let d = dispatcher();
    assert!(d.call("invoke", Some(Value::List(Vec::new()))).is_none());
    assert!(d.call("dispose", Some(Value::List(Vec::new()))).is_none());
}

#[test]
fn test_handle_reports_not_implemented() {
    let d = dispatcher();
    let mut sink = CollectingSink::default();
    d.handle(MethodCall::new("reflect", Some(Value::Null)), &mut sink);
    assert_eq!(sink.outcome, Some(Outcome::NotImplemented));

    let mut sink = CollectingSink::default();
    d.handle(MethodCall::new("dispose", None), &mut sink);
    assert_eq!(sink.outcome, Some(Outcome::NotImplemented));
}

#[test]
fn test_handle_reports_errors() {
    let d = dispatcher();
    let mut sink = CollectingSink::default();
    let desc = Value::try_from(json!({"n": "nope", "t": METHOD, "p": g()})).unwrap();
    d.handle(MethodCall::new("invoke", Some(desc)), &mut sink);
    match sink.outcome {
        Some(Outcome::Error { detail, .. }) => assert_eq!(detail, "MemberNotFound"),
        other => panic!("expected error, got {:?}", other),
    }
}

// ===== Concurrency =====

#[test]
fn test_concurrent_dispatch() {
    let d = Arc::new(dispatcher());
    let handles: Vec<_> = (0..8)
        .map(|t| {
            let d = Arc::clone(&d);
            thread::spawn(move || {
                for i in 0..50i64 {
                    let id = format!("t{}-{}", t, i);
                    let keep = Descriptor::method(Descriptor::global("G"), "foo")
                        .with_id(id.as_str())
                        .with_value(i);
                    assert!(d.invoke_and_cache(&keep).is_success());
                    let cached = d.invoke(&Descriptor::global("ignored").with_id(id.as_str()));
                    assert_eq!(cached, CallResult::Success(Value::Int(i + 1)));
                    d.dispose(&id);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    assert!(d.engine().cache().is_empty());
}
