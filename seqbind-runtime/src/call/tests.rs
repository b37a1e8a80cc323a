//! Call boundary tests

use super::*;
use crate::foreign::fake::FakeRuntime;
use crate::marshal::{self, Expect, Value, ValueKind};
use crate::refnum::Payload;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

fn registry() -> (Arc<FakeRuntime>, Arc<Registry>) {
    let runtime = Arc::new(FakeRuntime::default());
    let registry = Arc::new(Registry::new(runtime.clone()));
    (runtime, registry)
}

fn raise(runtime: &FakeRuntime, registry: &Registry, token: u64, text: &str) -> Handle {
    let handle = registry.register(Payload::Foreign(token));
    runtime.describe_as(handle, text);
    handle
}

fn int_overloads() -> Overloads {
    Overloads::new("com.example.Widget", "resize")
        .with(Signature::new(vec![Expect::Kind(ValueKind::I32)]))
        .with(Signature::new(vec![
            Expect::Kind(ValueKind::I32),
            Expect::Kind(ValueKind::Str),
        ]))
        .with(Signature::new(vec![
            Expect::Kind(ValueKind::I32),
            Expect::Kind(ValueKind::I64),
        ]))
}

fn returns(n: i32) -> impl Fn(&Receiver<'_>, &[Value]) -> StubResult + Send + Sync + 'static {
    move |_, _| Ok(Value::I32(n))
}

#[test]
fn test_overload_buckets_by_arity() {
    let overloads = int_overloads();
    assert_eq!(overloads.len(), 3);
    assert_eq!(overloads.resolve(&[Value::I32(1)]), Ok(0));
    assert_eq!(overloads.resolve(&[Value::I32(1), Value::from("x")]), Ok(1));
    assert_eq!(overloads.resolve(&[Value::I32(1), Value::I64(2)]), Ok(2));
}

#[test]
fn test_overload_no_match() {
    let overloads = int_overloads();
    let err = overloads
        .resolve(&[Value::I32(1), Value::F64(2.0)])
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "no overloaded method found for com.example.Widget.resize that matched the arguments"
    );
    assert!(overloads.resolve(&[]).is_err());
    assert!(overloads
        .resolve(&[Value::I32(1), Value::I32(2), Value::I32(3)])
        .is_err());
}

#[test]
fn test_overload_declaration_order() {
    let overloads = Overloads::new("C", "m")
        .with(Signature::new(vec![Expect::Any]))
        .with(Signature::new(vec![Expect::Kind(ValueKind::Str)]));
    // The first accepting variant wins even when a later one is more specific.
    assert_eq!(overloads.resolve(&[Value::from("s")]), Ok(0));
    for _ in 0..10 {
        assert_eq!(overloads.resolve(&[Value::Null]), Ok(0));
    }
}

#[test]
fn test_no_overload_matched_message() {
    let payload = catch_unwind(|| no_overload_matched("a.B", "run")).unwrap_err();
    let message = payload.downcast::<String>().unwrap();
    assert_eq!(
        *message,
        "no overloaded method found for a.B.run that matched the arguments"
    );
}

#[test]
fn test_check_success() {
    let (_, registry) = registry();
    assert!(check_in(&registry, NULL_HANDLE).is_ok());
    assert!(check(NULL_HANDLE).is_ok());
    assert_eq!(check_ret(Ret { res: 5, exc: NULL_HANDLE }).unwrap(), 5);
    assert_eq!(fault_ret(Ret { res: 'x', exc: NULL_HANDLE }), 'x');
}

#[test]
fn test_failing_signature_returns_error() {
    let (runtime, registry) = registry();
    let exc = raise(&runtime, &registry, 1, "java.io.IOException: disk full");

    let err = check_in(&registry, exc).unwrap_err();
    assert_eq!(err.to_string(), "java.io.IOException: disk full");
    assert_eq!(err.handle(), exc);
    assert_eq!(err.object().and_then(ObjectRef::foreign_handle), Some(exc));

    drop(err);
    assert_eq!(runtime.released(), vec![exc]);
}

#[test]
fn test_non_failing_signature_faults() {
    let (runtime, registry) = registry();
    let exc = raise(&runtime, &registry, 2, "NSInvalidArgumentException: nil key");

    let payload = catch_unwind(AssertUnwindSafe(|| fault_on_exception_in(&registry, exc)))
        .unwrap_err();
    let err = payload.downcast::<ForeignError>().unwrap();
    assert_eq!(err.to_string(), "NSInvalidArgumentException: nil key");
    assert_eq!(err.description(), "NSInvalidArgumentException: nil key");
}

#[test]
fn test_managed_error() {
    let err = ForeignError::new("bad state");
    assert_eq!(err.to_string(), "bad state");
    assert_eq!(err.handle(), NULL_HANDLE);
    assert!(err.object().is_none());
}

#[test]
fn test_stub_invoke() {
    let (runtime, registry) = registry();
    let stubs = StubRegistry::new();
    stubs.register(
        "com.example.Counter",
        "add",
        Signature::new(vec![Expect::Kind(ValueKind::I32)]),
        |receiver, args| {
            let base = receiver.downcast::<i32>()?;
            Ok(Value::I32(base + args[0].as_i32().unwrap_or_default()))
        },
    );
    stubs.register(
        "com.example.Counter",
        "add",
        Signature::new(vec![Expect::Kind(ValueKind::Str)]),
        |_, args| Ok(Value::from(format!("+{}", args[0].as_str().unwrap_or_default()))),
    );
    stubs.register(
        "com.example.Counter",
        "add",
        Signature::new(vec![Expect::Kind(ValueKind::I64)]),
        |_, _| Err(ForeignError::new("counter overflow").into()),
    );
    stubs.register(
        "com.example.Counter",
        "label",
        Signature::new(vec![]),
        |receiver, _| receiver.downcast::<String>().map(|s| Value::from(s.as_str())),
    );
    assert!(stubs.contains("com.example.Counter", "add"));

    let receiver = registry.register(Payload::managed(Arc::new(10i32), "com.example.Counter"));

    let sum = stubs
        .invoke_in(&registry, receiver, "com.example.Counter", "add", &[Value::I32(5)])
        .unwrap();
    assert_eq!(sum.as_i32(), Some(15));

    let text = stubs
        .invoke_in(&registry, receiver, "com.example.Counter", "add", &[Value::from("1")])
        .unwrap();
    assert_eq!(text.as_str(), Some("+1"));

    let err = stubs
        .invoke_in(&registry, receiver, "com.example.Counter", "add", &[Value::I64(1)])
        .unwrap_err();
    assert!(matches!(&err, StubError::Raised(raised) if raised.description() == "counter overflow"));

    // The receiver is not the type the stub was written for.
    assert!(matches!(
        stubs.invoke_in(&registry, receiver, "com.example.Counter", "label", &[]),
        Err(StubError::UnknownReceiver(handle)) if handle == receiver
    ));

    assert_eq!(runtime.pushes.load(std::sync::atomic::Ordering::SeqCst), 4);
    assert_eq!(runtime.depth(), 0);
}

#[test]
fn test_stub_errors() {
    let (_, registry) = registry();
    let stubs = StubRegistry::new();
    stubs.register(
        "C",
        "m",
        Signature::new(vec![]),
        |_, _| Ok(Value::Null),
    );

    assert!(matches!(
        stubs.invoke_in(&registry, -1, "C", "other", &[]),
        Err(StubError::UnknownMethod { .. })
    ));
    assert!(matches!(
        stubs.invoke_in(&registry, -1, "C", "m", &[]),
        Err(StubError::UnknownReceiver(-1))
    ));
    assert!(matches!(
        stubs.invoke_in(&registry, -1, "C", "m", &[Value::Null]),
        Err(StubError::NoOverload(_))
    ));
}

#[test]
fn test_stub_panics_become_errors() {
    let (runtime, registry) = registry();
    let exc = raise(&runtime, &registry, 5, "java.lang.IllegalStateException: closed");
    let stubs = StubRegistry::new();
    let nested = registry.clone();
    stubs.register("C", "fault", Signature::new(vec![]), move |_, _| {
        fault_on_exception_in(&nested, exc);
        Ok(Value::Null)
    });
    stubs.register("C", "bug", Signature::new(vec![]), |_, _| panic!("index out of range"));

    let receiver = registry.register(Payload::managed(Arc::new(()), "C"));
    let err = stubs.invoke_in(&registry, receiver, "C", "fault", &[]).unwrap_err();
    match &err {
        StubError::Raised(raised) => assert_eq!(raised.handle(), exc),
        other => panic!("unexpected {other:?}"),
    }

    let err = stubs.invoke_in(&registry, receiver, "C", "bug", &[]).unwrap_err();
    assert_eq!(err.to_string(), "stub panicked: index out of range");
    assert_eq!(runtime.depth(), 0);
}

#[test]
fn test_stub_error_into_exception() {
    let (runtime, registry) = registry();

    // A foreign exception goes back as its own handle, pinned.
    let exc = raise(&runtime, &registry, 6, "java.io.IOException: broken pipe");
    let raised = ForeignError::from_handle_in(&registry, exc);
    assert_eq!(registry.refcount(exc), 1);
    assert_eq!(StubError::Raised(raised).into_exception_in(&registry), exc);
    assert_eq!(registry.refcount(exc), 1);
    assert!(runtime.released().is_empty());
    registry.release(exc).unwrap();

    // Managed failures become managed error objects.
    let handle = StubError::UnknownReceiver(-9).into_exception_in(&registry);
    assert!(handle < 0);
    match registry.resolve(handle) {
        Some(Payload::Managed { object, class }) => {
            assert_eq!(class.as_ref(), stubs::MANAGED_ERROR);
            let err = object.downcast_ref::<ForeignError>().unwrap();
            assert_eq!(err.description(), "handle -9 does not name a managed object");
        }
        other => panic!("unexpected {other:?}"),
    }

    let handle = StubError::Raised(ForeignError::new("quota")).into_exception_in(&registry);
    let err = ObjectRef::from_refnum_in(&registry, handle).unwrap();
    assert_eq!(err.downcast_ref::<ForeignError>().map(ForeignError::description), Some("quota"));
}

#[test]
fn test_object_guards_agree_with_dispatch() {
    let (runtime, registry) = registry();
    let number = registry.register(Payload::Foreign(0x40));
    runtime.instance_of(number, &["java.lang.Object", "java.lang.Integer"]);
    let file = registry.register(Payload::Foreign(0x41));
    runtime.instance_of(file, &["java.lang.Object", "java.io.File"]);

    // add(Integer) before add(Object), as declared
    let overloads = Overloads::new("java.util.List", "add")
        .with(Signature::new(vec![Expect::object("java.lang.Integer")]))
        .with(Signature::new(vec![Expect::object("java.lang.Object")]));

    let cases = [
        ("null", Value::Null, 0),
        ("mismatched class", Value::from(ObjectRef::from_refnum_in(&registry, file)), 1),
        ("matching class", Value::from(ObjectRef::from_refnum_in(&registry, number)), 0),
    ];
    for (name, value, expected) in cases {
        let slot = value.clone().into_object();
        let guarded = marshal::narrow(&slot, "java.lang.Integer").is_some();
        let converted = value.object_of("java.lang.Integer").is_some();
        let index = overloads.resolve(std::slice::from_ref(&value)).unwrap();

        assert_eq!(index, expected, "{name}");
        assert_eq!(guarded, index == 0, "{name}");
        assert_eq!(converted, index == 0, "{name}");
    }
}

#[test]
fn test_stub_split_bucket_no_match() {
    let (_, registry) = registry();
    let stubs = StubRegistry::new();
    stubs.register(
        "Widget",
        "set",
        Signature::new(vec![Expect::Kind(ValueKind::I32)]),
        returns(1),
    );
    stubs.register(
        "Widget",
        "set",
        Signature::new(vec![Expect::Kind(ValueKind::I32), Expect::Kind(ValueKind::Str)]),
        returns(2),
    );
    stubs.register(
        "Widget",
        "set",
        Signature::new(vec![Expect::Kind(ValueKind::I32), Expect::Kind(ValueKind::I64)]),
        returns(3),
    );
    let receiver = registry.register(Payload::managed(Arc::new(()), "Widget"));

    let call = |args: &[Value]| stubs.invoke_in(&registry, receiver, "Widget", "set", args);
    assert_eq!(call(&[Value::I32(1)]).unwrap().as_i32(), Some(1));
    assert_eq!(call(&[Value::I32(1), Value::from("x")]).unwrap().as_i32(), Some(2));
    assert_eq!(call(&[Value::I32(1), Value::I64(2)]).unwrap().as_i32(), Some(3));

    let err = call(&[Value::I32(1), Value::Bool(true)]).unwrap_err();
    assert!(matches!(err, StubError::NoOverload(_)));
    assert_eq!(
        err.to_string(),
        "no overloaded method found for Widget.set that matched the arguments"
    );
}
