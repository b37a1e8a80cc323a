//! C ABI tests against the process-wide slot

use super::*;
use crate::call;
use crate::foreign::fake::FakeRuntime;
use crate::marshal::NString;
use crate::refnum::{Handle, ObjectRef, Registry, NULL_HANDLE};
use std::sync::Arc;
use std::sync::atomic::{AtomicI32, Ordering};

static LAST_RELEASED: AtomicI32 = AtomicI32::new(0);

extern "C" fn notify_release(handle: Handle) {
    LAST_RELEASED.store(handle, Ordering::SeqCst);
}

extern "C" fn describe(handle: Handle) -> NString {
    NString::encode(&format!("host exception {handle}"))
}

extern "C" fn is_instance_of(_handle: Handle, ptr: *const u8, len: usize) -> u8 {
    let class = unsafe { std::slice::from_raw_parts(ptr, len) };
    (class == b"java.lang.Object") as u8
}

fn vtable() -> SeqbindHostVTable {
    SeqbindHostVTable {
        notify_release,
        describe,
        is_instance_of: Some(is_instance_of),
        push_local_frame: None,
        pop_local_frame: None,
    }
}

#[test]
fn test_buffers() {
    let bytes = seqbind_alloc_bytes(16);
    assert_eq!(bytes.len, 16);
    assert!(!bytes.ptr.is_null());
    unsafe { seqbind_free_bytes(bytes) };

    assert!(seqbind_alloc_bytes(0).ptr.is_null());

    let s = seqbind_alloc_string(3);
    unsafe {
        std::ptr::copy_nonoverlapping(b"abc".as_ptr(), s.ptr, 3);
        assert_eq!(s.decode(), "abc");
    }

    let s16 = seqbind_alloc_string16(2);
    assert_eq!(s16.len, 2);
    unsafe { seqbind_free_string16(s16) };

    unsafe { seqbind_free_string(NString::encode("unused")) };
}

#[test]
fn test_calls_before_install() {
    let _guard = service::TEST_LOCK.lock();
    service::shutdown();

    assert_eq!(seqbind_register_foreign(1), 0);
    assert_eq!(seqbind_inc_ref(4), 4);
    seqbind_release(4);
    assert_eq!(unsafe { seqbind_runtime_install(std::ptr::null()) }, -1);
    assert!(seqbind_error_description(-1).is_empty());
    assert_eq!(call::stubs::exception(call::StubError::UnknownReceiver(-1)), NULL_HANDLE);
}

#[test]
fn test_host_lifecycle() {
    let _guard = service::TEST_LOCK.lock();
    service::shutdown();
    seqbind_runtime_init();

    let table = vtable();
    assert_eq!(unsafe { seqbind_runtime_install(&table) }, 0);
    assert_eq!(unsafe { seqbind_runtime_install(&table) }, -2);
    let registry = service::installed();

    // Handle counting through the C entry points
    let handle = seqbind_register_foreign(0x55);
    assert!(handle > 0);
    assert_eq!(seqbind_register_foreign(0x55), handle);
    assert_eq!(seqbind_inc_ref(handle), handle);
    assert_eq!(registry.refcount(handle), 3);
    for _ in 0..3 {
        seqbind_release(handle);
    }
    assert!(registry.resolve(handle).is_none());

    // Managed objects through the installed registry
    let object = ObjectRef::managed(String::from("payload"), "java.lang.Object");
    let managed = object.to_refnum();
    assert!(managed < 0);
    let back = ObjectRef::from_refnum(managed).unwrap();
    assert_eq!(back.downcast_ref::<String>().map(String::as_str), Some("payload"));

    // Host-side instance checks
    let foreign = ObjectRef::from_refnum(seqbind_register_foreign(0x77)).unwrap();
    assert!(foreign.is_instance_of("java.lang.Object"));
    assert!(!foreign.is_instance_of("java.lang.String"));
    drop(foreign);

    // Exceptions decoded with the host description
    let exc = seqbind_register_foreign(0x66);
    let err = call::check(exc).unwrap_err();
    assert_eq!(err.to_string(), format!("host exception {exc}"));
    drop(err);
    assert_eq!(LAST_RELEASED.load(Ordering::SeqCst), exc);

    seqbind_runtime_cleanup();
    assert!(!service::is_installed());
}

#[test]
fn test_register_foreign_when_exhausted() {
    let _guard = service::TEST_LOCK.lock();
    service::shutdown();

    let runtime = Arc::new(FakeRuntime::default());
    let registry = Arc::new(Registry::starting_at(runtime, -1, Handle::MAX));
    service::install(registry.clone()).unwrap();

    assert_eq!(seqbind_register_foreign(0x10), Handle::MAX);
    assert_eq!(seqbind_register_foreign(0x11), NULL_HANDLE);
    assert_eq!(registry.len(), 1);

    service::shutdown();
}

#[test]
fn test_error_description_for_stub_failures() {
    let _guard = service::TEST_LOCK.lock();
    service::shutdown();

    let runtime = Arc::new(FakeRuntime::default());
    let registry = Arc::new(Registry::new(runtime));
    service::install(registry.clone()).unwrap();

    let exc = call::stubs::exception(call::StubError::Raised(call::ForeignError::new("disk full")));
    assert!(exc < 0);
    let text = seqbind_error_description(exc);
    assert_eq!(unsafe { text.decode() }, "disk full");
    seqbind_release(exc);
    assert!(registry.is_empty());

    let plain = ObjectRef::managed(3u8, "java.lang.Object").to_refnum_in(&registry);
    assert!(seqbind_error_description(plain).is_empty());
    assert!(seqbind_error_description(NULL_HANDLE).is_empty());

    service::shutdown();
}
