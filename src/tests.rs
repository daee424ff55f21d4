//! End-to-end handshake scenarios across the registry and bridge.

use crate::bridge::{InitPayload, RenderBridge, RENDER_QUANTUM_FRAMES};
use crate::error::BridgeError;
use crate::registry::{self, ProcessorHandle};

#[test]
fn handshake_register_construct_render_then_handle_is_spent() {
    let handle = registry::register(Box::new(|output: &mut [f32]| {
        output.fill(0.5);
        true
    }));

    let payload = InitPayload {
        module: "compiled module",
        memory: "shared memory",
        handle,
    };
    let mut bridge = RenderBridge::construct(payload, |_, _| Ok(())).unwrap();

    let mut buffer = [0.0f32; RENDER_QUANTUM_FRAMES];
    assert!(bridge.render(&mut buffer));
    assert!(buffer.iter().all(|&s| s == 0.5));

    // Construction consumed the handle; a second claim anywhere fails.
    match registry::claim(handle) {
        Err(BridgeError::UnknownHandle(raw)) => assert_eq!(raw, handle.raw()),
        other => panic!("expected UnknownHandle, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn construction_with_unregistered_handle_fails_cleanly() {
    let payload = InitPayload {
        module: (),
        memory: (),
        handle: ProcessorHandle::from_raw(u64::MAX),
    };
    let err = RenderBridge::construct(payload, |_, _| Ok(())).unwrap_err();
    assert!(matches!(err, BridgeError::UnknownHandle(u64::MAX)));
}

#[test]
fn link_failure_aborts_before_the_claim() {
    let handle = registry::register(Box::new(|_: &mut [f32]| true));

    let payload = InitPayload {
        module: (),
        memory: (),
        handle,
    };
    let err = RenderBridge::construct(payload, |_, _| {
        Err(BridgeError::LinkFailure("memory refused to attach".into()))
    })
    .unwrap_err();
    assert!(matches!(err, BridgeError::LinkFailure(_)));

    // Linking failed before the claim, so the unit is still registered and
    // a retry with a working link succeeds.
    let retry = InitPayload {
        module: (),
        memory: (),
        handle,
    };
    assert!(RenderBridge::construct(retry, |_, _| Ok(())).is_ok());
}

#[test]
fn payload_fields_pass_through_the_link_in_order() {
    let handle = registry::register(Box::new(|_: &mut [f32]| true));
    let payload = InitPayload {
        module: 7u32,
        memory: vec![1u8, 2, 3],
        handle,
    };
    let bridge = RenderBridge::construct(payload, |module, memory| {
        assert_eq!(*module, 7);
        assert_eq!(memory.as_slice(), &[1, 2, 3]);
        Ok(())
    })
    .unwrap();
    assert!(bridge.is_live());
}
