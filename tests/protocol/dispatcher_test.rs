//! Interrupt dispatcher: buffer drains per role, acknowledgements, and every
//! fault path ending up in the diagnostics block.
mod helpers {
    include!("../helpers/mod.rs");
}

use canlight::{
    config::BusConfig,
    error::BusFault,
    infra::status::ControllerStatus,
    protocol::{
        bus::InternalBus,
        dispatcher::Dispatch,
        identity::{NodeId, NodeIdentity},
        message_object::CanFrame,
        slots::BufferKind,
        storage::NodeStorage,
    },
};
use embedded_can::Frame;
use helpers::{slot, SoftController};

fn bring_up(
    identity: NodeIdentity,
    storage: &NodeStorage,
) -> (SoftController, InternalBus<'_, SoftController>) {
    let controller = SoftController::new();
    let bus = InternalBus::initialize(controller.clone(), identity, &BusConfig::default(), storage)
        .unwrap();
    (controller, bus)
}

fn data_frame(raw: u32, data: &[u8]) -> CanFrame {
    CanFrame::new(NodeId::new(raw).unwrap(), data).unwrap()
}

#[test]
fn test_master_receive_slot_fills_rx_buffer() {
    let storage = NodeStorage::new();
    let (controller, mut bus) = bring_up(NodeIdentity::master(0x01).unwrap(), &storage);

    controller.store_frame(slot(32), data_frame(0x04, &[0x10, 0x20]));
    let outcome = bus.on_interrupt();

    let snapshot = storage.rx.snapshot();
    assert_eq!(snapshot.data, [0x10, 0x20]);
    assert_eq!(snapshot.sequence, 1);
    assert_eq!(
        outcome,
        Dispatch::Received {
            slot: slot(32),
            buffer: BufferKind::Rx,
            snapshot,
        }
    );
    assert!(!controller.cause_pending());
    assert_eq!(storage.remote.snapshot().sequence, 0);
}

#[test]
fn test_master_request_answer_fills_remote_buffer() {
    let storage = NodeStorage::new();
    let (controller, mut bus) = bring_up(NodeIdentity::master(0x01).unwrap(), &storage);
    let target = NodeId::slave(0x02).unwrap();

    bus.request_slave(target).unwrap();
    controller.complete(slot(31));
    controller.store_frame(slot(31), data_frame(0x02, &[0xAA, 0xBB]));

    let outcomes = controller.service(&mut bus);
    assert!(matches!(
        outcomes.as_slice(),
        [Dispatch::Received {
            buffer: BufferKind::Remote,
            ..
        }]
    ));
    assert_eq!(storage.remote.load(), [0xAA, 0xBB]);
    assert_eq!(storage.rx.snapshot().sequence, 0);
    // Answer received: the request slot is free again and no longer matches.
    assert_eq!(bus.outstanding_request(), None);
    assert!(controller.object(slot(31)).is_none());
    assert!(bus.request_slave(target).is_ok());
}

#[test]
fn test_slave_receive_and_response_acknowledge() {
    let storage = NodeStorage::new();
    let (controller, mut bus) = bring_up(NodeIdentity::slave(0x02).unwrap(), &storage);

    controller.store_frame(slot(32), data_frame(0x02, &[0xF2, 0x31]));
    assert!(matches!(
        bus.on_interrupt(),
        Dispatch::Received {
            buffer: BufferKind::Rx,
            ..
        }
    ));
    assert_eq!(storage.rx.load(), [0xF2, 0x31]);

    // The auto-response went out: acknowledged, buffers untouched.
    controller.state().txrqst |= slot(31).bit();
    controller.complete(slot(31));
    assert_eq!(bus.on_interrupt(), Dispatch::ResponseSent(slot(31)));
    assert_eq!(storage.remote.snapshot().sequence, 0);
    assert!(!controller.cause_pending());
}

#[test]
fn test_malformed_frame_is_counted_not_stored() {
    let storage = NodeStorage::new();
    let (controller, mut bus) = bring_up(NodeIdentity::slave(0x02).unwrap(), &storage);

    controller.store_frame(slot(32), data_frame(0x02, &[1, 2, 3]));
    assert_eq!(bus.on_interrupt(), Dispatch::Malformed(slot(32)));
    assert_eq!(storage.rx.snapshot().sequence, 0);
    assert_eq!(storage.diagnostics.counters().malformed_frames, 1);
    // The object was still drained.
    assert!(!controller.cause_pending());
}

#[test]
fn test_spurious_entry_is_counted() {
    let storage = NodeStorage::new();
    let (_, mut bus) = bring_up(NodeIdentity::master(0x01).unwrap(), &storage);

    assert_eq!(bus.on_interrupt(), Dispatch::Idle);
    assert_eq!(bus.on_interrupt(), Dispatch::Idle);
    assert_eq!(storage.diagnostics.counters().spurious, 2);
}

#[test]
fn test_unknown_cause_is_reported() {
    let storage = NodeStorage::new();
    let (controller, mut bus) = bring_up(NodeIdentity::master(0x01).unwrap(), &storage);

    for raw in [33, 0x7FFF, 0x8001] {
        controller.inject_cause(raw);
        assert_eq!(
            bus.on_interrupt(),
            Dispatch::Fault(BusFault::UnexpectedInterruptCause { cause: raw })
        );
    }

    let counters = storage.diagnostics.counters();
    assert_eq!(counters.unexpected_causes, 3);
    assert_eq!(counters.last_unexpected_cause, Some(0x8001));
    assert_eq!(counters.spurious, 0);
}

#[test]
fn test_healthy_status_is_not_a_fault() {
    let storage = NodeStorage::new();
    let (controller, mut bus) = bring_up(NodeIdentity::master(0x01).unwrap(), &storage);

    // TxOK with no error code.
    controller.raise_status(1 << 3);
    assert_eq!(
        bus.on_interrupt(),
        Dispatch::Status(ControllerStatus::from_bits(1 << 3))
    );
    assert_eq!(storage.diagnostics.counters().status_faults, 0);
    assert_eq!(storage.diagnostics.take_status_fault(), None);
    assert!(!controller.cause_pending());
}

#[test]
fn test_bus_off_is_surfaced() {
    let storage = NodeStorage::new();
    let (controller, mut bus) = bring_up(NodeIdentity::master(0x01).unwrap(), &storage);

    controller.raise_status(1 << 7);
    let status = ControllerStatus::from_bits(1 << 7);
    assert_eq!(
        bus.on_interrupt(),
        Dispatch::Fault(BusFault::ControllerStatusFault { status })
    );

    let counters = storage.diagnostics.take_counters();
    assert_eq!(counters.status_faults, 1);
    assert_eq!(counters.last_status_fault, Some(status));
    assert_eq!(storage.diagnostics.counters().status_faults, 0);
    assert_eq!(storage.diagnostics.take_status_fault(), Some(status));
    assert_eq!(storage.diagnostics.take_status_fault(), None);
}

#[test]
fn test_one_cause_per_entry() {
    let storage = NodeStorage::new();
    let (controller, mut bus) = bring_up(NodeIdentity::master(0x01).unwrap(), &storage);
    let target = NodeId::slave(0x02).unwrap();

    bus.command_slave(target, [0, 1]).unwrap();
    bus.command_slave(target, [0, 2]).unwrap();
    controller.complete(slot(1));
    controller.complete(slot(2));
    controller.raise_status(1 << 6);

    let outcomes = controller.service(&mut bus);
    assert_eq!(outcomes.len(), 3);
    assert!(matches!(outcomes[0], Dispatch::Fault(_)));
    assert_eq!(outcomes[1], Dispatch::TransmitComplete(slot(1)));
    assert_eq!(outcomes[2], Dispatch::TransmitComplete(slot(2)));
}
