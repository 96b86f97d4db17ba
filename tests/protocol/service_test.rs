//! Master polling service: command cadence, periodic requests, and reaction
//! to controller faults.
mod helpers {
    include!("../helpers/mod.rs");
}

use canlight::{
    config::BusConfig,
    core::{NodeRole, LAST_TRANSIENT_SLOT},
    error::SendError,
    infra::status::ControllerStatus,
    protocol::{
        bus::{InternalBus, SharedBus},
        identity::{NodeId, NodeIdentity},
        service::{CadenceConfig, CommandCadence, Cycle, MasterPoller, RequestStep, Tick},
        storage::NodeStorage,
    },
};
use embassy_time::Duration;
use helpers::{slot, InstantTimer, SoftController, SoftWire, StalledTimer, TokioTimer};
use static_cell::StaticCell;

fn lamp() -> NodeId {
    NodeId::slave(0x02).unwrap()
}

fn master_bus<'a>(storage: &'a NodeStorage) -> (SoftController, SharedBus<'a, SoftController>) {
    let hardware = SoftController::new();
    let shared = SharedBus::uninit();
    shared
        .init(
            hardware.clone(),
            NodeIdentity::master(0x01).unwrap(),
            &BusConfig::default(),
            storage,
        )
        .unwrap();
    (hardware, shared)
}

#[test]
fn test_cadence_skips_while_previous_command_pending() {
    let storage = NodeStorage::new();
    let hardware = SoftController::new();
    let mut bus = InternalBus::initialize(
        hardware.clone(),
        NodeIdentity::master(0x01).unwrap(),
        &BusConfig::default(),
        &storage,
    )
    .unwrap();
    let mut cadence = CommandCadence::new(lamp());

    assert_eq!(cadence.tick(&mut bus, [1, 0]), Ok(Tick::Sent(slot(1))));
    assert_eq!(cadence.tick(&mut bus, [2, 0]), Ok(Tick::SkippedBusy(slot(1))));
    assert_eq!(cadence.tick(&mut bus, [3, 0]), Ok(Tick::SkippedBusy(slot(1))));
    // Nothing piled up behind the stuck command.
    assert_eq!(hardware.txrqst(), slot(1).bit());

    hardware.complete(slot(1));
    hardware.service(&mut bus);
    assert_eq!(cadence.tick(&mut bus, [4, 0]), Ok(Tick::Sent(slot(1))));
    assert_eq!(hardware.object(slot(1)).unwrap().data, [4, 0]);

    let stats = cadence.stats();
    assert_eq!(stats.sent, 2);
    assert_eq!(stats.skipped_busy, 2);
    assert_eq!(stats.backpressure, 0);
}

#[test]
fn test_cadence_reports_backpressure() {
    let storage = NodeStorage::new();
    let hardware = SoftController::new();
    let mut bus = InternalBus::initialize(
        hardware.clone(),
        NodeIdentity::master(0x01).unwrap(),
        &BusConfig::default(),
        &storage,
    )
    .unwrap();
    for _ in 1..=LAST_TRANSIENT_SLOT {
        bus.command_slave(NodeId::slave(0x04).unwrap(), [0, 0]).unwrap();
    }

    let mut cadence = CommandCadence::new(lamp());
    assert_eq!(cadence.tick(&mut bus, [1, 1]), Ok(Tick::Backpressure));
    assert_eq!(cadence.last_slot(), None);
    assert_eq!(cadence.stats().backpressure, 1);
}

#[test]
fn test_cadence_propagates_role_error() {
    let storage = NodeStorage::new();
    let mut bus = InternalBus::initialize(
        SoftController::new(),
        NodeIdentity::slave(0x04).unwrap(),
        &BusConfig::default(),
        &storage,
    )
    .unwrap();
    let mut cadence = CommandCadence::new(lamp());
    assert_eq!(
        cadence.tick(&mut bus, [0, 0]),
        Err(SendError::WrongRole {
            role: NodeRole::Slave
        })
    );
}

#[test]
fn test_config_builders() {
    let config = CadenceConfig::new(lamp());
    assert_eq!(config.period, Duration::from_millis(1_000));
    assert_eq!(config.request_every, None);

    let config = config
        .with_period(Duration::from_millis(50))
        .with_request_every(3);
    assert_eq!(config.period, Duration::from_millis(50));
    assert_eq!(config.request_every, Some(3));
    assert_eq!(config.with_request_every(0).request_every, None);
}

#[tokio::test]
async fn test_poller_sends_command_buffer() {
    let storage = NodeStorage::new();
    let (hardware, shared) = master_bus(&storage);
    storage.command.store([0xF2, 0x31]);

    let mut poller = MasterPoller::new(&shared, InstantTimer::default(), CadenceConfig::new(lamp()));
    let cycle = poller.poll_once().await.unwrap();

    assert_eq!(
        cycle,
        Cycle::Ticked {
            tick: Tick::Sent(slot(1)),
            request: None,
            remote: None,
        }
    );
    let object = hardware.object(slot(1)).unwrap();
    assert_eq!(object.data, [0xF2, 0x31]);
    assert_eq!(object.id, lamp().as_extended());

    // Still pending on the next cycle: skipped.
    let cycle = poller.poll_once().await.unwrap();
    assert!(matches!(
        cycle,
        Cycle::Ticked {
            tick: Tick::SkippedBusy(_),
            ..
        }
    ));
    assert_eq!(poller.stats().cycles, 2);
}

#[tokio::test]
async fn test_poller_polls_slave_and_reports_answer() {
    let master_storage = NodeStorage::new();
    let lamp_storage = NodeStorage::new();
    let (master_hw, shared) = master_bus(&master_storage);
    let lamp_hw = SoftController::new();
    let mut lamp_bus = InternalBus::initialize(
        lamp_hw.clone(),
        NodeIdentity::slave(0x02).unwrap(),
        &BusConfig::default(),
        &lamp_storage,
    )
    .unwrap();
    lamp_bus.publish_response([0x0A, 0x0B]).unwrap();
    let mut wire = SoftWire::new(&[&master_hw, &lamp_hw]);

    let config = CadenceConfig::new(lamp()).with_request_every(1);
    let mut poller = MasterPoller::new(&shared, InstantTimer::default(), config);

    let cycle = poller.poll_once().await.unwrap();
    assert_eq!(
        cycle,
        Cycle::Ticked {
            tick: Tick::Sent(slot(1)),
            request: Some(RequestStep::Issued(slot(31))),
            remote: None,
        }
    );

    // Answer not serviced yet: the next request is skipped.
    let cycle = poller.poll_once().await.unwrap();
    assert!(matches!(
        cycle,
        Cycle::Ticked {
            request: Some(RequestStep::SkippedOutstanding),
            ..
        }
    ));

    wire.run();
    while master_hw.cause_pending() {
        shared.on_interrupt();
    }
    lamp_hw.service(&mut lamp_bus);

    let Cycle::Ticked { remote, request, .. } = poller.poll_once().await.unwrap() else {
        panic!("unexpected fault");
    };
    assert_eq!(remote.map(|s| s.data), Some([0x0A, 0x0B]));
    assert_eq!(request, Some(RequestStep::Issued(slot(31))));

    let stats = poller.stats();
    assert_eq!(stats.requests, 2);
    assert_eq!(stats.requests_skipped, 1);
}

#[tokio::test]
async fn test_fault_interrupts_the_wait() {
    let storage = NodeStorage::new();
    let (hardware, shared) = master_bus(&storage);
    let config = CadenceConfig::new(lamp()).with_request_every(1);

    shared.request_slave(lamp()).unwrap();
    hardware.raise_status(1 << 7);
    shared.on_interrupt();

    let mut poller = MasterPoller::new(&shared, StalledTimer, config);
    let cycle = poller.poll_once().await.unwrap();

    assert_eq!(cycle, Cycle::Fault(ControllerStatus::from_bits(1 << 7)));
    assert_eq!(poller.stats().faults, 1);
    assert_eq!(shared.with(|bus| bus.outstanding_request()), Ok(None));
}

#[tokio::test]
async fn test_run_stops_on_fatal_error() {
    static STORAGE: StaticCell<NodeStorage> = StaticCell::new();
    static BUS: StaticCell<SharedBus<'static, SoftController>> = StaticCell::new();
    let storage: &'static NodeStorage = STORAGE.init(NodeStorage::new());
    let shared: &'static SharedBus<'static, SoftController> = BUS.init(SharedBus::uninit());

    // Not initialized yet.
    let poller = MasterPoller::new(shared, TokioTimer, CadenceConfig::new(lamp()));
    assert_eq!(poller.run().await, Err(SendError::NotInitialized));

    // A slave cannot run the master cadence.
    shared
        .init(
            SoftController::new(),
            NodeIdentity::slave(0x04).unwrap(),
            &BusConfig::default(),
            storage,
        )
        .unwrap();
    let config = CadenceConfig::new(lamp()).with_period(Duration::from_millis(5));
    let result = tokio::time::timeout(
        std::time::Duration::from_secs(5),
        MasterPoller::new(shared, TokioTimer, config).run(),
    )
    .await
    .expect("poller should stop on its own");
    assert_eq!(
        result,
        Err(SendError::WrongRole {
            role: NodeRole::Slave
        })
    );
}
