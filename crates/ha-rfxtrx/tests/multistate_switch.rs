//! Behavior of the rfxtrx_multistate switch platform against a live host

use ha_core::events::StateChangedData;
use ha_core::{attrs, STATE_UNKNOWN};
use ha_rfxtrx::switch_multistate::SUBSCRIBER;
use ha_rfxtrx::{
    setup_platform, ButtonPressedData, DeviceConfig, DeviceKind, Entity, Hass, MultiStateSwitch,
    MultiStateSwitchConfig, PacketId, RfxDevice, RfxEntry, RfxtrxError, RfxtrxHub, RfxtrxResult,
    RxEvent, VALUE_COMMAND,
};
use indexmap::IndexMap;
use std::cell::RefCell;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::sync::mpsc;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Stand-in for the gateway driver: packet `01` is the kitchen mood switch,
/// `02` a hallway one, `03` a temperature sensor
fn resolve(packet_id: &PacketId) -> RfxtrxResult<RfxDevice> {
    let device = match packet_id.as_str() {
        "01" => RfxDevice::lighting("Kitchen_Switch"),
        "02" => RfxDevice::lighting("hall_switch"),
        "03" => RfxDevice::new("temp_sensor", DeviceKind::Sensor),
        other => {
            return Err(RfxtrxError::Resolve {
                packet_id: other.to_string(),
                reason: "unknown packet".to_string(),
            })
        }
    };
    Ok(device.with_packet_id(packet_id.clone()))
}

fn device(name: &str, packetid: &str, fire_event: bool) -> DeviceConfig {
    DeviceConfig {
        name: name.to_string(),
        packetid: packetid.to_string(),
        fire_event,
    }
}

fn config(devices: &[(&str, DeviceConfig)]) -> MultiStateSwitchConfig {
    MultiStateSwitchConfig {
        devices: Some(
            devices
                .iter()
                .map(|(id, d)| (id.to_string(), d.clone()))
                .collect::<IndexMap<_, _>>(),
        ),
    }
}

/// Run setup and return the batch handed to the host, plus how often the
/// callback ran
fn setup(
    hass: &Hass,
    hub: &RfxtrxHub,
    config: &MultiStateSwitchConfig,
) -> RfxtrxResult<(Vec<MultiStateSwitch>, usize)> {
    let calls = RefCell::new(0);
    let batch = RefCell::new(Vec::new());
    setup_platform(hass, hub, config, &resolve, |switches| {
        *calls.borrow_mut() += 1;
        for switch in &switches {
            switch.update_ha_state(hass, ha_core::Context::new());
        }
        batch.borrow_mut().extend(switches);
    })?;
    Ok((batch.into_inner(), calls.into_inner()))
}

fn command(id_string: &str, command: &str) -> RxEvent {
    RxEvent::new(RfxDevice::lighting(id_string)).with_value(VALUE_COMMAND, command)
}

fn drain<T: ha_core::EventData + serde::de::DeserializeOwned>(
    rx: &mut ha_event_bus::TypedEventReceiver<T>,
) -> Vec<T> {
    let mut out = Vec::new();
    while let Ok(event) = rx.try_recv() {
        out.push(event.data);
    }
    out
}

fn switch_state(hub: &RfxtrxHub, id: &str) -> String {
    match hub.multistate_switch(id) {
        Some(switch) => switch.state(),
        None => panic!("{id} is not a multistate switch: {:?}", hub.get(id)),
    }
}

#[test]
fn test_kitchen_scenario() {
    init_tracing();
    let hass = Hass::new();
    let hub = RfxtrxHub::new();
    let mut pressed = hass.bus.subscribe_typed::<ButtonPressedData>();

    let (batch, calls) = setup(
        &hass,
        &hub,
        &config(&[("kitchen_switch", device("Kitchen", "0x01", true))]),
    )
    .unwrap();

    assert_eq!(calls, 1);
    assert_eq!(batch.len(), 1);
    assert_eq!(batch[0].name(), "Kitchen");
    assert_eq!(batch[0].state(), STATE_UNKNOWN);
    assert!(batch[0].should_fire_event());
    assert!(!batch[0].should_poll());
    assert_eq!(switch_state(&hub, "kitchen_switch"), STATE_UNKNOWN);
    assert!(hass.states.is_state("switch.kitchen_switch", STATE_UNKNOWN));

    let mut refreshed = hass.bus.subscribe_typed::<StateChangedData>();
    assert_eq!(hub.dispatch(&command("Kitchen_Switch", "On")), 0);

    assert_eq!(switch_state(&hub, "kitchen_switch"), "on");

    let changes = drain(&mut refreshed);
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].entity_id.to_string(), "switch.kitchen_switch");
    let state = hass.states.get("switch.kitchen_switch").unwrap();
    assert_eq!(state.state, "on");
    assert_eq!(
        state.attribute::<String>(attrs::FRIENDLY_NAME).as_deref(),
        Some("Kitchen")
    );

    assert_eq!(
        drain(&mut pressed),
        vec![ButtonPressedData {
            entity_id: "kitchen_switch".to_string(),
            state: "on".to_string(),
        }]
    );
}

#[test]
fn test_setup_creates_one_entity_per_new_device() {
    let hass = Hass::new();
    let hub = RfxtrxHub::new();
    hub.insert(
        "porch",
        RfxEntry::Other {
            platform: "light".to_string(),
            name: "Porch".to_string(),
        },
    );

    let (batch, _) = setup(
        &hass,
        &hub,
        &config(&[
            ("kitchen_switch", device("Kitchen", "01", false)),
            ("hall_switch", device("Hall", "02", true)),
        ]),
    )
    .unwrap();

    assert_eq!(batch.len(), 2);
    assert_eq!(hub.len(), 3);
    assert_eq!(batch[0].device().id_string, "Kitchen_Switch");
    assert_eq!(batch[1].device().packet_id.as_ref().unwrap().as_str(), "02");
    assert_eq!(hass.states.domain_states("switch").len(), 2);
}

#[test]
fn test_setup_skips_existing_identifiers() {
    let hass = Hass::new();
    let hub = RfxtrxHub::new();

    setup(&hass, &hub, &config(&[("kitchen_switch", device("Kitchen", "01", false))])).unwrap();
    hub.dispatch(&command("kitchen_switch", "Mood2"));

    let (batch, calls) = setup(
        &hass,
        &hub,
        &config(&[
            ("kitchen_switch", device("Renamed", "01", true)),
            ("hall_switch", device("Hall", "02", false)),
        ]),
    )
    .unwrap();

    assert_eq!(calls, 1);
    assert_eq!(batch.len(), 1);
    assert_eq!(batch[0].name(), "Hall");
    assert_eq!(hub.len(), 2);

    let existing = hub.multistate_switch("kitchen_switch").unwrap();
    assert_eq!(existing.name(), "Kitchen");
    assert!(!existing.should_fire_event());
    assert_eq!(switch_state(&hub, "kitchen_switch"), "mood2");
}

#[test]
fn test_setup_without_devices_still_registers() {
    let hass = Hass::new();
    let hub = RfxtrxHub::new();

    let (batch, calls) = setup(&hass, &hub, &MultiStateSwitchConfig::default()).unwrap();
    assert!(batch.is_empty());
    assert_eq!(calls, 1);

    let (batch, calls) = setup(&hass, &hub, &config(&[])).unwrap();
    assert!(batch.is_empty());
    assert_eq!(calls, 1);

    assert!(hub.is_empty());
    assert!(hub.is_subscribed(SUBSCRIBER));
    assert_eq!(hub.subscriber_count(), 1);
}

#[test]
fn test_repeated_setup_subscribes_once() {
    let hass = Hass::new();
    let hub = RfxtrxHub::new();
    let cfg = config(&[("kitchen_switch", device("Kitchen", "01", true))]);
    let mut pressed = hass.bus.subscribe_typed::<ButtonPressedData>();

    setup(&hass, &hub, &cfg).unwrap();
    setup(&hass, &hub, &cfg).unwrap();
    assert_eq!(hub.subscriber_count(), 1);

    hub.dispatch(&command("kitchen_switch", "Off"));
    assert_eq!(drain(&mut pressed).len(), 1);
}

#[test]
fn test_non_lighting_events_are_ignored() {
    let hass = Hass::new();
    let hub = RfxtrxHub::new();
    setup(&hass, &hub, &config(&[("kitchen_switch", device("Kitchen", "01", true))])).unwrap();

    let mut changes = hass.bus.subscribe_typed::<StateChangedData>();
    let mut pressed = hass.bus.subscribe_typed::<ButtonPressedData>();

    for kind in [DeviceKind::Sensor, DeviceKind::Status] {
        let event =
            RxEvent::new(RfxDevice::new("kitchen_switch", kind)).with_value(VALUE_COMMAND, "On");
        assert_eq!(hub.dispatch(&event), 0);
    }

    assert_eq!(switch_state(&hub, "kitchen_switch"), STATE_UNKNOWN);
    assert!(drain(&mut changes).is_empty());
    assert!(drain(&mut pressed).is_empty());
}

#[test]
fn test_unknown_and_foreign_identifiers_are_ignored() {
    let hass = Hass::new();
    let hub = RfxtrxHub::new();
    hub.insert(
        "porch",
        RfxEntry::Other {
            platform: "light".to_string(),
            name: "Porch".to_string(),
        },
    );
    setup(&hass, &hub, &MultiStateSwitchConfig::default()).unwrap();
    let mut changes = hass.bus.subscribe_typed::<StateChangedData>();

    assert_eq!(hub.dispatch(&command("porch", "On")), 0);
    assert_eq!(hub.dispatch(&command("never_seen", "On")), 0);

    assert!(drain(&mut changes).is_empty());
    assert_eq!(hub.len(), 1);
    assert!(matches!(hub.get("porch"), Some(RfxEntry::Other { .. })));
}

#[test]
fn test_fire_event_disabled_publishes_nothing() {
    let hass = Hass::new();
    let hub = RfxtrxHub::new();
    setup(&hass, &hub, &config(&[("hall_switch", device("Hall", "02", false))])).unwrap();
    let mut pressed = hass.bus.subscribe_typed::<ButtonPressedData>();
    let mut changes = hass.bus.subscribe_typed::<StateChangedData>();

    for cmd in ["Mood1", "Mood3", "Group Off"] {
        hub.dispatch(&command("hall_switch", cmd));
    }

    assert_eq!(switch_state(&hub, "hall_switch"), "group off");
    assert_eq!(drain(&mut changes).len(), 3);
    assert!(drain(&mut pressed).is_empty());
}

#[test]
fn test_every_matching_event_publishes_once() {
    let hass = Hass::new();
    let hub = RfxtrxHub::new();
    setup(&hass, &hub, &config(&[("hall_switch", device("Hall", "02", true))])).unwrap();
    let mut pressed = hass.bus.subscribe_typed::<ButtonPressedData>();

    hub.dispatch(&command("hall_switch", "Mood1"));
    hub.dispatch(&command("hall_switch", "Mood1"));
    hub.dispatch(&command("HALL_SWITCH", "Off"));

    let states: Vec<_> = drain(&mut pressed).into_iter().map(|d| d.state).collect();
    assert_eq!(states, vec!["mood1", "mood1", "off"]);
}

#[test]
fn test_missing_command_is_reported_and_other_subscribers_run() {
    init_tracing();
    let hass = Hass::new();
    let hub = RfxtrxHub::new();
    setup(&hass, &hub, &config(&[("kitchen_switch", device("Kitchen", "01", true))])).unwrap();

    let seen = Arc::new(std::sync::atomic::AtomicUsize::new(0));
    let counter = seen.clone();
    hub.subscribe(ha_rfxtrx::SubscriberKey::new("light.rfxtrx"), move |_, _| {
        counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Ok(())
    });

    let failures = hub.dispatch(&RxEvent::new(RfxDevice::lighting("kitchen_switch")));
    assert_eq!(failures, 1);
    assert_eq!(seen.load(std::sync::atomic::Ordering::SeqCst), 1);
    assert_eq!(switch_state(&hub, "kitchen_switch"), STATE_UNKNOWN);
}

#[test]
fn test_setup_errors() {
    let hass = Hass::new();
    let hub = RfxtrxHub::new();

    let err = setup(&hass, &hub, &config(&[("bad", device("Bad", "0xZZ", false))])).unwrap_err();
    assert!(matches!(err, RfxtrxError::InvalidPacketId { .. }));

    let err = setup(&hass, &hub, &config(&[("lost", device("Lost", "0x7f", false))])).unwrap_err();
    assert!(matches!(err, RfxtrxError::Resolve { .. }));

    assert!(hub.is_empty());
    assert_eq!(hub.subscriber_count(), 0);

    let partial = config(&[
        ("kitchen_switch", device("Kitchen", "0x01", true)),
        ("bad", device("Bad", "zz", false)),
    ]);
    let calls = RefCell::new(0);
    let err = setup_platform(&hass, &hub, &partial, &resolve, |_| *calls.borrow_mut() += 1)
        .unwrap_err();
    assert!(matches!(err, RfxtrxError::InvalidPacketId { .. }));
    assert_eq!(calls.into_inner(), 0);
    assert!(hub.is_empty());
    assert_eq!(hub.subscriber_count(), 0);

    let (batch, calls) =
        setup(&hass, &hub, &config(&[("kitchen_switch", device("Kitchen", "0x01", true))]))
            .unwrap();
    assert_eq!(calls, 1);
    assert_eq!(batch.len(), 1);
    assert_eq!(hub.len(), 1);
    assert_eq!(hub.subscriber_count(), 1);
}

#[test]
fn test_host_held_switch_sees_updates() {
    let hass = Hass::new();
    let hub = RfxtrxHub::new();

    let (batch, _) = setup(
        &hass,
        &hub,
        &config(&[
            ("kitchen_switch", device("Kitchen", "01", true)),
            ("hall_switch", device("Hall", "02", false)),
        ]),
    )
    .unwrap();

    hub.dispatch(&command("kitchen_switch", "On"));
    hub.dispatch(&command("hall_switch", "Mood1"));

    assert_eq!(batch[0].state(), "on");
    assert_eq!(batch[1].state(), "mood1");
    let registered = hub.multistate_switch("kitchen_switch").unwrap();
    assert!(registered.same_entity(&batch[0]));
    assert!(!registered.same_entity(&batch[1]));
}

#[test]
fn test_setup_from_yaml() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("secrets.yaml"), "hall_packet: \"0x02\"\n").unwrap();

    let yaml = ha_config::load_yaml_string(
        dir.path(),
        r#"
switch:
  - platform: rfxtrx_multistate
    devices:
      kitchen_switch:
        name: Kitchen
        packetid: "0x01"
        fire_event: true
      hall_switch:
        name: Hall
        packetid: !secret hall_packet
  - platform: template
"#,
        "configuration.yaml",
    )
    .unwrap();

    let configs = MultiStateSwitchConfig::from_yaml(&yaml).unwrap();
    assert_eq!(configs.len(), 1);

    let hass = Hass::new();
    let hub = RfxtrxHub::new();
    let (batch, _) = setup(&hass, &hub, &configs[0]).unwrap();

    let names: Vec<_> = batch.iter().map(|s| s.name()).collect();
    assert_eq!(names, vec!["Kitchen", "Hall"]);
    assert!(batch[0].should_fire_event());
    assert!(!batch[1].should_fire_event());
}

#[tokio::test]
async fn test_gateway_loop_updates_switches() {
    init_tracing();
    let hass = Hass::new();
    let hub = Arc::new(RfxtrxHub::new());
    setup(&hass, &hub, &config(&[("kitchen_switch", device("Kitchen", "01", true))])).unwrap();
    let mut pressed = hass.bus.subscribe_typed::<ButtonPressedData>();

    let (tx, rx) = mpsc::channel(16);
    let gateway = tokio::spawn(hub.clone().run(rx));

    tx.send(command("kitchen_switch", "Mood1")).await.unwrap();
    tx.send(RxEvent::new(RfxDevice::new("kitchen_switch", DeviceKind::Sensor)))
        .await
        .unwrap();
    tx.send(command("kitchen_switch", "Off")).await.unwrap();
    drop(tx);
    gateway.await.unwrap();

    assert_eq!(switch_state(&hub, "kitchen_switch"), "off");
    assert!(hass.states.is_state("switch.kitchen_switch", "off"));

    let first = pressed.recv().await.unwrap();
    assert_eq!(first.data.state, "mood1");
    let second = pressed.recv().await.unwrap();
    assert_eq!(second.data.state, "off");
}
