use station_core::{
    HandshakeCfg, HandshakeSession, ListenCfg, ListenSession, ModemState, Peripheral,
    SessionEvent, StationError,
};
use station_hardware::{SimulatedModem, SimulatedSerial, SimulatedSwitch};
use station_traits::clock::test_clock::TestClock;
use station_traits::{BoxError, ByteStream, PowerSwitch};

const TAG: &str = "0415ABCDEF012345";

fn tag_reader() -> (
    Peripheral<SimulatedSerial, SimulatedSwitch, ListenSession, TestClock>,
    station_hardware::SerialHandle,
    SimulatedSwitch,
    TestClock,
) {
    let serial = SimulatedSerial::new();
    let device = serial.handle();
    let switch = SimulatedSwitch::new();
    let clock = TestClock::new();
    let p = Peripheral::new(
        serial,
        switch.clone(),
        ListenSession::new(ListenCfg::default()),
        clock.clone(),
    );
    (p, device, switch, clock)
}

#[test]
fn unpowered_device_ignores_traffic() {
    let (mut p, device, switch, _clock) = tag_reader();
    device.inject(format!("{TAG}\r").as_bytes());
    assert!(p.update().unwrap().is_empty());
    assert!(!switch.is_on());
    assert_eq!(device.pending(), TAG.len() + 1);
}

#[test]
fn tag_read_extends_window_once() {
    let (mut p, device, switch, clock) = tag_reader();
    p.power_up().unwrap();
    assert!(switch.is_on());

    clock.advance(1_000);
    device.inject(format!("{TAG}\r").as_bytes());
    let events = p.update().unwrap();
    assert_eq!(
        events,
        vec![SessionEvent::TagRead {
            tag: TAG.into(),
            first_since_power_up: true
        }]
    );
    assert_eq!(p.window().total_on_ms(), 31_000);

    clock.advance(1_000);
    device.inject(format!("{TAG}\r").as_bytes());
    let events = p.update().unwrap();
    assert!(matches!(
        events.as_slice(),
        [SessionEvent::TagRead {
            first_since_power_up: false,
            ..
        }]
    ));
    assert_eq!(p.window().total_on_ms(), 31_000);

    clock.set(31_000);
    p.update().unwrap();
    assert!(p.is_on());
    clock.set(31_001);
    p.update().unwrap();
    assert!(!p.is_on());
    assert!(!switch.is_on());
}

#[test]
fn power_cycle_discards_partial_frame() {
    let (mut p, device, _switch, clock) = tag_reader();
    p.power_up().unwrap();
    device.inject(b"0415ABCD");
    p.update().unwrap();
    p.power_down().unwrap();

    p.power_up().unwrap();
    clock.advance(10);
    device.inject(format!("{TAG}\r").as_bytes());
    let events = p.update().unwrap();
    assert_eq!(
        events,
        vec![SessionEvent::TagRead {
            tag: TAG.into(),
            first_since_power_up: true
        }]
    );
}

#[test]
fn oversized_line_is_truncated_and_counted() {
    let (mut p, device, _switch, _clock) = tag_reader();
    p.power_up().unwrap();
    let long = "9".repeat(100);
    device.inject(format!("{long}\r").as_bytes());
    let events = p.update().unwrap();
    let [SessionEvent::TagRead { tag, .. }] = events.as_slice() else {
        panic!("expected one tag, got {events:?}");
    };
    assert_eq!(tag.len(), 47);
    assert_eq!(p.dropped_bytes(), 53);
}

fn modem() -> (
    Peripheral<SimulatedModem, SimulatedSwitch, HandshakeSession, TestClock>,
    TestClock,
) {
    let clock = TestClock::new();
    let p = Peripheral::new(
        SimulatedModem::new(1),
        SimulatedSwitch::new(),
        HandshakeSession::new(HandshakeCfg::default()),
        clock.clone(),
    );
    (p, clock)
}

#[test]
fn modem_registers_and_sends_report() {
    let (mut p, clock) = modem();
    p.power_up().unwrap();

    // First query goes out one interval after power-up; the simulated
    // network answers "not registered" once.
    clock.advance(10_000);
    assert!(p.update().unwrap().is_empty());
    assert_eq!(p.protocol().commands_sent(), 1);

    clock.advance(10_000);
    assert!(p.update().unwrap().is_empty());
    assert_eq!(p.protocol().state(), ModemState::NotRegistered);
    assert!(p.protocol().ok_received());

    clock.advance(10);
    assert_eq!(p.update().unwrap(), vec![SessionEvent::Registered]);
    assert!(p.protocol().is_connected());
    assert_eq!(p.window().total_on_ms(), 300_000 + 20_010);

    assert!(p.protocol_mut().queue_text("1500000000000,TAG,,812.3"));
    clock.advance(10);
    assert_eq!(p.update().unwrap(), vec![SessionEvent::TextModeArmed]);
    assert_eq!(p.protocol().state(), ModemState::AwaitingPrompt);

    clock.advance(10);
    assert_eq!(p.update().unwrap(), vec![SessionEvent::PromptReceived]);
    assert_eq!(p.protocol().state(), ModemState::AwaitingConfirmation);

    clock.advance(10);
    assert_eq!(
        p.update().unwrap(),
        vec![SessionEvent::MessageSent { reference: Some(1) }]
    );
    assert!(p.protocol().was_text_sent());
    assert!(p.protocol().is_ready_for_text());
    assert_eq!(
        p.stream().sent_messages(),
        ["1500000000000,TAG,,812.3".to_string()]
    );
}

#[test]
fn unregistered_modem_times_out() {
    let clock = TestClock::new();
    let mut p = Peripheral::new(
        SimulatedModem::new(u32::MAX),
        SimulatedSwitch::new(),
        HandshakeSession::new(HandshakeCfg::default()),
        clock.clone(),
    );
    p.power_up().unwrap();
    for _ in 0..30 {
        clock.advance(10_000);
        p.update().unwrap();
    }
    assert!(p.is_on());
    clock.advance(1);
    p.update().unwrap();
    assert!(!p.is_on());
    assert_eq!(p.protocol().state(), ModemState::NotRegistered);
}

struct BrokenUart;

impl ByteStream for BrokenUart {
    fn available(&mut self) -> usize {
        0
    }
    fn read_byte(&mut self) -> Option<u8> {
        None
    }
    fn write(&mut self, _bytes: &[u8]) -> Result<(), BoxError> {
        Err(Box::new(station_hardware::error::HwError::Uart(
            "tx fifo stuck".into(),
        )))
    }
}

#[test]
fn write_failure_is_mapped_and_reported() {
    let clock = TestClock::new();
    let mut p = Peripheral::new(
        BrokenUart,
        SimulatedSwitch::new(),
        HandshakeSession::new(HandshakeCfg::default()),
        clock.clone(),
    );
    p.power_up().unwrap();
    clock.advance(10_000);
    let err = p.update().unwrap_err();
    assert!(format!("{err}").contains("modem write"));
    let root = err.downcast_ref::<StationError>().unwrap();
    assert!(matches!(root, StationError::HardwareFault(msg) if msg.contains("tx fifo stuck")));
}

#[test]
fn power_down_starts_the_next_session_fresh() {
    let clock = TestClock::new();
    let mut p = Peripheral::new(
        SimulatedModem::new(0),
        SimulatedSwitch::new(),
        HandshakeSession::new(HandshakeCfg::default()),
        clock.clone(),
    );
    p.power_up().unwrap();
    assert!(p.protocol_mut().queue_text("1500000000000,TAG,,1.0"));
    clock.advance(10_000);
    p.update().unwrap();
    for _ in 0..30 {
        clock.advance(10);
        p.update().unwrap();
    }
    assert!(p.protocol().was_text_sent());
    assert!(p.protocol().commands_sent() > 0);
    assert!(p.protocol().responses_received() > 0);

    p.power_down().unwrap();
    assert_eq!(p.protocol().state(), ModemState::NotRegistered);
    assert_eq!(p.protocol().commands_sent(), 0);
    assert_eq!(p.protocol().responses_received(), 0);
    assert!(!p.protocol().was_text_sent());
    assert!(!p.protocol().ok_received());
}

#[test]
fn tag_reader_power_down_clears_last_tag() {
    let (mut p, device, _switch, clock) = tag_reader();
    p.power_up().unwrap();
    clock.advance(100);
    device.inject(format!("{TAG}\r").as_bytes());
    p.update().unwrap();
    assert!(p.protocol().has_tag_been_read());

    p.power_down().unwrap();
    assert!(!p.protocol().has_tag_been_read());
    assert_eq!(p.protocol().tag(), None);
}
