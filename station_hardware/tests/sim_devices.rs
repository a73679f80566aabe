use rstest::rstest;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::thread;
use std::time::Duration;

use station_hardware::SimulatedModem;
use station_hardware::util::{decode_sample, wait_until_low_with_timeout};
use station_traits::ByteStream;

fn drain(modem: &mut SimulatedModem) -> String {
    let mut out = Vec::new();
    while let Some(b) = modem.read_byte() {
        out.push(b);
    }
    String::from_utf8_lossy(&out).into_owned()
}

#[rstest]
#[case(0, 1)]
#[case(2, 3)]
#[case(5, 6)]
fn modem_registers_on_query_after_delay(#[case] delay: u32, #[case] registered_on: u32) {
    let mut modem = SimulatedModem::new(delay);
    for query in 1..=registered_on {
        modem.write(b"AT+CREG?\r").unwrap();
        let reply = drain(&mut modem);
        if query < registered_on {
            assert!(reply.contains("+CREG: 0,2"), "query {query}: {reply:?}");
        } else {
            assert!(reply.contains("+CREG: 0,1"), "query {query}: {reply:?}");
        }
    }
}

#[rstest]
#[case(b"AT+CMGF=1\r".as_slice(), "\r\nOK\r\n")]
#[case(b"AT+CMGS=\"+15005550006\"\r".as_slice(), "\r\n> ")]
#[case(b"ATD123;\r".as_slice(), "\r\nERROR\r\n")]
fn modem_command_replies(#[case] cmd: &[u8], #[case] expected: &str) {
    let mut modem = SimulatedModem::new(0);
    modem.write(cmd).unwrap();
    assert_eq!(drain(&mut modem), expected);
}

#[test]
fn modem_numbers_each_accepted_message() {
    let mut modem = SimulatedModem::new(0);
    for body in ["one", "two"] {
        modem.write(b"AT+CMGS=\"+1\"\r").unwrap();
        drain(&mut modem);
        modem.write(body.as_bytes()).unwrap();
        modem.write(&[0x1A]).unwrap();
    }
    assert_eq!(modem.sent_messages(), ["one".to_string(), "two".to_string()]);
    assert!(drain(&mut modem).contains("+CMGS: 2"));
}

#[rstest]
#[case([0x00, 0x00, 0x00], 0x80_0000)]
#[case([0x00, 0x02, 0xC8], 0x80_02C8)]
#[case([0xFF, 0xFD, 0x38], 0x7F_FD38)]
fn decode_sample_cases(#[case] bytes: [u8; 3], #[case] expected: i32) {
    assert_eq!(decode_sample(bytes), expected);
}

#[test]
fn wait_until_low_success_path() {
    let high = Arc::new(AtomicBool::new(true));
    let high_bg = high.clone();
    thread::spawn(move || {
        thread::sleep(Duration::from_millis(3));
        high_bg.store(false, Ordering::Relaxed);
    });

    let res = wait_until_low_with_timeout(
        || high.load(Ordering::Relaxed),
        Duration::from_millis(200),
        Duration::from_micros(200),
    );
    assert!(res.is_ok(), "expected success, got {res:?}");
}
