#![no_main]
use libfuzzer_sys::fuzz_target;
use station_core::Report;

fuzz_target!(|data: &str| {
    if let Ok(received) = Report::parse(data)
        && let Some(report) = received.into_report()
    {
        // A complete report must survive a second pass through the wire format.
        let again = Report::parse(&report.to_string());
        assert!(again.is_ok());
    }
});
