#![no_main]
use libfuzzer_sys::fuzz_target;
use scoot_core::CacheRecord;

fuzz_target!(|data: &str| {
    // Any text must load as some record; whatever loads must survive a rewrite.
    let record = CacheRecord::parse(data);
    assert!(record.distance_pulses.is_finite());
    assert!(record.timestamp.is_finite());
    if let Ok(text) = record.render() {
        assert_eq!(CacheRecord::parse(&text), record);
    }
});
