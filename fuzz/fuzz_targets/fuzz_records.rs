#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(records) = hiddenlab_core::record::RecordList::parse(s) {
            let json = records.to_json().unwrap();
            let again = hiddenlab_core::record::RecordList::parse(&json).unwrap();
            assert_eq!(records, again);
        }
    }
});
