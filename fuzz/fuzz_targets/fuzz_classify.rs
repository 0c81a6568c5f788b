#![no_main]
use libfuzzer_sys::fuzz_target;

use hiddenlab_core::record::RecordList;
use hiddenlab_core::types::Gesture;
use hiddenlab_engine::classify::{is_validated_hidden, FilterRule};

fuzz_target!(|data: &[u8]| {
    let Ok(s) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(records) = RecordList::parse(s) else {
        return;
    };
    for gesture in Gesture::ALL {
        let verdict = is_validated_hidden(gesture, &records);
        assert_eq!(verdict, FilterRule::ValidatedHidden.matches(gesture, &records));
        let _ = FilterRule::AllMarkedYes.matches(gesture, &records);
    }
});
