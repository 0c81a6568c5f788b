#![no_main]
use libfuzzer_sys::fuzz_target;

use hiddenlab_core::path::{gesture_from_path, InstancePath};

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let gesture = gesture_from_path(s);
        if let Ok(instance) = InstancePath::parse(s) {
            assert_eq!(instance.gesture(), gesture);
            let again = InstancePath::parse(&instance.to_string()).unwrap();
            assert_eq!(instance, again);
        }
    }
});
