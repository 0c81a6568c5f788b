#![no_main]
use libfuzzer_sys::fuzz_target;

use hiddenlab_core::record::RecordList;
use hiddenlab_core::types::{Mark, RecordKind};

const OPTIONS: [&str; 6] = ["border", "text", "icon", "imageOrVideo", "emptySpace", "other"];
const MARKS: [Mark; 3] = [Mark::Yes, Mark::No, Mark::Unset];

// Each byte drives one edit; the list must stay well-formed throughout.
fuzz_target!(|data: &[u8]| {
    let mut records = RecordList::default();
    for &b in data {
        let arg = usize::from(b >> 3);
        match b & 0b111 {
            0 => {
                let _ = records.toggle_mark(RecordKind::IsCorrect, MARKS[arg % 3]);
            }
            1 => {
                let _ = records.toggle_mark(RecordKind::IsHidden, MARKS[arg % 3]);
            }
            2 => {
                records.toggle_element_option(OPTIONS[arg % OPTIONS.len()]);
            }
            3 => {
                records.set_others_text(if arg % 2 == 0 { "" } else { "slider" });
            }
            4 => {
                records.toggle_frame(if arg % 2 == 0 { "during" } else { "after" });
            }
            _ => {
                let _ = records.set_mark(RecordKind::ElementType, Mark::Yes);
            }
        }
        for kind in RecordKind::ALL {
            assert!(records.iter().filter(|r| r.is(kind)).count() <= 1);
        }
        if let Some(sel) = records.element_selection() {
            assert!(!sel.is_empty());
        }
    }
    let reparsed = RecordList::parse(&records.to_json().unwrap()).unwrap();
    assert_eq!(records, reparsed);
});
