use hiddenlab_core::record::RecordList;
use hiddenlab_core::types::{element, Gesture, Mark, RecordKind};

/// Whether an instance counts as a validated hidden interaction.
///
/// Rule by gesture:
/// - `tap`: marked correct, and the element record names exactly one
///   category which is `imageOrVideo` or `emptySpace`
/// - `double_tap`, `long_press`: marked correct
/// - every other gesture: marked correct and marked hidden
///
/// Lookups take the first record of each type. Missing records and
/// decisions of the wrong shape never equal `o`, so partially reviewed or
/// malformed instances are not counted. `D/A` records are not consulted.
pub fn is_validated_hidden(gesture: Gesture, records: &RecordList) -> bool {
    let correct = marked_yes(records, RecordKind::IsCorrect);

    match gesture {
        Gesture::Tap => correct && single_signal_free_element(records),
        Gesture::DoubleTap | Gesture::LongPress => correct,
        Gesture::SwipeLeft
        | Gesture::SwipeRight
        | Gesture::ScrollDown
        | Gesture::ScrollUp
        | Gesture::PinchZoomIn
        | Gesture::PinchZoomOut => correct && marked_yes(records, RecordKind::IsHidden),
    }
}

fn marked_yes(records: &RecordList, kind: RecordKind) -> bool {
    records.mark(kind) == Some(Mark::Yes)
}

fn single_signal_free_element(records: &RecordList) -> bool {
    let Some(selection) = records.element_selection() else {
        return false;
    };
    match selection.distinct_options().as_slice() {
        [only] => element::is_signal_free(only),
        _ => false,
    }
}
