#![no_main]

use dgm_runtime::{ActionDispatcher, DispatchOutcome};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let mut dispatcher = ActionDispatcher::default();
    let before = std::sync::Arc::clone(dispatcher.stack().root());

    match dispatcher.dispatch_json(text) {
        Ok(DispatchOutcome::Executed { .. }) => {
            assert_eq!(dispatcher.stack().undo_depth(), 1);
            dispatcher.stack().committed_root().validate().unwrap();
            let mut ts = 0.0;
            while dispatcher.stack().is_animating() {
                dispatcher.on_frame(ts);
                ts += 100.0;
            }
            dispatcher.stack().root().validate().unwrap();
        }
        Ok(_) | Err(_) => {
            // Nothing was committed.
            assert!(std::sync::Arc::ptr_eq(dispatcher.stack().root(), &before));
            assert_eq!(dispatcher.stack().undo_depth(), 0);
        }
    }
});
