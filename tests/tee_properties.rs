use std::sync::Arc;
use std::thread;

use proptest::prelude::*;
use shrun::exec::Tee;
use shrun_test_utils::sinks::{SharedBuffer, failing_sink};

fn chunks_strategy() -> impl Strategy<Value = Vec<Vec<u8>>> {
    proptest::collection::vec(proptest::collection::vec(any::<u8>(), 0..64), 0..32)
}

proptest! {
    #[test]
    fn every_sink_sees_the_concatenation(chunks in chunks_strategy()) {
        let a = SharedBuffer::new();
        let b = SharedBuffer::new();
        let mut tee = Tee::new(&[a.sink(), b.sink()]);

        for chunk in &chunks {
            tee.write_chunk(chunk);
        }

        let expected: Vec<u8> = chunks.concat();
        prop_assert_eq!(tee.captured(), &expected[..]);
        prop_assert_eq!(a.contents(), expected.clone());
        prop_assert_eq!(b.contents(), expected);
        prop_assert!(tee.sink_error().is_none());
    }

    #[test]
    fn broken_sink_position_does_not_matter(
        chunks in chunks_strategy(),
        position in 0..3usize,
    ) {
        let healthy: Vec<SharedBuffer> = (0..2).map(|_| SharedBuffer::new()).collect();
        let mut sinks = vec![healthy[0].sink(), healthy[1].sink()];
        sinks.insert(position, failing_sink());

        let mut tee = Tee::new(&sinks);
        for chunk in &chunks {
            tee.write_chunk(chunk);
        }

        let expected: Vec<u8> = chunks.concat();
        for buffer in &healthy {
            prop_assert_eq!(buffer.contents(), expected.clone());
        }
        prop_assert_eq!(tee.captured(), &expected[..]);
    }
}

#[test]
fn test_failed_sink_is_skipped_and_first_error_kept() {
    let ok = SharedBuffer::new();
    let mut tee = Tee::new(&[failing_sink(), ok.sink()]);

    tee.write_chunk(b"abc");
    tee.write_chunk(b"def");

    assert_eq!(tee.healthy_sinks(), 1);
    assert_eq!(ok.text(), "abcdef");

    let (captured, err) = tee.take_parts();
    assert_eq!(captured, b"abcdef");
    assert_eq!(err.unwrap().to_string(), "sink is broken");

    // take_parts leaves the tee empty
    assert!(tee.captured().is_empty());
    assert!(tee.sink_error().is_none());
}

#[test]
fn test_poisoned_sink_counts_as_failed() {
    let poisoned = SharedBuffer::new();
    let handle = poisoned.sink();
    let holder = Arc::clone(&handle);
    let _ = thread::spawn(move || {
        let _guard = holder.lock().unwrap();
        panic!("poison the sink");
    })
    .join();

    let ok = SharedBuffer::new();
    let mut tee = Tee::new(&[handle, ok.sink()]);
    tee.write_chunk(b"abc");
    tee.write_chunk(b"def");

    assert_eq!(tee.healthy_sinks(), 1);
    assert_eq!(ok.text(), "abcdef");
    assert_eq!(tee.captured(), b"abcdef");
    assert_eq!(tee.sink_error().unwrap().to_string(), "sink mutex poisoned");
}
