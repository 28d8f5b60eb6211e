//! Ring semantics and runtime capacity changes for history buffers.

use traymon::history::HistoryBuffer;

#[test]
fn pushing_past_capacity_keeps_the_newest_values() {
    let mut hist = HistoryBuffer::new(5);
    for i in 0..9 {
        hist.push("cpu_percent", i as f64);
    }
    assert_eq!(hist.snapshot("cpu_percent"), vec![4.0, 5.0, 6.0, 7.0, 8.0]);
}

#[test]
fn snapshot_of_unknown_key_is_empty() {
    let hist = HistoryBuffer::new(5);
    assert!(hist.snapshot("nope").is_empty());
}

#[test]
fn series_are_created_lazily_per_key() {
    let mut hist = HistoryBuffer::new(3);
    hist.push("a", 1.0);
    hist.push("b", 2.0);
    assert_eq!(hist.snapshot("a"), vec![1.0]);
    assert_eq!(hist.snapshot("b"), vec![2.0]);
}

#[test]
fn shrinking_capacity_truncates_from_the_oldest_end() {
    let mut hist = HistoryBuffer::new(10);
    for i in 0..6 {
        hist.push("k", i as f64);
    }
    hist.set_capacity("k", 3);
    assert_eq!(hist.snapshot("k"), vec![3.0, 4.0, 5.0]);
    // and the new cap holds for later pushes
    hist.push("k", 6.0);
    assert_eq!(hist.snapshot("k"), vec![4.0, 5.0, 6.0]);
}

#[test]
fn growing_capacity_preserves_existing_values() {
    let mut hist = HistoryBuffer::new(2);
    hist.push("k", 1.0);
    hist.push("k", 2.0);
    hist.set_capacity("k", 4);
    hist.push("k", 3.0);
    hist.push("k", 4.0);
    assert_eq!(hist.snapshot("k"), vec![1.0, 2.0, 3.0, 4.0]);
}
