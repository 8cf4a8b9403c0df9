//! Property-based tests for the occupancy and ordering invariants.
//!
//! Random operation sequences are replayed against both the ring and a
//! `VecDeque` model bounded at `capacity - 1` records.

use proptest::prelude::*;
use recring_rs::{RingBuffer, RingError};
use std::collections::VecDeque;

#[derive(Debug, Clone)]
enum Op {
    Write(usize),
    Read(usize),
    Peek { offset: usize, count: usize },
    Flush,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0usize..8).prop_map(Op::Write),
        4 => (0usize..8).prop_map(Op::Read),
        1 => (0usize..6, 0usize..6).prop_map(|(offset, count)| Op::Peek { offset, count }),
        1 => Just(Op::Flush),
    ]
}

const RECORD: usize = 3;

fn record(seq: u32) -> [u8; RECORD] {
    let b = seq.to_le_bytes();
    [b[0], b[1], b[2]]
}

// =============================================================================
// Occupancy identity: data_count + space_count == capacity - 1
// =============================================================================

proptest! {
    #[test]
    fn prop_occupancy_identity(
        capacity in 2usize..12,
        ops in prop::collection::vec(op_strategy(), 1..80),
    ) {
        let ring = RingBuffer::create(capacity, RECORD).unwrap();
        prop_assert_eq!(ring.data_count(), 0);
        prop_assert_eq!(ring.space_count(), capacity - 1);

        for op in ops {
            match op {
                Op::Write(n) => { let _ = ring.write(&vec![0u8; n * RECORD]); }
                Op::Read(n) => { let _ = ring.read(&mut vec![0u8; n * RECORD]); }
                Op::Peek { offset, count } => {
                    let _ = ring.peek(&mut vec![0u8; count * RECORD], offset);
                }
                Op::Flush => { ring.flush(); }
            }
            prop_assert_eq!(ring.data_count() + ring.space_count(), capacity - 1);
            prop_assert!(ring.data_count() <= capacity - 1);
        }
    }
}

// =============================================================================
// FIFO equivalence with a bounded queue, including all-or-nothing rejections
// =============================================================================

proptest! {
    #[test]
    fn prop_matches_bounded_queue(
        capacity in 2usize..12,
        ops in prop::collection::vec(op_strategy(), 1..120),
    ) {
        let ring = RingBuffer::create(capacity, RECORD).unwrap();
        let mut model: VecDeque<[u8; RECORD]> = VecDeque::new();
        let mut seq = 0u32;

        for op in ops {
            match op {
                Op::Write(n) => {
                    let records: Vec<[u8; RECORD]> = (0..n).map(|i| record(seq + i as u32)).collect();
                    let src: Vec<u8> = records.concat();
                    let free = capacity - 1 - model.len();
                    match ring.write(&src) {
                        Ok(written) => {
                            prop_assert!(n <= free);
                            prop_assert_eq!(written, n);
                            model.extend(records);
                            seq += n as u32;
                        }
                        Err(e) => {
                            prop_assert!(n > free);
                            prop_assert_eq!(e, RingError::InsufficientSpace { requested: n, available: free });
                        }
                    }
                }
                Op::Read(n) => {
                    let mut dst = vec![0u8; n * RECORD];
                    match ring.read(&mut dst) {
                        Ok(read) => {
                            prop_assert_eq!(read, n);
                            let expected: Vec<u8> = model.drain(..n).flatten().collect();
                            prop_assert_eq!(dst, expected);
                        }
                        Err(e) => {
                            prop_assert!(n > model.len());
                            prop_assert_eq!(e, RingError::InsufficientData { requested: n, available: model.len() });
                            prop_assert!(dst.iter().all(|b| *b == 0));
                        }
                    }
                }
                Op::Peek { offset, count } => {
                    let mut dst = vec![0u8; count * RECORD];
                    match ring.peek(&mut dst, offset) {
                        Ok(_) => {
                            let expected: Vec<u8> =
                                model.iter().skip(offset).take(count).flatten().copied().collect();
                            prop_assert_eq!(dst, expected);
                        }
                        Err(_) => prop_assert!(offset + count > model.len()),
                    }
                }
                Op::Flush => {
                    prop_assert_eq!(ring.flush(), model.len());
                    model.clear();
                }
            }
            prop_assert_eq!(ring.data_count(), model.len());
        }
    }
}

// =============================================================================
// Round trip: n <= capacity - 1 records come back byte-identical
// =============================================================================

proptest! {
    #[test]
    fn prop_round_trip(
        capacity in 2usize..32,
        record_size in 1usize..16,
        seed in any::<u8>(),
        skew in 0usize..32,
    ) {
        let ring = RingBuffer::create(capacity, record_size).unwrap();

        // Move the cursors so the batch may straddle the end of storage
        let skew = skew % capacity;
        let filler = vec![0u8; skew.min(capacity - 1) * record_size];
        ring.write(&filler).unwrap();
        ring.read(&mut vec![0u8; filler.len()]).unwrap();

        let n = capacity - 1;
        let src: Vec<u8> = (0..n * record_size).map(|i| seed.wrapping_add(i as u8)).collect();
        prop_assert_eq!(ring.write(&src), Ok(n));
        let mut dst = vec![0u8; src.len()];
        prop_assert_eq!(ring.read(&mut dst), Ok(n));
        prop_assert_eq!(dst, src);
    }
}
