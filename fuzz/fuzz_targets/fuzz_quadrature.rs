#![no_main]
use libfuzzer_sys::fuzz_target;
use pendant_core::QuadratureDecoder;
use std::time::Instant;

fuzz_target!(|levels: Vec<(bool, bool)>| {
    let now = Instant::now();
    let mut dec = QuadratureDecoder::new(false, false);
    let mut net = 0i64;
    for (a, b) in levels.iter().copied() {
        if let Some(tick) = dec.edge(a, b, now) {
            net += i64::from(tick.direction.sign());
        }
    }
    // Steps move one Gray-code position and rejected jumps move two, so
    // together they must land on the final position modulo 4.
    let pos = |(a, b): (bool, bool)| match (a, b) {
        (false, false) => 0,
        (true, false) => 1,
        (true, true) => 2,
        (false, true) => 3,
    };
    let last = levels.last().copied().unwrap_or((false, false));
    let jumps = i64::try_from(dec.invalid_transitions()).unwrap_or(0);
    assert_eq!((net + 2 * jumps).rem_euclid(4), pos(last));
});
