use std::sync::Arc;
use std::time::Instant;

use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use pendant_core::{
    Direction, EdgeDecoder, EncoderTick, PendantConfig, QuadratureDecoder, TickQueue, build_pendant,
};
use pendant_hardware::{RecordingBus, SimulatedEnableLine, SimulatedPanel};
use pendant_traits::{MonotonicClock, PanelLevels};

// Synthetic crank: pseudo-random direction changes over a Gray-code walk
fn synth_walk(n: usize, seed: u32) -> Vec<(bool, bool)> {
    // tiny PRNG
    let mut state = seed.max(1);
    let mut next = || {
        let mut x = state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        state = x;
        x
    };
    let mut pos: i64 = 0;
    let mut forward = true;
    let mut v = Vec::with_capacity(n);
    for _ in 0..n {
        if next() % 64 == 0 {
            forward = !forward;
        }
        pos += if forward { 1 } else { -1 };
        v.push(match pos.rem_euclid(4) {
            0 => (false, false),
            1 => (true, false),
            2 => (true, true),
            _ => (false, true),
        });
    }
    v
}

fn configure(g: &mut criterion::BenchmarkGroup<'_, criterion::measurement::WallTime>) {
    // Allow quick tweaking without CLI flags (Criterion 0.5):
    //   BENCH_SAMPLE_SIZE=10 BENCH_MEAS_MS=50 cargo bench -p pendant_core --bench decoder
    if let Ok(ss) = std::env::var("BENCH_SAMPLE_SIZE") {
        if let Ok(n) = ss.parse::<usize>() {
            g.sample_size(n.max(1));
        }
    } else {
        g.sample_size(50);
    }
    if let Ok(ms) = std::env::var("BENCH_MEAS_MS")
        && let Ok(ms_u64) = ms.parse::<u64>()
    {
        g.measurement_time(std::time::Duration::from_millis(ms_u64));
    }
}

pub fn bench_decode(c: &mut Criterion) {
    let mut g = c.benchmark_group("decode");
    configure(&mut g);
    let walk = synth_walk(50_000, 0xC0FFEE);

    g.bench_function("table_walk", |b| {
        let now = Instant::now();
        b.iter(|| {
            let mut d = QuadratureDecoder::new(false, false);
            let mut net = 0i32;
            for &(a, bl) in black_box(&walk) {
                if let Some(t) = d.edge(a, bl, now) {
                    net += t.direction.sign();
                }
            }
            black_box(net);
        })
    });

    g.bench_function("edge_decoder_enqueue_drain", |b| {
        b.iter_batched(
            || {
                let q = Arc::new(TickQueue::new(64));
                let d = EdgeDecoder::new(false, false, Arc::clone(&q), MonotonicClock::new());
                (q, d)
            },
            |(q, d)| {
                for &(a, bl) in &walk[..4096] {
                    d.on_levels(a, bl);
                    if q.len() >= 32 {
                        black_box(q.drain().count());
                    }
                }
            },
            BatchSize::SmallInput,
        )
    });
    g.finish();
}

pub fn bench_cycle(c: &mut Criterion) {
    let mut g = c.benchmark_group("control_cycle");
    configure(&mut g);
    let panel = SimulatedPanel::new(PanelLevels {
        axis: [true, false, false],
        speed: [false, true, false],
        adaptive: true,
    });
    let bus = RecordingBus::new();
    let mut ctl = build_pendant(
        panel,
        bus.clone(),
        SimulatedEnableLine::new(),
        PendantConfig::default(),
        None,
    )
    .expect("build");
    let queue = ctl.tick_queue();

    g.bench_function("step_with_tick", |b| {
        let mut forward = true;
        b.iter(|| {
            forward = !forward;
            let direction = if forward { Direction::Forward } else { Direction::Reverse };
            queue.push(EncoderTick {
                direction,
                at: Instant::now(),
            });
            black_box(ctl.step());
            black_box(bus.take_frames());
        })
    });
    g.finish();
}

criterion_group!(decoder, bench_decode, bench_cycle);
criterion_main!(decoder);
