use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};

use rust_forkdrive::core::{Action, Mode, SimRng, TrainerConfig};
use rust_forkdrive::nn::Network;
use rust_forkdrive::tracks::simple::SimpleTrackBuilder;
use rust_forkdrive::training::{MemoryStore, TimelineTrainer};

const TOPOLOGY: [usize; 6] = [18, 30, 30, 30, 10, 4];

fn bench_network(c: &mut Criterion) {
    let mut rng = SimRng::new(7);
    let input: Vec<f32> = (0..TOPOLOGY[0]).map(|_| rng.gen_range_f32(-1.0..1.0)).collect();
    let expected = [1.0, -1.0, -1.0, 1.0];

    let mut net = Network::new(&TOPOLOGY, 0.02, &mut SimRng::new(1)).unwrap();
    c.bench_function("feed_forward", |b| {
        b.iter(|| {
            net.feed_forward(black_box(&input)).unwrap();
        })
    });

    c.bench_function("feed_forward_back_prop", |b| {
        b.iter(|| {
            net.feed_forward(black_box(&input)).unwrap();
            net.back_prop(black_box(&expected)).unwrap();
        })
    });

    let text = net.to_text(1);
    c.bench_function("from_text", |b| {
        b.iter(|| Network::from_text(black_box(&text), 0.02).unwrap())
    });
}

fn bench_training_tick(c: &mut Criterion) {
    c.bench_function("training_1000_ticks", |b| {
        b.iter_batched(
            || {
                let config = TrainerConfig::default().with_saving_interval(10);
                let mut trainer = TimelineTrainer::new(config, MemoryStore::new()).unwrap();
                trainer.select_mode(Mode::Training);
                (trainer, SimpleTrackBuilder::new().build())
            },
            |(mut trainer, mut world)| {
                for _ in 0..1000 {
                    trainer.tick(&mut world, Action::IDLE).unwrap();
                    world.step();
                }
                trainer
            },
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, bench_network, bench_training_tick);
criterion_main!(benches);
