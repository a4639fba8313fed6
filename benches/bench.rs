// Criterion benchmarks for Santa Exchange

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;
use santa_exchange::core::{
    assign_once, generate_message, wrap_line, AssignmentGenerator, MessageDefaults,
};
use santa_exchange::models::{Assignment, EmailFormat, Exchange, Organizer, Participant};

fn create_participants(count: i64) -> Vec<Participant> {
    (1..=count)
        .map(|id| {
            let mut participant = Participant::new(
                id,
                &format!("Participant {}", id),
                &format!("P{}", id),
                &format!("p{}@example.com", id),
            );
            // Partners conflict with each other, as in a typical family exchange
            let partner = if id % 2 == 0 { id - 1 } else { id + 1 };
            if partner <= count {
                participant.add_conflict(partner);
            }
            participant
        })
        .collect()
}

fn create_defaults() -> MessageDefaults {
    MessageDefaults {
        sender_name: "Secret Santa".to_string(),
        sender_address: "santa@example.com".to_string(),
        template_group: "exchange".to_string(),
        email_format: EmailFormat::Multipart,
        template_name: "standard".to_string(),
    }
}

fn bench_assign_once(c: &mut Criterion) {
    let participants = create_participants(20);
    let mut rng = StdRng::seed_from_u64(42);

    c.bench_function("assign_once_20_participants", |b| {
        b.iter(|| assign_once(black_box(&participants), black_box(true), &mut rng))
    });
}

fn bench_generate(c: &mut Criterion) {
    let generator = AssignmentGenerator::new(1000);

    let mut group = c.benchmark_group("generate_assignments");

    for participant_count in [4i64, 10, 25, 50, 100].iter() {
        let participants = create_participants(*participant_count);

        for auto_conflict in [false, true] {
            group.bench_with_input(
                BenchmarkId::new(format!("auto_conflict_{}", auto_conflict), participant_count),
                participant_count,
                |b, _| {
                    let mut rng = StdRng::seed_from_u64(7);
                    b.iter(|| {
                        generator.generate_with_rng(
                            black_box(&participants),
                            black_box(auto_conflict),
                            &mut rng,
                        )
                    });
                },
            );
        }
    }

    group.finish();
}

fn bench_wrap_line(c: &mut Criterion) {
    let text = "Please bring a wrapped gift and something to share. ".repeat(40);

    c.bench_function("wrap_line_2k_chars", |b| {
        b.iter(|| wrap_line(black_box(&text), black_box(75), black_box("\r\n")))
    });
}

fn bench_generate_message(c: &mut Criterion) {
    let participants = create_participants(2);
    let exchange = Exchange {
        name: Some("Family".to_string()),
        date_and_time: Some("December 24".to_string()),
        extra_info: Some("Please bring a wrapped gift and something to share. ".repeat(10)),
        organizer: Organizer::new("Ken", "ken@example.com", "555-1212"),
        participants: participants.clone(),
        ..Exchange::default()
    };
    let assignment = Assignment::new(participants[0].clone(), participants[1].clone());
    let defaults = create_defaults();

    c.bench_function("generate_message", |b| {
        b.iter(|| {
            generate_message(
                black_box(&defaults),
                black_box(&exchange),
                black_box(&assignment),
                false,
            )
        })
    });
}

criterion_group!(
    benches,
    bench_assign_once,
    bench_generate,
    bench_wrap_line,
    bench_generate_message
);

criterion_main!(benches);
