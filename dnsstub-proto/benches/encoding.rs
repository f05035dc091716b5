use criterion::{black_box, criterion_group, criterion_main, Criterion};
use dnsstub_proto::buffer::PacketBuffer;
use dnsstub_proto::message::{write_query, Question, RecordType};

fn criterion_benchmark(c: &mut Criterion) {
    c.bench_function("encode query", |b| {
        b.iter(|| {
            let mut buf = PacketBuffer::udp_sized();
            let question = black_box(Question::new("app.datadoghq.com", RecordType::A));
            write_query(&mut buf, 45838, true, &question).unwrap();
            black_box(buf)
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
