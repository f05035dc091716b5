use criterion::{black_box, criterion_group, criterion_main, Criterion};
use dnsstub_proto::buffer::PacketBuffer;
use dnsstub_proto::message::{write_query, MessageReader, Question, RecordType};

fn answer_packet() -> PacketBuffer {
    let mut buf = PacketBuffer::udp_sized();
    let question = Question::new("app.datadoghq.com", RecordType::A);
    write_query(&mut buf, 45838, true, &question).unwrap();
    buf.pos = 0;
    buf
}

fn criterion_benchmark(c: &mut Criterion) {
    let packet = answer_packet();
    c.bench_function("decode header and question", |b| {
        b.iter(|| {
            let mut buf = black_box(packet.buf.clone());
            let mut cursor = PacketBuffer::from_bytes(buf.split_off(0));
            let mut reader = MessageReader::new(&mut cursor);
            let header = reader.read_header().unwrap();
            let question = reader.read_question().unwrap();
            black_box((header, question))
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
