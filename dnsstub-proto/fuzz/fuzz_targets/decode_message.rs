#![no_main]

use dnsstub_proto::buffer::PacketBuffer;
use dnsstub_proto::message::MessageReader;

libfuzzer_sys::fuzz_target!(|buffer: PacketBuffer| {
    let mut buffer = buffer;
    let mut reader = MessageReader::new(&mut buffer);
    let Ok(header) = reader.read_header() else {
        return;
    };
    for _ in 0..header.question_count {
        if reader.read_question().is_err() {
            return;
        }
    }
    for _ in 0..header.answer_count {
        if reader.read_resource_record().is_err() {
            return;
        }
    }
});
