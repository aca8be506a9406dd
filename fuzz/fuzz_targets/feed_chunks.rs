#![no_main]

use libfuzzer_sys::fuzz_target;
use sxml::{Session, translate};
use tools::utf8::Utf8Decoder;

// First byte picks the chunk size; the rest is the document.
fuzz_target!(|data: &[u8]| {
    let Some((&size, body)) = data.split_first() else {
        return;
    };
    let size = usize::from(size % 16) + 1;

    let mut decoder = Utf8Decoder::new();
    let mut session = Session::new();
    let mut fragments = Vec::new();
    let mut whole = String::new();
    let mut text = String::new();
    for chunk in body.chunks(size) {
        text.clear();
        decoder.push(chunk, &mut text);
        whole.push_str(&text);
        session.feed_into(&text, &mut fragments);
    }
    text.clear();
    decoder.finish(&mut text);
    whole.push_str(&text);
    session.feed_into(&text, &mut fragments);

    assert_eq!(fragments.concat(), translate(&whole));
});
