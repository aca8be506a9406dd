use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use sxml::{Session, translate};
use tools::utf8::Utf8Decoder;

const BLOCK_TEMPLATE: &str =
    "(div (@class box) (span hello (&nbsp 2)) (img (@src 'x.png')) ((aside)))\n";
const SMALL_BLOCKS: usize = 64;
const LARGE_BLOCKS: usize = 20_000;

fn make_blocks(blocks: usize) -> String {
    let mut source = String::with_capacity(BLOCK_TEMPLATE.len() * blocks);
    for _ in 0..blocks {
        source.push_str(BLOCK_TEMPLATE);
    }
    source
}

fn make_trapdoor_adversarial(bytes: usize) -> String {
    let mut body = String::with_capacity(bytes + 8);
    body.push_str("#(");
    while body.len() < bytes {
        body.push_str("<b>)x");
    }
    body.push_str(")#");
    body
}

fn bench_translate_small(c: &mut Criterion) {
    let input = make_blocks(SMALL_BLOCKS);
    c.bench_function("bench_translate_small", |b| {
        b.iter(|| black_box(translate(black_box(&input)).len()));
    });
}

fn bench_translate_large(c: &mut Criterion) {
    let input = make_blocks(LARGE_BLOCKS);
    c.bench_function("bench_translate_large", |b| {
        b.iter(|| black_box(translate(black_box(&input)).len()));
    });
}

fn bench_streaming_chunked(c: &mut Criterion) {
    let input = make_blocks(LARGE_BLOCKS);
    let bytes = input.as_bytes();
    let chunk_sizes = [1usize, 2, 3, 7, 64, 128, 256, 1024];
    c.bench_function("bench_streaming_chunked", |b| {
        b.iter_batched(
            || (Session::new(), Utf8Decoder::new()),
            |(mut session, mut decoder)| {
                let mut fragments = Vec::new();
                let mut text = String::new();
                let mut offset = 0usize;
                let mut size_idx = 0usize;
                while offset < bytes.len() {
                    let size = chunk_sizes[size_idx % chunk_sizes.len()];
                    let end = (offset + size).min(bytes.len());
                    text.clear();
                    decoder.push(&bytes[offset..end], &mut text);
                    session.feed_into(&text, &mut fragments);
                    offset = end;
                    size_idx += 1;
                }
                black_box(fragments.len());
            },
            BatchSize::LargeInput,
        );
    });
}

fn bench_trapdoor_adversarial(c: &mut Criterion) {
    let input = make_trapdoor_adversarial(512 * 1024);
    c.bench_function("bench_trapdoor_adversarial", |b| {
        b.iter(|| black_box(translate(black_box(&input)).len()));
    });
}

criterion_group!(
    benches,
    bench_translate_small,
    bench_translate_large,
    bench_streaming_chunked,
    bench_trapdoor_adversarial
);
criterion_main!(benches);
