//! Streams a byte source through a translation session into a writer.

use std::io::{self, Read, Write};

use anyhow::{Context, Result, bail};
use sxml::{DiagnosticSink, Render, Session};
use tools::utf8::Utf8Decoder;

pub const DEFAULT_CHUNK_SIZE: usize = 8 * 1024;
pub const CHUNK_SIZE_ENV: &str = "SXML_CHUNK_SIZE";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Summary {
    pub bytes_read: u64,
    pub chunks: u64,
    pub fragments: u64,
}

/// Read size from `SXML_CHUNK_SIZE`, defaulting to 8 KiB.
pub fn chunk_size_from_env() -> Result<usize> {
    match std::env::var(CHUNK_SIZE_ENV) {
        Ok(raw) => parse_chunk_size(&raw),
        Err(std::env::VarError::NotPresent) => Ok(DEFAULT_CHUNK_SIZE),
        Err(err) => Err(err).with_context(|| format!("invalid {CHUNK_SIZE_ENV}")),
    }
}

fn parse_chunk_size(raw: &str) -> Result<usize> {
    let size: usize = raw
        .trim()
        .parse()
        .with_context(|| format!("{CHUNK_SIZE_ENV} must be a positive integer, got {raw:?}"))?;
    if size == 0 {
        bail!("{CHUNK_SIZE_ENV} must be a positive integer, got 0");
    }
    Ok(size)
}

/// Feed `input` to `session` in `chunk_size` byte reads, writing fragments
/// to `output` and flushing after every read.
pub fn translate_stream<P, D, R, W>(
    session: &mut Session<P, D>,
    mut input: R,
    mut output: W,
    chunk_size: usize,
) -> Result<Summary>
where
    P: Render,
    D: DiagnosticSink,
    R: Read,
    W: Write,
{
    let mut buf = vec![0u8; chunk_size.max(1)];
    let mut decoder = Utf8Decoder::new();
    let mut text = String::with_capacity(buf.len());
    let mut fragments = Vec::new();
    let mut summary = Summary::default();

    loop {
        let n = match input.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err).context("failed to read input"),
        };
        summary.bytes_read += n as u64;
        summary.chunks += 1;
        text.clear();
        decoder.push(&buf[..n], &mut text);
        session.feed_into(&text, &mut fragments);
        write_fragments(&mut output, &mut fragments, &mut summary)?;
    }

    text.clear();
    decoder.finish(&mut text);
    if !text.is_empty() {
        session.feed_into(&text, &mut fragments);
        write_fragments(&mut output, &mut fragments, &mut summary)?;
    }
    Ok(summary)
}

fn write_fragments<W: Write>(
    output: &mut W,
    fragments: &mut Vec<String>,
    summary: &mut Summary,
) -> Result<()> {
    for fragment in fragments.drain(..) {
        output
            .write_all(fragment.as_bytes())
            .context("failed to write output")?;
        summary.fragments += 1;
    }
    output.flush().context("failed to flush output")
}
