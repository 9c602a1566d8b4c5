//! File-to-file conversion driven through a [`StreamResampler`].
//!
//! The input file is streamed in `chunk_bytes` pieces; converted buffers are
//! forwarded from the listeners over a `flume` channel to an async writer.

use bytes::Bytes;
use tokio::{
    fs::File,
    io::{AsyncReadExt, AsyncWriteExt},
};
use tracing::{info, warn};

use crate::{
    common::types::AnyResult,
    configs::{ConvertConfig, ResamplerConfig},
    resampler::StreamResampler,
};

enum Output {
    Samples(Bytes),
    Error(String),
    End,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TranscodeReport {
    pub bytes_in: u64,
    pub bytes_out: u64,
    pub chunks_in: usize,
    pub chunks_out: usize,
    pub errors: Vec<String>,
}

/// Fills `buf` unless EOF comes first; returns the bytes read.
async fn read_chunk(file: &mut File, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = file.read(&mut buf[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

pub async fn transcode_file(
    resampler_config: &ResamplerConfig,
    convert: &ConvertConfig,
) -> AnyResult<TranscodeReport> {
    let mut input = File::open(&convert.input).await?;
    let mut output = File::create(&convert.output).await?;

    let resampler = StreamResampler::with_config(resampler_config.clone());
    let (tx, rx) = flume::unbounded();

    let samples_tx = tx.clone();
    resampler.on_samples(move |bytes| {
        let _ = samples_tx.send(Output::Samples(bytes.clone()));
    });
    let error_tx = tx.clone();
    resampler.on_error(move |message| {
        let _ = error_tx.send(Output::Error(message.to_owned()));
    });
    resampler.on_end(move || {
        let _ = tx.send(Output::End);
    });

    resampler.open()?;
    resampler.set_source_format(convert.source);
    resampler.set_destination_format(convert.destination);

    info!(
        "Converting {} ({}) -> {} ({})",
        convert.input.display(),
        convert.source,
        convert.output.display(),
        convert.destination
    );

    let mut report = TranscodeReport::default();
    // Whole frames only, so no frame is ever split across two feeds.
    let frame_bytes = convert.source.frame_bytes();
    let mut chunk = vec![0u8; (convert.chunk_bytes / frame_bytes).max(1) * frame_bytes];
    loop {
        let read = read_chunk(&mut input, &mut chunk).await?;
        if read == 0 {
            break;
        }
        resampler.feed(&chunk, Some(read))?;
        report.bytes_in += read as u64;
        report.chunks_in += 1;
    }
    resampler.end();

    while let Ok(out) = rx.recv_async().await {
        match out {
            Output::Samples(bytes) => {
                output.write_all(&bytes).await?;
                report.bytes_out += bytes.len() as u64;
                report.chunks_out += 1;
            }
            Output::Error(message) => {
                warn!("Conversion error: {}", message);
                report.errors.push(message);
            }
            Output::End => break,
        }
    }
    output.flush().await?;
    resampler.shutdown().await?;

    info!(
        "Converted {} bytes in {} chunks into {} bytes in {} chunks ({} errors)",
        report.bytes_in,
        report.chunks_in,
        report.bytes_out,
        report.chunks_out,
        report.errors.len()
    );
    Ok(report)
}
