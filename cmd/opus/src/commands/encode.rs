//! PCM to packet stream encoding.

use std::path::PathBuf;

use clap::Args;
use serde::Serialize;
use twetalk_opus::{pcm, EncoderParams, EncoderSession};

use super::{load_file, print_summary, read_bytes, write_bytes};
use crate::Cli;

/// Encode s16le PCM into a stream of fixed-size packets.
#[derive(Args)]
pub struct EncodeCommand {
    /// Input PCM file (s16le, interleaved)
    #[arg(short = 'i', long)]
    input: PathBuf,

    /// Output packet stream
    #[arg(short = 'o', long)]
    output: PathBuf,

    /// Encoder config file (YAML or JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Sample rate in Hz (overrides config file)
    #[arg(long)]
    sample_rate: Option<i32>,

    /// Channel count (overrides config file)
    #[arg(long)]
    channels: Option<i32>,

    /// Packet size in bytes (overrides config file)
    #[arg(long)]
    packet_bytes: Option<usize>,

    /// Bitrate in bits per second (overrides config file)
    #[arg(long)]
    bitrate: Option<i32>,

    /// Complexity 0-10 (overrides config file)
    #[arg(long)]
    complexity: Option<i32>,

    /// Use variable bitrate
    #[arg(long)]
    vbr: bool,

    /// Enable discontinuous transmission
    #[arg(long)]
    dtx: bool,

    /// Tune for music instead of voice
    #[arg(long)]
    music: bool,
}

#[derive(Debug, Serialize)]
struct EncodeSummary {
    frames: usize,
    packet_bytes: usize,
    total_bytes: usize,
    frame_samples: usize,
    duration_ms: u64,
}

impl EncodeCommand {
    pub fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let params = self.params()?;
        let samples = pcm::bytes_to_samples(&read_bytes(&self.input)?)?;

        let mut encoder = EncoderSession::new(&params)?;
        let stream = encode_stream(&mut encoder, &samples)?;
        let frames = stream.len() / encoder.target_bytes();
        encoder.close();

        write_bytes(&self.output, &stream)?;
        tracing::info!(frames, bytes = stream.len(), "encoded {}", self.output.display());

        print_summary(
            &EncodeSummary {
                frames,
                packet_bytes: params.target_bytes,
                total_bytes: stream.len(),
                frame_samples: encoder.frame_sample_count(),
                duration_ms: frames as u64 * encoder.frame_duration().millis() as u64,
            },
            cli.json,
        )
    }

    fn params(&self) -> anyhow::Result<EncoderParams> {
        let mut params = match &self.config {
            Some(path) => load_file(path)?,
            None => EncoderParams::default(),
        };
        if let Some(v) = self.sample_rate {
            params.sample_rate = v;
        }
        if let Some(v) = self.channels {
            params.channels = v;
        }
        if let Some(v) = self.packet_bytes {
            params.target_bytes = v;
        }
        if let Some(v) = self.bitrate {
            params.bitrate = v;
        }
        if let Some(v) = self.complexity {
            params.complexity = v;
        }
        if self.vbr {
            params.cbr = false;
        }
        if self.dtx {
            params.dtx = true;
        }
        if self.music {
            params.signal_voice = false;
        }
        params.validate()?;
        Ok(params)
    }
}

/// Encodes interleaved samples frame by frame. A trailing partial frame is
/// completed with silence.
pub(crate) fn encode_stream(
    encoder: &mut EncoderSession,
    samples: &[i16],
) -> anyhow::Result<Vec<u8>> {
    let frame_len = encoder.frame_len();
    let mut stream = Vec::with_capacity(samples.len().div_ceil(frame_len) * encoder.target_bytes());
    let mut last = vec![0i16; frame_len];

    for (index, chunk) in samples.chunks(frame_len).enumerate() {
        let frame = if chunk.len() == frame_len {
            chunk
        } else {
            last[..chunk.len()].copy_from_slice(chunk);
            &last[..]
        };
        let packet = encoder
            .encode(frame)
            .map_err(|err| anyhow::anyhow!("frame {}: {}", index, err))?;
        stream.extend_from_slice(&packet);
    }

    Ok(stream)
}
