//! Decoding synthesized segments to PCM and encoding the merged result.

use std::io::Cursor;
use std::str::FromStr;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Polly's default sample rate for PCM output
pub const DEFAULT_PCM_SAMPLE_RATE: u32 = 16000;

/// Container/encoding of the audio segments returned by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentFormat {
    Mp3,
    OggVorbis,
    /// Headerless signed 16-bit little-endian mono
    Pcm { sample_rate: u32 },
}

impl SegmentFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::OggVorbis => "ogg",
            Self::Pcm { .. } => "pcm",
        }
    }

    pub fn with_sample_rate(self, sample_rate: Option<u32>) -> Self {
        match (self, sample_rate) {
            (Self::Pcm { .. }, Some(sample_rate)) => Self::Pcm { sample_rate },
            (format, _) => format,
        }
    }
}

impl FromStr for SegmentFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mp3" => Ok(Self::Mp3),
            "ogg_vorbis" | "ogg" => Ok(Self::OggVorbis),
            "pcm" => Ok(Self::Pcm {
                sample_rate: DEFAULT_PCM_SAMPLE_RATE,
            }),
            other => Err(format!("unsupported audio format: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcmSpec {
    pub sample_rate: u32,
    pub channels: u16,
}

/// Interleaved 16-bit samples
#[derive(Debug, Clone, PartialEq)]
pub struct PcmAudio {
    pub spec: PcmSpec,
    pub samples: Vec<i16>,
}

pub fn decode_segment(format: SegmentFormat, bytes: &[u8]) -> Result<PcmAudio, String> {
    match format {
        SegmentFormat::Pcm { sample_rate } => decode_raw_pcm(bytes, sample_rate),
        SegmentFormat::Mp3 => decode_compressed(bytes, "mp3"),
        SegmentFormat::OggVorbis => decode_compressed(bytes, "ogg"),
    }
}

fn decode_raw_pcm(bytes: &[u8], sample_rate: u32) -> Result<PcmAudio, String> {
    if bytes.len() % 2 != 0 {
        return Err(format!(
            "PCM segment has an odd byte length ({}), expected 16-bit samples",
            bytes.len()
        ));
    }

    let samples = bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect();

    Ok(PcmAudio {
        spec: PcmSpec {
            sample_rate,
            channels: 1,
        },
        samples,
    })
}

fn decode_compressed(bytes: &[u8], extension: &str) -> Result<PcmAudio, String> {
    let source = MediaSourceStream::new(Box::new(Cursor::new(bytes.to_vec())), Default::default());
    let mut hint = Hint::new();
    hint.with_extension(extension);

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            source,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| format!("unrecognized {} stream: {}", extension, e))?;
    let mut reader = probed.format;

    let track = reader
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| format!("no audio track in {} stream", extension))?;
    let track_id = track.id;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| format!("no decoder for {} stream: {}", extension, e))?;

    let mut spec: Option<PcmSpec> = None;
    let mut samples = Vec::new();

    loop {
        let packet = match reader.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break
            }
            Err(e) => return Err(format!("failed to read {} packet: {}", extension, e)),
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let signal = *decoded.spec();
                spec.get_or_insert(PcmSpec {
                    sample_rate: signal.rate,
                    channels: signal.channels.count() as u16,
                });

                let mut buffer = SampleBuffer::<i16>::new(decoded.capacity() as u64, signal);
                buffer.copy_interleaved_ref(decoded);
                samples.extend_from_slice(buffer.samples());
            }
            // Corrupt frames are skipped, matching how players treat them
            Err(SymphoniaError::DecodeError(e)) => {
                tracing::debug!(error = e, "Skipping undecodable frame");
            }
            Err(e) => return Err(format!("failed to decode {} stream: {}", extension, e)),
        }
    }

    let spec = spec.ok_or_else(|| format!("{} stream contained no audio frames", extension))?;
    Ok(PcmAudio { spec, samples })
}

/// Encode interleaved samples as a 16-bit WAV file
pub fn encode_wav(audio: &PcmAudio) -> Result<Vec<u8>, String> {
    let spec = hound::WavSpec {
        channels: audio.spec.channels,
        sample_rate: audio.spec.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer =
            hound::WavWriter::new(&mut cursor, spec).map_err(|e| format!("WAV writer: {}", e))?;
        for sample in &audio.samples {
            writer
                .write_sample(*sample)
                .map_err(|e| format!("WAV write: {}", e))?;
        }
        writer
            .finalize()
            .map_err(|e| format!("WAV finalize: {}", e))?;
    }

    Ok(cursor.into_inner())
}
