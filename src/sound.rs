//! Cue sounds: embedded base64 WAV payloads, decoded asynchronously.

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::{Arc, Mutex};
use std::thread;

use anyhow::{Context, Result};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use rodio::buffer::SamplesBuffer;
use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink, Source};
use tracing::{debug, warn};

const PRESS_WAV_B64: &str = include_str!("../assets/press.wav.b64");
const HIT_WAV_B64: &str = include_str!("../assets/hit.wav.b64");
const SCORE_WAV_B64: &str = include_str!("../assets/score.wav.b64");

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Cue {
    ButtonPress,
    Hit,
    Score,
}

impl Cue {
    pub const ALL: [Cue; 3] = [Cue::ButtonPress, Cue::Hit, Cue::Score];

    pub fn name(self) -> &'static str {
        match self {
            Cue::ButtonPress => "BUTTON_PRESS",
            Cue::Hit => "HIT",
            Cue::Score => "SCORE",
        }
    }

    fn payload(self) -> &'static str {
        match self {
            Cue::ButtonPress => PRESS_WAV_B64,
            Cue::Hit => HIT_WAV_B64,
            Cue::Score => SCORE_WAV_B64,
        }
    }
}

/// A decoded cue, cheap to clone; each playback builds a fresh source from
/// the shared samples so overlapping plays of one cue do not interfere.
#[derive(Clone)]
pub struct SoundClip {
    channels: u16,
    sample_rate: u32,
    samples: Arc<Vec<f32>>,
}

impl SoundClip {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn source(&self) -> SamplesBuffer {
        SamplesBuffer::new(self.channels, self.sample_rate, self.samples.as_slice())
    }
}

pub type SoundCache = Arc<Mutex<HashMap<Cue, SoundClip>>>;

/// Best-effort sound playback. If no output stream can be opened the whole
/// subsystem stays disabled and every call is a no-op.
pub struct SoundPlayer {
    stream: Option<OutputStream>,
    cache: SoundCache,
    loaded: bool,
}

impl SoundPlayer {
    pub fn new() -> Self {
        let stream = match OutputStreamBuilder::open_default_stream() {
            Ok(stream) => Some(stream),
            Err(err) => {
                warn!(%err, "audio unavailable, sound disabled");
                None
            }
        };
        Self {
            stream,
            cache: Arc::default(),
            loaded: false,
        }
    }

    /// A player that never produces sound. Used when audio is unwanted and
    /// by tests.
    pub fn disabled() -> Self {
        Self {
            stream: None,
            cache: Arc::default(),
            loaded: false,
        }
    }

    /// Decode all cues into the cache. Runs at most once; each cue decodes
    /// on its own fire-and-forget thread, so completion order across cues
    /// is unordered. Skipped entirely while the subsystem is disabled.
    pub fn load(&mut self) {
        if self.loaded || self.stream.is_none() {
            return;
        }
        self.loaded = true;
        for cue in Cue::ALL {
            let cache = Arc::clone(&self.cache);
            thread::spawn(move || match decode_cue(cue) {
                Ok(clip) => {
                    debug!(cue = cue.name(), samples = clip.len(), "cue decoded");
                    if let Ok(mut cache) = cache.lock() {
                        cache.insert(cue, clip);
                    }
                }
                Err(err) => warn!(cue = cue.name(), %err, "cue decode failed"),
            });
        }
    }

    /// Play a cue on a fresh detached sink. No-op if the cue has not
    /// finished decoding yet.
    pub fn play(&self, cue: Cue) {
        let Some(stream) = &self.stream else { return };
        let Ok(cache) = self.cache.lock() else { return };
        if let Some(clip) = cache.get(&cue) {
            let sink = Sink::connect_new(stream.mixer());
            sink.append(clip.source());
            sink.detach();
        }
    }
}

/// Decode one cue's embedded payload: base64 text to WAV bytes, WAV bytes
/// to raw samples.
pub fn decode_cue(cue: Cue) -> Result<SoundClip> {
    let bytes = decode_base64(cue.payload())
        .with_context(|| format!("bad base64 payload for {}", cue.name()))?;
    let decoder = Decoder::new(Cursor::new(bytes))
        .with_context(|| format!("undecodable payload for {}", cue.name()))?;
    let channels = decoder.channels();
    let sample_rate = decoder.sample_rate();
    let samples: Vec<f32> = decoder.collect();
    Ok(SoundClip {
        channels,
        sample_rate,
        samples: Arc::new(samples),
    })
}

fn decode_base64(text: &str) -> Result<Vec<u8>> {
    // Payload files are line-wrapped.
    let compact: String = text.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    Ok(BASE64.decode(compact.as_bytes())?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_cues_decode() {
        for cue in Cue::ALL {
            let clip = decode_cue(cue).unwrap();
            assert!(!clip.is_empty(), "{} decoded to no samples", cue.name());
            assert_eq!(clip.sample_rate(), 8000);
        }
    }

    #[test]
    fn cache_population_is_commutative() {
        let forward: Vec<Cue> = Cue::ALL.to_vec();
        let mut reversed = forward.clone();
        reversed.reverse();

        let populate = |order: &[Cue]| {
            let mut cache = HashMap::new();
            for &cue in order {
                cache.insert(cue, decode_cue(cue).unwrap());
            }
            cache
        };
        let a = populate(&forward);
        let b = populate(&reversed);

        assert_eq!(a.len(), b.len());
        for cue in Cue::ALL {
            assert_eq!(a[&cue].len(), b[&cue].len());
            assert_eq!(a[&cue].sample_rate(), b[&cue].sample_rate());
        }
    }

    #[test]
    fn disabled_player_is_a_no_op() {
        let mut player = SoundPlayer::disabled();
        player.load();
        assert!(player.cache.lock().unwrap().is_empty());
        // Playing a missing cue must not panic.
        player.play(Cue::Hit);
    }
}
