/// Sound engine: procedural chiptune effects and background music via rodio.
///
/// Every buffer is synthesised into an in-memory WAV at startup. Effects are
/// fire-and-forget on detached sinks; music loops on one long-lived sink
/// that is paused and resumed by the music toggle.
///
/// Build without the "sound" feature to disable audio entirely (the stub
/// SoundEngine does nothing).

#[cfg(feature = "sound")]
mod inner {
    use std::io::Cursor;
    use std::sync::Arc;

    use log::{debug, warn};
    use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};

    use super::synth;

    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        music: Option<Sink>,
        sfx_select: Arc<Vec<u8>>,
        sfx_swap: Arc<Vec<u8>>,
        sfx_match: Arc<Vec<u8>>,
        sfx_wrong: Arc<Vec<u8>>,
        sfx_land: Arc<Vec<u8>>,
        sfx_high_score: Arc<Vec<u8>>,
    }

    impl SoundEngine {
        pub fn new(music_on: bool) -> Option<Self> {
            let (stream, handle) = match OutputStream::try_default() {
                Ok(pair) => pair,
                Err(e) => {
                    warn!("no audio output, running silent: {e}");
                    return None;
                }
            };

            let music = Self::start_music(&handle, music_on);

            Some(SoundEngine {
                _stream: stream,
                handle,
                music,
                sfx_select: Arc::new(synth::wav(&synth::select())),
                sfx_swap: Arc::new(synth::wav(&synth::swap())),
                sfx_match: Arc::new(synth::wav(&synth::matched(0))),
                sfx_wrong: Arc::new(synth::wav(&synth::wrong())),
                sfx_land: Arc::new(synth::wav(&synth::land())),
                sfx_high_score: Arc::new(synth::wav(&synth::high_score())),
            })
        }

        fn start_music(handle: &OutputStreamHandle, on: bool) -> Option<Sink> {
            let sink = Sink::try_new(handle).ok()?;
            let src = Decoder::new(Cursor::new(synth::wav(&synth::music_loop()))).ok()?;
            sink.set_volume(0.35);
            sink.append(src.repeat_infinite());
            if !on {
                sink.pause();
            }
            Some(sink)
        }

        fn play_bytes(&self, bytes: Vec<u8>) {
            let Ok(sink) = Sink::try_new(&self.handle) else { return };
            match Decoder::new(Cursor::new(bytes)) {
                Ok(src) => {
                    sink.append(src);
                    sink.detach();
                }
                Err(e) => debug!("sfx decode failed: {e}"),
            }
        }

        fn play(&self, buf: &Arc<Vec<u8>>) {
            self.play_bytes(buf.as_ref().clone());
        }

        pub fn set_music(&self, on: bool) {
            if let Some(sink) = &self.music {
                if on { sink.play() } else { sink.pause() }
            }
        }

        pub fn play_select(&self) { self.play(&self.sfx_select); }
        pub fn play_swap(&self) { self.play(&self.sfx_swap); }
        pub fn play_match(&self) { self.play(&self.sfx_match); }
        pub fn play_wrong(&self) { self.play(&self.sfx_wrong); }
        pub fn play_land(&self) { self.play(&self.sfx_land); }
        pub fn play_high_score(&self) { self.play(&self.sfx_high_score); }

        /// Match chime transposed up with each cascade link.
        pub fn play_cascade(&self, depth: u32) {
            self.play_bytes(synth::wav(&synth::matched(depth)));
        }
    }
}

/// Pure waveform synthesis. Kept outside `inner` so it is testable without
/// an audio device.
#[cfg_attr(not(feature = "sound"), allow(dead_code))]
mod synth {
    use std::f32::consts::TAU;

    pub const SAMPLE_RATE: u32 = 22050;

    #[derive(Clone, Copy)]
    pub enum Voice {
        Sine,
        /// Sine plus a third harmonic, reads as a soft square.
        Retro,
        Noise,
    }

    /// Append one enveloped note. `decay` shapes the fade-out curve.
    fn note(out: &mut Vec<f32>, freq: f32, secs: f32, voice: Voice, volume: f32, decay: f32) {
        let n = (SAMPLE_RATE as f32 * secs) as usize;
        let mut seed: u32 = 0x2545_f491;
        out.extend((0..n).map(|i| {
            let t = i as f32 / SAMPLE_RATE as f32;
            let env = 1.0 - (i as f32 / n as f32).powf(decay);
            let phase = t * freq * TAU;
            let wave = match voice {
                Voice::Sine => phase.sin(),
                Voice::Retro => phase.sin() * 0.7 + (phase * 3.0).sin() * 0.3,
                Voice::Noise => {
                    seed = seed.wrapping_mul(1103515245).wrapping_add(12345);
                    (seed as f32 / u32::MAX as f32) * 2.0 - 1.0
                }
            };
            wave * env * volume
        }));
    }

    fn sequence(notes: &[(f32, f32)], voice: Voice, volume: f32) -> Vec<f32> {
        let mut out = Vec::new();
        for &(freq, secs) in notes {
            note(&mut out, freq, secs, voice, volume, 0.5);
        }
        out
    }

    pub fn select() -> Vec<f32> {
        sequence(&[(880.0, 0.04)], Voice::Sine, 0.2)
    }

    /// Short upward sweep.
    pub fn swap() -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * 0.1) as usize;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let freq = 300.0 + t * 500.0;
                let ti = i as f32 / SAMPLE_RATE as f32;
                (ti * freq * TAU).sin() * (1.0 - t) * 0.2
            })
            .collect()
    }

    /// C6-E6-G6 arpeggio, a whole tone higher per cascade link (capped).
    pub fn matched(depth: u32) -> Vec<f32> {
        let shift = 2f32.powf(depth.min(6) as f32 * 2.0 / 12.0);
        let notes = [1047.0, 1319.0, 1568.0].map(|f: f32| (f * shift, 0.045));
        sequence(&notes, Voice::Retro, 0.25)
    }

    /// Low buzz: descending pair with noise.
    pub fn wrong() -> Vec<f32> {
        let mut out = sequence(&[(220.0, 0.08), (165.0, 0.12)], Voice::Retro, 0.25);
        let mut hiss = Vec::new();
        note(&mut hiss, 0.0, 0.2, Voice::Noise, 0.08, 0.8);
        for (s, h) in out.iter_mut().zip(hiss) {
            *s += h;
        }
        out
    }

    pub fn land() -> Vec<f32> {
        let mut out = Vec::new();
        note(&mut out, 140.0, 0.06, Voice::Sine, 0.3, 0.8);
        out
    }

    pub fn high_score() -> Vec<f32> {
        let mut out = sequence(
            &[(523.0, 0.1), (659.0, 0.1), (784.0, 0.1)],
            Voice::Retro,
            0.3,
        );
        note(&mut out, 1047.0, 0.3, Voice::Retro, 0.3, 1.0);
        out
    }

    /// Eight-bar loop in A minor at 120 bpm, eighth notes.
    pub fn music_loop() -> Vec<f32> {
        const BAR: [f32; 8] = [440.0, 523.0, 659.0, 523.0, 587.0, 523.0, 494.0, 523.0];
        const ROOTS: [f32; 8] = [1.0, 1.0, 0.794, 0.794, 0.891, 0.891, 0.749, 0.749];
        let mut out = Vec::new();
        for root in ROOTS {
            for f in BAR {
                note(&mut out, f * root, 0.25, Voice::Sine, 0.15, 2.0);
            }
        }
        out
    }

    /// Wrap mono f32 samples in a 16-bit PCM WAV container.
    pub fn wav(samples: &[f32]) -> Vec<u8> {
        const CHANNELS: u16 = 1;
        const BITS: u16 = 16;
        let block_align = CHANNELS * BITS / 8;
        let byte_rate = SAMPLE_RATE * block_align as u32;
        let data_len = samples.len() as u32 * block_align as u32;

        let mut buf = Vec::with_capacity(44 + data_len as usize);
        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&(36 + data_len).to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
        buf.extend_from_slice(&CHANNELS.to_le_bytes());
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&BITS.to_le_bytes());

        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_len.to_le_bytes());
        for &s in samples {
            buf.extend_from_slice(&((s.clamp(-1.0, 1.0) * 32767.0) as i16).to_le_bytes());
        }
        buf
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn wav_header_describes_payload() {
            let bytes = wav(&[0.0, 1.0, -1.0]);
            assert_eq!(&bytes[0..4], b"RIFF");
            assert_eq!(&bytes[8..12], b"WAVE");
            assert_eq!(bytes.len(), 44 + 6);
            assert_eq!(u32::from_le_bytes([bytes[40], bytes[41], bytes[42], bytes[43]]), 6);
            assert_eq!(i16::from_le_bytes([bytes[46], bytes[47]]), 32767);
        }

        #[test]
        fn effects_stay_in_range() {
            for buf in [select(), swap(), matched(3), wrong(), land(), high_score()] {
                assert!(!buf.is_empty());
                assert!(buf.iter().all(|s| s.abs() <= 1.0));
            }
        }

        #[test]
        fn cascade_chime_rises_then_caps() {
            let zero_crossings = |v: &[f32]| v.windows(2).filter(|w| w[0] <= 0.0 && w[1] > 0.0).count();
            let base = zero_crossings(&matched(0));
            let up = zero_crossings(&matched(2));
            assert!(up > base);
            assert_eq!(matched(6), matched(20));
        }

        #[test]
        fn music_loop_is_sixteen_seconds() {
            let secs = music_loop().len() as f32 / SAMPLE_RATE as f32;
            assert!((secs - 16.0).abs() < 0.01);
        }
    }
}

// ════════════════════════════════════════════════════════════
//  Public API: no-ops when the sound feature is off
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new(_music_on: bool) -> Option<Self> { Some(SoundEngine) }
    pub fn set_music(&self, _on: bool) {}
    pub fn play_select(&self) {}
    pub fn play_swap(&self) {}
    pub fn play_match(&self) {}
    pub fn play_wrong(&self) {}
    pub fn play_land(&self) {}
    pub fn play_high_score(&self) {}
    pub fn play_cascade(&self, _depth: u32) {}
}
