// Sound playback on the default output device.
//
// Clips are read and decoded once at startup into replayable buffers. A clip
// that fails to load is logged and its slot stays empty; playing an empty slot
// does nothing. Effects each get a detached sink so they can overlap. Music
// has one sink that loops and can be paused.

use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use rodio::source::Buffered;
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};

use super::events::AudioSink;
use crate::scene::{AssetLoadError, AudioConfig};

/// Decoded clip, cheap to clone for each play.
pub type Clip = Buffered<Decoder<Cursor<Vec<u8>>>>;

pub fn load_clip(path: &Path) -> Result<Clip, AssetLoadError> {
    let bytes = fs::read(path).map_err(|source| AssetLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let decoder = Decoder::new(Cursor::new(bytes)).map_err(|source| AssetLoadError::Audio {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(decoder.buffered())
}

/// Load every clip, keeping slot indices stable when one fails.
fn load_bank(paths: &[PathBuf]) -> Vec<Option<Clip>> {
    paths
        .iter()
        .map(|path| match load_clip(path) {
            Ok(clip) => {
                log::info!(
                    "Audio {} -> {} ch, {} Hz",
                    path.display(),
                    clip.channels(),
                    clip.sample_rate()
                );
                Some(clip)
            }
            Err(e) => {
                log::warn!("{}", e);
                None
            }
        })
        .collect()
}

pub struct RodioAudio {
    // Closing the stream closes the device; keep it alive with the sinks.
    _stream: OutputStream,
    handle: OutputStreamHandle,
    effects: Vec<Option<Clip>>,
    tracks: Vec<Option<Clip>>,
    music: Option<Sink>,
}

impl RodioAudio {
    /// Open the default device and load the configured clips.
    /// Only a missing device is an error; bad clips are logged and skipped.
    pub fn new(config: &AudioConfig) -> Result<Self, rodio::StreamError> {
        let (stream, handle) = OutputStream::try_default()?;
        Ok(Self {
            _stream: stream,
            handle,
            effects: load_bank(&config.effects),
            tracks: load_bank(&config.music),
            music: None,
        })
    }
}

impl AudioSink for RodioAudio {
    fn play_effect(&mut self, index: usize) {
        let clip = match self.effects.get(index) {
            Some(Some(clip)) => clip,
            Some(None) => return,
            None => {
                log::warn!("no sound effect at index {}", index);
                return;
            }
        };
        match Sink::try_new(&self.handle) {
            Ok(sink) => {
                sink.append(clip.clone());
                sink.detach();
            }
            Err(e) => log::warn!("effect {}: {}", index, e),
        }
    }

    fn play_music(&mut self, track: usize) {
        let clip = match self.tracks.get(track) {
            Some(Some(clip)) => clip,
            Some(None) => return,
            None => {
                log::warn!("no music track at index {}", track);
                return;
            }
        };
        if let Some(previous) = self.music.take() {
            previous.stop();
        }
        match Sink::try_new(&self.handle) {
            Ok(sink) => {
                sink.append(clip.clone().repeat_infinite());
                log::info!("music track {} looping", track);
                self.music = Some(sink);
            }
            Err(e) => log::warn!("music track {}: {}", track, e),
        }
    }

    fn toggle_pause_music(&mut self) {
        let Some(sink) = &self.music else {
            return;
        };
        if sink.is_paused() {
            sink.play();
            log::debug!("music resumed");
        } else {
            sink.pause();
            log::debug!("music paused");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::SceneConfig;

    /// Minimal 16-bit mono PCM WAV.
    fn write_wav(path: &Path, rate: u32, samples: &[i16]) {
        let data_len = (samples.len() * 2) as u32;
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"RIFF");
        bytes.extend_from_slice(&(36 + data_len).to_le_bytes());
        bytes.extend_from_slice(b"WAVEfmt ");
        bytes.extend_from_slice(&16u32.to_le_bytes());
        bytes.extend_from_slice(&1u16.to_le_bytes()); // PCM
        bytes.extend_from_slice(&1u16.to_le_bytes()); // mono
        bytes.extend_from_slice(&rate.to_le_bytes());
        bytes.extend_from_slice(&(rate * 2).to_le_bytes());
        bytes.extend_from_slice(&2u16.to_le_bytes());
        bytes.extend_from_slice(&16u16.to_le_bytes());
        bytes.extend_from_slice(b"data");
        bytes.extend_from_slice(&data_len.to_le_bytes());
        for s in samples {
            bytes.extend_from_slice(&s.to_le_bytes());
        }
        fs::write(path, bytes).unwrap();
    }

    #[test]
    fn decodes_wav_clip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("click.wav");
        let samples: Vec<i16> = (0..400).map(|i| ((i % 40) * 500 - 10_000) as i16).collect();
        write_wav(&path, 8000, &samples);

        let clip = load_clip(&path).unwrap();
        assert_eq!(clip.channels(), 1);
        assert_eq!(clip.sample_rate(), 8000);
        assert_eq!(clip.clone().count(), samples.len());
        // Replays come from the buffer, not the file.
        fs::remove_file(&path).unwrap();
        assert_eq!(clip.count(), samples.len());
    }

    #[test]
    fn missing_clip_is_io_error() {
        let err = load_clip(Path::new("no/such/clip.wav")).err().unwrap();
        assert!(matches!(err, AssetLoadError::Io { .. }));
    }

    #[test]
    fn corrupt_clip_is_audio_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("noise.wav");
        fs::write(&path, b"definitely not a sound file").unwrap();
        let err = load_clip(&path).err().unwrap();
        assert!(matches!(err, AssetLoadError::Audio { .. }));
    }

    #[test]
    fn bad_clip_leaves_empty_slot() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.wav");
        write_wav(&good, 8000, &[0, 100, -100, 0]);

        let bank = load_bank(&[dir.path().join("gone.wav"), good]);
        assert_eq!(bank.len(), 2);
        assert!(bank[0].is_none());
        assert!(bank[1].is_some());
    }

    #[test]
    fn shipped_clips_decode() {
        let config = SceneConfig::load(Path::new("assets/museum.ron")).unwrap();
        assert!(!config.audio.music.is_empty());
        for path in config.audio.effects.iter().chain(&config.audio.music) {
            let clip = load_clip(path).unwrap();
            assert!(clip.sample_rate() > 0, "{}", path.display());
        }
        for &index in config.audio.footsteps.iter().chain([&config.audio.card]) {
            assert!(index < config.audio.effects.len());
        }
    }
}
