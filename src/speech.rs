//! Text-to-speech with exclusive playback.

use std::fs;
use std::path::PathBuf;
use tracing::{debug, error};

use crate::error::SpeechError;
use crate::providers::{lang_code, Accent};

pub const ENDPOINT_ENV: &str = "LINGREADER_TTS_ENDPOINT";
pub const API_KEY_ENV: &str = "LINGREADER_TTS_API_KEY";

const FALLBACK_VOICE: &str = "en-US-AvaNeural";

/// Speech endpoint settings, read from the environment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpeechConfig {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
}

impl SpeechConfig {
    pub fn from_env() -> Self {
        let read = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
        SpeechConfig {
            endpoint: read(ENDPOINT_ENV),
            api_key: read(API_KEY_ENV),
        }
    }
}

/// Preferred neural voice for a language code
pub fn voice_for(lang: &str, accent: Accent) -> &'static str {
    match lang {
        "en" => match accent {
            Accent::Us => "en-US-AvaNeural",
            Accent::Uk => "en-GB-SoniaNeural",
        },
        "fr" => "fr-FR-DeniseNeural",
        "es" => "es-ES-ElviraNeural",
        "de" => "de-DE-KatjaNeural",
        "zh" | "zh-Hans" => "zh-CN-XiaoxiaoMultilingualNeural",
        "ja" => "ja-JP-NanamiNeural",
        "ko" => "ko-KR-SunHiNeural",
        "it" => "it-IT-ElsaNeural",
        "ru" => "ru-RU-DmitryNeural",
        "pt" => "pt-BR-FranciscaNeural",
        _ => FALLBACK_VOICE,
    }
}

/// Turns text into encoded audio
pub trait SpeechSynthesizer: Send + Sync {
    fn synthesize(&self, text: &str, voice: &str) -> Result<Vec<u8>, SpeechError>;
}

/// A started audio stream
pub trait Playback {
    fn stop(&mut self);
}

/// Somewhere audio can be played
pub trait AudioOutput {
    fn start(&mut self, audio: Vec<u8>) -> Result<Box<dyn Playback>, SpeechError>;
}

/// Speaks text, keeping at most one stream alive
pub struct Speaker {
    synthesizer: Option<Box<dyn SpeechSynthesizer>>,
    output: Box<dyn AudioOutput>,
    active: Option<Box<dyn Playback>>,
}

impl Speaker {
    /// `synthesizer` is `None` when speech is not configured; every
    /// [`Speaker::speak`] call then fails with [`SpeechError::Unconfigured`].
    pub fn new(synthesizer: Option<Box<dyn SpeechSynthesizer>>, output: Box<dyn AudioOutput>) -> Self {
        Speaker {
            synthesizer,
            output,
            active: None,
        }
    }

    /// Speak `text` in a lesson language. Empty text is a no-op.
    ///
    /// Any current playback is stopped first, even if this call fails.
    pub fn speak(&mut self, text: &str, language: &str, accent: Accent) -> Result<(), SpeechError> {
        let content = text.trim();
        if content.is_empty() {
            return Ok(());
        }
        self.stop();

        let Some(synthesizer) = &self.synthesizer else {
            error!("speech requested but no endpoint is configured");
            return Err(SpeechError::Unconfigured);
        };
        let voice = voice_for(lang_code(language), accent);
        debug!(voice, chars = content.chars().count(), "synthesizing speech");

        let audio = synthesizer.synthesize(content, voice).map_err(|e| {
            error!(error = %e, "speech synthesis failed");
            e
        })?;
        self.active = Some(self.output.start(audio)?);
        Ok(())
    }

    pub fn stop(&mut self) {
        if let Some(mut playback) = self.active.take() {
            playback.stop();
        }
    }

    pub fn is_playing(&self) -> bool {
        self.active.is_some()
    }
}

/// Writes each clip to a file instead of a sound device
pub struct FileOutput {
    path: PathBuf,
}

impl FileOutput {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileOutput { path: path.into() }
    }
}

struct FinishedClip;

impl Playback for FinishedClip {
    fn stop(&mut self) {}
}

impl AudioOutput for FileOutput {
    fn start(&mut self, audio: Vec<u8>) -> Result<Box<dyn Playback>, SpeechError> {
        fs::write(&self.path, audio).map_err(|e| SpeechError::Playback(e.to_string()))?;
        Ok(Box::new(FinishedClip))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    struct FixedSynth(Arc<Mutex<Vec<String>>>);

    impl SpeechSynthesizer for FixedSynth {
        fn synthesize(&self, text: &str, voice: &str) -> Result<Vec<u8>, SpeechError> {
            self.0.lock().unwrap().push(format!("{voice}:{text}"));
            Ok(text.as_bytes().to_vec())
        }
    }

    struct Tracked {
        id: usize,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl Playback for Tracked {
        fn stop(&mut self) {
            self.log.lock().unwrap().push(format!("stop {}", self.id));
        }
    }

    struct TrackedOutput {
        started: usize,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl AudioOutput for TrackedOutput {
        fn start(&mut self, _audio: Vec<u8>) -> Result<Box<dyn Playback>, SpeechError> {
            self.started += 1;
            self.log.lock().unwrap().push(format!("start {}", self.started));
            Ok(Box::new(Tracked {
                id: self.started,
                log: Arc::clone(&self.log),
            }))
        }
    }

    #[test]
    fn test_voice_table() {
        assert_eq!(voice_for("en", Accent::Uk), "en-GB-SoniaNeural");
        assert_eq!(voice_for("zh-Hans", Accent::Us), "zh-CN-XiaoxiaoMultilingualNeural");
        assert_eq!(voice_for("auto", Accent::Uk), "en-US-AvaNeural");
    }

    #[test]
    fn test_playback_is_exclusive() {
        let synth_log = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut speaker = Speaker::new(
            Some(Box::new(FixedSynth(Arc::clone(&synth_log)))),
            Box::new(TrackedOutput {
                started: 0,
                log: Arc::clone(&log),
            }),
        );

        speaker.speak("Bonjour", "French", Accent::Us).unwrap();
        speaker.speak("Hello", "English", Accent::Uk).unwrap();

        assert_eq!(*log.lock().unwrap(), vec!["start 1", "stop 1", "start 2"]);
        assert_eq!(
            *synth_log.lock().unwrap(),
            vec!["fr-FR-DeniseNeural:Bonjour", "en-GB-SoniaNeural:Hello"]
        );
        assert!(speaker.is_playing());
    }

    #[test]
    fn test_unconfigured_fails_loudly() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut speaker = Speaker::new(None, Box::new(TrackedOutput { started: 0, log }));
        assert!(matches!(
            speaker.speak("Hello", "English", Accent::Us),
            Err(SpeechError::Unconfigured)
        ));
        assert!(speaker.speak("   ", "English", Accent::Us).is_ok());
    }

    #[test]
    fn test_file_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.mp3");
        let mut output = FileOutput::new(&path);
        output.start(vec![1, 2, 3]).unwrap();
        assert_eq!(fs::read(&path).unwrap(), vec![1, 2, 3]);
    }
}
