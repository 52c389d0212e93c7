//! HTTP implementations of the provider traits.
//!
//! - [`HttpTranslator`]: DeepSeek chat completions when selected and
//!   configured, then MyMemory, then a dictionaryapi.dev definition for
//!   English words.
//! - [`DictionaryApiSource`]: phonetics from dictionaryapi.dev.
//! - [`HttpSpeech`]: OpenAI-compatible text-to-speech endpoint.

use reqwest::blocking::Client;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{ProviderError, SpeechError};
use crate::lexicon::{encode_component, PhoneticSource};
use crate::provider::Provider;
use crate::providers::{lang_code, lang_display_name, ProviderConfig, TranslationResult, Translator};
use crate::speech::{SpeechConfig, SpeechSynthesizer};

const USER_AGENT: &str = concat!("lingreader/", env!("CARGO_PKG_VERSION"));

const DEEPSEEK_URL: &str = "https://api.deepseek.com/chat/completions";
const MYMEMORY_URL: &str = "https://api.mymemory.translated.net/get";
const DICTIONARY_URL: &str = "https://api.dictionaryapi.dev/api/v2/entries/en";

const SYSTEM_PROMPT: &str =
    "You are a translation engine. Convert the user text into the requested language and reply only with the translation.";

fn build_client(timeout: Duration) -> Result<Client, ProviderError> {
    Ok(Client::builder().user_agent(USER_AGENT).timeout(timeout).build()?)
}

fn check_status(response: reqwest::blocking::Response) -> Result<reqwest::blocking::Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(ProviderError::Status(status.as_u16()))
    }
}

/// Translation content of a chat-completions response
fn parse_chat_completion(json: &Value) -> Option<String> {
    json["choices"][0]["message"]["content"]
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

/// Translated text of a MyMemory response; the service reports errors
/// in-band through `responseStatus`
fn parse_mymemory(json: &Value) -> Option<String> {
    let status = &json["responseStatus"];
    let ok = status.as_u64() == Some(200) || status.as_str() == Some("200");
    if !ok {
        return None;
    }
    json["responseData"]["translatedText"]
        .as_str()
        .filter(|s| !s.trim().is_empty())
        .map(String::from)
}

/// First definition of the first meaning
fn parse_definition(json: &Value) -> Option<String> {
    json[0]["meanings"][0]["definitions"][0]["definition"]
        .as_str()
        .map(String::from)
}

/// First phonetic text across all entries
fn parse_phonetic(json: &Value) -> Option<String> {
    json.as_array()?.iter().find_map(|entry| {
        entry["phonetic"]
            .as_str()
            .filter(|p| !p.is_empty())
            .or_else(|| {
                entry["phonetics"]
                    .as_array()?
                    .iter()
                    .find_map(|p| p["text"].as_str().filter(|t| !t.is_empty()))
            })
            .map(String::from)
    })
}

/// Translator backed by public web APIs
pub struct HttpTranslator {
    client: Client,
}

impl HttpTranslator {
    pub fn new() -> Result<Self, ProviderError> {
        Ok(HttpTranslator {
            client: build_client(Duration::from_secs(30))?,
        })
    }

    fn deepseek(
        &self,
        text: &str,
        source_language: &str,
        target_lang: &str,
        api_key: &str,
        model: &str,
    ) -> Result<TranslationResult, ProviderError> {
        let from = if source_language.is_empty() {
            "auto-detected language"
        } else {
            source_language
        };
        let body = json!({
            "model": model,
            "temperature": 0.2,
            "max_tokens": 800,
            "stream": false,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                {
                    "role": "user",
                    "content": format!(
                        "Translate the following text from {} to {}. Only return the translation.\n\n{}",
                        from,
                        lang_display_name(target_lang),
                        text
                    )
                }
            ]
        });
        let response = self
            .client
            .post(DEEPSEEK_URL)
            .bearer_auth(api_key)
            .json(&body)
            .send()?;
        let json: Value = check_status(response)?.json()?;
        let text = parse_chat_completion(&json).ok_or(ProviderError::Empty)?;
        Ok(TranslationResult::new(text, "DeepSeek"))
    }

    fn mymemory(&self, text: &str, source_lang: &str, target_lang: &str) -> Result<TranslationResult, ProviderError> {
        let from = if source_lang == "auto" { "en" } else { source_lang };
        let pair = format!("{from}|{target_lang}");
        let response = self
            .client
            .get(MYMEMORY_URL)
            .query(&[("q", text), ("langpair", pair.as_str())])
            .send()?;
        let json: Value = check_status(response)?.json()?;
        let text = parse_mymemory(&json).ok_or(ProviderError::Empty)?;
        Ok(TranslationResult::new(text, "MyMemory"))
    }

    fn definition(&self, word: &str) -> Result<TranslationResult, ProviderError> {
        let url = format!("{DICTIONARY_URL}/{}", encode_component(word));
        let response = self.client.get(url).send()?;
        let json: Value = check_status(response)?.json()?;
        let text = parse_definition(&json).ok_or(ProviderError::Empty)?;
        Ok(TranslationResult::new(text, "Dictionary"))
    }
}

impl Translator for HttpTranslator {
    fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_lang: &str,
        config: &ProviderConfig,
    ) -> Option<TranslationResult> {
        if config.provider == Provider::DeepSeek {
            match config.api_key.as_deref() {
                None => warn!("DeepSeek selected without an API key"),
                Some(key) => match self.deepseek(text, source_language, target_lang, key, &config.model) {
                    Ok(result) => return Some(result),
                    Err(e) => warn!(error = %e, "DeepSeek translation failed"),
                },
            }
        }

        let source_lang = lang_code(source_language);
        match self.mymemory(text, source_lang, target_lang) {
            Ok(result) => return Some(result),
            Err(e) => warn!(error = %e, "MyMemory translation failed"),
        }

        if source_lang == "en" {
            match self.definition(text) {
                Ok(result) => return Some(result),
                Err(e) => warn!(error = %e, "dictionary definition failed"),
            }
        }
        None
    }
}

/// Phonetics from dictionaryapi.dev (English only)
pub struct DictionaryApiSource {
    client: Client,
}

impl DictionaryApiSource {
    pub fn new() -> Result<Self, ProviderError> {
        Ok(DictionaryApiSource {
            client: build_client(Duration::from_secs(15))?,
        })
    }

    fn fetch(&self, word: &str) -> Result<Option<String>, ProviderError> {
        let url = format!("{DICTIONARY_URL}/{}", encode_component(word));
        let response = self.client.get(url).send()?;
        let json: Value = check_status(response)?.json()?;
        Ok(parse_phonetic(&json))
    }
}

impl PhoneticSource for DictionaryApiSource {
    fn phonetic(&self, word: &str) -> Option<String> {
        match self.fetch(word) {
            Ok(found) => found,
            Err(ProviderError::Status(404)) => {
                debug!(word, "no dictionary entry");
                None
            }
            Err(e) => {
                warn!(word, error = %e, "phonetic lookup failed");
                None
            }
        }
    }
}

/// OpenAI-compatible speech endpoint producing mp3
pub struct HttpSpeech {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl HttpSpeech {
    /// `None` unless both endpoint and key are configured
    pub fn from_config(config: &SpeechConfig) -> Result<Option<Self>, ProviderError> {
        let (Some(endpoint), Some(api_key)) = (&config.endpoint, &config.api_key) else {
            return Ok(None);
        };
        Ok(Some(HttpSpeech {
            client: build_client(Duration::from_secs(60))?,
            endpoint: endpoint.clone(),
            api_key: api_key.clone(),
        }))
    }
}

impl SpeechSynthesizer for HttpSpeech {
    fn synthesize(&self, text: &str, voice: &str) -> Result<Vec<u8>, SpeechError> {
        let body = json!({
            "model": "tts-1",
            "voice": voice,
            "input": text,
            "response_format": "mp3",
        });
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .map_err(|e| SpeechError::Network(e.to_string()))?;
        if !response.status().is_success() {
            return Err(SpeechError::Network(format!("HTTP {}", response.status())));
        }
        let bytes = response.bytes().map_err(|e| SpeechError::Network(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}
