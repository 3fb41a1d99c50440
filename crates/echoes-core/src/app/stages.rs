//! Stage model specs - caption / image / speech の job 入力
//!
//! Builds the request for each inference stage and interprets its output.

use serde_json::{Value, json};

use crate::domain::{ModelRef, PredictionSpec};

pub const CAPTION_MODEL_VERSION: &str =
    "19be067b589d0c46689ffa7cc3ff321447a441986a7694c01225973c2eafc874";
pub const CAPTION_PROMPT: &str = "Describe this image with a short but precise description.";
pub const CAPTION_MAX_TOKENS: u32 = 80;

pub const IMAGE_MODEL_OWNER: &str = "black-forest-labs";
pub const IMAGE_MODEL_NAME: &str = "flux-dev";

pub const SPEECH_MODEL_VERSION: &str =
    "684bc3855b37866c0c65add2ff39c78f3dea3f4ff103a436465326e0f438d55e";
pub const SPEECH_LANGUAGE: &str = "en";

/// Voice samples the narration is cloned from.
pub const DEFAULT_SPEAKERS: [&str; 4] = [
    "https://rn2xk7sjthrsbxqc.public.blob.vercel-storage.com/audioBase/matteoAudio-ZRnpUs99H9sI7BurCppQjONxiFLIHp.wav",
    "https://rn2xk7sjthrsbxqc.public.blob.vercel-storage.com/audioBase/cathrineAudio-hS7GFKppvV8zEm92hImJGg7ApTZiaz.wav",
    "https://rn2xk7sjthrsbxqc.public.blob.vercel-storage.com/audioBase/hannaAudio-KumIbXBPkK7Dsl4xYbdXGZUIgH2yVr.wav",
    "https://rn2xk7sjthrsbxqc.public.blob.vercel-storage.com/audioBase/aminaAudio-8fBwV71tY0yKhmKiV7MV4LMkZuHXFe.wav",
];

pub fn default_speakers() -> Vec<String> {
    DEFAULT_SPEAKERS.iter().map(|s| s.to_string()).collect()
}

/// Which models the three inference stages run on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageModels {
    pub caption: ModelRef,
    pub image: ModelRef,
    pub speech: ModelRef,
}

impl Default for StageModels {
    fn default() -> Self {
        Self {
            caption: ModelRef::version(CAPTION_MODEL_VERSION),
            image: ModelRef::model(IMAGE_MODEL_OWNER, IMAGE_MODEL_NAME),
            speech: ModelRef::version(SPEECH_MODEL_VERSION),
        }
    }
}

impl StageModels {
    pub fn caption_spec(&self, image_url: &str) -> PredictionSpec {
        PredictionSpec {
            model: self.caption.clone(),
            input: json!({
                "image": image_url,
                "prompt": CAPTION_PROMPT,
                "max_tokens": CAPTION_MAX_TOKENS,
            }),
        }
    }

    pub fn image_spec(&self, caption: &str) -> PredictionSpec {
        PredictionSpec {
            model: self.image.clone(),
            input: json!({
                "prompt": caption,
                "go_fast": true,
                "guidance": 3.5,
                "num_outputs": 1,
                "aspect_ratio": "1:1",
                "output_format": "webp",
                "output_quality": 80,
                "prompt_strength": 0.8,
                "num_inference_steps": 40,
            }),
        }
    }

    pub fn speech_spec(&self, caption: &str, speaker: &str) -> PredictionSpec {
        PredictionSpec {
            model: self.speech.clone(),
            input: json!({
                "text": caption,
                "language": SPEECH_LANGUAGE,
                "speaker": speaker,
            }),
        }
    }
}

/// Caption output: streamed string chunks or one string.
///
/// Chunks are joined without separator, each line break becomes one space,
/// and the result is trimmed. `None` when nothing usable is left.
pub fn caption_text(output: &Value) -> Option<String> {
    let joined = match output {
        Value::String(s) => s.clone(),
        Value::Array(chunks) => chunks.iter().filter_map(Value::as_str).collect(),
        _ => return None,
    };
    let caption = joined.replace("\r\n", " ").replace('\n', " ");
    let caption = caption.trim();
    (!caption.is_empty()).then(|| caption.to_string())
}

/// URL of the first produced file (`["url", ...]` or `"url"`).
pub fn first_output_url(output: &Value) -> Option<&str> {
    let url = match output {
        Value::String(s) => s.as_str(),
        Value::Array(items) => items.first()?.as_str()?,
        _ => return None,
    };
    (!url.trim().is_empty()).then_some(url)
}
