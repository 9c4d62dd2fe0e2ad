use std::env;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use jelajah_core::model::{Place, QuestionPackage};

use crate::error::QuestionSourceError;

//
// ─── CONTRACT ──────────────────────────────────────────────────────────────────
//

/// Produces one question package for a topic and place name.
///
/// Implementations may fail, time out, or return malformed data; the session
/// engine recovers from any of it via [`fallback_question`], so callers never
/// need to distinguish the failure modes.
#[async_trait]
pub trait QuestionSource: Send + Sync {
    /// Request a question about `topic` for the place called `place_name`.
    ///
    /// # Errors
    ///
    /// Returns `QuestionSourceError` for network failures, overload signals,
    /// and payloads that do not decode into a well-formed question.
    async fn fetch_question(
        &self,
        topic: &str,
        place_name: &str,
    ) -> Result<QuestionPackage, QuestionSourceError>;
}

//
// ─── GEMINI CLIENT ─────────────────────────────────────────────────────────────
//

#[derive(Clone, Debug)]
pub struct GeminiConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

impl GeminiConfig {
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let api_key = env::var("JELAJAH_AI_API_KEY").ok()?;
        if api_key.trim().is_empty() {
            return None;
        }
        let base_url = env::var("JELAJAH_AI_BASE_URL")
            .unwrap_or_else(|_| "https://generativelanguage.googleapis.com/v1beta".into());
        let model = env::var("JELAJAH_AI_MODEL").unwrap_or_else(|_| "gemini-2.5-flash".into());
        Some(Self {
            api_key,
            base_url,
            model,
        })
    }
}

/// Question source backed by the Gemini `generateContent` REST endpoint.
#[derive(Clone)]
pub struct GeminiQuestionSource {
    client: Client,
    config: Option<GeminiConfig>,
}

impl GeminiQuestionSource {
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(GeminiConfig::from_env())
    }

    #[must_use]
    pub fn new(config: Option<GeminiConfig>) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// False when no API key is configured; every fetch then reports
    /// `Disabled` and the engine plays on fallback questions alone.
    #[must_use]
    pub fn enabled(&self) -> bool {
        self.config.is_some()
    }
}

fn build_prompt(topic: &str, place_name: &str) -> String {
    format!(
        r#"Anda adalah AI pembuat kuis untuk anak SD tentang geografi di Jawa Barat.
Buat satu pertanyaan tentang topik "{topic}" dari {place_name}.

Secara acak, pilih salah satu format: "multiple_choice", "short_answer", atau "fill_in_blank".

Jawab HANYA dengan JSON valid, tanpa teks lain dan tanpa pagar kode. Struktur:
{{
  "kind": "multiple_choice" | "short_answer" | "fill_in_blank",
  "prompt": "Teks pertanyaan. Untuk fill_in_blank gunakan '____' sebagai placeholder.",
  "options": ["Pilihan A", "Pilihan B", "Pilihan C"],
  "answer": "jawaban benar" atau ["jawaban 1", "jawaban 2"],
  "explanation": "Penjelasan singkat (2 kalimat) yang cocok untuk anak SD."
}}

Aturan:
- "short_answer": "answer" adalah string, tanpa field "options".
- "multiple_choice": "answer" adalah string, "options" berisi 3 pilihan termasuk jawaban benar.
- "fill_in_blank": "answer" adalah ARRAY string sesuai urutan placeholder '____', tanpa field "options"."#
    )
}

#[async_trait]
impl QuestionSource for GeminiQuestionSource {
    async fn fetch_question(
        &self,
        topic: &str,
        place_name: &str,
    ) -> Result<QuestionPackage, QuestionSourceError> {
        let config = self.config.as_ref().ok_or(QuestionSourceError::Disabled)?;

        let url = format!(
            "{}/models/{}:generateContent?key={}",
            config.base_url.trim_end_matches('/'),
            config.model,
            config.api_key
        );
        let payload = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart {
                    text: build_prompt(topic, place_name),
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
            },
        };

        let response = self.client.post(url).json(&payload).send().await?;

        let status = response.status();
        if !status.is_success() {
            // The overload signal arrives in the error body, not the status.
            if let Ok(body) = response.json::<ApiErrorBody>().await {
                if body.error.message.to_lowercase().contains("overloaded") {
                    return Err(QuestionSourceError::Overloaded);
                }
            }
            return Err(QuestionSourceError::HttpStatus(status));
        }

        let body: GenerateResponse = response.json().await?;
        let text = body
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content.parts.into_iter().next())
            .map(|part| part.text)
            .ok_or_else(|| QuestionSourceError::Malformed("no candidate text".into()))?;

        decode_question(&text)
    }
}

/// Decode model output into a question and check its invariants.
///
/// # Errors
///
/// Returns `QuestionSourceError::Malformed` for anything that does not parse
/// into the closed question union or fails the well-formedness check.
pub fn decode_question(raw: &str) -> Result<QuestionPackage, QuestionSourceError> {
    let question: QuestionPackage = serde_json::from_str(raw.trim())
        .map_err(|err| QuestionSourceError::Malformed(err.to_string()))?;
    question
        .ensure_well_formed()
        .map_err(|err| QuestionSourceError::Malformed(err.to_string()))?;
    Ok(question)
}

/// Deterministic built-in question used whenever the remote source fails.
///
/// Always well-formed, and correct for every place in the catalog.
#[must_use]
pub fn fallback_question(place: &Place) -> QuestionPackage {
    QuestionPackage::MultipleChoice {
        prompt: format!("{} terletak di provinsi mana?", place.name()),
        options: vec![
            "Jawa Barat".to_owned(),
            "Jawa Tengah".to_owned(),
            "Banten".to_owned(),
        ],
        answer: "Jawa Barat".to_owned(),
        explanation: format!(
            "{} adalah salah satu kabupaten/kota di Provinsi Jawa Barat.",
            place.name()
        ),
    }
}

//
// ─── WIRE TYPES ────────────────────────────────────────────────────────────────
//

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<RequestContent>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct RequestContent {
    parts: Vec<RequestPart>,
}

#[derive(Debug, Serialize)]
struct RequestPart {
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    #[serde(rename = "responseMimeType")]
    response_mime_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    message: String,
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
