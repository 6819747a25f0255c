//! Hugging Face inference API provider.
//!
//! One text-generation model backs all three collaborator roles: question
//! generation, answer explanations and the closing career recommendation.

use std::sync::Mutex;
use std::time::Instant;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use skillcheck_core::model::Question;
use skillcheck_core::traits::{
    parse_generated_questions, ExplanationProvider, ExplanationRequest, QuestionRequest,
    QuestionSource, RecommendationProvider, RecommendationRequest,
};

use crate::error::ProviderError;

pub const DEFAULT_BASE_URL: &str = "https://api-inference.huggingface.co";
pub const DEFAULT_MODEL: &str = "google/gemma-2-2b-it";
const DEFAULT_TIMEOUT_SECS: u64 = 60;
const DEFAULT_QUESTION_COUNT: usize = 5;

/// Hugging Face hosted inference provider.
pub struct HuggingFaceProvider {
    api_key: String,
    base_url: String,
    model: String,
    client: reqwest::Client,
    /// Set once a request fails in a way retrying cannot fix.
    halted: Mutex<Option<String>>,
}

impl HuggingFaceProvider {
    pub fn new(api_key: &str, base_url: Option<String>, model: Option<String>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| ProviderError::NetworkError(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            api_key: api_key.to_string(),
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            client,
            halted: Mutex::new(None),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send a prompt and return the generated text.
    ///
    /// After a permanent failure (bad key, unknown model) every later call
    /// fails immediately without touching the network.
    async fn generate(&self, prompt: &str) -> anyhow::Result<String> {
        if let Some(reason) = self.lock_halted().clone() {
            anyhow::bail!("{} disabled after permanent failure: {reason}", self.model);
        }
        let result = self.send(prompt).await;
        if let Err(e) = &result {
            if let Some(err) = e
                .downcast_ref::<ProviderError>()
                .filter(|err| err.is_permanent())
            {
                tracing::error!(model = %self.model, "{err}, skipping further requests");
                *self.lock_halted() = Some(err.to_string());
            }
        }
        result
    }

    fn lock_halted(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.halted
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    #[instrument(skip(self, prompt), fields(model = %self.model))]
    async fn send(&self, prompt: &str) -> anyhow::Result<String> {
        let start = Instant::now();

        let body = InferenceRequest { inputs: prompt };
        let response = self
            .client
            .post(format!("{}/models/{}", self.base_url, self.model))
            .bearer_auth(&self.api_key)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout(DEFAULT_TIMEOUT_SECS)
                } else {
                    ProviderError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        if status == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(5)
                * 1000;
            return Err(ProviderError::RateLimited {
                retry_after_ms: retry_after,
            }
            .into());
        }
        if status == 401 || status == 403 {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::AuthenticationFailed(body).into());
        }
        if status == 404 {
            return Err(ProviderError::ModelNotFound(self.model.clone()).into());
        }
        if status >= 400 {
            let body = response.text().await.unwrap_or_default();
            if let Ok(err) = serde_json::from_str::<InferenceError>(&body) {
                if let Some(secs) = err.estimated_time {
                    return Err(ProviderError::ModelLoading {
                        estimated_secs: secs.ceil() as u64,
                    }
                    .into());
                }
                return Err(ProviderError::ApiError {
                    status,
                    message: err.error,
                }
                .into());
            }
            return Err(ProviderError::ApiError { status, message: body }.into());
        }

        let generations: Vec<Generation> =
            response.json().await.map_err(|e| ProviderError::ApiError {
                status: 0,
                message: format!("failed to parse response: {e}"),
            })?;

        tracing::debug!(latency_ms = start.elapsed().as_millis() as u64, "generation done");

        Ok(generations
            .into_iter()
            .next()
            .map(|g| g.generated_text)
            .unwrap_or_default())
    }
}

#[derive(Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
}

#[derive(Deserialize)]
struct Generation {
    #[serde(default)]
    generated_text: String,
}

#[derive(Deserialize)]
struct InferenceError {
    error: String,
    #[serde(default)]
    estimated_time: Option<f64>,
}

fn questions_prompt(request: &QuestionRequest) -> String {
    let count = match request.count {
        0 => DEFAULT_QUESTION_COUNT,
        n => n,
    };
    format!(
        r#"
Generate {count} multiple-choice questions for role "{}" and difficulty "{}".
Return ONLY a JSON array of questions:
[
  {{ "title": "Question text", "options": ["A", "B", "C", "D"], "correct": 0 }}
]
No extra text.
"#,
        request.role, request.difficulty
    )
}

fn explanation_prompt(request: &ExplanationRequest) -> String {
    format!(
        "Explain why \"{}\" is correct (or incorrect) for: {}",
        request.answer_text, request.title
    )
}

fn recommendation_prompt(request: &RecommendationRequest) -> String {
    format!(
        r#"
The user scored {}/{} in an AI/DS assessment (role: {}, difficulty: {}).
Suggest one AI career path in 1-2 sentences.
"#,
        request.correct, request.total, request.role, request.difficulty
    )
}

/// Drop a leading echo of the prompt, which some models include.
fn strip_prompt<'a>(generated: &'a str, prompt: &str) -> &'a str {
    generated.strip_prefix(prompt).unwrap_or(generated).trim()
}

#[async_trait]
impl QuestionSource for HuggingFaceProvider {
    fn name(&self) -> &str {
        "huggingface"
    }

    async fn fetch_questions(&self, request: &QuestionRequest) -> anyhow::Result<Vec<Question>> {
        let prompt = questions_prompt(request);
        let text = self.generate(&prompt).await?;
        let questions = parse_generated_questions(strip_prompt(&text, &prompt));
        if questions.is_empty() {
            tracing::warn!("model returned no usable questions");
        }
        Ok(questions)
    }
}

#[async_trait]
impl ExplanationProvider for HuggingFaceProvider {
    fn name(&self) -> &str {
        "huggingface"
    }

    async fn explain(&self, request: &ExplanationRequest) -> anyhow::Result<String> {
        let prompt = explanation_prompt(request);
        let text = self.generate(&prompt).await?;
        Ok(strip_prompt(&text, &prompt).to_string())
    }
}

#[async_trait]
impl RecommendationProvider for HuggingFaceProvider {
    fn name(&self) -> &str {
        "huggingface"
    }

    async fn recommend(&self, request: &RecommendationRequest) -> anyhow::Result<String> {
        let prompt = recommendation_prompt(request);
        let text = self.generate(&prompt).await?;
        Ok(strip_prompt(&text, &prompt).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skillcheck_core::engine::Epoch;
    use skillcheck_core::model::Difficulty;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const MODEL_PATH: &str = "/models/google/gemma-2-2b-it";

    fn question_request() -> QuestionRequest {
        QuestionRequest {
            role: "Data Scientist".into(),
            difficulty: Difficulty::Advanced,
            count: 2,
        }
    }

    fn provider(server: &MockServer, key: &str) -> HuggingFaceProvider {
        HuggingFaceProvider::new(key, Some(server.uri()), None).unwrap()
    }

    #[tokio::test]
    async fn generates_questions() {
        let server = MockServer::start().await;

        let generated = r#"Sure! [
            {"title": "What is overfitting?", "options": ["A", "B", "C"], "correct": 1},
            {"title": "What is a tensor?", "options": ["X", "Y"], "correct": 0}
        ]"#;
        Mock::given(method("POST"))
            .and(path(MODEL_PATH))
            .and(header("authorization", "Bearer test-key"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!([{ "generated_text": generated }])),
            )
            .mount(&server)
            .await;

        let questions = provider(&server, "test-key")
            .fetch_questions(&question_request())
            .await
            .unwrap();
        assert_eq!(questions.len(), 2);
        assert_eq!(questions[0].correct_text(), Some("B"));
    }

    #[tokio::test]
    async fn echoed_prompt_is_stripped() {
        let server = MockServer::start().await;
        let prompt = questions_prompt(&question_request());
        let generated = format!(
            "{prompt}[{{\"title\": \"Q\", \"options\": [\"a\", \"b\"], \"correct\": 0}}]"
        );
        Mock::given(method("POST"))
            .and(path(MODEL_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!([{ "generated_text": generated }])),
            )
            .mount(&server)
            .await;

        let questions = provider(&server, "k")
            .fetch_questions(&question_request())
            .await
            .unwrap();
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].title, "Q");
    }

    #[tokio::test]
    async fn malformed_generation_yields_no_questions() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(MODEL_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!([{ "generated_text": "I can't do that." }])),
            )
            .mount(&server)
            .await;

        let questions = provider(&server, "k")
            .fetch_questions(&question_request())
            .await
            .unwrap();
        assert!(questions.is_empty());
    }

    #[tokio::test]
    async fn explanation_prompt_names_answer() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(MODEL_PATH))
            .and(body_partial_json(serde_json::json!({
                "inputs": "Explain why \"Softmax\" is correct (or incorrect) for: Which activation?"
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(
                    serde_json::json!([{ "generated_text": "  It normalises outputs.  " }]),
                ),
            )
            .mount(&server)
            .await;

        let text = provider(&server, "k")
            .explain(&ExplanationRequest {
                epoch: Epoch::default(),
                question_index: 0,
                title: "Which activation?".into(),
                answer_text: "Softmax".into(),
            })
            .await
            .unwrap();
        assert_eq!(text, "It normalises outputs.");
    }

    #[tokio::test]
    async fn recommendation_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(MODEL_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!([{ "generated_text": "Become an ML Engineer." }])),
            )
            .mount(&server)
            .await;

        let text = provider(&server, "k")
            .recommend(&RecommendationRequest {
                epoch: Epoch::default(),
                correct: 5,
                total: 6,
                score: 5.0 / 6.0,
                role: "Data Scientist".into(),
                difficulty: Difficulty::Intermediate,
            })
            .await
            .unwrap();
        assert_eq!(text, "Become an ML Engineer.");
    }

    #[tokio::test]
    async fn authentication_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(MODEL_PATH))
            .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized"))
            .mount(&server)
            .await;

        let err = provider(&server, "bad-key")
            .fetch_questions(&question_request())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("authentication"));
        let provider_err = err.downcast_ref::<ProviderError>().unwrap();
        assert!(provider_err.is_permanent());
    }

    #[tokio::test]
    async fn permanent_failure_stops_further_requests() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(MODEL_PATH))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let provider = provider(&server, "k");
        let request = ExplanationRequest {
            epoch: Epoch::default(),
            question_index: 0,
            title: "t".into(),
            answer_text: "a".into(),
        };
        let first = provider.explain(&request).await.unwrap_err();
        assert!(first.downcast_ref::<ProviderError>().is_some());

        let second = provider.explain(&request).await.unwrap_err();
        assert!(second.to_string().contains("disabled after permanent failure"));
    }

    #[tokio::test]
    async fn transient_failure_does_not_halt() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(MODEL_PATH))
            .respond_with(ResponseTemplate::new(429))
            .expect(2)
            .mount(&server)
            .await;

        let provider = provider(&server, "k");
        assert!(provider.fetch_questions(&question_request()).await.is_err());
        let err = provider.fetch_questions(&question_request()).await.unwrap_err();
        assert!(err.to_string().contains("rate limited"));
    }

    #[tokio::test]
    async fn rate_limiting() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(MODEL_PATH))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "3"))
            .mount(&server)
            .await;

        let err = provider(&server, "k")
            .fetch_questions(&question_request())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("retry after 3000ms"));
    }

    #[tokio::test]
    async fn model_loading() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(MODEL_PATH))
            .respond_with(ResponseTemplate::new(503).set_body_json(serde_json::json!({
                "error": "Model google/gemma-2-2b-it is currently loading",
                "estimated_time": 20.5
            })))
            .mount(&server)
            .await;

        let err = provider(&server, "k")
            .fetch_questions(&question_request())
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ProviderError>(),
            Some(ProviderError::ModelLoading { estimated_secs: 21 })
        ));
    }

    #[test]
    fn questions_prompt_defaults_count() {
        let mut request = question_request();
        request.count = 0;
        let prompt = questions_prompt(&request);
        assert!(prompt.contains("Generate 5 multiple-choice questions"));
        assert!(prompt.contains("difficulty \"advanced\""));
    }
}
