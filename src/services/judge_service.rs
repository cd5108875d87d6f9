use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use crate::models::room::{AnswerSheet, CategoryVerdict, VerdictSheet};
use crate::models::round::CATEGORIES;

#[derive(Debug)]
pub enum JudgeError {
    Http(String),
    MalformedResponse(String),
}

impl std::fmt::Display for JudgeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JudgeError::Http(msg) => write!(f, "HTTP error: {}", msg),
            JudgeError::MalformedResponse(msg) => write!(f, "Malformed response: {}", msg),
        }
    }
}

impl std::error::Error for JudgeError {}

/// External collaborator that rules on each answer. Slow and unreliable by
/// assumption; callers must never block a player on it.
#[async_trait]
pub trait AnswerJudge: Send + Sync {
    async fn judge(&self, answers: &AnswerSheet, letter: char) -> Result<VerdictSheet, JudgeError>;
}

#[derive(Debug, Clone)]
pub struct JudgeConfig {
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl JudgeConfig {
    pub fn from_env() -> Self {
        JudgeConfig {
            endpoint: std::env::var("JUDGE_ENDPOINT")
                .unwrap_or_else(|_| "https://api.anthropic.com/v1/messages".to_string()),
            model: std::env::var("JUDGE_MODEL")
                .unwrap_or_else(|_| "claude-sonnet-4-20250514".to_string()),
            api_key: std::env::var("JUDGE_API_KEY").ok(),
            timeout: Duration::from_secs(15),
        }
    }
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: String,
}

/// LLM-backed judge speaking the messages API.
pub struct HttpAnswerJudge {
    client: reqwest::Client,
    config: JudgeConfig,
}

impl HttpAnswerJudge {
    pub fn new(config: JudgeConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("failed to build HTTP client");
        Self { client, config }
    }

    fn build_prompt(answers: &AnswerSheet, letter: char) -> String {
        let lines: Vec<String> = CATEGORIES
            .iter()
            .map(|category| {
                let answer = answers
                    .get(*category)
                    .map(|a| a.trim())
                    .filter(|a| !a.is_empty())
                    .unwrap_or("(empty)");
                format!("{}: \"{}\"", category, answer)
            })
            .collect();

        format!(
            "You are a strict judge for the word game \"Stop/Alphabet Game\".\n\
             Letter this round: \"{letter}\"\n\n\
             For each category validate:\n\
             1. Answer starts with \"{letter}\" (case-insensitive)\n\
             2. Answer genuinely belongs to the category (be strict — \"Belgium\" is a Country NOT a City, a person's name is NOT food, etc.)\n\n\
             Reply ONLY with minified JSON, no markdown, mapping every category to {{\"valid\":bool,\"reason\":\"...\"}}.\n\n\
             Answers:\n{}",
            lines.join("\n")
        )
    }

    /// The reply is supposed to be minified JSON; tolerate models that wrap
    /// it in a markdown fence anyway.
    fn parse_verdicts(text: &str) -> Result<VerdictSheet, JudgeError> {
        let cleaned = text.replace("```json", "").replace("```", "");
        serde_json::from_str(cleaned.trim())
            .map_err(|e| JudgeError::MalformedResponse(e.to_string()))
    }
}

#[async_trait]
impl AnswerJudge for HttpAnswerJudge {
    async fn judge(&self, answers: &AnswerSheet, letter: char) -> Result<VerdictSheet, JudgeError> {
        let body = json!({
            "model": self.config.model,
            "max_tokens": 800,
            "messages": [{ "role": "user", "content": Self::build_prompt(answers, letter) }],
        });

        let mut request = self.client.post(&self.config.endpoint).json(&body);
        if let Some(api_key) = &self.config.api_key {
            request = request
                .header("x-api-key", api_key)
                .header("anthropic-version", "2023-06-01");
        }

        let response = request
            .send()
            .await
            .map_err(|e| JudgeError::Http(e.to_string()))?;
        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|e| JudgeError::MalformedResponse(e.to_string()))?;

        let text: String = parsed
            .content
            .iter()
            .map(|block| block.text.as_str())
            .collect();
        Self::parse_verdicts(&text)
    }
}

/// Grading with a deterministic safety net: when the judge is unavailable or
/// talks nonsense, every category falls back to a simple prefix check so the
/// player is never left blocked.
#[derive(Clone)]
pub struct JudgeService {
    judge: Arc<dyn AnswerJudge>,
}

impl JudgeService {
    pub fn new(judge: Arc<dyn AnswerJudge>) -> Self {
        JudgeService { judge }
    }

    pub async fn judge_answers(&self, answers: &AnswerSheet, letter: char) -> VerdictSheet {
        match self.judge.judge(answers, letter).await {
            Ok(verdicts) => verdicts,
            Err(error) => {
                warn!("Judge unavailable, grading locally: {}", error);
                Self::fallback_verdicts(answers, letter)
            }
        }
    }

    /// Prefix heuristic: a non-empty answer of length >= 2 whose first
    /// character matches the round letter case-insensitively.
    pub fn fallback_verdicts(answers: &AnswerSheet, letter: char) -> VerdictSheet {
        CATEGORIES
            .iter()
            .map(|category| {
                let answer = answers.get(*category).map(|a| a.trim()).unwrap_or("");
                let ok = answer.len() >= 2
                    && answer
                        .chars()
                        .next()
                        .map(|c| c.eq_ignore_ascii_case(&letter))
                        .unwrap_or(false);
                let verdict = CategoryVerdict {
                    valid: ok,
                    reason: if ok { "Valid" } else { "Invalid or empty" }.to_string(),
                };
                (category.to_string(), verdict)
            })
            .collect()
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use test_case::test_case;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Judge double that counts invocations and either returns a canned
    /// sheet or fails, for exercising both grading paths.
    pub struct MockAnswerJudge {
        pub calls: AtomicUsize,
        pub verdicts: Option<VerdictSheet>,
    }

    impl MockAnswerJudge {
        pub fn succeeding(verdicts: VerdictSheet) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                verdicts: Some(verdicts),
            }
        }

        pub fn failing() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                verdicts: None,
            }
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AnswerJudge for MockAnswerJudge {
        async fn judge(
            &self,
            _answers: &AnswerSheet,
            _letter: char,
        ) -> Result<VerdictSheet, JudgeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.verdicts {
                Some(verdicts) => Ok(verdicts.clone()),
                None => Err(JudgeError::Http("connection refused".to_string())),
            }
        }
    }

    fn answers(pairs: &[(&str, &str)]) -> AnswerSheet {
        pairs
            .iter()
            .map(|(category, answer)| (category.to_string(), answer.to_string()))
            .collect()
    }

    #[test_case("Brazil", 'B', true; "matching prefix is valid")]
    #[test_case("brazil", 'B', true; "prefix check is case-insensitive")]
    #[test_case("", 'B', false; "empty answer is invalid")]
    #[test_case("B", 'B', false; "single character is too short")]
    #[test_case("Chile", 'B', false; "wrong letter is invalid")]
    #[test_case("  Berlin  ", 'B', true; "whitespace is trimmed")]
    fn fallback_heuristic(answer: &str, letter: char, expected: bool) {
        let sheet = JudgeService::fallback_verdicts(&answers(&[("Country", answer)]), letter);
        assert_eq!(sheet["Country"].valid, expected);
    }

    #[test]
    fn fallback_covers_every_category() {
        let sheet = JudgeService::fallback_verdicts(&HashMap::new(), 'B');
        assert_eq!(sheet.len(), CATEGORIES.len());
        assert!(sheet.values().all(|verdict| !verdict.valid));
    }

    #[tokio::test]
    async fn failing_judge_falls_back_to_heuristic() {
        let service = JudgeService::new(Arc::new(MockAnswerJudge::failing()));
        let sheet = service
            .judge_answers(&answers(&[("Country", "Brazil")]), 'B')
            .await;
        assert!(sheet["Country"].valid);
        assert!(!sheet["City"].valid);
    }

    #[test]
    fn parses_fenced_json_reply() {
        let text = "```json\n{\"Country\":{\"valid\":true,\"reason\":\"ok\"}}\n```";
        let sheet = HttpAnswerJudge::parse_verdicts(text).unwrap();
        assert!(sheet["Country"].valid);
    }

    #[test]
    fn rejects_non_json_reply() {
        assert!(HttpAnswerJudge::parse_verdicts("I think Brazil is fine").is_err());
    }

    #[tokio::test]
    async fn http_judge_parses_messages_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "content": [
                    { "type": "text", "text": "{\"Country\":{\"valid\":true,\"reason\":\"starts with B\"}," },
                    { "type": "text", "text": "\"City\":{\"valid\":false,\"reason\":\"wrong letter\"}}" }
                ]
            })))
            .mount(&server)
            .await;

        let judge = HttpAnswerJudge::new(JudgeConfig {
            endpoint: format!("{}/v1/messages", server.uri()),
            model: "test-model".to_string(),
            api_key: None,
            timeout: Duration::from_secs(5),
        });

        let sheet = judge
            .judge(&answers(&[("Country", "Brazil"), ("City", "Madrid")]), 'B')
            .await
            .unwrap();
        assert!(sheet["Country"].valid);
        assert!(!sheet["City"].valid);
    }

    #[tokio::test]
    async fn http_judge_reports_malformed_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "content": [{ "type": "text", "text": "sorry, no JSON today" }]
            })))
            .mount(&server)
            .await;

        let judge = HttpAnswerJudge::new(JudgeConfig {
            endpoint: server.uri(),
            model: "test-model".to_string(),
            api_key: None,
            timeout: Duration::from_secs(5),
        });

        let result = judge.judge(&HashMap::new(), 'B').await;
        assert!(matches!(result, Err(JudgeError::MalformedResponse(_))));
    }
}
