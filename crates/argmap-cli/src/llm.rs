//! LLM-backed negation (Ollama).
//!
//! Blocking HTTP against a local Ollama server, temperature 0 so repeated runs
//! over the same export produce the same counter-statements.

use anyhow::{anyhow, Result};
use argmap_kialo::{GeneratorInfo, NegationError, Negator};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

const OLLAMA_HOST_ENV: &str = "OLLAMA_HOST";

const SYSTEM_PROMPT: &str = "You negate debate claims. Reply with the negated claim only: \
one sentence, same language, no quotes, no explanation. Change as few words as possible.";

pub fn normalize_ollama_host(host: &str) -> String {
    let mut host = host.trim().to_string();
    if host.is_empty() {
        host = "http://127.0.0.1:11434".to_string();
    }
    if !host.starts_with("http://") && !host.starts_with("https://") {
        host = format!("http://{host}");
    }
    host.trim_end_matches('/').to_string()
}

/// Strip the wrapping models like to add despite the prompt.
fn clean_reply(reply: &str) -> String {
    let reply = reply.trim();
    let reply = reply
        .strip_prefix('"')
        .and_then(|r| r.strip_suffix('"'))
        .unwrap_or(reply);
    reply.trim().to_string()
}

pub struct OllamaNegator {
    client: reqwest::blocking::Client,
    url: String,
    model: String,
}

impl OllamaNegator {
    pub fn new(host: &str, model: &str, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::blocking::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| anyhow!("failed to build http client: {e}"))?;
        Ok(Self {
            client,
            url: format!("{}/api/chat", normalize_ollama_host(host)),
            model: model.to_string(),
        })
    }
}

#[derive(Deserialize)]
struct OllamaChatResponse {
    message: OllamaChatMessage,
}

#[derive(Deserialize)]
struct OllamaChatMessage {
    content: String,
}

impl Negator for OllamaNegator {
    fn negate(&self, text: &str) -> Result<String, NegationError> {
        let body = json!({
            "model": self.model,
            "stream": false,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": text },
            ],
            "options": { "temperature": 0 }
        });

        let resp = self.client.post(&self.url).json(&body).send().map_err(|e| {
            NegationError::Unavailable(format!(
                "failed to reach ollama at {} (is it running?) ({e}). Try: `ollama serve` or set {OLLAMA_HOST_ENV}",
                self.url
            ))
        })?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().unwrap_or_default();
            return Err(NegationError::Unavailable(format!(
                "ollama http error {status}: {body}"
            )));
        }

        let out: OllamaChatResponse = resp
            .json()
            .map_err(|e| NegationError::InvalidResponse(format!("ollama returned invalid JSON: {e}")))?;

        let negated = clean_reply(&out.message.content);
        if negated.is_empty() {
            return Err(NegationError::Empty);
        }
        tracing::trace!(model = %self.model, original = text, %negated, "negated");
        Ok(negated)
    }

    fn generator(&self) -> GeneratorInfo {
        GeneratorInfo::new(format!("ollama/{}", self.model), "temperature-0")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_normalization() {
        assert_eq!(normalize_ollama_host(""), "http://127.0.0.1:11434");
        assert_eq!(normalize_ollama_host("gpu-box:11434/"), "http://gpu-box:11434");
        assert_eq!(
            normalize_ollama_host("https://ollama.internal"),
            "https://ollama.internal"
        );
    }

    #[test]
    fn replies_lose_wrapping_quotes() {
        assert_eq!(clean_reply("  \"Cats are not great.\"\n"), "Cats are not great.");
        assert_eq!(clean_reply("It is \"fine\""), "It is \"fine\"");
    }

    #[test]
    fn unreachable_server_is_a_negation_error() {
        // Port 9 (discard) is essentially never an Ollama server.
        let negator =
            OllamaNegator::new("127.0.0.1:9", "m", Some(Duration::from_millis(200))).unwrap();
        assert!(matches!(
            negator.negate("A is B."),
            Err(NegationError::Unavailable(_))
        ));
    }
}
