//! First-run onboarding: ask for an API key, check it, store it.

use super::prompt::{LineReader, Prompt, PromptResult};
use super::spinner::Spinner;
use crate::config::{ApiSettings, ConfigError};
use crate::credentials::CredentialStore;
use crate::llm::{OpenAiTransport, TransportError};
use crate::render::{Renderer, Role};
use async_trait::async_trait;
use std::io::Write;
use tracing::{info, warn};

/// Shortest key accepted before asking the server.
const MIN_KEY_LEN: usize = 10;

const SETUP_TEXT: &str = "Welcome to Ducky! 🦆\n\
\n\
To get started, you'll need an OpenAI API key.\n\
You can get one from: https://platform.openai.com/api-keys\n\
\n\
Your API key will be stored securely in ~/.ducky/config.json";

/// Checks a candidate key against the API.
#[async_trait]
pub trait KeyVerifier: Send + Sync {
    /// Returns the model's reply to the probe on success.
    async fn verify(&self, key: &str) -> Result<String, TransportError>;
}

/// Verifies keys with a live probe request.
pub struct ApiKeyVerifier {
    settings: ApiSettings,
}

impl ApiKeyVerifier {
    pub fn new(settings: ApiSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl KeyVerifier for ApiKeyVerifier {
    async fn verify(&self, key: &str) -> Result<String, TransportError> {
        OpenAiTransport::new(&self.settings, key)?.verify().await
    }
}

/// Run onboarding until a key is verified and stored or the user gives up.
///
/// Returns the stored key, or `None` when the user cancelled. A key that
/// verified but could not be written is an error.
pub async fn run_setup<R, V, W>(
    reader: &mut R,
    verifier: &V,
    store: &CredentialStore,
    renderer: &Renderer,
    out: &mut W,
    animate: bool,
) -> anyhow::Result<Option<String>>
where
    R: LineReader,
    V: KeyVerifier + ?Sized,
    W: Write,
{
    renderer.text_panel(out, Some("🔑 API Key Setup Required"), Role::Warning, SETUP_TEXT)?;
    out.flush()?;

    let key_prompt = Prompt::new("🦆 Please enter your OpenAI API key").secret();

    loop {
        let key = match reader.read_line(&key_prompt)? {
            PromptResult::Submitted(key) => key.trim().to_string(),
            PromptResult::Cancelled | PromptResult::Interrupted => return Ok(None),
        };

        if key.len() < MIN_KEY_LEN {
            renderer.status_line(
                out,
                Role::Error,
                "❌ Invalid API key format. Please try again.",
            )?;
            out.flush()?;
            continue;
        }

        let spinner = Spinner::new(
            "🦆 Verifying API key...",
            renderer.theme().color(Role::Accent),
            animate,
        );
        let Some(outcome) = spinner.run(out, verifier.verify(&key)).await? else {
            return Ok(None);
        };

        match outcome {
            Ok(reply) => {
                if let Err(err) = store.set_api_key(&key) {
                    renderer.status_line(
                        out,
                        Role::Error,
                        &format!("❌ Failed to save API key: {err}"),
                    )?;
                    out.flush()?;
                    return Err(save_error(err));
                }
                info!(path = %store.path().display(), "api key saved");
                renderer.status_line(out, Role::Success, "✅ API key verified and saved!")?;
                renderer.text_panel(out, Some("🎉 Success"), Role::Success, &reply)?;
                out.flush()?;
                return Ok(Some(key));
            }
            Err(err) => {
                warn!(%err, "api key verification failed");
                renderer.status_line(out, Role::Error, &format!("❌ {err}"))?;
                out.flush()?;

                let retry = Prompt::new("Try again? (y/n)").default_value("y");
                match reader.read_line(&retry)? {
                    PromptResult::Submitted(answer) if answer.trim().eq_ignore_ascii_case("y") => {
                        continue
                    }
                    _ => return Ok(None),
                }
            }
        }
    }
}

fn save_error(err: ConfigError) -> anyhow::Error {
    anyhow::Error::new(err).context("failed to save API key")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{strip_ansi, DisplayTheme};
    use std::collections::VecDeque;
    use std::io;
    use std::sync::Mutex;

    struct ScriptedReader {
        answers: VecDeque<PromptResult>,
        asked: Vec<String>,
    }

    impl ScriptedReader {
        fn new(answers: Vec<PromptResult>) -> Self {
            Self {
                answers: answers.into(),
                asked: Vec::new(),
            }
        }
    }

    impl LineReader for ScriptedReader {
        fn read_line(&mut self, prompt: &Prompt) -> io::Result<PromptResult> {
            self.asked.push(prompt.label.clone());
            Ok(self.answers.pop_front().unwrap_or(PromptResult::Interrupted))
        }
    }

    struct FakeVerifier {
        results: Mutex<VecDeque<Result<String, TransportError>>>,
        seen: Mutex<Vec<String>>,
    }

    impl FakeVerifier {
        fn new(results: Vec<Result<String, TransportError>>) -> Self {
            Self {
                results: Mutex::new(results.into()),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl KeyVerifier for FakeVerifier {
        async fn verify(&self, key: &str) -> Result<String, TransportError> {
            self.seen.lock().unwrap().push(key.to_string());
            self.results
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(TransportError::EmptyResponse))
        }
    }

    fn submitted(text: &str) -> PromptResult {
        PromptResult::Submitted(text.to_string())
    }

    fn renderer() -> Renderer {
        Renderer::new(DisplayTheme::default(), 60)
    }

    #[tokio::test]
    async fn test_valid_key_is_saved() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::at(dir.path().join("config.json"));
        let mut reader = ScriptedReader::new(vec![submitted("  sk-test-1234567890  ")]);
        let verifier = FakeVerifier::new(vec![Ok("API key verified successfully".into())]);
        let mut out = Vec::new();

        let key = run_setup(&mut reader, &verifier, &store, &renderer(), &mut out, false)
            .await
            .unwrap();

        assert_eq!(key.as_deref(), Some("sk-test-1234567890"));
        assert_eq!(store.get_api_key().as_deref(), Some("sk-test-1234567890"));
        assert_eq!(*verifier.seen.lock().unwrap(), vec!["sk-test-1234567890"]);

        let text = strip_ansi(&String::from_utf8(out).unwrap());
        assert!(text.contains("API Key Setup Required"));
        assert!(text.contains("✅ API key verified and saved!"));
        assert!(text.contains("API key verified successfully"));
    }

    #[tokio::test]
    async fn test_short_key_is_rejected_without_verifying() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::at(dir.path().join("config.json"));
        let mut reader = ScriptedReader::new(vec![
            submitted("short"),
            submitted("sk-long-enough-key"),
        ]);
        let verifier = FakeVerifier::new(vec![Ok("ok".into())]);
        let mut out = Vec::new();

        let key = run_setup(&mut reader, &verifier, &store, &renderer(), &mut out, false)
            .await
            .unwrap();

        assert_eq!(key.as_deref(), Some("sk-long-enough-key"));
        assert_eq!(verifier.seen.lock().unwrap().len(), 1);
        let text = strip_ansi(&String::from_utf8(out).unwrap());
        assert!(text.contains("❌ Invalid API key format. Please try again."));
    }

    #[tokio::test]
    async fn test_failed_verification_then_decline() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::at(dir.path().join("config.json"));
        let mut reader = ScriptedReader::new(vec![submitted("sk-bad-key-000"), submitted("n")]);
        let verifier = FakeVerifier::new(vec![Err(TransportError::EmptyResponse)]);
        let mut out = Vec::new();

        let key = run_setup(&mut reader, &verifier, &store, &renderer(), &mut out, false)
            .await
            .unwrap();

        assert_eq!(key, None);
        assert_eq!(store.get_api_key(), None);
        assert_eq!(reader.asked[1], "Try again? (y/n)");
        let text = strip_ansi(&String::from_utf8(out).unwrap());
        assert!(text.contains("❌ the model returned no choices"));
    }

    #[tokio::test]
    async fn test_failed_verification_then_retry() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::at(dir.path().join("config.json"));
        let mut reader = ScriptedReader::new(vec![
            submitted("sk-bad-key-000"),
            submitted("Y"),
            submitted("sk-good-key-111"),
        ]);
        let verifier = FakeVerifier::new(vec![
            Err(TransportError::EmptyResponse),
            Ok("fine".into()),
        ]);
        let mut out = Vec::new();

        let key = run_setup(&mut reader, &verifier, &store, &renderer(), &mut out, false)
            .await
            .unwrap();

        assert_eq!(key.as_deref(), Some("sk-good-key-111"));
    }

    #[tokio::test]
    async fn test_cancel_at_key_prompt() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::at(dir.path().join("config.json"));
        let mut reader = ScriptedReader::new(vec![PromptResult::Cancelled]);
        let verifier = FakeVerifier::new(vec![]);
        let mut out = Vec::new();

        let key = run_setup(&mut reader, &verifier, &store, &renderer(), &mut out, false)
            .await
            .unwrap();

        assert_eq!(key, None);
        assert!(verifier.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_failure_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the file should be makes the write fail.
        let path = dir.path().join("config.json");
        std::fs::create_dir(&path).unwrap();
        let store = CredentialStore::at(&path);
        let mut reader = ScriptedReader::new(vec![submitted("sk-test-1234567890")]);
        let verifier = FakeVerifier::new(vec![Ok("ok".into())]);
        let mut out = Vec::new();

        let result = run_setup(&mut reader, &verifier, &store, &renderer(), &mut out, false).await;

        assert!(result.is_err());
        let text = strip_ansi(&String::from_utf8(out).unwrap());
        assert!(text.contains("❌ Failed to save API key"));
    }
}
