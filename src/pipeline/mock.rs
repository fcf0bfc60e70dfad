//! Scripted [`TextGenerator`] for tests and offline runs.

use crate::error::GenerateError;
use crate::pipeline::llm::TextGenerator;
use futures::future::BoxFuture;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// One scripted reply.
#[derive(Debug, Clone)]
pub enum MockResponse {
    Text(String),
    Error(GenerateError),
}

/// A hand-rolled generator that replays scripted replies.
///
/// Replies are served in order; once the script runs out the last reply
/// repeats. Every prompt received is recorded for inspection.
pub struct MockGenerator {
    responses: Mutex<Vec<MockResponse>>,
    fallback: MockResponse,
    delay: Option<Duration>,
    prompts: Mutex<Vec<String>>,
    call_count: AtomicUsize,
}

impl MockGenerator {
    /// Always answer with `text`.
    pub fn with_text(text: impl Into<String>) -> Self {
        Self::with_sequence(vec![MockResponse::Text(text.into())])
    }

    /// Always fail with `error`.
    pub fn with_error(error: GenerateError) -> Self {
        Self::with_sequence(vec![MockResponse::Error(error)])
    }

    /// Answer with each response in turn, then keep repeating the last one.
    ///
    /// An empty script behaves like a model that returns a malformed reply.
    pub fn with_sequence(mut responses: Vec<MockResponse>) -> Self {
        let fallback = responses.last().cloned().unwrap_or_else(|| {
            MockResponse::Error(GenerateError::MalformedResponse("empty script".into()))
        });
        // Reverse so replies can be popped from the end.
        responses.reverse();
        Self {
            responses: Mutex::new(responses),
            fallback,
            delay: None,
            prompts: Mutex::new(Vec::new()),
            call_count: AtomicUsize::new(0),
        }
    }

    /// Sleep this long before every reply.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// How many times `generate()` has been called.
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Every prompt received so far, oldest first.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }

    fn next_response(&self) -> MockResponse {
        match self.responses.lock() {
            Ok(mut seq) => seq.pop().unwrap_or_else(|| self.fallback.clone()),
            Err(_) => self.fallback.clone(),
        }
    }
}

impl TextGenerator for MockGenerator {
    fn generate<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<String, GenerateError>> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        let response = self.next_response();
        let delay = self.delay;

        Box::pin(async move {
            if let Some(d) = delay {
                tokio::time::sleep(d).await;
            }
            match response {
                MockResponse::Text(text) => Ok(text),
                MockResponse::Error(e) => Err(e),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_then_repeat_last() {
        let mock = MockGenerator::with_sequence(vec![
            MockResponse::Text("first".into()),
            MockResponse::Error(GenerateError::Quota("429".into())),
        ]);

        assert_eq!(tokio_test::block_on(mock.generate("a")), Ok("first".into()));
        assert!(tokio_test::block_on(mock.generate("b")).is_err());
        assert!(tokio_test::block_on(mock.generate("c")).is_err());
        assert_eq!(mock.call_count(), 3);
        assert_eq!(mock.prompts(), vec!["a", "b", "c"]);
    }

    #[test]
    fn empty_script_is_malformed() {
        let mock = MockGenerator::with_sequence(Vec::new());
        assert!(matches!(
            tokio_test::block_on(mock.generate("x")),
            Err(GenerateError::MalformedResponse(_))
        ));
    }
}
