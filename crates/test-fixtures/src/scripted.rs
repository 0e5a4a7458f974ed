//! A closure-driven [`IGenerativeModel`] that records every request.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use narrata_core::errors::SynthesisError;
use narrata_core::models::CompletionRequest;
use narrata_core::traits::IGenerativeModel;

/// Which pipeline stage issued a request, recovered from the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptedTask {
    Synthesis,
    Narration,
}

impl ScriptedTask {
    /// Synthesis prompts ask for a `query_string` object; narration prompts never do.
    pub fn of(request: &CompletionRequest) -> Self {
        if request.messages.iter().any(|m| m.content.contains("query_string")) {
            Self::Synthesis
        } else {
            Self::Narration
        }
    }
}

type Handler = dyn Fn(ScriptedTask, &CompletionRequest) -> Result<String, SynthesisError> + Send + Sync;

pub struct ScriptedModel {
    handler: Box<Handler>,
    delay: Option<Duration>,
    synthesis_calls: AtomicUsize,
    narration_calls: AtomicUsize,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedModel {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(ScriptedTask, &CompletionRequest) -> Result<String, SynthesisError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            handler: Box::new(handler),
            delay: None,
            synthesis_calls: AtomicUsize::new(0),
            narration_calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Answers synthesis with `{"query_string": sql}` and narration with the
    /// data table it was given, or "No data was found." for an empty result.
    pub fn answering(sql: impl Into<String>) -> Self {
        let sql = sql.into();
        Self::new(move |task, request| match task {
            ScriptedTask::Synthesis => Ok(serde_json::json!({ "query_string": sql }).to_string()),
            ScriptedTask::Narration => Ok(echo_narration(request)),
        })
    }

    /// Sleep this long before every answer.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self, task: ScriptedTask) -> usize {
        match task {
            ScriptedTask::Synthesis => self.synthesis_calls.load(Ordering::SeqCst),
            ScriptedTask::Narration => self.narration_calls.load(Ordering::SeqCst),
        }
    }

    pub fn total_calls(&self) -> usize {
        self.calls(ScriptedTask::Synthesis) + self.calls(ScriptedTask::Narration)
    }

    /// Every request received, in order.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// The most recent narration prompt, all messages joined.
    pub fn last_narration_prompt(&self) -> Option<String> {
        self.requests()
            .into_iter()
            .rev()
            .find(|r| ScriptedTask::of(r) == ScriptedTask::Narration)
            .map(|r| {
                r.messages
                    .iter()
                    .map(|m| m.content.as_str())
                    .collect::<Vec<_>>()
                    .join("\n")
            })
    }
}

impl IGenerativeModel for ScriptedModel {
    fn complete(&self, request: &CompletionRequest) -> Result<String, SynthesisError> {
        let task = ScriptedTask::of(request);
        match task {
            ScriptedTask::Synthesis => self.synthesis_calls.fetch_add(1, Ordering::SeqCst),
            ScriptedTask::Narration => self.narration_calls.fetch_add(1, Ordering::SeqCst),
        };
        self.requests.lock().unwrap().push(request.clone());
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        (self.handler)(task, request)
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Narration stand-in: repeat the data section of the prompt.
fn echo_narration(request: &CompletionRequest) -> String {
    if request.messages.iter().any(|m| m.content.contains("Rows returned: 0")) {
        return "No data was found for this question.".to_string();
    }
    request
        .messages
        .iter()
        .find_map(|m| m.content.split_once("Data:\n"))
        .map(|(_, data)| format!("According to the data:\n{}", data.trim()))
        .unwrap_or_else(|| "I could not find the data section.".to_string())
}
