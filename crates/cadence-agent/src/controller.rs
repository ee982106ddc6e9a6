use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;

use cadence_llm::{ChatClient, ChatOptions, ChatRequest, Tool};
use cadence_reduce::{reduce, SourceRanker};
use cadence_search::ToolExecutor;
use cadence_types::{
    Conversation, LLMConfig, LoopConfig, LoopEvent, ParsedResponse, RunInput, RunState, Source,
};
use futures::Stream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;
use tracing::Instrument;

use crate::error::LoopError;
use crate::prompt::build_system_prompt;
use crate::router::{LoopState, SimpleRouter};
use crate::tools::ToolRunner;
use crate::turn::{stream_turn, TurnOutcome};

pub type EventSender = mpsc::Sender<LoopEvent>;

/// Send an event, treating a closed channel as a disconnected client
pub(crate) async fn emit(events: &EventSender, event: LoopEvent) -> Result<(), LoopError> {
    events
        .send(event)
        .await
        .map_err(|_| LoopError::ClientDisconnected)
}

/// Terminal result of a successful run
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    pub response: ParsedResponse,
    /// Deduplicated, ranked and truncated
    pub sources: Vec<Source>,
}

/// Events of one spawned run
///
/// Yields any number of `Token` and `Sources` events followed by exactly one
/// `Done` or `Error`. Dropping the handle aborts the run, which cancels the
/// in-flight upstream request and any tool call still executing.
pub struct RunHandle {
    events: ReceiverStream<LoopEvent>,
    task: JoinHandle<()>,
}

impl Stream for RunHandle {
    type Item = LoopEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.events).poll_next(cx)
    }
}

impl Drop for RunHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Drives the stream / tool / continue cycle for one request at a time
///
/// Cheap to clone; every run gets its own state and shares only immutable
/// collaborators.
#[derive(Clone)]
pub struct Controller {
    client: Arc<dyn ChatClient>,
    executor: Arc<dyn ToolExecutor>,
    ranker: SourceRanker,
    llm_config: LLMConfig,
    config: LoopConfig,
    system_prompt: Arc<str>,
}

impl Controller {
    pub fn new(
        client: Arc<dyn ChatClient>,
        executor: Arc<dyn ToolExecutor>,
        ranker: SourceRanker,
        llm_config: LLMConfig,
        config: LoopConfig,
        system_prompt: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            client,
            executor,
            ranker,
            llm_config,
            config,
            system_prompt: system_prompt.into(),
        }
    }

    /// Create a builder for fluent construction
    pub fn builder() -> crate::builder::ControllerBuilder {
        crate::builder::ControllerBuilder::new()
    }

    pub fn config(&self) -> &LoopConfig {
        &self.config
    }

    /// Spawn a run in the background and return its event stream
    pub fn spawn_run(&self, input: RunInput) -> RunHandle {
        let (tx, rx) = mpsc::channel(self.config.event_buffer.max(1));
        let controller = self.clone();

        let task = tokio::spawn(async move {
            let terminal = match controller.run_with_deadline(input, &tx).await {
                Ok(outcome) => LoopEvent::Done {
                    response: outcome.response,
                    sources: outcome.sources,
                },
                Err(LoopError::ClientDisconnected) => {
                    tracing::info!("Client disconnected, run abandoned");
                    return;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Run failed");
                    LoopEvent::Error {
                        message: e.user_message().to_string(),
                    }
                }
            };
            let _ = tx.send(terminal).await;
        });

        RunHandle {
            events: ReceiverStream::new(rx),
            task,
        }
    }

    /// Drive a run to its end without streaming to a client
    pub async fn run_to_completion(&self, input: RunInput) -> Result<RunOutcome, LoopError> {
        let (tx, mut rx) = mpsc::channel(self.config.event_buffer.max(1));
        let drain = async move { while rx.recv().await.is_some() {} };

        let run = async move {
            let result = self.run_with_deadline(input, &tx).await;
            drop(tx);
            result
        };

        let (result, ()) = tokio::join!(run, drain);
        if let Err(e) = &result {
            tracing::error!(error = %e, "Run failed");
        }
        result
    }

    async fn run_with_deadline(
        &self,
        input: RunInput,
        events: &EventSender,
    ) -> Result<RunOutcome, LoopError> {
        let timeout = self.config.request_timeout;
        match tokio::time::timeout(timeout, self.execute_loop(input, events)).await {
            Ok(result) => result,
            Err(_) => Err(LoopError::Timeout(timeout)),
        }
    }

    async fn execute_loop(
        &self,
        input: RunInput,
        events: &EventSender,
    ) -> Result<RunOutcome, LoopError> {
        let start_time = Instant::now();
        let mut state = RunState::new(Conversation::from_history(&input.history, &input.message));
        let span = tracing::info_span!("run", run_id = %state.run_id);

        async move {
            tracing::info!(turns = state.conversation.len(), "Run started");

            let system = build_system_prompt(&self.system_prompt, input.context.as_ref());
            let tools = self.executor.tools();
            let router = SimpleRouter::new(self.config.max_iterations);
            let tool_runner = ToolRunner::new(Arc::clone(&self.executor), self.ranker.clone());

            let mut current = LoopState::Streaming;
            let mut turn = TurnOutcome::default();

            while current != LoopState::Reducing {
                match current {
                    LoopState::Streaming => {
                        debug_assert!(!state.conversation.has_pending_tool_use());
                        let request = self.build_request(&state, &system, &tools);
                        let stream = self
                            .client
                            .chat_stream(request)
                            .await
                            .map_err(LoopError::transport)?;
                        turn = stream_turn(stream, &mut state, events, self.config.live_preview).await?;
                        tracing::debug!(
                            round = state.rounds,
                            stop_reason = ?turn.stop_reason,
                            tool_calls = turn.tool_calls.len(),
                            "Turn finished"
                        );
                    }
                    LoopState::ExecutingTools => {
                        let results = tool_runner.run(&turn.tool_calls, &mut state, events).await?;
                        state
                            .conversation
                            .push_tool_round(&turn.text, &turn.tool_calls, &results);
                        state.rounds += 1;
                    }
                    LoopState::Continuing => {
                        turn = TurnOutcome::default();
                    }
                    LoopState::Reducing | LoopState::Done => break,
                }

                current = router.next(current, Some(&turn), state.rounds)?;
            }

            let response = reduce(&state.reduction_buffer);
            let sources = self.ranker.rank(&state.sources);
            tracing::info!(
                tier = ?response.tier,
                structured = response.is_structured(),
                actions = response.actions.len(),
                sources = sources.len(),
                rounds = state.rounds,
                duration_ms = start_time.elapsed().as_millis() as u64,
                "Run completed"
            );
            Ok(RunOutcome { response, sources })
        }
        .instrument(span)
        .await
    }

    fn build_request(&self, state: &RunState, system: &str, tools: &[Tool]) -> ChatRequest {
        let mut options = ChatOptions::new().tools(tools.to_vec());
        if let Some(temp) = self.llm_config.temperature {
            options = options.temperature(temp);
        }
        if let Some(max_tokens) = self.llm_config.max_tokens {
            options = options.max_tokens(max_tokens);
        }

        ChatRequest::new(
            self.llm_config.model.clone(),
            state.conversation.messages().to_vec(),
        )
        .with_system(system)
        .with_options(options)
    }
}
