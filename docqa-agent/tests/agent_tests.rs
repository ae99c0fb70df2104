//! Agent loop tests against a scripted chat model.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::sync::mpsc;

use docqa_agent::{
    AgentError, ChannelSink, ChatEvent, ChatEventStream, ChatModel, ChatRequest, DocAgent,
    FinishReason, NullSink, Tool, ToolCall, ToolChoice,
};

/// A model that replays a fixed script of event sequences, one per round,
/// and records every request it receives.
struct ScriptedModel {
    rounds: Mutex<Vec<Vec<ChatEvent>>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedModel {
    fn new(rounds: Vec<Vec<ChatEvent>>) -> Self {
        Self { rounds: Mutex::new(rounds), requests: Mutex::new(Vec::new()) }
    }

    fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn chat(&self, request: ChatRequest) -> docqa_agent::Result<ChatEventStream> {
        self.requests.lock().unwrap().push(request);
        let mut rounds = self.rounds.lock().unwrap();
        if rounds.is_empty() {
            return Err(AgentError::Model("script exhausted".into()));
        }
        let events = rounds.remove(0);
        Ok(Box::pin(futures::stream::iter(events.into_iter().map(Ok))))
    }
}

/// A tool that records queries and returns a canned chunk list.
struct RecordingTool {
    queries: Mutex<Vec<String>>,
    fail: bool,
}

impl RecordingTool {
    fn new() -> Self {
        Self { queries: Mutex::new(Vec::new()), fail: false }
    }

    fn failing() -> Self {
        Self { queries: Mutex::new(Vec::new()), fail: true }
    }
}

#[async_trait]
impl Tool for RecordingTool {
    fn name(&self) -> &str {
        "docs_retriever"
    }

    fn description(&self) -> &str {
        "retrieve chunks"
    }

    fn parameters_schema(&self) -> Value {
        json!({"type": "object", "properties": {"query": {"type": "string"}}})
    }

    async fn execute(&self, args: Value) -> docqa_agent::Result<Value> {
        let query = args.get("query").and_then(|v| v.as_str()).unwrap_or_default();
        self.queries.lock().unwrap().push(query.to_string());
        if self.fail {
            return Err(AgentError::Tool("index unavailable".into()));
        }
        Ok(json!({"results": [{"title": "Handbook", "text": "refunds take 5 days"}]}))
    }
}

fn retrieval_round() -> Vec<ChatEvent> {
    vec![
        ChatEvent::ToolCall(ToolCall {
            id: "call_1".into(),
            name: "docs_retriever".into(),
            arguments: "{\"query\":\"refund policy\"}".into(),
        }),
        ChatEvent::Finished(FinishReason::ToolCalls),
    ]
}

fn answer_round(tokens: &[&str]) -> Vec<ChatEvent> {
    let mut events: Vec<ChatEvent> =
        tokens.iter().map(|t| ChatEvent::Token((*t).to_string())).collect();
    events.push(ChatEvent::Finished(FinishReason::Stop));
    events
}

#[tokio::test]
async fn retrieves_then_answers() {
    let model = Arc::new(ScriptedModel::new(vec![
        retrieval_round(),
        answer_round(&["**Answer:** ", "5 days"]),
    ]));
    let tool = Arc::new(RecordingTool::new());
    let agent = DocAgent::new(model.clone(), tool.clone());

    let answer = agent.run("how long do refunds take?", &NullSink).await.unwrap();
    assert_eq!(answer, "**Answer:** 5 days");
    assert_eq!(tool.queries.lock().unwrap().as_slice(), ["refund policy"]);

    // Round 1 forces retrieval; the follow-up round does not.
    let requests = model.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].tool_choice, ToolChoice::Required);
    assert_eq!(requests[1].tool_choice, ToolChoice::Auto);
    assert!(!requests[1].tools.is_empty());
}

#[tokio::test]
async fn streams_tokens_in_order() {
    let model = Arc::new(ScriptedModel::new(vec![
        retrieval_round(),
        answer_round(&["a", "b", "c"]),
    ]));
    let agent = DocAgent::new(model, Arc::new(RecordingTool::new()));

    let (tx, mut rx) = mpsc::channel(16);
    let sink = ChannelSink::new(tx);
    let answer = agent.run("q", &sink).await.unwrap();
    drop(sink);

    assert_eq!(answer, "abc");
    let mut streamed = Vec::new();
    while let Some(token) = rx.recv().await {
        streamed.push(token);
    }
    assert_eq!(streamed, ["a", "b", "c"]);
}

#[tokio::test]
async fn tool_results_are_fed_back_to_the_model() {
    let model = Arc::new(ScriptedModel::new(vec![retrieval_round(), answer_round(&["done"])]));
    let agent = DocAgent::new(model.clone(), Arc::new(RecordingTool::new()));

    agent.run("q", &NullSink).await.unwrap();

    let requests = model.requests();
    let followup = &requests[1].messages;
    // system, user, assistant tool calls, tool result.
    assert_eq!(followup.len(), 4);
    assert_eq!(followup[2].tool_calls[0].name, "docs_retriever");
    assert_eq!(followup[3].tool_call_id.as_deref(), Some("call_1"));
    assert!(followup[3].content.contains("refunds take 5 days"));
}

#[tokio::test]
async fn tool_failure_is_reported_not_fatal() {
    let model = Arc::new(ScriptedModel::new(vec![retrieval_round(), answer_round(&["sorry"])]));
    let agent = DocAgent::new(model.clone(), Arc::new(RecordingTool::failing()));

    let answer = agent.run("q", &NullSink).await.unwrap();
    assert_eq!(answer, "sorry");

    let requests = model.requests();
    assert!(requests[1].messages[3].content.contains("index unavailable"));
}

#[tokio::test]
async fn round_cap_forces_a_final_round_without_tools() {
    // The model keeps calling the tool every round; after the cap the agent
    // must issue one last request with no tools offered.
    let model = Arc::new(ScriptedModel::new(vec![
        retrieval_round(),
        retrieval_round(),
        answer_round(&["final"]),
    ]));
    let agent = DocAgent::new(model.clone(), Arc::new(RecordingTool::new())).with_max_rounds(2);

    let answer = agent.run("q", &NullSink).await.unwrap();
    assert_eq!(answer, "final");

    let requests = model.requests();
    assert_eq!(requests.len(), 3);
    assert!(!requests[0].tools.is_empty());
    assert!(!requests[1].tools.is_empty());
    assert!(requests[2].tools.is_empty());
}

#[tokio::test]
async fn unknown_tool_name_becomes_an_error_result() {
    let rogue_round = vec![
        ChatEvent::ToolCall(ToolCall {
            id: "call_9".into(),
            name: "format_disk".into(),
            arguments: "{}".into(),
        }),
        ChatEvent::Finished(FinishReason::ToolCalls),
    ];
    let model = Arc::new(ScriptedModel::new(vec![rogue_round, answer_round(&["ok"])]));
    let tool = Arc::new(RecordingTool::new());
    let agent = DocAgent::new(model.clone(), tool.clone());

    agent.run("q", &NullSink).await.unwrap();

    assert!(tool.queries.lock().unwrap().is_empty());
    let requests = model.requests();
    assert!(requests[1].messages[3].content.contains("unknown tool"));
}

#[tokio::test]
async fn system_prompt_pins_the_grounding_contract() {
    let unanswerable = "The information needed to answer this question is not available in the provided documents.";
    let model = Arc::new(ScriptedModel::new(vec![
        retrieval_round(),
        answer_round(&[unanswerable]),
    ]));
    let agent = DocAgent::new(model.clone(), Arc::new(RecordingTool::new()));

    let answer = agent.run("what is the moon made of?", &NullSink).await.unwrap();
    assert!(answer.contains("not available in the provided documents"));

    let requests = model.requests();
    let system = &requests[0].messages[0].content;
    assert!(system.contains(unanswerable));
    assert!(system.contains("**Answer:**"));
    assert!(system.contains("**Sources:**"));
}

#[tokio::test]
async fn model_error_aborts_the_run() {
    // Script exhausted on round 1.
    let model = Arc::new(ScriptedModel::new(vec![]));
    let agent = DocAgent::new(model, Arc::new(RecordingTool::new()));

    let err = agent.run("q", &NullSink).await.unwrap_err();
    assert!(matches!(err, AgentError::Model(_)));
}
