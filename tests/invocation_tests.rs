mod common;

use common::mocks::{MockLLMClient, RecordingNotifier, tool_registry};
use factory::agents::{AgentExecutor, AgentSpec, InMemorySessionService, InvocationOutcome, RemoteInvoker};
use factory::llm::ChatMessage;
use factory::tools::ToolFilter;
use factory::types::{AgentMessage, AppError, RemoteAgentRequest};
use serde_json::json;
use std::sync::Arc;
use tokio_util::task::TaskTracker;

struct Harness {
    invoker: RemoteInvoker,
    executor: Arc<AgentExecutor>,
    llm: Arc<MockLLMClient>,
    notifier: Arc<RecordingNotifier>,
    tracker: TaskTracker,
}

fn harness(llm: MockLLMClient, max_tool_iterations: usize) -> Harness {
    let llm = Arc::new(llm);
    let notifier = Arc::new(RecordingNotifier::new());
    let tracker = TaskTracker::new();
    let executor = Arc::new(AgentExecutor::new(
        "remote_agents",
        llm.clone(),
        tool_registry(),
        Arc::new(InMemorySessionService::new()),
        max_tool_iterations,
    ));
    let invoker = RemoteInvoker::new(executor.clone(), notifier.clone(), tracker.clone());

    Harness {
        invoker,
        executor,
        llm,
        notifier,
        tracker,
    }
}

fn weather_request(query: &str) -> RemoteAgentRequest {
    RemoteAgentRequest {
        agent_name: "Weather Bot".to_string(),
        agent_description: "fetches weather".to_string(),
        agent_instruction: "Answer with the temperature.".to_string(),
        required_tools: vec!["http_get".to_string()],
        input_query: query.to_string(),
    }
}

#[tokio::test]
async fn test_invocation_reports_final_response() {
    let llm = MockLLMClient::new();
    llm.push_tool_call("c1", "http_get", json!({"url": "https://wttr.in/Paris"}))
        .push_text("Sunny, 21C");
    let h = harness(llm, 5);

    let ticket = h.invoker.invoke(weather_request("Weather in Paris?"));
    assert_eq!(ticket.acknowledgement(), "Weather Bot started running..");

    let outcome = ticket.handle.await.unwrap();
    assert_eq!(outcome, InvocationOutcome::Completed("Sunny, 21C".to_string()));
    assert_eq!(h.notifier.responses(), vec!["Sunny, 21C".to_string()]);

    let (messages, tools, _) = h.llm.request(0);
    match &messages[0] {
        ChatMessage::System(prompt) => {
            assert!(prompt.starts_with("Answer with the temperature."));
            assert!(prompt.contains("\"Weather_Bot\""));
        }
        other => panic!("expected a system prompt, got {:?}", other),
    }
    assert_eq!(tools.len(), 1);
    assert_eq!(tools[0].name, "http_get");

    let (second_turn, _, _) = h.llm.request(1);
    match second_turn.last() {
        Some(ChatMessage::Tool { tool_call_id, content }) => {
            assert_eq!(tool_call_id, "c1");
            assert!(content.contains("sunny, 21C"));
        }
        other => panic!("expected a tool message, got {:?}", other),
    }
}

#[tokio::test]
async fn test_invocation_failure_is_reported() {
    let llm = MockLLMClient::new();
    llm.push_failure("model unavailable");
    let h = harness(llm, 5);

    let outcome = h
        .invoker
        .invoke(weather_request("Weather in Paris?"))
        .handle
        .await
        .unwrap();

    match outcome {
        InvocationOutcome::Failed(message) => {
            assert!(message.starts_with("Agent Weather_Bot failed"));
            assert!(message.contains("model unavailable"));
        }
        other => panic!("expected failure, got {:?}", other),
    }
    let responses = h.notifier.responses();
    assert_eq!(responses.len(), 1);
    assert!(responses[0].contains("model unavailable"));
}

#[tokio::test]
async fn test_runaway_tool_loop_fails() {
    let h = harness(MockLLMClient::looping(10), 3);

    let outcome = h
        .invoker
        .invoke(weather_request("loop"))
        .handle
        .await
        .unwrap();

    assert!(matches!(&outcome, InvocationOutcome::Failed(m) if m.contains("exceeded 3 tool iterations")));
    assert_eq!(h.llm.request_count(), 3);
}

#[tokio::test]
async fn test_each_invocation_gets_a_fresh_session() {
    let llm = MockLLMClient::new();
    llm.push_text("one").push_text("two");
    let h = harness(llm, 5);

    let first = h.invoker.invoke(weather_request("a"));
    first.handle.await.unwrap();
    let second = h.invoker.invoke(weather_request("b"));
    second.handle.await.unwrap();

    assert_eq!(h.executor.sessions().len(), 0);
    let (messages, _, _) = h.llm.request(1);
    assert_eq!(messages.len(), 2, "no history leaks between invocations");
}

#[tokio::test]
async fn test_failed_invocation_drops_its_session() {
    let llm = MockLLMClient::new();
    llm.push_failure("model unavailable");
    let h = harness(llm, 5);

    let outcome = h.invoker.invoke(weather_request("a")).handle.await.unwrap();

    assert!(matches!(outcome, InvocationOutcome::Failed(_)));
    assert!(h.executor.sessions().is_empty());
}

#[tokio::test]
async fn test_tracker_drains_background_runs() {
    let llm = MockLLMClient::new();
    llm.push_text("done");
    let h = harness(llm, 5);

    let _ticket = h.invoker.invoke(weather_request("a"));
    h.tracker.close();
    h.tracker.wait().await;

    assert_eq!(h.notifier.responses(), vec!["done".to_string()]);
}

#[tokio::test]
async fn test_trace_records_calls_and_tool_errors() {
    let llm = MockLLMClient::new();
    llm.push_tool_call("c1", "http_get", json!({}))
        .push_tool_call("c2", "echo", json!({"text": "hi"}))
        .push_text("gave up");
    let h = harness(llm, 5);

    let spec = AgentSpec::new("weather", "fetches weather", "")
        .with_tools(ToolFilter::only(["http_get"]));
    let message = AgentMessage {
        session_id: "s".to_string(),
        user_id: "u".to_string(),
        query: "hi".to_string(),
    };
    let trace = h.executor.execute(&spec, &message).await.unwrap();

    let ids: Vec<_> = trace.function_calls.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["c1", "c2"]);
    assert_eq!(trace.function_responses.len(), 2);
    assert!(trace.function_responses[0].result["error"]
        .as_str()
        .unwrap()
        .contains("url is required"));
    // echo is outside the agent's filter
    assert!(trace.function_responses[1].result["error"].is_string());
    assert_eq!(trace.final_response.as_deref(), Some("gave up"));
}

#[tokio::test]
async fn test_execute_propagates_model_errors() {
    let llm = MockLLMClient::new();
    llm.push_failure("boom");
    let h = harness(llm, 5);

    let spec = AgentSpec::new("weather", "fetches weather", "");
    let message = AgentMessage {
        session_id: "s".to_string(),
        user_id: "u".to_string(),
        query: "hi".to_string(),
    };
    let err = h.executor.execute(&spec, &message).await.unwrap_err();
    assert!(matches!(err, AppError::LLM(_)));
}
