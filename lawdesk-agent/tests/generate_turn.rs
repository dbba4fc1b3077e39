mod support;

use std::sync::{Arc, Mutex};

use lawdesk_agent::{
    validate_deltas_match_final, validate_single_final, AdviceEngine, GenerateEvent,
    GenerateRequest, BLOCKED_FALLBACK_MESSAGE, NOT_CONFIGURED_MESSAGE, TRANSIENT_FAILURE_MESSAGE,
};
use lawdesk_core::{ChunkChoice, ChunkDelta, CompletionChunk, LawdeskError, Role, ToolChoice};
use serde_json::json;
use support::*;

fn ask(question: &str) -> GenerateRequest {
    GenerateRequest::new(question, "SYS")
}

#[tokio::test]
async fn unconfigured_engine_reports_and_stops() {
    let engine = AdviceEngine::builder().model("gpt-test").build();
    let events = run(&engine, ask("질문")).await;
    assert_eq!(
        events,
        vec![GenerateEvent::final_text(NOT_CONFIGURED_MESSAGE, vec![])]
    );

    let provider = ScriptedProvider::new(vec![]);
    let engine = AdviceEngine::builder().provider(provider.clone()).model("  ").build();
    let events = run(&engine, ask("질문")).await;
    assert_eq!(events[0].text(), NOT_CONFIGURED_MESSAGE);
    assert!(provider.requests().is_empty());
}

#[tokio::test]
async fn first_call_block_emits_single_final_with_filter_message() {
    let provider = ScriptedProvider::new(vec![Scripted::Blocked(Some(
        "요청이 안전 정책에 의해 차단되었습니다.".to_string(),
    ))]);
    let events = run(&engine(provider.clone()), ask("질문").allow_tools(true)).await;

    assert_eq!(events.len(), 1);
    assert!(events[0].is_final());
    assert_eq!(events[0].text(), "요청이 안전 정책에 의해 차단되었습니다.");
    assert!(events[0].links().is_empty());
    assert_eq!(provider.requests().len(), 1);
}

#[tokio::test]
async fn block_without_message_uses_fallback() {
    let provider = ScriptedProvider::new(vec![Scripted::Blocked(None)]);
    let events = run(&engine(provider), ask("질문")).await;
    assert_eq!(events, vec![GenerateEvent::final_text(BLOCKED_FALLBACK_MESSAGE, vec![])]);
}

#[tokio::test]
async fn transient_failures_end_the_turn_with_retry_message() {
    let provider = ScriptedProvider::new(vec![Scripted::Transient]);
    let events = run(&engine(provider), ask("질문")).await;
    assert_eq!(events, vec![GenerateEvent::final_text(TRANSIENT_FAILURE_MESSAGE, vec![])]);

    let provider = ScriptedProvider::new(vec![Scripted::text(""), Scripted::Transient]);
    let events = run(&engine(provider.clone()), ask("질문")).await;
    assert_eq!(events, vec![GenerateEvent::final_text(TRANSIENT_FAILURE_MESSAGE, vec![])]);
    assert_eq!(provider.requests().len(), 2);
}

#[tokio::test]
async fn call_parameters_follow_the_two_phase_protocol() {
    let provider = ScriptedProvider::new(vec![Scripted::text("초안"), Scripted::stream(&["답"])]);
    let search = FixedSearch::new(json!({}), json!([]));
    let engine = AdviceEngine::builder()
        .provider(provider.clone())
        .model("gpt-test")
        .search(search)
        .build();

    run(&engine, ask("질문").allow_tools(true)).await;
    let requests = provider.requests();
    assert_eq!(requests.len(), 2);

    let first = &requests[0];
    assert!(!first.stream);
    assert!(first.allow_retry);
    assert_eq!(first.max_tokens, 800);
    assert_eq!(first.temperature, 0.2);
    assert_eq!(first.tool_choice, Some(ToolChoice::Auto));
    let names: Vec<_> = first.tools.iter().map(|spec| spec.name.as_str()).collect();
    assert_eq!(names, vec!["search_one", "search_multi"]);
    assert_eq!(first.messages.len(), 2);
    assert_eq!(first.messages[0].role, Role::System);
    assert_eq!(first.messages[0].content, "SYS");
    assert_eq!(first.messages[1].role, Role::User);

    let second = &requests[1];
    assert!(second.stream);
    assert_eq!(second.max_tokens, 1400);
    assert!(second.tools.is_empty());
    assert_eq!(second.tool_choice, None);
    assert_eq!(second.messages, first.messages);
}

#[tokio::test]
async fn tools_are_not_offered_when_disallowed_or_unbacked() {
    let provider = ScriptedProvider::new(vec![Scripted::text(""), Scripted::text("답")]);
    let search = FixedSearch::new(json!({}), json!([]));
    let engine = AdviceEngine::builder()
        .provider(provider.clone())
        .model("gpt-test")
        .search(search)
        .build();
    run(&engine, ask("질문").allow_tools(false)).await;
    let first = &provider.requests()[0];
    assert!(first.tools.is_empty());
    assert_eq!(first.tool_choice, Some(ToolChoice::None));

    let provider = ScriptedProvider::new(vec![Scripted::text(""), Scripted::text("답")]);
    run(&support::engine(provider.clone()), ask("질문").allow_tools(true)).await;
    assert!(provider.requests()[0].tools.is_empty());
}

#[tokio::test]
async fn tool_calls_are_dispatched_in_order_and_fed_back() {
    let provider = ScriptedProvider::new(vec![
        Scripted::tool_calls(vec![
            call("call_a", "search_one", r#"{"query":"민법"}"#),
            call("call_b", "lookup_case", "{}"),
            call("call_c", "search_multi", "not json"),
        ]),
        Scripted::text("답변"),
    ]);
    let search = FixedSearch::new(
        json!({"items": [{"title": "민법", "url": "https://law.go.kr/법령/민법"}]}),
        json!([
            {"items": [{"title": "형법"}]},
            {"items": []},
            "ignored",
            {"items": [{"title": "상법"}]}
        ]),
    );
    let engine = AdviceEngine::builder()
        .provider(provider.clone())
        .model("gpt-test")
        .search(search.clone())
        .build();

    let events = run(&engine, ask("질문").allow_tools(true).stream(false)).await;

    let calls = search.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].0, "search_one");
    assert_eq!(calls[0].1.get("query"), Some(&json!("민법")));
    assert_eq!(calls[1].0, "search_multi");
    assert!(calls[1].1.is_empty());

    let second = &provider.requests()[1];
    let messages = &second.messages;
    assert_eq!(messages.len(), 6);
    assert_eq!(messages[2].role, Role::Assistant);
    assert_eq!(messages[2].content, "");
    assert_eq!(messages[2].tool_calls.len(), 3);

    let tool_ids: Vec<_> = messages[3..]
        .iter()
        .map(|message| (message.role.clone(), message.tool_call_id.clone().unwrap()))
        .collect();
    assert_eq!(
        tool_ids,
        vec![
            (Role::Tool, "call_a".to_string()),
            (Role::Tool, "call_b".to_string()),
            (Role::Tool, "call_c".to_string()),
        ]
    );
    let unknown: serde_json::Value = serde_json::from_str(&messages[4].content).unwrap();
    assert_eq!(unknown, json!({"error": "unknown tool: lookup_case"}));

    let links = events[0].links();
    let titles: Vec<_> = links.iter().map(|item| item["title"].clone()).collect();
    assert_eq!(titles, vec![json!("민법"), json!("형법"), json!("상법")]);
    assert_eq!(events.len(), 1);
}

#[tokio::test]
async fn failing_tool_becomes_an_error_result() {
    let provider = ScriptedProvider::new(vec![
        Scripted::tool_calls(vec![call("call_a", "search_one", "")]),
        Scripted::text("답변"),
    ]);
    let engine = AdviceEngine::builder()
        .provider(provider.clone())
        .model("gpt-test")
        .search(FixedSearch::failing("quota exceeded"))
        .build();

    let events = run(&engine, ask("질문").allow_tools(true).stream(false)).await;
    let tool_message = &provider.requests()[1].messages[3];
    let result: serde_json::Value = serde_json::from_str(&tool_message.content).unwrap();
    assert_eq!(result, json!({"error": "execution failed: quota exceeded"}));
    assert_eq!(events[0].text(), "답변");
}

#[tokio::test]
async fn known_tool_without_backend_reports_missing_search() {
    let provider = ScriptedProvider::new(vec![
        Scripted::tool_calls(vec![call("call_a", "search_multi", "{}")]),
        Scripted::text("답변"),
    ]);
    run(&engine(provider.clone()), ask("질문").stream(false)).await;
    let result: serde_json::Value =
        serde_json::from_str(&provider.requests()[1].messages[3].content).unwrap();
    assert_eq!(result, json!({"error": "search backend not configured"}));
}

#[tokio::test]
async fn streamed_deltas_add_up_to_final_with_links_block() {
    let provider = ScriptedProvider::new(vec![
        Scripted::text(""),
        Scripted::stream(&["민법 제8", "39조의2에 따라 ", "재산분할을 청구할 수 있다."]),
    ]);
    let events = run(&engine(provider), ask("재산분할")).await;

    validate_single_final(&events).unwrap();
    validate_deltas_match_final(&events).unwrap();

    assert_eq!(events.len(), 5);
    assert_eq!(events[0].text(), "민법 제8");
    let tail = events[3].text();
    assert!(tail.starts_with("\n\n### 참고 링크(조문)\n- [민법 제839조의2]("));
    let final_text = events[4].text();
    assert!(final_text.starts_with("민법 제839조의2에 따라 재산분할을 청구할 수 있다.\n"));
    assert!(final_text.ends_with(")\n"));
}

#[tokio::test]
async fn stream_without_citations_has_no_extra_delta() {
    let provider = ScriptedProvider::new(vec![
        Scripted::text(""),
        Scripted::stream(&["안녕하세요", ""]),
    ]);
    let events = run(&engine(provider), ask("인사")).await;
    assert_eq!(
        events,
        vec![
            GenerateEvent::delta("안녕하세요", vec![]),
            GenerateEvent::final_text("안녕하세요", vec![]),
        ]
    );
}

#[tokio::test]
async fn malformed_chunks_are_skipped_and_finish_reason_stops() {
    let provider = ScriptedProvider::new(vec![
        Scripted::text(""),
        Scripted::Chunks(vec![
            Ok(CompletionChunk::text("가")),
            Err(LawdeskError::ParseFailed {
                output: "{".to_string(),
                reason: "eof".to_string(),
            }),
            Ok(CompletionChunk { choices: vec![] }),
            Ok(CompletionChunk::text("나")),
            Ok(CompletionChunk::finished("stop")),
            Ok(CompletionChunk::text("버려짐")),
        ]),
    ]);
    let events = run(&engine(provider), ask("질문")).await;
    let texts: Vec<_> = events.iter().map(GenerateEvent::text).collect();
    assert_eq!(texts, vec!["가", "나", "가나"]);
    validate_deltas_match_final(&events).unwrap();
}

fn last_piece(content: &str) -> CompletionChunk {
    CompletionChunk {
        choices: vec![ChunkChoice {
            delta: ChunkDelta {
                content: Some(content.to_string()),
            },
            finish_reason: Some("stop".to_string()),
        }],
    }
}

#[tokio::test]
async fn text_on_the_finishing_chunk_is_streamed() {
    let provider = ScriptedProvider::new(vec![
        Scripted::text(""),
        Scripted::Chunks(vec![
            Ok(CompletionChunk::text("Hel")),
            Ok(last_piece("lo")),
            Ok(CompletionChunk::text("after")),
        ]),
    ]);
    let events = run(&engine(provider), ask("질문")).await;
    let texts: Vec<_> = events.iter().map(GenerateEvent::text).collect();
    assert_eq!(texts, vec!["Hel", "lo", "Hello"]);
    validate_deltas_match_final(&events).unwrap();
}

#[tokio::test]
async fn drained_stream_keeps_text_on_the_finishing_chunk() {
    let provider = ScriptedProvider::new(vec![
        Scripted::text(""),
        Scripted::Chunks(vec![
            Ok(CompletionChunk::text("Hel")),
            Ok(last_piece("lo")),
            Ok(CompletionChunk::text("after")),
        ]),
    ]);
    let events = run(&engine(provider), ask("질문").stream(false)).await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].text(), "Hello");
}

#[tokio::test]
async fn model_written_links_block_survives_only_when_streamed() {
    let answer = "민법 제750조\n### 참고 링크(조문)\n- 직접 작성";

    let provider = ScriptedProvider::new(vec![Scripted::text(""), Scripted::stream(&[answer])]);
    let streamed = run(&engine(provider), ask("질문")).await;
    validate_deltas_match_final(&streamed).unwrap();
    assert_eq!(streamed.last().map(GenerateEvent::text), Some(answer));

    let provider = ScriptedProvider::new(vec![Scripted::text(""), Scripted::text(answer)]);
    let whole = run(&engine(provider), ask("질문").stream(false)).await;
    let text = whole[0].text();
    assert!(!text.contains("직접 작성"));
    assert!(text.starts_with("민법 제750조\n### 참고 링크(조문)\n- [민법 제750조](https://law.go.kr/"));
}

#[tokio::test]
async fn second_call_block_keeps_accumulated_links() {
    let provider = ScriptedProvider::new(vec![
        Scripted::tool_calls(vec![call("call_a", "search_one", r#"{"query":"형법"}"#)]),
        Scripted::Blocked(None),
    ]);
    let engine = AdviceEngine::builder()
        .provider(provider)
        .model("gpt-test")
        .search(FixedSearch::new(json!({"items": [{"title": "형법"}]}), json!([])))
        .build();

    let events = run(&engine, ask("질문").allow_tools(true)).await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].text(), BLOCKED_FALLBACK_MESSAGE);
    assert_eq!(events[0].links(), &[json!({"title": "형법"})]);
}

#[tokio::test]
async fn non_streamed_answer_is_linked_once() {
    let provider = ScriptedProvider::new(vec![
        Scripted::text(""),
        Scripted::text("형소법 제163조를 확인하라."),
    ]);
    let events = run(&engine(provider), ask("질문").stream(false)).await;
    assert_eq!(events.len(), 1);
    let text = events[0].text();
    assert!(text.starts_with("형소법 제163조를 확인하라.\n\n### 참고 링크(조문)\n"));
    assert!(text.contains("- [형사소송법 제163조](https://law.go.kr/"));
}

#[tokio::test]
async fn whole_reply_in_streaming_mode_is_one_delta() {
    let provider = ScriptedProvider::new(vec![Scripted::text(""), Scripted::text("민법 제750조")]);
    let events = run(&engine(provider), ask("질문")).await;
    assert_eq!(events.len(), 2);
    validate_deltas_match_final(&events).unwrap();
}

#[tokio::test]
async fn primer_is_injected_before_the_question() {
    let provider = ScriptedProvider::new(vec![Scripted::text(""), Scripted::text("답")]);
    let prefetch = Arc::new(FixedPrefetch {
        fail: false,
        seen_rows: Mutex::new(None),
    });
    let engine = AdviceEngine::builder()
        .provider(provider.clone())
        .model("gpt-test")
        .prefetch(prefetch.clone())
        .summarize(Arc::new(FixedSummary(Some("관련 법령: 민법".to_string()))))
        .build();

    run(&engine, ask("질문").allow_tools(true).num_rows(5)).await;
    let messages = &provider.requests()[0].messages;
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[1].role, Role::System);
    assert_eq!(messages[1].content, "관련 법령: 민법");
    assert_eq!(*prefetch.seen_rows.lock().unwrap(), Some(5));
}

#[tokio::test]
async fn primer_is_skipped_without_tools_or_on_failure() {
    let summary = Arc::new(FixedSummary(Some("primer".to_string())));

    let provider = ScriptedProvider::new(vec![Scripted::text(""), Scripted::text("답")]);
    let engine = AdviceEngine::builder()
        .provider(provider.clone())
        .model("gpt-test")
        .prefetch(Arc::new(FixedPrefetch {
            fail: false,
            seen_rows: Mutex::new(None),
        }))
        .summarize(summary.clone())
        .build();
    run(&engine, ask("질문").allow_tools(false)).await;
    assert_eq!(provider.requests()[0].messages.len(), 2);

    let provider = ScriptedProvider::new(vec![Scripted::text(""), Scripted::text("답")]);
    let engine = AdviceEngine::builder()
        .provider(provider.clone())
        .model("gpt-test")
        .prefetch(Arc::new(FixedPrefetch {
            fail: true,
            seen_rows: Mutex::new(None),
        }))
        .summarize(summary)
        .build();
    let events = run(&engine, ask("질문").allow_tools(true)).await;
    assert_eq!(provider.requests()[0].messages.len(), 2);
    assert_eq!(events.last().unwrap().text(), "답");
}
