//! End-to-end engine tests driving the public API the same way an embedding
//! application would: build an engine, launch it, start a run, poll for
//! completion and inspect records, logs and events.

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use nexus_stream::{
    Capability, ChannelEvent, ChannelOptions, EngineBuilder, FlowSnapshot, GraphEvent, LogStatus, NexusKind, NexusModel, NexusStatus, NexusSubtype,
    Result, Run, StreamError, StreamModel, SynapseModel, Vars,
};

fn nexus(
    id: &str,
    kind: NexusKind,
    subtype: NexusSubtype,
) -> NexusModel {
    NexusModel {
        id: id.to_string(),
        kind,
        subtype,
        ..Default::default()
    }
}

fn trigger(id: &str) -> NexusModel {
    nexus(id, NexusKind::Trigger, NexusSubtype::Webhook)
}

fn action(id: &str) -> NexusModel {
    nexus(id, NexusKind::Action, NexusSubtype::Logger)
}

fn synapse(
    id: &str,
    source: &str,
    target: &str,
) -> SynapseModel {
    SynapseModel {
        id: id.to_string(),
        source: source.to_string(),
        target: target.to_string(),
        source_handle: None,
    }
}

fn stream(
    nexuses: Vec<NexusModel>,
    synapses: Vec<SynapseModel>,
) -> StreamModel {
    StreamModel {
        id: "stream-1".to_string(),
        name: "test stream".to_string(),
        desc: String::new(),
        nexuses,
        synapses,
    }
}

fn wait_complete(run: &Arc<Run>) {
    for _ in 0..500 {
        if run.is_complete() {
            // Give the channel listener a moment to drain pending events.
            std::thread::sleep(Duration::from_millis(50));
            return;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    panic!("run did not complete in time");
}

/// Capability that always fails.
struct FailingCapability;

#[async_trait]
impl Capability for FailingCapability {
    fn subtype(&self) -> NexusSubtype {
        NexusSubtype::Agent
    }

    async fn execute(
        &self,
        _: &Vars,
        _: &FlowSnapshot,
    ) -> Result<Vars> {
        Err(StreamError::Capability("inference backend unreachable".to_string()))
    }
}

/// Capability that hangs far longer than any test timeout.
struct HangingCapability;

#[async_trait]
impl Capability for HangingCapability {
    fn subtype(&self) -> NexusSubtype {
        NexusSubtype::Agent
    }

    async fn execute(
        &self,
        _: &Vars,
        _: &FlowSnapshot,
    ) -> Result<Vars> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(Vars::new())
    }
}

#[test]
fn test_fan_out_execution_order() {
    let engine = EngineBuilder::new().async_worker_thread_number(2).build().unwrap();
    engine.launch();

    // T -> A -> B -> C, plus independent T -> D
    let model = stream(
        vec![trigger("t"), action("a"), action("b"), action("c"), action("d")],
        vec![
            synapse("s1", "t", "a"),
            synapse("s2", "t", "d"),
            synapse("s3", "a", "b"),
            synapse("s4", "b", "c"),
        ],
    );

    let run = engine.build_run(&model).unwrap();
    engine.start_run(run.clone()).unwrap();
    wait_complete(&run);

    let logs = run.logs();
    let order: Vec<&str> = logs.iter().map(|l| l.nexus_id.as_str()).collect();
    assert_eq!(order, vec!["t", "a", "d", "b", "c"]);
    assert!(logs.iter().all(|l| l.status == LogStatus::Success));

    engine.shutdown();
}

#[test]
fn test_error_stops_branch_only() {
    let engine = EngineBuilder::new()
        .async_worker_thread_number(2)
        .register_capability(Arc::new(FailingCapability))
        .build()
        .unwrap();
    engine.launch();

    // T -> A (fails) -> B, plus independent T -> D
    let model = stream(
        vec![
            trigger("t"),
            nexus("a", NexusKind::Action, NexusSubtype::Agent),
            action("b"),
            action("d"),
        ],
        vec![synapse("s1", "t", "a"), synapse("s2", "t", "d"), synapse("s3", "a", "b")],
    );

    let run = engine.build_run(&model).unwrap();
    engine.start_run(run.clone()).unwrap();
    wait_complete(&run);

    let records = run.records();
    assert_eq!(records["a"].status, NexusStatus::Error);
    assert_eq!(records["b"].status, NexusStatus::Idle);
    assert_eq!(records["d"].status, NexusStatus::Success);

    // The failed visit still left a log entry and the error text as output.
    let logs = run.logs();
    let a_entry = logs.iter().find(|l| l.nexus_id == "a").unwrap();
    assert_eq!(a_entry.status, LogStatus::Error);
    assert_eq!(
        records["a"].last_output,
        Some(serde_json::Value::String("inference backend unreachable".to_string()))
    );
    assert!(!logs.iter().any(|l| l.nexus_id == "b"));

    engine.shutdown();
}

#[test]
fn test_dangling_synapse_is_skipped() {
    let engine = EngineBuilder::new().async_worker_thread_number(2).build().unwrap();
    engine.launch();

    let model = stream(
        vec![trigger("t"), action("a")],
        vec![synapse("s1", "t", "ghost"), synapse("s2", "t", "a")],
    );

    let run = engine.build_run(&model).unwrap();
    engine.start_run(run.clone()).unwrap();
    wait_complete(&run);

    let logs = run.logs();
    assert!(!logs.iter().any(|l| l.nexus_id == "ghost"));
    assert_eq!(run.records()["a"].status, NexusStatus::Success);

    engine.shutdown();
}

#[test]
fn test_shared_node_executes_once_first_arrival() {
    let engine = EngineBuilder::new().async_worker_thread_number(2).build().unwrap();
    engine.launch();

    // Two triggers feeding the same node: S executes exactly once, during
    // the first trigger's sweep. Its context therefore reflects only t1,
    // which pins the first-arrival semantics rather than a fan-in barrier.
    let model = stream(
        vec![trigger("t1"), trigger("t2"), action("s")],
        vec![synapse("s1", "t1", "s"), synapse("s2", "t2", "s")],
    );

    let run = engine.build_run(&model).unwrap();
    engine.start_run(run.clone()).unwrap();
    wait_complete(&run);

    let logs = run.logs();
    let order: Vec<&str> = logs.iter().map(|l| l.nexus_id.as_str()).collect();
    assert_eq!(order, vec!["t1", "s", "t2"]);

    let s_output = logs.iter().find(|l| l.nexus_id == "s").unwrap().output_data.clone().unwrap();
    assert!(s_output.contains_key("t1"));
    assert!(!s_output.contains_key("t2"));

    engine.shutdown();
}

#[test]
fn test_cycle_executes_each_node_once() {
    let engine = EngineBuilder::new().async_worker_thread_number(2).build().unwrap();
    engine.launch();

    // T -> A -> B -> A: the visited set breaks the cycle.
    let model = stream(
        vec![trigger("t"), action("a"), action("b")],
        vec![synapse("s1", "t", "a"), synapse("s2", "a", "b"), synapse("s3", "b", "a")],
    );

    let run = engine.build_run(&model).unwrap();
    engine.start_run(run.clone()).unwrap();
    wait_complete(&run);

    let order: Vec<String> = run.logs().iter().map(|l| l.nexus_id.clone()).collect();
    assert_eq!(order, vec!["t", "a", "b"]);

    engine.shutdown();
}

#[test]
fn test_diamond_join_executes_once() {
    let engine = EngineBuilder::new().async_worker_thread_number(2).build().unwrap();
    engine.launch();

    let model = stream(
        vec![trigger("t"), action("a"), action("b"), action("c")],
        vec![
            synapse("s1", "t", "a"),
            synapse("s2", "t", "b"),
            synapse("s3", "a", "c"),
            synapse("s4", "b", "c"),
        ],
    );

    let run = engine.build_run(&model).unwrap();
    engine.start_run(run.clone()).unwrap();
    wait_complete(&run);

    let order: Vec<String> = run.logs().iter().map(|l| l.nexus_id.clone()).collect();
    assert_eq!(order, vec!["t", "a", "b", "c"]);

    engine.shutdown();
}

#[test]
fn test_single_flight_guard() {
    let engine = EngineBuilder::new().async_worker_thread_number(2).build().unwrap();
    engine.launch();

    let mut slow = nexus("slow", NexusKind::Action, NexusSubtype::Delay);
    slow.config = serde_json::json!({"delay_ms": 300});

    let model = stream(vec![trigger("t"), slow], vec![synapse("s1", "t", "slow")]);

    let first = engine.build_run(&model).unwrap();
    engine.start_run(first.clone()).unwrap();
    assert!(engine.is_run_active());

    let second = engine.build_run(&model).unwrap();
    let err = engine.start_run(second).unwrap_err();
    assert!(matches!(err, StreamError::Engine(_)));

    wait_complete(&first);

    // A finished run releases the guard.
    let third = engine.build_run(&model).unwrap();
    engine.start_run(third.clone()).unwrap();
    wait_complete(&third);

    engine.shutdown();
}

#[test]
fn test_node_timeout_resolves_to_error() {
    let engine = EngineBuilder::new()
        .async_worker_thread_number(2)
        .register_capability(Arc::new(HangingCapability))
        .build()
        .unwrap();
    engine.launch();

    let mut hung = nexus("hung", NexusKind::Action, NexusSubtype::Agent);
    hung.timeout = Some(50);

    let model = stream(
        vec![trigger("t"), hung, action("b")],
        vec![synapse("s1", "t", "hung"), synapse("s2", "hung", "b")],
    );

    let run = engine.build_run(&model).unwrap();
    engine.start_run(run.clone()).unwrap();
    wait_complete(&run);

    let records = run.records();
    assert_eq!(records["hung"].status, NexusStatus::Error);
    assert_eq!(records["hung"].last_output, Some(serde_json::Value::String("Timeout".to_string())));
    assert_eq!(records["b"].status, NexusStatus::Idle);

    engine.shutdown();
}

#[test]
fn test_status_transitions_are_monotonic_and_ordered() {
    let engine = EngineBuilder::new().async_worker_thread_number(2).build().unwrap();
    engine.launch();

    let model = stream(vec![trigger("t"), action("a")], vec![synapse("s1", "t", "a")]);

    let run = engine.build_run(&model).unwrap();

    let seen: Arc<Mutex<Vec<(String, String)>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    ChannelEvent::channel(engine.channel(), ChannelOptions::with_rid(run.id().to_string())).on_event(move |e| {
        if let GraphEvent::Nexus(event) = &e.event {
            sink.lock().unwrap().push((e.nid.clone(), event.str().to_string()));
        }
    });

    engine.start_run(run.clone()).unwrap();
    wait_complete(&run);

    let seen = seen.lock().unwrap().clone();
    for nid in ["t", "a"] {
        let transitions: Vec<&str> = seen.iter().filter(|(n, _)| n == nid).map(|(_, s)| s.as_str()).collect();
        assert_eq!(transitions, vec!["Running", "Succeeded"], "nexus {}", nid);
    }

    // Upstream settles before downstream starts.
    let t_done = seen.iter().position(|(n, s)| n == "t" && s == "Succeeded").unwrap();
    let a_started = seen.iter().position(|(n, s)| n == "a" && s == "Running").unwrap();
    assert!(t_done < a_started);

    engine.shutdown();
}

#[test]
fn test_context_visibility_downstream() {
    let engine = EngineBuilder::new().async_worker_thread_number(2).build().unwrap();
    engine.launch();

    let mut data = nexus("data", NexusKind::Action, NexusSubtype::StaticData);
    data.config = serde_json::json!({"content": "{\"x\": 1}"});

    // T -> data -> logger: the logger sees every output produced before it.
    let model = stream(
        vec![trigger("t"), data, action("log")],
        vec![synapse("s1", "t", "data"), synapse("s2", "data", "log")],
    );

    let run = engine.build_run(&model).unwrap();
    engine.start_run(run.clone()).unwrap();
    wait_complete(&run);

    let records = run.records();
    let log_output = records["log"].last_output.clone().unwrap();
    let upstream: Vars = Vars::from(log_output);
    assert!(upstream.contains_key("t"));
    let data_vars: Vars = upstream.get("data").unwrap();
    assert_eq!(data_vars.get::<i64>("x"), Some(1));

    engine.shutdown();
}

#[test]
fn test_unknown_subtype_is_logged_no_op() {
    let engine = EngineBuilder::new().async_worker_thread_number(2).build().unwrap();
    engine.launch();

    // Email has no registered capability; the visit succeeds with empty
    // output and the branch continues.
    let model = stream(
        vec![trigger("t"), nexus("mail", NexusKind::Action, NexusSubtype::Email), action("b")],
        vec![synapse("s1", "t", "mail"), synapse("s2", "mail", "b")],
    );

    let run = engine.build_run(&model).unwrap();
    engine.start_run(run.clone()).unwrap();
    wait_complete(&run);

    let records = run.records();
    assert_eq!(records["mail"].status, NexusStatus::Success);
    assert_eq!(records["mail"].last_output, Some(serde_json::json!({})));
    assert_eq!(records["b"].status, NexusStatus::Success);

    engine.shutdown();
}

#[test]
fn test_abort_cancels_traversal() {
    let engine = EngineBuilder::new().async_worker_thread_number(2).build().unwrap();
    engine.launch();

    let mut slow = nexus("slow", NexusKind::Action, NexusSubtype::Delay);
    slow.config = serde_json::json!({"delay_ms": 10_000});

    let model = stream(
        vec![trigger("t"), slow, action("b")],
        vec![synapse("s1", "t", "slow"), synapse("s2", "slow", "b")],
    );

    let run = engine.build_run(&model).unwrap();
    let rid = engine.start_run(run.clone()).unwrap();

    std::thread::sleep(Duration::from_millis(100));
    engine.stop(&rid).unwrap();
    wait_complete(&run);

    assert_eq!(run.records()["b"].status, NexusStatus::Idle);
    assert!(!engine.is_run_active());

    engine.shutdown();
}

#[test]
fn test_build_run_requires_launched_engine() {
    let engine = EngineBuilder::new().async_worker_thread_number(2).build().unwrap();

    let model = stream(vec![trigger("t")], vec![]);
    let err = engine.build_run(&model).unwrap_err();
    assert!(matches!(err, StreamError::Engine(_)));
}
