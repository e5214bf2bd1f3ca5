// tests/watch_controller.rs

mod common;
use crate::common::{Project, init_tracing};

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::timeout;

use assetpipe::engine::{CoreRuntime, Runtime, RuntimeEvent, RuntimeOptions, TriggerReason};
use assetpipe::exec::PipelineExecutor;
use assetpipe::fs::RealFileSystem;
use assetpipe::server::{ReloadHub, ReloadMessage, forward_completions};
use assetpipe::watch::{WatchController, WatchState};

const WATCHED: &str = r#"
[config]
port = 0
debounce_ms = 200

[task.html-task]
src = "src/index.html"

[task.css-task]
src = "src/sass/style.scss"
dest = "assets/css"

[[watch]]
patterns = ["src/*.html"]
tasks = ["html-task"]

[[watch]]
patterns = ["src/sass/**/*.scss"]
tasks = ["css-task"]
"#;

async fn next_trigger(rx: &mut mpsc::Receiver<RuntimeEvent>) -> (String, TriggerReason) {
    let event = timeout(Duration::from_secs(10), rx.recv())
        .await
        .expect("no trigger within 10s")
        .expect("watcher channel closed");
    match event {
        RuntimeEvent::TaskTriggered { task, reason } => (task, reason),
        other => panic!("unexpected event: {other:?}"),
    }
}

#[tokio::test]
async fn source_change_triggers_mapped_task() {
    init_tracing();
    let project = Project::new(WATCHED);
    project.write("src/index.html", "<p>1</p>");
    project.write("src/sass/style.scss", "a { color: red; }");

    let mut controller =
        WatchController::from_config(&project.config(), project.root(), Arc::new(RealFileSystem))
            .unwrap();
    assert_eq!(controller.state(), WatchState::Idle);
    assert_eq!(controller.watch_dir(), project.path("src"));

    let (tx, mut rx) = mpsc::channel(16);
    controller.start(tx.clone()).unwrap();
    assert_eq!(controller.state(), WatchState::Watching);
    assert!(controller.start(tx).is_err());

    // Give the OS watcher a moment to arm.
    tokio::time::sleep(Duration::from_millis(200)).await;
    project.write("src/sass/_vars.scss", "$c: blue;");

    let (task, reason) = next_trigger(&mut rx).await;
    assert_eq!(task, "css-task");
    assert_eq!(reason, TriggerReason::FileWatch);

    controller.stop();
    assert_eq!(controller.state(), WatchState::Idle);
}

#[tokio::test]
async fn bursts_are_debounced_per_task() {
    init_tracing();
    let project = Project::new(WATCHED);
    project.write("src/index.html", "<p>1</p>");

    let mut controller =
        WatchController::from_config(&project.config(), project.root(), Arc::new(RealFileSystem))
            .unwrap();
    let (tx, mut rx) = mpsc::channel(16);
    controller.start(tx).unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;

    for i in 0..5 {
        project.write("src/index.html", format!("<p>{i}</p>"));
    }

    let (task, _) = next_trigger(&mut rx).await;
    assert_eq!(task, "html-task");

    // Nothing else arrives once the burst has been folded into one trigger.
    let extra = timeout(Duration::from_millis(500), rx.recv()).await;
    assert!(extra.is_err(), "unexpected extra trigger: {extra:?}");
}

const LIVE: &str = r#"
[config]
port = 0
debounce_ms = 100

[task.html-task]
src = "src/index.html"

[task.style-task]
src = "src/css/*.css"
dest = "assets/css"
reload = "styles"

[[watch]]
patterns = ["src/*.html"]
tasks = ["html-task"]

[[watch]]
patterns = ["src/css/*.css"]
tasks = ["style-task"]
"#;

#[tokio::test]
async fn source_edits_rebuild_output_and_notify_clients() {
    init_tracing();
    let project = Project::new(LIVE);
    project.write("src/index.html", "<p>1</p>");
    project.write("src/css/site.css", "a{color:red}");

    let cfg = project.config();
    let orchestrator = Arc::new(project.orchestrator());
    let hub = Arc::new(ReloadHub::new());
    let mut client = hub.subscribe();
    let _forwarder = forward_completions(orchestrator.subscribe(), hub.clone());

    let (rt_tx, rt_rx) = mpsc::channel(64);
    let mut controller =
        WatchController::from_config(&cfg, project.root(), Arc::new(RealFileSystem)).unwrap();
    controller.start(rt_tx.clone()).unwrap();

    let names: Vec<String> = orchestrator.registry().names().map(str::to_string).collect();
    let core = CoreRuntime::new(names, RuntimeOptions::default());
    let executor = PipelineExecutor::new(orchestrator.clone(), rt_tx.clone());
    let runtime = tokio::spawn(Runtime::new(core, rt_rx, executor).run());

    tokio::time::sleep(Duration::from_millis(200)).await;
    project.write("src/index.html", "<p>2</p>");

    let message = timeout(Duration::from_secs(10), client.recv())
        .await
        .expect("no reload within 10s")
        .unwrap();
    assert_eq!(message, ReloadMessage::Reload);
    let html = std::fs::read_to_string(project.path("dist/index.html")).unwrap();
    assert_eq!(html, "<p>2</p>");

    project.write("src/css/site.css", "a{color:blue}");

    // A late duplicate event for the page may still be in flight.
    let message = timeout(Duration::from_secs(10), async {
        loop {
            match client.recv().await.unwrap() {
                ReloadMessage::Reload => continue,
                css => break css,
            }
        }
    })
    .await
    .expect("no stylesheet refresh within 10s");
    assert_eq!(
        message,
        ReloadMessage::Css {
            paths: vec!["/assets/css/site.css".to_string()]
        }
    );
    let css = std::fs::read_to_string(project.path("dist/assets/css/site.css")).unwrap();
    assert_eq!(css, "a{color:blue}");

    controller.stop();
    rt_tx.send(RuntimeEvent::ShutdownRequested).await.unwrap();
    timeout(Duration::from_secs(10), runtime)
        .await
        .expect("runtime did not stop")
        .unwrap()
        .unwrap();
}
