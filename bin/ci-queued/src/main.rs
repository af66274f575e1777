mod args;
mod config;
mod demo;

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use ci_queue::{InMemoryResourceController, Queue, StaticEnvironment, Ticker};
use ci_queue_api::{Executor, NodeMode, NodeRole, Task};
use clap::Parser;
use rand::Rng;
use tracing::info;

use args::{Args, Settings};
use demo::{DemoExecutor, DemoNode, DemoTask};

type DemoQueue = Queue<DemoTask, DemoNode, InMemoryResourceController<DemoTask>, StaticEnvironment<DemoTask>>;

fn main() -> anyhow::Result<()> {
    let settings = Args::parse().resolve()?;
    ci_queue_log::init(settings.log_format)?;

    info!(?settings, "starting ci-queued demo harness");

    let environment = StaticEnvironment::new(settings.agents);
    let resources = InMemoryResourceController::new();
    let queue = Arc::new(Queue::new(resources, environment));

    let restored = queue.load_from(&settings.persistence_path);
    info!(restored, "restored pending tasks from persistence");

    let ticker = Ticker::spawn(queue.clone(), settings.tick_period);

    let nodes = build_nodes(&settings);
    spawn_executors(&queue, &nodes, settings.executors_per_node);

    let producer = spawn_producer(queue.clone(), settings.default_quiet_period);

    match settings.run_for {
        Some(run_for) => {
            thread::sleep(run_for);
            info!("run duration elapsed, shutting down");
        }
        None => loop {
            thread::sleep(Duration::from_secs(60));
        },
    }

    drop(producer);
    queue.save(&settings.persistence_path)?;
    ticker.shutdown();

    Ok(())
}

/// One controller plus `settings.agents` agent nodes, matching the
/// controller/agent split the offload heuristic in `ci_queue::choose`
/// reasons about.
fn build_nodes(settings: &Settings) -> Vec<DemoNode> {
    let mut nodes = vec![DemoNode::new("controller", NodeMode::Normal, NodeRole::Controller)];
    for i in 0..settings.agents {
        let mut node = DemoNode::new(format!("agent-{i}"), NodeMode::Normal, NodeRole::Agent);
        if i == 0 {
            node = node.with_labels(vec!["linux".to_string()]);
        }
        nodes.push(node);
    }
    nodes
}

fn spawn_executors(queue: &Arc<DemoQueue>, nodes: &[DemoNode], executors_per_node: usize) {
    for node in nodes {
        for slot in 0..executors_per_node {
            let queue = queue.clone();
            let executor = DemoExecutor::new(node.clone(), slot as u64);
            thread::Builder::new()
                .name(format!("executor-{}", executor.id()))
                .spawn(move || run_executor(&queue, executor))
                .expect("failed to spawn executor thread");
        }
    }
}

fn run_executor(queue: &DemoQueue, executor: DemoExecutor) {
    loop {
        let task = queue.pop(&executor);
        let started = Instant::now();
        info!(task = task.name(), executor = executor.id(), "dispatched");

        let run_time = task.estimated_duration().unwrap_or(Duration::from_millis(200));
        thread::sleep(run_time.min(Duration::from_secs(2)));

        info!(
            task = task.name(),
            executor = executor.id(),
            elapsed_ms = started.elapsed().as_millis(),
            "finished"
        );
    }
}

/// Adds a new demo task every couple of seconds, occasionally re-triggering
/// an existing one to exercise quiet-period coalescing.
fn spawn_producer(queue: Arc<DemoQueue>, default_quiet_period: Duration) -> thread::JoinHandle<()> {
    thread::Builder::new()
        .name("producer".into())
        .spawn(move || {
            let mut next_id = 0u64;
            loop {
                thread::sleep(Duration::from_secs(2));

                let mut rng = rand::thread_rng();
                let id = next_id;
                next_id += 1;

                let mut task = DemoTask::new(id, format!("task-{id}")).with_quiet_period(default_quiet_period);
                if rng.gen_bool(0.2) {
                    task = task.with_label("linux");
                }
                if rng.gen_bool(0.1) {
                    task = task.with_estimated_duration(Duration::from_secs(20 * 60));
                }

                queue.environment().register(task.clone());
                if queue.add(task.clone()) {
                    info!(task = task.name(), "scheduled new task");
                }
            }
        })
        .expect("failed to spawn producer thread")
}
