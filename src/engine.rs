use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::{Condvar, Mutex};
use tracing::{debug, trace};

use crate::config::LayoutConfig;
use crate::graph::vertex::{ConnectorId, NodeId};
use crate::incremental::{DiagramMutation, IncrementalLayoutCalculator, LayoutAction};

/// Receives each batch's reconciled layout actions, typically to animate
/// on-screen shapes. Called from the engine's worker thread.
pub trait LayoutActionSink: Send {
    fn apply(&mut self, actions: Vec<LayoutAction>);
}

impl<F: FnMut(Vec<LayoutAction>) + Send> LayoutActionSink for F {
    fn apply(&mut self, actions: Vec<LayoutAction>) {
        self(actions)
    }
}

struct Shared {
    queue: Mutex<VecDeque<DiagramMutation>>,
    signal: Condvar,
    shutdown: AtomicBool,
}

/// Producer/consumer front of the pipeline: `enqueue` may be called from
/// any thread and never blocks beyond a brief queue lock; a dedicated
/// worker coalesces bursts of mutations into one batch, runs the
/// incremental calculator, collapses redundant per-shape actions, and
/// hands the result to the sink.
///
/// All graph and layout state lives on the worker thread; mutations are
/// applied strictly in enqueue order. Dropping the engine flushes: the
/// worker drains and processes whatever is still queued before exiting,
/// so every mutation is handled exactly once.
pub struct IncrementalLayoutEngine {
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
}

impl IncrementalLayoutEngine {
    pub fn new(config: LayoutConfig, sink: impl LayoutActionSink + 'static) -> Self {
        let shared = Arc::new(Shared {
            queue: Mutex::new(VecDeque::new()),
            signal: Condvar::new(),
            shutdown: AtomicBool::new(false),
        });
        let worker_shared = Arc::clone(&shared);
        let worker = thread::Builder::new()
            .name("layout-engine".into())
            .spawn(move || worker_loop(worker_shared, config, sink))
            .expect("failed to spawn layout worker");
        Self {
            shared,
            worker: Some(worker),
        }
    }

    pub fn enqueue(&self, mutation: DiagramMutation) {
        let mut queue = self.shared.queue.lock();
        queue.push_back(mutation);
        drop(queue);
        self.shared.signal.notify_one();
    }
}

impl Drop for IncrementalLayoutEngine {
    fn drop(&mut self) {
        self.shared.shutdown.store(true, Ordering::SeqCst);
        self.shared.signal.notify_all();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

fn worker_loop(shared: Arc<Shared>, config: LayoutConfig, mut sink: impl LayoutActionSink) {
    let mut calculator = IncrementalLayoutCalculator::new(config.clone());
    let park = Duration::from_millis(config.park_timeout_ms);
    let window = Duration::from_millis(config.coalesce_window_ms);

    loop {
        let mut queue = shared.queue.lock();
        while queue.is_empty() && !shared.shutdown.load(Ordering::SeqCst) {
            shared.signal.wait_for(&mut queue, park);
        }
        if queue.is_empty() {
            break; // shutdown with nothing left to flush
        }

        // Keep waiting while the burst is still growing; on shutdown take
        // whatever is there immediately.
        while !shared.shutdown.load(Ordering::SeqCst) {
            let before = queue.len();
            drop(queue);
            thread::sleep(window);
            queue = shared.queue.lock();
            if queue.len() == before {
                break;
            }
            trace!(pending = queue.len(), "burst still growing");
        }

        let batch: Vec<DiagramMutation> = queue.drain(..).collect();
        drop(queue);
        debug!(batch = batch.len(), "processing mutation batch");

        // Contract violations are host defects; fail fast rather than
        // continue with a layout that no longer matches the diagram.
        let actions = calculator
            .calculate_layout_actions(&batch)
            .unwrap_or_else(|e| panic!("diagram mutation contract violated: {e}"));
        let actions = coalesce_actions(actions);
        if !actions.is_empty() {
            sink.apply(actions);
        }
    }
}

#[derive(PartialEq, Eq, PartialOrd, Ord)]
enum ShapeKey {
    Move(NodeId),
    Reroute(ConnectorId),
}

/// Collapses superseding actions per target shape, keeping the last state:
/// consecutive moves of one node fold into a single move from the first
/// old position to the final new one, likewise reroutes; a `Clear` wipes
/// everything queued before it.
pub fn coalesce_actions(actions: Vec<LayoutAction>) -> Vec<LayoutAction> {
    let mut result: Vec<LayoutAction> = Vec::with_capacity(actions.len());
    let mut slot: BTreeMap<ShapeKey, usize> = BTreeMap::new();
    for action in actions {
        match action {
            LayoutAction::Clear => {
                result.clear();
                slot.clear();
                result.push(LayoutAction::Clear);
            }
            LayoutAction::MoveNode {
                node,
                old_center,
                new_center,
            } => match slot.get(&ShapeKey::Move(node)) {
                Some(&i) => {
                    if let LayoutAction::MoveNode {
                        old_center: first_old,
                        ..
                    } = result[i]
                    {
                        result[i] = LayoutAction::MoveNode {
                            node,
                            old_center: first_old,
                            new_center,
                        };
                    }
                }
                None => {
                    slot.insert(ShapeKey::Move(node), result.len());
                    result.push(LayoutAction::MoveNode {
                        node,
                        old_center,
                        new_center,
                    });
                }
            },
            LayoutAction::RerouteConnector {
                connector,
                old_route,
                new_route,
            } => match slot.get(&ShapeKey::Reroute(connector)) {
                Some(&i) => {
                    if let LayoutAction::RerouteConnector {
                        old_route: first_old,
                        ..
                    } = std::mem::replace(&mut result[i], LayoutAction::Clear)
                    {
                        result[i] = LayoutAction::RerouteConnector {
                            connector,
                            old_route: first_old,
                            new_route,
                        };
                    }
                }
                None => {
                    slot.insert(ShapeKey::Reroute(connector), result.len());
                    result.push(LayoutAction::RerouteConnector {
                        connector,
                        old_route,
                        new_route,
                    });
                }
            },
            other => result.push(other),
        }
    }
    result
}
