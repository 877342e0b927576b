use std::{collections::HashMap, time::Duration};
use tracing::{error, warn};
use uuid::Uuid;

use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::{self, Instant},
};

use crate::actors::{Actor, ActorType, ControlMessage};

/// Restarts registered actors when their heartbeat goes quiet. Each running
/// actor instance is tracked by its Uuid so a late heartbeat from an already
/// replaced instance cannot resurrect a stale entry.
pub struct Supervisor {
    factories: HashMap<ActorType, Box<dyn Fn() -> Box<dyn Actor> + Send + Sync>>,
    kinds: HashMap<Uuid, ActorType>,
    pulses: HashMap<Uuid, Instant>,
    handles: HashMap<Uuid, JoinHandle<()>>,
}

impl Supervisor {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
            kinds: HashMap::new(),
            pulses: HashMap::new(),
            handles: HashMap::new(),
        }
    }

    pub fn register_actor(
        &mut self,
        actor_type: ActorType,
        factory: Box<dyn Fn() -> Box<dyn Actor> + Send + Sync>,
    ) {
        self.factories.insert(actor_type, factory);
    }

    pub async fn start(&mut self) {
        let mut check_interval = time::interval(Duration::from_secs(1));
        let timeout_duration = Duration::from_secs(3);

        let (supervisor_tx, mut supervisor_rx) = mpsc::channel::<ControlMessage>(512);

        let kinds: Vec<ActorType> = self.factories.keys().copied().collect();
        for kind in kinds {
            self.spawn_actor(kind, supervisor_tx.clone());
        }

        loop {
            tokio::select! {
                Some(msg) = supervisor_rx.recv() => {
                    match msg {
                        ControlMessage::Heartbeat(id) => {
                            if let Some(pulse) = self.pulses.get_mut(&id) {
                                *pulse = Instant::now();
                            }
                        }
                        ControlMessage::Shutdown(id) => {
                            if let Some(kind) = self.kinds.remove(&id) {
                                warn!("{:?} is shutting down gracefully.", kind);
                            }
                            self.pulses.remove(&id);
                            if let Some(handle) = self.handles.remove(&id) {
                                handle.abort();
                            }
                        }
                        ControlMessage::Error(id, error_msg) => {
                            let kind = self.kinds.get(&id);
                            error!("Actor {:?} reported error: {}", kind, error_msg);
                            self.pulses.insert(id, Instant::now());
                        }
                    }
                }

                _ = check_interval.tick() => {
                    let dead_timeout = Instant::now() - timeout_duration;

                    let dead: Vec<Uuid> = self
                        .pulses
                        .iter()
                        .filter(|&(_, &pulse)| pulse < dead_timeout)
                        .map(|(&id, _)| id)
                        .collect();

                    for id in dead {
                        let kind = match self.kinds.remove(&id) {
                            Some(kind) => kind,
                            None => continue,
                        };
                        warn!("{:?} is unresponsive, restarting", kind);
                        self.pulses.remove(&id);
                        if let Some(handle) = self.handles.remove(&id) {
                            handle.abort();
                        }
                        self.spawn_actor(kind, supervisor_tx.clone());
                    }
                }
            }
        }
    }

    fn spawn_actor(&mut self, actor_type: ActorType, tx: mpsc::Sender<ControlMessage>) {
        let mut actor = self.factories[&actor_type]();
        let id = actor.id();
        let handle = tokio::spawn(async move {
            if let Err(e) = actor.run(tx).await {
                error!("Actor {:?} crashed: {}", actor_type, e);
            }
        });
        self.kinds.insert(id, actor_type);
        self.handles.insert(id, handle);
        self.pulses.insert(id, Instant::now());
    }
}
