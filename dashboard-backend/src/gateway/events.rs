use crate::gateway::protocol::GatewayEvent;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Max number of recent events kept for replay on connect
const EVENT_BUFFER_SIZE: usize = 200;

/// Per-client queue depth; a client that falls this far behind loses events
const CLIENT_QUEUE_SIZE: usize = 256;

type Clients = Arc<DashMap<String, mpsc::Sender<GatewayEvent>>>;

/// Fans events out to every connected WebSocket client.
///
/// `broadcast()` never blocks: events go onto an unbounded channel and a
/// background task buffers them and delivers them to each client in order.
pub struct EventBroadcaster {
    event_tx: mpsc::UnboundedSender<GatewayEvent>,
    clients: Clients,
    recent_events: Arc<Mutex<VecDeque<GatewayEvent>>>,
}

impl EventBroadcaster {
    pub fn new() -> Self {
        let clients: Clients = Arc::new(DashMap::new());
        let recent_events = Arc::new(Mutex::new(VecDeque::with_capacity(EVENT_BUFFER_SIZE)));
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        tokio::spawn(Self::run_loop(event_rx, clients.clone(), recent_events.clone()));

        Self {
            event_tx,
            clients,
            recent_events,
        }
    }

    /// Subscribe a new client and return (client_id, receiver).
    pub fn subscribe(&self) -> (String, mpsc::Receiver<GatewayEvent>) {
        let client_id = Uuid::new_v4().to_string();
        let (tx, rx) = mpsc::channel(CLIENT_QUEUE_SIZE);
        self.clients.insert(client_id.clone(), tx);
        log::debug!("[GATEWAY] Client {} subscribed", client_id);
        (client_id, rx)
    }

    pub fn unsubscribe(&self, client_id: &str) {
        self.clients.remove(client_id);
        log::debug!("[GATEWAY] Client {} unsubscribed", client_id);
    }

    /// Snapshot of buffered events, oldest first
    pub fn get_recent_events(&self) -> Vec<GatewayEvent> {
        self.recent_events.lock().iter().cloned().collect()
    }

    pub fn broadcast(&self, event: GatewayEvent) {
        let _ = self.event_tx.send(event);
    }

    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    async fn run_loop(
        mut event_rx: mpsc::UnboundedReceiver<GatewayEvent>,
        clients: Clients,
        recent_events: Arc<Mutex<VecDeque<GatewayEvent>>>,
    ) {
        while let Some(event) = event_rx.recv().await {
            {
                let mut buffer = recent_events.lock();
                if buffer.len() >= EVENT_BUFFER_SIZE {
                    buffer.pop_front();
                }
                buffer.push_back(event.clone());
            }

            if event.event != "tx.status" {
                log::info!("[GATEWAY] '{}' to {} client(s)", event.event, clients.len());
            }

            let mut closed = Vec::new();
            for entry in clients.iter() {
                match entry.value().try_send(event.clone()) {
                    Ok(()) => {}
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        log::warn!(
                            "[GATEWAY] Queue full for client {}, dropping '{}'",
                            entry.key(),
                            event.event
                        );
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => closed.push(entry.key().clone()),
                }
            }
            for client_id in closed {
                clients.remove(&client_id);
                log::debug!("[GATEWAY] Removed disconnected client {}", client_id);
            }
        }

        log::info!("[GATEWAY] Broadcast loop shutting down");
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}
