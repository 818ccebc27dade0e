use std::fmt::Debug;
use tokio::sync::{broadcast, mpsc, Mutex, RwLock};

// Notifier lets the session tasks know that the server is shutting down, and lets the server
// wait until they are done.
#[derive(Debug)]
pub struct Notifier {
    shutdown_tx: RwLock<Option<broadcast::Sender<()>>>,
    shutdown_complete_tx: RwLock<Option<mpsc::Sender<()>>>,
    shutdown_complete_rx: Mutex<mpsc::Receiver<()>>,
}

impl Notifier {
    pub fn new() -> Notifier {
        let (shutdown_tx, _) = broadcast::channel(1);
        let (shutdown_complete_tx, shutdown_complete_rx) = mpsc::channel(1);
        Notifier {
            shutdown_tx: RwLock::new(Some(shutdown_tx)),
            shutdown_complete_tx: RwLock::new(Some(shutdown_complete_tx)),
            shutdown_complete_rx: Mutex::new(shutdown_complete_rx),
        }
    }

    // Tells all subscribed listeners that shutdown is commencing. Dropping the broadcast sender
    // wakes every subscriber; dropping the completion sender lets linger() finish once the last
    // listener is gone.
    pub async fn notify(&self) {
        drop(self.shutdown_tx.write().await.take());
        drop(self.shutdown_complete_tx.write().await.take());
    }

    // Waits for the tasks holding listeners to finish. When the last listener drops its cloned
    // completion sender the channel closes and recv() returns None.
    pub async fn linger(&self) {
        let _ = self.shutdown_complete_rx.lock().await.recv().await;
    }

    pub async fn subscribe(&self) -> Listener {
        let sender_opt = self.shutdown_tx.read().await;
        let complete_sender_opt = self.shutdown_complete_tx.read().await;
        Listener {
            shutdown: sender_opt.is_none(),
            shutdown_rx: sender_opt.as_ref().map(|tx| tx.subscribe()),
            shutdown_complete_tx: complete_sender_opt.clone(),
        }
    }
}

// Listener notices shutdown notifications; its mere existence delays the end of linger().
#[derive(Debug)]
#[allow(dead_code)]
pub struct Listener {
    shutdown: bool,
    shutdown_rx: Option<broadcast::Receiver<()>>,
    shutdown_complete_tx: Option<mpsc::Sender<()>>,
}

impl Listener {
    /// Waits for the shutdown notice. Returns immediately if it already arrived.
    pub async fn listen(&mut self) {
        if self.shutdown {
            return;
        }
        if let Some(rx) = self.shutdown_rx.as_mut() {
            // Cannot receive a "lag error" as only one value is ever sent.
            let _ = rx.recv().await;
        }
        self.shutdown = true;
    }
}
