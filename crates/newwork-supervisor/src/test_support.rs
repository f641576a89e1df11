use crate::supervisor::BackendControl;
use async_trait::async_trait;
use newwork_types::{NewworkError, NewworkResult, ProcessHealth, ProcessStatus};
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

const HEALTHY_BODY: &str = r#"{"status":"healthy","app":"NewWork API","version":"1.0.0"}"#;

/// Minimal HTTP server answering every request with 200 or 503.
pub struct HealthResponder {
    port: u16,
    healthy: Arc<AtomicBool>,
    hits: Arc<AtomicU64>,
    task: JoinHandle<()>,
}

impl HealthResponder {
    pub async fn spawn() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind health responder");
        let port = listener.local_addr().expect("No local addr").port();
        let healthy = Arc::new(AtomicBool::new(true));
        let hits = Arc::new(AtomicU64::new(0));

        let task = {
            let healthy = Arc::clone(&healthy);
            let hits = Arc::clone(&hits);
            tokio::spawn(async move {
                loop {
                    let (mut socket, _) = match listener.accept().await {
                        Ok(conn) => conn,
                        Err(_) => continue,
                    };
                    hits.fetch_add(1, Ordering::Relaxed);
                    let ok = healthy.load(Ordering::Relaxed);

                    tokio::spawn(async move {
                        let mut buf = [0u8; 1024];
                        let _ = socket.read(&mut buf).await;
                        let response = if ok {
                            format!(
                                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                                HEALTHY_BODY.len(),
                                HEALTHY_BODY
                            )
                        } else {
                            "HTTP/1.1 503 Service Unavailable\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
                                .to_string()
                        };
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
            })
        };

        Self {
            port,
            healthy,
            hits,
            task,
        }
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::Relaxed);
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }
}

impl Drop for HealthResponder {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// A port with nothing listening on it.
pub async fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    listener.local_addr().expect("No local addr").port()
}

pub async fn wait_for_status(
    rx: &mut broadcast::Receiver<ProcessHealth>,
    status: ProcessStatus,
) -> ProcessHealth {
    tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            match rx.recv().await {
                Ok(health) if health.status == status => return health,
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => panic!("health channel closed"),
            }
        }
    })
    .await
    .unwrap_or_else(|_| panic!("timed out waiting for {}", status))
}

/// Scripted stand-in for the process supervisor.
pub struct MockBackend {
    health: RwLock<ProcessHealth>,
    tx: broadcast::Sender<ProcessHealth>,
    healthy: AtomicBool,
    fail_start: AtomicBool,
    fail_restart: AtomicBool,
    start_delay: Mutex<Duration>,
    pub starts: AtomicU32,
    pub stops: AtomicU32,
    pub restarts: AtomicU32,
    pub checks: AtomicU32,
    calls: Mutex<Vec<&'static str>>,
}

impl MockBackend {
    pub fn new() -> Arc<Self> {
        let (tx, _) = broadcast::channel(64);
        Arc::new(Self {
            health: RwLock::new(ProcessHealth::with_status(ProcessStatus::Running)),
            tx,
            healthy: AtomicBool::new(true),
            fail_start: AtomicBool::new(false),
            fail_restart: AtomicBool::new(false),
            start_delay: Mutex::new(Duration::ZERO),
            starts: AtomicU32::new(0),
            stops: AtomicU32::new(0),
            restarts: AtomicU32::new(0),
            checks: AtomicU32::new(0),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }

    pub fn set_fail_start(&self, fail: bool) {
        self.fail_start.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_restart(&self, fail: bool) {
        self.fail_restart.store(fail, Ordering::SeqCst);
    }

    pub fn set_start_delay(&self, delay: Duration) {
        *self.start_delay.lock() = delay;
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().clone()
    }

    /// Publishes a health value as if the poll loop observed it.
    pub fn emit(&self, status: ProcessStatus) {
        let next = self.health.read().transition(status);
        *self.health.write() = next.clone();
        let _ = self.tx.send(next);
    }

    fn settle(&self) {
        let status = if self.healthy.load(Ordering::SeqCst) {
            ProcessStatus::Running
        } else {
            ProcessStatus::Starting
        };
        self.emit(status);
    }
}

#[async_trait]
impl BackendControl for MockBackend {
    async fn start(&self) -> NewworkResult<()> {
        self.calls.lock().push("start");
        self.starts.fetch_add(1, Ordering::SeqCst);

        let delay = *self.start_delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if self.fail_start.load(Ordering::SeqCst) {
            self.emit(ProcessStatus::Error);
            return Err(NewworkError::Spawn("mock spawn failure".into()));
        }
        self.settle();
        Ok(())
    }

    async fn stop(&self) -> NewworkResult<()> {
        self.calls.lock().push("stop");
        self.stops.fetch_add(1, Ordering::SeqCst);
        self.emit(ProcessStatus::Stopped);
        Ok(())
    }

    async fn restart_backend(&self) -> NewworkResult<()> {
        self.calls.lock().push("restart");
        self.restarts.fetch_add(1, Ordering::SeqCst);
        self.emit(ProcessStatus::Restarting);

        if self.fail_restart.load(Ordering::SeqCst) {
            self.emit(ProcessStatus::Error);
            return Err(NewworkError::Spawn("mock restart failure".into()));
        }
        self.settle();
        Ok(())
    }

    async fn check_health(&self) -> bool {
        self.checks.fetch_add(1, Ordering::SeqCst);
        self.healthy.load(Ordering::SeqCst)
    }

    fn health(&self) -> ProcessHealth {
        self.health.read().clone()
    }

    fn subscribe(&self) -> broadcast::Receiver<ProcessHealth> {
        self.tx.subscribe()
    }
}
