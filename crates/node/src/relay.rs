//! Fire-and-forget announcement of transaction sets to peers.

use std::net::SocketAddr;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Sender, TrySendError};
use rivd_consensus::constants::RELAY_TRANSACTION_SET;
use rivd_log::{log_debug, log_trace, log_warn};
use rivd_primitives::hash256_to_hex;

use crate::txpool::TransactionSetId;

/// Outbound half of the peer network.
pub trait Gateway: Send + Sync + 'static {
    fn peers(&self) -> Vec<SocketAddr>;

    fn broadcast(&self, kind: &str, payload: &[u8], peers: &[SocketAddr]) -> Result<(), String>;
}

pub struct RelayJob {
    pub set_id: TransactionSetId,
    /// Encoded transaction set.
    pub payload: Vec<u8>,
}

/// Worker threads draining a bounded job queue into [`Gateway::broadcast`].
///
/// Dropping the relay closes the queue and joins the workers after they have
/// sent every job already queued.
pub struct Relay {
    sender: Option<Sender<RelayJob>>,
    handles: Vec<JoinHandle<()>>,
}

impl Relay {
    pub fn spawn<G: Gateway>(gateway: Arc<G>, workers: usize, queue: usize) -> Self {
        let (sender, receiver) = bounded::<RelayJob>(queue.max(1));
        let mut handles = Vec::new();
        for index in 0..workers.max(1) {
            let receiver = receiver.clone();
            let gateway = Arc::clone(&gateway);
            let spawned = thread::Builder::new()
                .name(format!("relay-{index}"))
                .spawn(move || {
                    while let Ok(job) = receiver.recv() {
                        let peers = gateway.peers();
                        if peers.is_empty() {
                            log_trace!(
                                "no peers to relay transaction set {}",
                                hash256_to_hex(&job.set_id)
                            );
                            continue;
                        }
                        if let Err(err) =
                            gateway.broadcast(RELAY_TRANSACTION_SET, &job.payload, &peers)
                        {
                            log_warn!(
                                "relay of transaction set {} failed: {err}",
                                hash256_to_hex(&job.set_id)
                            );
                        }
                    }
                });
            match spawned {
                Ok(handle) => handles.push(handle),
                Err(err) => log_warn!("failed to spawn relay worker {index}: {err}"),
            }
        }
        Self {
            sender: Some(sender),
            handles,
        }
    }

    /// Queues `job` without blocking. Returns false when it was dropped.
    pub fn submit(&self, job: RelayJob) -> bool {
        let Some(sender) = self.sender.as_ref() else {
            return false;
        };
        if self.handles.is_empty() {
            return false;
        }
        match sender.try_send(job) {
            Ok(()) => true,
            Err(TrySendError::Full(job)) => {
                log_warn!(
                    "relay queue full; dropping transaction set {}",
                    hash256_to_hex(&job.set_id)
                );
                false
            }
            Err(TrySendError::Disconnected(job)) => {
                log_debug!(
                    "relay stopped; dropping transaction set {}",
                    hash256_to_hex(&job.set_id)
                );
                false
            }
        }
    }

    pub fn queued(&self) -> usize {
        self.sender.as_ref().map(Sender::len).unwrap_or(0)
    }

    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        self.sender.take();
        for handle in self.handles.drain(..) {
            let _ = handle.join();
        }
    }
}

impl Drop for Relay {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingGateway {
        sent: Mutex<Vec<(String, Vec<u8>, usize)>>,
    }

    impl Gateway for RecordingGateway {
        fn peers(&self) -> Vec<SocketAddr> {
            vec![SocketAddr::from(([127, 0, 0, 1], 23112))]
        }

        fn broadcast(&self, kind: &str, payload: &[u8], peers: &[SocketAddr]) -> Result<(), String> {
            self.sent
                .lock()
                .push((kind.to_string(), payload.to_vec(), peers.len()));
            Ok(())
        }
    }

    #[test]
    fn queued_jobs_are_sent_before_shutdown_returns() {
        let gateway = Arc::new(RecordingGateway::default());
        let relay = Relay::spawn(Arc::clone(&gateway), 2, 8);
        for tag in 0..4u8 {
            assert!(relay.submit(RelayJob {
                set_id: [tag; 32],
                payload: vec![tag],
            }));
        }
        relay.shutdown();
        let sent = gateway.sent.lock();
        assert_eq!(sent.len(), 4);
        assert!(sent
            .iter()
            .all(|(kind, _, peers)| kind == RELAY_TRANSACTION_SET && *peers == 1));
    }

    struct PeerlessGateway;

    impl Gateway for PeerlessGateway {
        fn peers(&self) -> Vec<SocketAddr> {
            Vec::new()
        }

        fn broadcast(&self, _kind: &str, _payload: &[u8], _peers: &[SocketAddr]) -> Result<(), String> {
            Err("no peers were offered".to_string())
        }
    }

    #[test]
    fn job_without_peers_is_skipped_with_a_trace() {
        rivd_log::init(rivd_log::LogConfig {
            level: rivd_log::Level::Trace,
            ..rivd_log::LogConfig::default()
        });
        rivd_log::set_stderr_enabled(false);
        rivd_log::enable_capture(64);

        let relay = Relay::spawn(Arc::new(PeerlessGateway), 1, 4);
        assert!(relay.submit(RelayJob {
            set_id: [9u8; 32],
            payload: vec![9],
        }));
        relay.shutdown();

        let set_hex = hash256_to_hex(&[9u8; 32]);
        let logs = rivd_log::capture_snapshot(64);
        assert!(logs
            .iter()
            .any(|record| record.level == rivd_log::Level::Trace && record.msg.contains(&set_hex)));
        assert!(!logs
            .iter()
            .any(|record| record.level == rivd_log::Level::Warn && record.msg.contains(&set_hex)));
    }
}
