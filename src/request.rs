use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::Result;
use crossbeam_channel::{bounded, unbounded, Receiver, Sender, TryRecvError};
use serde::Serialize;

use crate::waveform::ControlPoint;

/// Everything the panel ever tells the controller. All four are PUTs with the
/// payload carried in the query string; responses are ignored.
#[derive(Clone, Debug, PartialEq)]
pub enum ControllerRequest {
    Joystick { x: f64, y: f64 },
    Schedule(Vec<ControlPoint>),
    Stop,
    Watchdog { timestamp_ms: u64 },
}

#[derive(Serialize)]
struct JoystickVector {
    x: f64,
    y: f64,
}

impl ControllerRequest {
    pub fn endpoint(&self) -> &'static str {
        match self {
            ControllerRequest::Joystick { .. } => "get-joystick",
            ControllerRequest::Schedule(_) => "get-schedule",
            ControllerRequest::Stop => "stop",
            ControllerRequest::Watchdog { .. } => "watchdog",
        }
    }

    /// Query parameter as `(name, JSON value)`, unescaped.
    pub fn query(&self) -> Option<(&'static str, String)> {
        let encoded = match self {
            ControllerRequest::Joystick { x, y } => {
                ("joystick", serde_json::to_string(&JoystickVector { x: *x, y: *y }))
            }
            ControllerRequest::Schedule(points) => ("points", serde_json::to_string(points)),
            ControllerRequest::Stop => return None,
            ControllerRequest::Watchdog { timestamp_ms } => {
                ("timestamp_ms", serde_json::to_string(timestamp_ms))
            }
        };
        match encoded {
            (name, Ok(value)) => Some((name, value)),
            (name, Err(e)) => {
                log::error!("Failed to encode {} parameter: {}", name, e);
                None
            }
        }
    }
}

/// Outbound side of the panel. Implementations must not block the caller
/// on the network and never report failures back.
pub trait Transport: Send + Sync {
    fn send(&self, request: ControllerRequest);
}

const SHUTDOWN_WAIT: Duration = Duration::from_secs(2);

enum Outbound {
    Request(ControllerRequest),
    Close,
}

/// Fire-and-forget HTTP transport backed by one worker thread.
///
/// User commands go through a FIFO that never drops and is always drained
/// first. Watchdog beats are coalesced: only the newest one waits to be sent.
pub struct HttpTransport {
    commands: Sender<Outbound>,
    latest_beat: Arc<Mutex<Option<ControllerRequest>>>,
    wake: Sender<()>,
    backlog_warn: usize,
    done: Receiver<()>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

fn put(agent: &ureq::Agent, base_url: &str, request: &ControllerRequest) {
    let url = format!("{}/{}", base_url, request.endpoint());
    let mut call = agent.request("PUT", &url);
    if let Some((name, value)) = request.query() {
        call = call.query(name, &value);
    }
    match call.call() {
        Ok(_) => {}
        Err(ureq::Error::Status(code, _)) => {
            log::debug!("PUT {} answered {}", url, code);
        }
        Err(e) => {
            log::debug!("PUT {} failed: {}", url, e);
        }
    }
}

fn take_beat(slot: &Mutex<Option<ControllerRequest>>) -> Option<ControllerRequest> {
    slot.lock().ok().and_then(|mut beat| beat.take())
}

impl HttpTransport {
    /// `backlog_warn` is the number of queued commands past which a warning is logged.
    pub fn new(base_url: &str, backlog_warn: usize) -> Result<Self> {
        let base_url = base_url.trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            anyhow::bail!("Controller URL must start with http:// or https://: {}", base_url);
        }
        let (commands, command_rx) = unbounded::<Outbound>();
        let (wake, wake_rx) = bounded::<()>(1);
        let (done_tx, done) = bounded::<()>(1);
        let latest_beat: Arc<Mutex<Option<ControllerRequest>>> = Arc::default();
        let agent = ureq::AgentBuilder::new().build();

        let slot = latest_beat.clone();
        let worker = thread::Builder::new()
            .name("controller-http".to_string())
            .spawn(move || {
                loop {
                    match command_rx.try_recv() {
                        Ok(Outbound::Request(request)) => {
                            put(&agent, &base_url, &request);
                            continue;
                        }
                        Ok(Outbound::Close) | Err(TryRecvError::Disconnected) => break,
                        Err(TryRecvError::Empty) => {}
                    }
                    if let Some(beat) = take_beat(&slot) {
                        put(&agent, &base_url, &beat);
                        continue;
                    }
                    crossbeam_channel::select! {
                        recv(command_rx) -> outbound => match outbound {
                            Ok(Outbound::Request(request)) => put(&agent, &base_url, &request),
                            Ok(Outbound::Close) | Err(_) => break,
                        },
                        recv(wake_rx) -> _ => {}
                    }
                }
                log::debug!("Controller transport closed");
                let _ = done_tx.send(());
            })?;

        Ok(Self {
            commands,
            latest_beat,
            wake,
            backlog_warn: backlog_warn.max(1),
            done,
            worker: Mutex::new(Some(worker)),
        })
    }

    /// Flushes queued commands and stops the worker, waiting at most `wait`.
    /// Beats still pending are discarded. Calling it again does nothing.
    pub fn shutdown(&self, wait: Duration) {
        let worker = match self.worker.lock().ok().and_then(|mut w| w.take()) {
            Some(worker) => worker,
            None => return,
        };
        let _ = self.commands.send(Outbound::Close);
        match self.done.recv_timeout(wait) {
            Ok(()) => {
                if worker.join().is_err() {
                    log::warn!("Controller transport worker panicked");
                }
            }
            Err(_) => {
                log::warn!("Controller did not drain {} queued requests in time", self.commands.len());
            }
        }
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: ControllerRequest) {
        if let ControllerRequest::Watchdog { .. } = request {
            if let Ok(mut beat) = self.latest_beat.lock() {
                *beat = Some(request);
            }
            let _ = self.wake.try_send(());
            return;
        }
        let queued = self.commands.len();
        if queued >= self.backlog_warn {
            log::warn!("{} requests waiting for the controller", queued);
        }
        if self.commands.send(Outbound::Request(request)).is_err() {
            log::warn!("Controller transport is gone");
        }
    }
}

impl Drop for HttpTransport {
    fn drop(&mut self) {
        self.shutdown(SHUTDOWN_WAIT);
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints() {
        assert_eq!(ControllerRequest::Joystick { x: 0.0, y: 0.0 }.endpoint(), "get-joystick");
        assert_eq!(ControllerRequest::Schedule(vec![]).endpoint(), "get-schedule");
        assert_eq!(ControllerRequest::Stop.endpoint(), "stop");
        assert_eq!(ControllerRequest::Watchdog { timestamp_ms: 0 }.endpoint(), "watchdog");
    }

    #[test]
    fn joystick_query_is_json_vector() {
        let req = ControllerRequest::Joystick { x: 0.5, y: -0.25 };
        assert_eq!(req.query(), Some(("joystick", r#"{"x":0.5,"y":-0.25}"#.to_string())));
    }

    #[test]
    fn schedule_query_carries_all_points() {
        let req = ControllerRequest::Schedule(vec![
            ControlPoint { id: 1, x: 0.0, y: 10.0 },
            ControlPoint { id: 2, x: 4.5, y: 80.0 },
        ]);
        assert_eq!(
            req.query(),
            Some((
                "points",
                r#"[{"id":1,"x":0.0,"y":10.0},{"id":2,"x":4.5,"y":80.0}]"#.to_string()
            ))
        );
    }

    #[test]
    fn watchdog_query_is_integer() {
        let req = ControllerRequest::Watchdog { timestamp_ms: 300 };
        assert_eq!(req.query(), Some(("timestamp_ms", "300".to_string())));
    }

    #[test]
    fn stop_has_no_query() {
        assert_eq!(ControllerRequest::Stop.query(), None);
    }

    #[test]
    fn rejects_non_http_url() {
        assert!(HttpTransport::new("192.168.10.1", 4).is_err());
    }
}
