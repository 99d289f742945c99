//! Scripted transport doubles for unit tests.
//!
//! A [`Script`] is shared (via `Arc`) between the test and every
//! connection the [`ScriptedConnector`] hands out, so the test can queue
//! answers up front and inspect what was sent and closed afterwards.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use authlink_protocol::{Codec, Envelope, JsonCodec, Message};
use authlink_transport::{Connection, ConnectionId, Connector, TransportError};

type Inbound = Result<Option<Vec<u8>>, TransportError>;

#[derive(Default)]
pub(crate) struct Script {
    connects: AtomicU32,
    refuse_connect: AtomicBool,
    hang_connect: AtomicBool,
    send_calls: AtomicU32,
    send_failures: AtomicU32,
    hang_send: AtomicBool,
    max_frame_len: AtomicUsize,
    sent: Mutex<Vec<Vec<u8>>>,
    recv_calls: AtomicU32,
    inbox: Mutex<VecDeque<Inbound>>,
    closes: AtomicU32,
    fail_close: AtomicBool,
}

impl Script {
    /// Queues `message` as the next inbound frame.
    pub(crate) fn answer(&self, message: Message) {
        let frame = JsonCodec
            .encode(&Envelope::new(message))
            .expect("test message encodes");
        self.push_raw(frame);
    }

    pub(crate) fn push_raw(&self, frame: Vec<u8>) {
        self.inbox.lock().unwrap().push_back(Ok(Some(frame)));
    }

    pub(crate) fn push_eof(&self) {
        self.inbox.lock().unwrap().push_back(Ok(None));
    }

    pub(crate) fn push_recv_error(&self) {
        let err = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "scripted");
        self.inbox
            .lock()
            .unwrap()
            .push_back(Err(TransportError::ReceiveFailed(err)));
    }

    /// The next `n` sends fail with a broken pipe.
    pub(crate) fn fail_sends(&self, n: u32) {
        self.send_failures.store(n, Ordering::SeqCst);
    }

    pub(crate) fn hang_sends(&self) {
        self.hang_send.store(true, Ordering::SeqCst);
    }

    /// Sends of frames longer than `max` bytes fail with `FrameTooLarge`.
    pub(crate) fn limit_frames(&self, max: usize) {
        self.max_frame_len.store(max, Ordering::SeqCst);
    }

    pub(crate) fn refuse_connects(&self) {
        self.refuse_connect.store(true, Ordering::SeqCst);
    }

    pub(crate) fn hang_connects(&self) {
        self.hang_connect.store(true, Ordering::SeqCst);
    }

    pub(crate) fn fail_closes(&self) {
        self.fail_close.store(true, Ordering::SeqCst);
    }

    pub(crate) fn connects(&self) -> u32 {
        self.connects.load(Ordering::SeqCst)
    }

    pub(crate) fn send_calls(&self) -> u32 {
        self.send_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn recv_calls(&self) -> u32 {
        self.recv_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn closes(&self) -> u32 {
        self.closes.load(Ordering::SeqCst)
    }

    /// Every successfully sent frame, decoded.
    pub(crate) fn sent_messages(&self) -> Vec<Message> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|frame| {
                let envelope: Envelope = JsonCodec.decode(frame).expect("sent frame decodes");
                envelope.message
            })
            .collect()
    }
}

pub(crate) struct ScriptedConnector(Arc<Script>);

impl ScriptedConnector {
    pub(crate) fn new(script: Arc<Script>) -> Self {
        Self(script)
    }
}

impl Connector for ScriptedConnector {
    type Connection = ScriptedConnection;

    async fn connect(
        &self,
        address: &str,
        port: u16,
    ) -> Result<Self::Connection, TransportError> {
        self.0.connects.fetch_add(1, Ordering::SeqCst);
        if self.0.hang_connect.load(Ordering::SeqCst) {
            return std::future::pending().await;
        }
        if self.0.refuse_connect.load(Ordering::SeqCst) {
            return Err(TransportError::ConnectFailed {
                addr: format!("{address}:{port}"),
                source: std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "scripted"),
            });
        }
        Ok(ScriptedConnection {
            id: ConnectionId::next(),
            script: Arc::clone(&self.0),
        })
    }
}

pub(crate) struct ScriptedConnection {
    id: ConnectionId,
    script: Arc<Script>,
}

impl Connection for ScriptedConnection {
    async fn send(&self, data: &[u8]) -> Result<(), TransportError> {
        self.script.send_calls.fetch_add(1, Ordering::SeqCst);
        if self.script.hang_send.load(Ordering::SeqCst) {
            return std::future::pending().await;
        }
        let max = self.script.max_frame_len.load(Ordering::SeqCst);
        if max > 0 && data.len() > max {
            return Err(TransportError::FrameTooLarge {
                len: data.len(),
                max,
            });
        }
        let fail = self
            .script
            .send_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if fail {
            let err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "scripted");
            return Err(TransportError::SendFailed(err));
        }
        self.script.sent.lock().unwrap().push(data.to_vec());
        Ok(())
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, TransportError> {
        self.script.recv_calls.fetch_add(1, Ordering::SeqCst);
        let next = self.script.inbox.lock().unwrap().pop_front();
        match next {
            Some(inbound) => inbound,
            None => std::future::pending().await,
        }
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.script.closes.fetch_add(1, Ordering::SeqCst);
        if self.script.fail_close.load(Ordering::SeqCst) {
            return Err(TransportError::ConnectionClosed("scripted close failure".into()));
        }
        Ok(())
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}
