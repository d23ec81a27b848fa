use protocol::{Command, Notification};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

use crate::gate::ReadyGate;
use crate::Error;

/// Time between two commands, gives the hub time to act.
pub const TIME_BETWEEN_ACTIONS: Duration = Duration::from_millis(100);

/// Raw write access to the hub, e.g. a GATT characteristic.
#[allow(async_fn_in_trait)]
pub trait CommandWriter {
    async fn write(&mut self, payload: &[u8]) -> Result<(), Error>;
}

/// Handles a notification from the hub.
pub fn handle_notification(gate: &ReadyGate, data: &[u8]) {
    match Notification::parse(data) {
        Notification::Ready => gate.signal(),
        Notification::Stdout(payload) => {
            info!("Received: {}", String::from_utf8_lossy(payload))
        }
        Notification::Other(data) => debug!("Ignoring notification {data:02x?}"),
    }
}

/// The only way to send commands to the hub. Every send waits for the hub
/// to be ready and takes the ready state before writing.
pub struct GatedLink<W> {
    gate: Arc<ReadyGate>,
    writer: W,
    pause: Duration,
    ready_timeout: Option<Duration>,
}

impl<W: CommandWriter> GatedLink<W> {
    pub fn new(gate: Arc<ReadyGate>, writer: W) -> Self {
        GatedLink {
            gate,
            writer,
            pause: TIME_BETWEEN_ACTIONS,
            ready_timeout: None,
        }
    }

    pub fn with_pause(mut self, pause: Duration) -> Self {
        self.pause = pause;
        self
    }

    /// Give up when the hub does not get ready in time. Waits forever if
    /// `None`.
    pub fn with_ready_timeout(mut self, ready_timeout: Option<Duration>) -> Self {
        self.ready_timeout = ready_timeout;
        self
    }

    pub fn gate(&self) -> &ReadyGate {
        &self.gate
    }

    #[cfg(test)]
    pub(crate) fn writer(&self) -> &W {
        &self.writer
    }

    pub async fn send(&mut self, cmd: Command) -> Result<(), Error> {
        let frame = cmd.encode()?;

        match self.ready_timeout {
            Some(limit) => timeout(limit, acquire(&self.gate))
                .await
                .map_err(|_| Error::ReadyTimeout(limit))?,
            None => acquire(&self.gate).await,
        }

        self.writer.write(&frame.to_stdin()).await?;
        info!("Send: {cmd}");

        sleep(self.pause).await;
        Ok(())
    }
}

/// Waits for the ready state and takes it. Never returns without having
/// taken it, even if another sender got there first.
async fn acquire(gate: &ReadyGate) {
    loop {
        gate.await_ready().await;
        if gate.consume() {
            return;
        }
        warn!("Ready state was taken by another sender, waiting again");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Collects written payloads. Does not answer with ready.
    #[derive(Default)]
    struct Sink(Vec<Vec<u8>>);

    impl CommandWriter for Sink {
        async fn write(&mut self, payload: &[u8]) -> Result<(), Error> {
            self.0.push(payload.to_vec());
            Ok(())
        }
    }

    fn link() -> GatedLink<Sink> {
        GatedLink::new(Arc::new(ReadyGate::new()), Sink::default()).with_pause(Duration::ZERO)
    }

    #[tokio::test]
    async fn test_send_consumes_ready() {
        let mut link = link();
        link.gate().signal();

        link.send(Command::Forward).await.unwrap();
        assert_eq!(link.writer.0, [vec![0x06, b'f', b'w', b'd']]);
        assert!(!link.gate().is_ready());
    }

    #[tokio::test]
    async fn test_send_waits_for_ready() {
        let mut link = link();
        let pending = timeout(Duration::from_millis(20), link.send(Command::Stop)).await;
        assert!(pending.is_err());
        assert!(link.writer.0.is_empty());

        link.gate().signal();
        link.send(Command::Stop).await.unwrap();
        assert_eq!(link.writer.0, [b"\x06stp".to_vec()]);
    }

    #[tokio::test]
    async fn test_ready_timeout() {
        let mut link = link().with_ready_timeout(Some(Duration::from_millis(10)));
        let result = link.send(Command::Reverse).await;
        assert!(matches!(result, Err(Error::ReadyTimeout(_))));
        assert!(link.writer.0.is_empty());
    }

    #[tokio::test]
    async fn test_send_unknown() {
        let mut link = link();
        link.gate().signal();

        let result = link.send(Command::Unknown).await;
        assert!(matches!(
            result,
            Err(Error::Protocol(protocol::Error::InvalidArgument(
                Command::Unknown
            )))
        ));
        // nothing sent, still ready
        assert!(link.writer.0.is_empty());
        assert!(link.gate().is_ready());
    }

    #[tokio::test]
    async fn test_one_ready_one_send() {
        let gate = Arc::new(ReadyGate::new());
        let mut first = GatedLink::new(gate.clone(), Sink::default()).with_pause(Duration::ZERO);
        let mut second = GatedLink::new(gate.clone(), Sink::default())
            .with_pause(Duration::ZERO)
            .with_ready_timeout(Some(Duration::from_millis(20)));

        gate.signal();
        first.send(Command::Forward).await.unwrap();
        let result = second.send(Command::Reverse).await;
        assert!(matches!(result, Err(Error::ReadyTimeout(_))));
        assert!(second.writer.0.is_empty());

        gate.signal();
        second.send(Command::Reverse).await.unwrap();
        assert_eq!(second.writer.0, [b"\x06rev".to_vec()]);
        assert_eq!(first.writer.0.len(), 1);
        assert!(!gate.is_ready());
    }

    #[test]
    fn test_notifications() {
        let gate = ReadyGate::new();

        handle_notification(&gate, b"\x01hello");
        handle_notification(&gate, b"rdy");
        handle_notification(&gate, b"\x02rdy");
        assert!(!gate.is_ready());

        handle_notification(&gate, b"\x01rdy");
        assert!(gate.is_ready());
    }
}
