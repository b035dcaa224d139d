use crate::adapters::http::ActuationQueue;
use crate::core::actuation::Intent;
use crate::core::store::MountStore;
use crate::domain::model::AxisIds;
use crate::lx200::{Parser, Response};
use crate::utils::error::Result;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

const READ_BUFFER_SIZE: usize = 1024;

/// One LX200 client connection.
pub struct Lx200Session {
    store: MountStore,
    axes: AxisIds,
    actuation: ActuationQueue,
    parser: Parser,
}

impl Lx200Session {
    pub fn new(store: MountStore, axes: AxisIds, actuation: ActuationQueue) -> Self {
        Self {
            store,
            axes,
            actuation,
            parser: Parser::new(),
        }
    }

    /// Feeds one inbound chunk and returns the bytes to write back.
    pub fn handle_bytes(&mut self, data: &[u8]) -> Vec<u8> {
        self.parser.feed(data);
        tracing::debug!("<< {}", String::from_utf8_lossy(data));

        let mut output = Vec::new();
        while let Some(command) = self.parser.next_command() {
            command.commit(&self.store);

            let mut response = Response::for_command(&command);

            if let Some(intent) = Intent::for_command(&command) {
                let calls = intent.plan(&self.store, &self.axes);
                tracing::debug!("{:?} -> {} axis call(s)", command, calls.len());
                self.actuation.submit(calls);
            }

            response.fill(&self.store);

            let serialized = response.to_string();
            tracing::debug!(">> {:?}", response);
            tracing::debug!(">> {}", serialized);
            output.extend_from_slice(serialized.as_bytes());
        }
        output
    }

    pub async fn run<S>(mut self, mut stream: S) -> Result<()>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let mut buffer = [0u8; READ_BUFFER_SIZE];
        loop {
            let read = stream.read(&mut buffer).await?;
            if read == 0 {
                return Ok(());
            }

            let reply = self.handle_bytes(&buffer[..read]);
            if !reply.is_empty() {
                stream.write_all(&reply).await?;
                stream.flush().await?;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::actuation::AxisCall;
    use serde_json::json;
    use tokio::sync::mpsc;

    fn session() -> (Lx200Session, MountStore, mpsc::Receiver<AxisCall>) {
        let store = MountStore::new();
        let (queue, receiver) = ActuationQueue::channel(16);
        (
            Lx200Session::new(store.clone(), AxisIds::default(), queue),
            store,
            receiver,
        )
    }

    fn drain(receiver: &mut mpsc::Receiver<AxisCall>) -> Vec<AxisCall> {
        std::iter::from_fn(|| receiver.try_recv().ok()).collect()
    }

    #[test]
    fn test_set_target_then_goto() {
        let (mut session, store, mut receiver) = session();

        let reply = session.handle_bytes(b":Sr 06:00:00#:Sd -10*00:00#:MS#");
        assert_eq!(reply, b"110");
        assert!(store.contains("mount.target.right_ascension"));

        let calls = drain(&mut receiver);
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].path(), "/api/devices/RA/goto/astronomical");
        assert_eq!(
            calls[0].body,
            Some(json!({"hours": 6.0, "minutes": 0.0, "seconds": 0.0}))
        );
        assert_eq!(calls[1].path(), "/api/devices/DEC/goto/angle");
    }

    #[test]
    fn test_goto_without_dec_target_sends_ra_only() {
        let (mut session, _store, mut receiver) = session();

        session.handle_bytes(b":Sr 01:02:03#:MA#");
        let calls = drain(&mut receiver);
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].axis_id, "RA");
    }

    #[test]
    fn test_directional_halt_is_run_speed() {
        let (mut session, _store, mut receiver) = session();

        let reply = session.handle_bytes(b":Qe#:Qn#");
        assert!(reply.is_empty());
        assert_eq!(
            drain(&mut receiver),
            vec![AxisCall::halt_axis_slew("RA"), AxisCall::halt_axis_slew("DEC")]
        );
    }

    #[test]
    fn test_rate_change_applies_to_following_move() {
        let (mut session, _store, mut receiver) = session();

        session.handle_bytes(b":RC#:Mw#");
        let calls = drain(&mut receiver);
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0].body,
            Some(json!({"degrees": 0, "minutes": 0, "seconds": -30}))
        );
    }

    #[test]
    fn test_query_reflects_feedback_state() {
        let (mut session, store, mut receiver) = session();
        store.set(
            "mount.right_ascension",
            json!({"hours": 12.0, "minutes": 30.0, "seconds": 0.0}),
        );

        assert_eq!(session.handle_bytes(b":GR#"), b"12:30.0#");
        assert_eq!(session.handle_bytes(b":U#:GR#"), b"12:30:00#");
        assert!(drain(&mut receiver).is_empty());
    }

    #[tokio::test]
    async fn test_run_over_mock_stream() {
        let (session, _store, _receiver) = session();
        let stream = tokio_test::io::Builder::new()
            .read(b"\x06")
            .write(b"P")
            .read(b":Sd +45*30#")
            .write(b"1")
            .read(b":Gd#")
            .write(b"+45*30#")
            .build();

        session.run(stream).await.unwrap();
    }
}
