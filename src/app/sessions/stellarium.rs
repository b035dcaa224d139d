use crate::adapters::http::ActuationQueue;
use crate::core::actuation::{plan_positioning, Positioning};
use crate::core::codec::{
    encode_position_frame, now_micros, GotoFrame, GOTO_FRAME_LEN, POSITION_FRAME_LEN,
};
use crate::core::store::{merge, MountStore};
use crate::domain::model::{AnglePosition, AstronomicalPosition, Axis, AxisIds};
use crate::lx200::Command;
use crate::utils::error::Result;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// One Stellarium telescope-control connection.
///
/// Inbound bytes are cut into fixed 20-byte goto frames regardless of how the
/// TCP stream splits them; each complete frame gets one position frame back.
/// A trailing partial frame is kept until more bytes arrive and dropped when
/// the client disconnects.
pub struct StellariumSession {
    store: MountStore,
    axes: AxisIds,
    actuation: ActuationQueue,
    pending: Vec<u8>,
}

impl StellariumSession {
    pub fn new(store: MountStore, axes: AxisIds, actuation: ActuationQueue) -> Self {
        Self {
            store,
            axes,
            actuation,
            pending: Vec::with_capacity(GOTO_FRAME_LEN),
        }
    }

    /// Handles one decoded goto and returns the position frame to send.
    pub fn handle_frame(&mut self, frame: &[u8; GOTO_FRAME_LEN]) -> [u8; POSITION_FRAME_LEN] {
        let goto = GotoFrame::decode(frame);
        tracing::debug!(
            "Goto: RA {}  DEC {}",
            goto.right_ascension,
            goto.declination
        );

        let set_ra = Command::SetTargetRightAscension(goto.right_ascension);
        let set_dec = Command::SetTargetDeclination(goto.declination);
        // 兩個目標一次寫入，讀者不會看到半套
        let mut patch = serde_json::Value::Object(Default::default());
        for command in [set_ra, set_dec] {
            if let Some(partial) = command.store_patch() {
                merge(&mut patch, partial);
            }
        }
        self.store.update(patch);

        self.actuation
            .submit(plan_positioning(Positioning::Goto, &self.store, &self.axes));

        let current_ra: AstronomicalPosition = self
            .store
            .get_as(Axis::RightAscension.current_path())
            .unwrap_or_default();
        let current_dec: AnglePosition = self
            .store
            .get_as(Axis::Declination.current_path())
            .unwrap_or_default();
        tracing::debug!(
            "Sent current position: RA {}  DEC {}",
            current_ra,
            current_dec
        );

        encode_position_frame(&current_ra, &current_dec, now_micros())
    }

    /// Buffers `data` and returns one position frame per complete goto frame.
    pub fn handle_bytes(&mut self, data: &[u8]) -> Vec<u8> {
        self.pending.extend_from_slice(data);

        let mut output = Vec::new();
        while self.pending.len() >= GOTO_FRAME_LEN {
            let mut frame = [0u8; GOTO_FRAME_LEN];
            frame.copy_from_slice(&self.pending[..GOTO_FRAME_LEN]);
            self.pending.drain(..GOTO_FRAME_LEN);
            output.extend_from_slice(&self.handle_frame(&frame));
        }
        output
    }

    pub async fn run<S>(mut self, mut stream: S) -> Result<()>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let mut buffer = [0u8; 256];
        loop {
            let read = stream.read(&mut buffer).await?;
            if read == 0 {
                if !self.pending.is_empty() {
                    tracing::warn!(
                        "Dropping {} byte(s) of incomplete goto frame",
                        self.pending.len()
                    );
                }
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
