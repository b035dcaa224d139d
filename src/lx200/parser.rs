use crate::lx200::commands::Command;
use std::collections::VecDeque;

const ACK: char = '\u{6}';
/// 超過此長度仍未見到 `#` 的 frame 直接丟棄
const MAX_FRAME_LEN: usize = 64;

/// Incremental LX200 parser: feed raw bytes, drain complete commands in
/// arrival order.
#[derive(Debug, Default)]
pub struct Parser {
    buffer: String,
    output: VecDeque<Command>,
}

impl Parser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, data: &[u8]) {
        // Latin-1 decoding keeps 0xDF (degree mark) intact.
        self.buffer.extend(data.iter().map(|&b| b as char));
        self.scan();
    }

    pub fn next_command(&mut self) -> Option<Command> {
        self.output.pop_front()
    }

    pub fn pending(&self) -> usize {
        self.output.len()
    }

    fn scan(&mut self) {
        loop {
            match self.buffer.find([':', ACK]) {
                Some(start) => {
                    self.buffer.drain(..start);
                }
                None => {
                    self.buffer.clear();
                    return;
                }
            }

            if self.buffer.starts_with(ACK) {
                self.buffer.drain(..ACK.len_utf8());
                self.output.push_back(Command::AlignmentQuery);
                continue;
            }

            match self.buffer.find('#') {
                Some(end) => {
                    let command = Command::parse(&self.buffer[1..end]);
                    self.buffer.drain(..=end);
                    self.output.push_back(command);
                }
                None => {
                    if self.buffer.len() > MAX_FRAME_LEN {
                        tracing::warn!("Discarding unterminated LX200 frame: {:?}", self.buffer);
                        self.buffer.clear();
                    }
                    return;
                }
            }
        }
    }
}
