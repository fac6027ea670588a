use tokio_util::bytes::{BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::error::{Error, Result};
use crate::message::{Notification, Request};

/// Default maximum length of a message line, in bytes.
pub const MAX_LINE_LENGTH: usize = 16 * 1024 * 1024;

/// Line-oriented codec of the debugger protocol.
#[derive(Debug)]
pub struct MessageCodec {
    /// ID of the message whose payload line is expected next.
    pending_id: Option<i32>,

    /// Index of the next byte to scan for a line terminator.
    next_index: usize,

    /// Maximum length of a line, terminator excluded.
    max_length: usize,
}

impl MessageCodec {
    /// Creates a new codec, accepting lines of up to [MAX_LINE_LENGTH]
    /// bytes.
    pub const fn new() -> Self {
        Self::with_max_length(MAX_LINE_LENGTH)
    }

    /// Creates a new codec, accepting lines of up to `max_length` bytes.
    pub const fn with_max_length(max_length: usize) -> Self {
        Self {
            pending_id: None,
            next_index: 0,
            max_length,
        }
    }

    /// Returns the maximum length of a line.
    pub const fn max_length(&self) -> usize {
        self.max_length
    }

    /// Splits the next complete line off `src`, without its line terminator.
    fn next_line(&mut self, src: &mut BytesMut) -> Result<Option<BytesMut>> {
        // a terminator may follow a line of exactly `max_length` bytes
        let read_to = src.len().min(self.max_length.saturating_add(1));

        let Some(offset) = src[self.next_index..read_to]
            .iter()
            .position(|&b| b == b'\n')
        else {
            if src.len() > self.max_length {
                return Err(Error::LineTooLong {
                    limit: self.max_length,
                });
            }

            self.next_index = read_to;
            return Ok(None);
        };

        let pos = self.next_index + offset;
        self.next_index = 0;

        let mut line = src.split_to(pos + 1);
        line.truncate(pos);

        if line.last() == Some(&b'\r') {
            line.truncate(pos - 1);
        }

        Ok(Some(line))
    }
}

impl Default for MessageCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for MessageCodec {
    type Item = Request;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        while let Some(line) = self.next_line(src)? {
            match self.pending_id.take() {
                Some(code) => return Request::decode(code, &line).map(Some),
                None => {
                    let header = String::from_utf8_lossy(&line);
                    let header = header.trim();

                    if header.is_empty() {
                        continue;
                    }

                    let code = header
                        .parse()
                        .map_err(|_| Error::BadHeader(header.to_owned()))?;

                    self.pending_id = Some(code);
                }
            }
        }

        Ok(None)
    }
}

impl Encoder<Notification> for MessageCodec {
    type Error = Error;

    fn encode(&mut self, item: Notification, dst: &mut BytesMut) -> Result<()> {
        let header = item.id().code().to_string();
        let payload = item.to_json()?;

        dst.reserve(header.len() + payload.len() + 2);
        dst.put_slice(header.as_bytes());
        dst.put_u8(b'\n');
        dst.put_slice(&payload);
        dst.put_u8(b'\n');

        Ok(())
    }
}
