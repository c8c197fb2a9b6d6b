use super::{Chunks, ChunksError};

#[derive(Debug, PartialEq, Eq)]
pub enum Error {
    ChunksError(ChunksError),
    InvalidPayload,
}

/// A type for reading server-sent events from a chunk stream.
///
/// Only the `data` field is surfaced. Multi-line data is joined with
/// `\n`, comments and the `event`/`id`/`retry` fields are skipped.
pub struct Sse {
    // Raw bytes, so a multi-byte character split across two chunks is
    // decoded only once the whole event has arrived.
    buf: Vec<u8>,
    chunks: Chunks,
    exhausted: bool,
}

impl Sse {
    #[inline]
    pub fn new(chunks: Chunks) -> Self {
        Self {
            buf: Vec::new(),
            chunks,
            exhausted: false,
        }
    }

    pub async fn next_event(&mut self) -> Result<Option<String>, Error> {
        loop {
            // Drain complete events already buffered before reading more.
            while let Some(block) = self.take_block() {
                if let Some(data) = parse_block(&block)? {
                    return Ok(Some(data));
                }
            }
            if self.exhausted {
                return Ok(None);
            }

            match self.chunks.next_chunk().await.map_err(Error::ChunksError)? {
                Some(bytes) => {
                    // Only `\n` is treated as end-of-line below.
                    self.buf.extend(bytes.iter().filter(|b| **b != b'\r'));
                }
                None => {
                    // A trailing event without the blank line is dropped,
                    // same as browsers do.
                    self.exhausted = true;
                }
            }
        }
    }

    fn take_block(&mut self) -> Option<Vec<u8>> {
        let eol_idx = self.buf.windows(2).position(|w| w == b"\n\n")?;
        let block = self.buf[..eol_idx].to_vec();
        self.buf.drain(..eol_idx + 2);
        Some(block)
    }
}

// event         = *( comment / field ) end-of-line
// comment       = colon *any-char end-of-line
// field         = 1*name-char [ colon [ space ] *any-char ] end-of-line
fn parse_block(block: &[u8]) -> Result<Option<String>, Error> {
    let Ok(block) = std::str::from_utf8(block) else {
        return Err(Error::InvalidPayload);
    };

    let mut data: Option<String> = None;
    for line in block.split('\n') {
        if line.is_empty() || line.starts_with(':') {
            continue;
        }
        let (name, value) = match line.split_once(':') {
            Some((name, value)) => {
                (name, value.strip_prefix(' ').unwrap_or(value))
            }
            None => (line, ""),
        };
        match name {
            "data" => match &mut data {
                Some(data) => {
                    data.push('\n');
                    data.push_str(value);
                }
                None => data = Some(value.to_owned()),
            },
            "event" | "id" | "retry" => {}
            _ => return Err(Error::InvalidPayload),
        }
    }
    Ok(data)
}
