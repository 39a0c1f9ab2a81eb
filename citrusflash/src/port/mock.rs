//! Scripted port for unit tests.

use {
    crate::{error::Result, port::Port},
    std::{
        collections::VecDeque,
        io::{Read, Write},
        time::Duration,
    },
};

/// One scripted answer to a read.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Reply {
    /// The device sends this byte.
    Byte(u8),
    /// The read returns zero bytes.
    Silence,
    /// The read fails with `ErrorKind::TimedOut`, as `serialport` does.
    TimedOut,
}

/// Mock serial port with separate read script and write log.
///
/// An exhausted script behaves like a dead link.
pub(crate) struct MockPort {
    pub(crate) replies: VecDeque<Reply>,
    pub(crate) writes: Vec<Vec<u8>>,
    pub(crate) cleared: usize,
    pub(crate) closed: bool,
}

impl MockPort {
    pub(crate) fn new(replies: impl IntoIterator<Item = Reply>) -> Self {
        Self {
            replies: replies
                .into_iter()
                .collect(),
            writes: Vec::new(),
            cleared: 0,
            closed: false,
        }
    }

    /// A port that answers every frame with the same byte.
    pub(crate) fn answering(byte: u8, count: usize) -> Self {
        Self::new(std::iter::repeat_n(Reply::Byte(byte), count))
    }
}

impl Read for MockPort {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        match self
            .replies
            .pop_front()
        {
            Some(Reply::Byte(b)) => {
                buf[0] = b;
                Ok(1)
            },
            Some(Reply::Silence) => Ok(0),
            Some(Reply::TimedOut) | None => Err(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                "no data",
            )),
        }
    }
}

impl Write for MockPort {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writes
            .push(buf.to_vec());
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl Port for MockPort {
    fn timeout(&self) -> Duration {
        Duration::from_millis(10)
    }

    fn baud_rate(&self) -> u32 {
        921_600
    }

    fn clear_buffers(&mut self) -> Result<()> {
        self.cleared += 1;
        Ok(())
    }

    fn name(&self) -> &str {
        "mock"
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}
