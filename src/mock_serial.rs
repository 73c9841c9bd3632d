//! We use this mocking module in unit tests to emulate a serial port.
//!
//! Each write to the port is treated as a new request and delivers the next queued reply into
//! the receive buffer. Bytes nobody reads stay there across requests, like on a real port, and
//! reads from an empty buffer time out.

use std::collections::VecDeque;

/// A reply that lands in the receive buffer after `timeouts` reads have timed out.
struct LateReply {
    data: Vec<u8>,
    timeouts: usize,
}

/// Our mock type used to emulate a serial port.
pub struct MockSerial {
    /// Every byte written to the port, across all requests.
    write_buffer: Vec<u8>,
    /// Replies to hand out, one per request.
    replies: VecDeque<LateReply>,
    /// Bytes received and not yet read.
    rx: VecDeque<u8>,
    /// Reply still on its way.
    in_flight: Option<LateReply>,
    /// Flag to simulate write errors
    should_error_on_write: bool,
    /// Flag to simulate read errors
    should_error_on_read: bool,
}

#[derive(Debug)]
pub enum MockSerialError {
    /// Simulated timeout, nothing left to read.
    Timeout,
    /// Generic simulated error for testing
    SimulatedError,
}

impl core::fmt::Display for MockSerialError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            MockSerialError::Timeout => write!(f, "simulated timeout"),
            MockSerialError::SimulatedError => write!(f, "simulated error"),
        }
    }
}

impl core::error::Error for MockSerialError {}

impl embedded_io::Error for MockSerialError {
    fn kind(&self) -> embedded_io::ErrorKind {
        match self {
            MockSerialError::Timeout => embedded_io::ErrorKind::TimedOut,
            MockSerialError::SimulatedError => embedded_io::ErrorKind::Other,
        }
    }
}

impl embedded_io::ErrorType for MockSerial {
    type Error = MockSerialError;
}

impl embedded_io::Write for MockSerial {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        if self.should_error_on_write {
            return Err(MockSerialError::SimulatedError);
        }
        self.write_buffer.extend_from_slice(buf);
        // A reply still in flight from an earlier request arrives now.
        if let Some(late) = self.in_flight.take() {
            self.rx.extend(late.data);
        }
        if let Some(reply) = self.replies.pop_front() {
            if reply.timeouts == 0 {
                self.rx.extend(reply.data);
            } else {
                self.in_flight = Some(reply);
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        if self.should_error_on_write {
            return Err(MockSerialError::SimulatedError);
        }
        Ok(())
    }
}

impl embedded_io::Read for MockSerial {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if self.should_error_on_read {
            return Err(MockSerialError::SimulatedError);
        }

        if self.rx.is_empty() {
            if let Some(mut late) = self.in_flight.take() {
                late.timeouts -= 1;
                if late.timeouts == 0 {
                    self.rx.extend(late.data);
                } else {
                    self.in_flight = Some(late);
                }
            }
            return Err(MockSerialError::Timeout);
        }

        let bytes_to_read = core::cmp::min(buf.len(), self.rx.len());
        for (slot, byte) in buf.iter_mut().zip(self.rx.drain(..bytes_to_read)) {
            *slot = byte;
        }
        Ok(bytes_to_read)
    }
}

impl embedded_io::ReadReady for MockSerial {
    fn read_ready(&mut self) -> Result<bool, Self::Error> {
        if self.should_error_on_read {
            return Err(MockSerialError::SimulatedError);
        }
        Ok(!self.rx.is_empty())
    }
}

impl MockSerial {
    /// Create a new MockSerial instance with no queued replies.
    pub fn new() -> Self {
        Self {
            write_buffer: Vec::new(),
            replies: VecDeque::new(),
            rx: VecDeque::new(),
            in_flight: None,
            should_error_on_write: false,
            should_error_on_read: false,
        }
    }

    /// Queue the bytes the device answers the next request with.
    pub fn queue_reply(&mut self, data: &[u8]) {
        self.queue_late_reply(data, 0);
    }

    /// Queue a reply that only arrives once `timeouts` reads have timed out, or when the next
    /// request is written, whichever comes first.
    pub fn queue_late_reply(&mut self, data: &[u8], timeouts: usize) {
        self.replies.push_back(LateReply {
            data: data.to_vec(),
            timeouts,
        });
    }

    /// Queue a request the device does not answer.
    pub fn queue_silence(&mut self) {
        self.queue_reply(&[]);
    }

    /// Bytes received and not read yet.
    pub fn unread(&self) -> usize {
        self.rx.len()
    }

    /// Get a reference to the data that was written to this mock serial port
    pub fn written_data(&self) -> &[u8] {
        &self.write_buffer
    }

    /// Configure whether write operations should fail with an error
    pub fn set_write_error(&mut self, should_error: bool) {
        self.should_error_on_write = should_error;
    }

    /// Configure whether read operations should fail with an error
    pub fn set_read_error(&mut self, should_error: bool) {
        self.should_error_on_read = should_error;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_io::{Read, ReadReady, Write};

    #[test]
    fn each_write_loads_the_next_reply() {
        let mut mock = MockSerial::new();
        mock.queue_reply(b"first");
        mock.queue_reply(b"second");

        let mut buffer = [0u8; 10];
        mock.write(b"a").unwrap();
        assert_eq!(mock.read(&mut buffer).unwrap(), 5);
        assert_eq!(&buffer[..5], b"first");
        assert!(matches!(mock.read(&mut buffer), Err(MockSerialError::Timeout)));

        mock.write(b"b").unwrap();
        assert_eq!(mock.read(&mut buffer).unwrap(), 6);
        assert_eq!(&buffer[..6], b"second");
        assert_eq!(mock.written_data(), b"ab");
    }

    #[test]
    fn unread_bytes_survive_the_next_request() {
        let mut mock = MockSerial::new();
        mock.queue_reply(b"old");
        mock.queue_reply(b"new");

        mock.write(b"a").unwrap();
        mock.write(b"b").unwrap();
        let mut buffer = [0u8; 8];
        assert_eq!(mock.read(&mut buffer).unwrap(), 6);
        assert_eq!(&buffer[..6], b"oldnew");
    }

    #[test]
    fn late_reply_lands_after_a_timeout() {
        let mut mock = MockSerial::new();
        mock.queue_late_reply(b"late", 1);
        mock.write(b"a").unwrap();

        let mut buffer = [0u8; 8];
        assert!(!mock.read_ready().unwrap());
        assert!(matches!(mock.read(&mut buffer), Err(MockSerialError::Timeout)));
        assert!(mock.read_ready().unwrap());
        assert_eq!(mock.unread(), 4);
        assert_eq!(mock.read(&mut buffer).unwrap(), 4);
        assert_eq!(&buffer[..4], b"late");
    }

    #[test]
    fn silence_times_out() {
        let mut mock = MockSerial::new();
        mock.queue_silence();
        mock.write(b"req").unwrap();

        let mut buffer = [0u8; 4];
        assert!(matches!(mock.read(&mut buffer), Err(MockSerialError::Timeout)));
    }

    #[test]
    fn partial_reads() {
        let mut mock = MockSerial::new();
        mock.queue_reply(b"Hello World");
        mock.write(b"?").unwrap();

        let mut buffer1 = [0u8; 5];
        let mut buffer2 = [0u8; 6];
        assert_eq!(mock.read(&mut buffer1).unwrap(), 5);
        assert_eq!(mock.read(&mut buffer2).unwrap(), 6);
        assert_eq!(&buffer1, b"Hello");
        assert_eq!(&buffer2, b" World");
    }

    #[test]
    fn error_simulation() {
        let mut mock = MockSerial::new();
        mock.set_write_error(true);
        assert!(matches!(
            mock.write(b"test"),
            Err(MockSerialError::SimulatedError)
        ));
        assert!(mock.written_data().is_empty());

        mock.set_write_error(false);
        mock.queue_reply(b"data");
        mock.write(b"test").unwrap();
        mock.set_read_error(true);
        let mut buffer = [0u8; 4];
        assert!(matches!(
            mock.read(&mut buffer),
            Err(MockSerialError::SimulatedError)
        ));
    }
}
