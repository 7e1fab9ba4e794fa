//! # strata-buffer
//!
//! A queue of immutable byte chunks for streamed input.
//!
//! Producers append chunks as they arrive (socket reads, pipe reads); consumers
//! pull exact byte counts, whole chunks, single bytes or lines. Chunks are
//! [`Bytes`] handles, so splitting one only creates a new handle to the
//! unconsumed suffix. Bytes are copied only when a read spans chunks.
//!
//! ```text
//! append("He") append("llo, ") append("World")
//!   [He][llo, ][World]          len = 12
//! read_up_to(8) -> "Hello, W"
//!   [orld]                      len = 4
//! ```
//!
//! The buffer does no locking. A producer and a consumer on different threads
//! must share it behind their own lock.

use std::collections::VecDeque;
use std::io::{self, Read};
use std::ops::Index;

use bytes::{Bytes, BytesMut};
use tracing::trace;

/// Ordered chunks plus their running total.
///
/// Invariants: no chunk is empty, and `len()` equals the sum of chunk lengths.
#[derive(Debug, Clone, Default)]
pub struct SegmentedByteBuffer {
    chunks: VecDeque<Bytes>,
    total: usize,
}

impl SegmentedByteBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a chunk at the back. Empty chunks are ignored.
    pub fn append(&mut self, chunk: impl Into<Bytes>) {
        let chunk = chunk.into();
        if chunk.is_empty() {
            return;
        }
        self.total += chunk.len();
        self.chunks.push_back(chunk);
    }

    /// Move every chunk of `other` to the back of this buffer, leaving
    /// `other` empty.
    pub fn append_buffer(&mut self, other: &mut SegmentedByteBuffer) {
        if other.is_empty() {
            return;
        }
        self.total += other.total;
        self.chunks.append(&mut other.chunks);
        other.total = 0;
    }

    /// Put a chunk back at the front, e.g. an unconsumed remainder.
    pub fn prepend(&mut self, chunk: impl Into<Bytes>) {
        let chunk = chunk.into();
        if chunk.is_empty() {
            return;
        }
        self.total += chunk.len();
        self.chunks.push_front(chunk);
    }

    /// Remove and return the front chunk. Cheapest way to consume.
    pub fn take_first_chunk(&mut self) -> Option<Bytes> {
        let chunk = self.chunks.pop_front()?;
        self.total -= chunk.len();
        Some(chunk)
    }

    /// Remove up to `amount` bytes from the front.
    ///
    /// Requests beyond [`len`](Self::len) are clamped. When the bytes lie in a
    /// single chunk no copy happens; otherwise they are gathered into one
    /// new allocation.
    pub fn read_up_to(&mut self, amount: usize) -> Bytes {
        let amount = amount.min(self.total);
        if amount == 0 {
            return Bytes::new();
        }

        if self.next_chunk_len() >= amount {
            let mut front = self.chunks.pop_front().unwrap_or_default();
            self.total -= amount;
            if front.len() > amount {
                let head = front.split_to(amount);
                self.chunks.push_front(front);
                return head;
            }
            return front;
        }

        let mut out = BytesMut::zeroed(amount);
        let copied = self.read_into(&mut out);
        debug_assert_eq!(copied, amount);
        out.freeze()
    }

    /// Copy up to `dst.len()` bytes from the front into `dst`.
    ///
    /// Returns how many bytes were copied. A partially consumed chunk is
    /// replaced by a new chunk holding its suffix.
    pub fn read_into(&mut self, dst: &mut [u8]) -> usize {
        let amount = dst.len().min(self.total);
        let mut written = 0;

        while written < amount {
            let Some(front) = self.chunks.pop_front() else {
                break;
            };
            let need = amount - written;
            if need >= front.len() {
                // take it completely
                dst[written..written + front.len()].copy_from_slice(&front);
                written += front.len();
                self.total -= front.len();
            } else {
                // take a part of it & it is the last one to take
                dst[written..amount].copy_from_slice(&front[..need]);
                self.total -= need;
                self.chunks.push_front(front.slice(need..));
                written = amount;
            }
        }

        written
    }

    /// Remove everything.
    pub fn read_all(&mut self) -> Bytes {
        self.read_up_to(self.total)
    }

    /// Remove a single byte, `None` when empty.
    pub fn read_byte(&mut self) -> Option<u8> {
        let mut byte = [0u8; 1];
        (self.read_into(&mut byte) == 1).then_some(byte[0])
    }

    pub fn clear(&mut self) {
        self.chunks.clear();
        self.total = 0;
    }

    /// Total buffered bytes
    pub fn len(&self) -> usize {
        self.total
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Length of the front chunk, or 0 when empty. A read of at most this
    /// many bytes does not copy.
    pub fn next_chunk_len(&self) -> usize {
        self.chunks.front().map_or(0, Bytes::len)
    }

    /// Inspect a chunk without consuming it.
    pub fn chunk(&self, idx: usize) -> Option<&Bytes> {
        self.chunks.get(idx)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Bytes> {
        self.chunks.iter()
    }

    /// True if some chunk contains `\n`.
    ///
    /// Each chunk is checked on its own. Only `\n` counts as a terminator, so
    /// a `\r\n` split as `"...\r" | "\n..."` is seen through its `\n` and a
    /// lone `\r` never is. Use [`find_byte`](Self::find_byte) or
    /// [`read_line`](Self::read_line) when the line position matters.
    pub fn has_complete_line(&self) -> bool {
        self.chunks.iter().any(|chunk| chunk.contains(&b'\n'))
    }

    /// Offset of the first `byte` counted from the front of the buffer.
    pub fn find_byte(&self, byte: u8) -> Option<usize> {
        let mut offset = 0;
        for chunk in &self.chunks {
            if let Some(pos) = chunk.iter().position(|&b| b == byte) {
                return Some(offset + pos);
            }
            offset += chunk.len();
        }
        None
    }

    /// Remove one line including its `\n`, if a complete line is buffered.
    pub fn read_line(&mut self) -> Option<Bytes> {
        let end = self.find_byte(b'\n')?;
        Some(self.read_up_to(end + 1))
    }

    /// Read one chunk of at most `chunk_size` bytes from `reader` and append
    /// it. Returns the number of bytes read; 0 means end of stream.
    pub fn fill_from<R: Read + ?Sized>(&mut self, reader: &mut R, chunk_size: usize) -> io::Result<usize> {
        let mut chunk = BytesMut::zeroed(chunk_size);
        let n = loop {
            match reader.read(&mut chunk) {
                Ok(n) => break n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        };
        chunk.truncate(n);
        self.append(chunk.freeze());
        trace!(component = "BUFFER", read = n, buffered = self.total, "filled");
        Ok(n)
    }
}

impl Index<usize> for SegmentedByteBuffer {
    type Output = Bytes;

    fn index(&self, idx: usize) -> &Bytes {
        &self.chunks[idx]
    }
}

impl Read for SegmentedByteBuffer {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(self.read_into(buf))
    }
}

impl Extend<Bytes> for SegmentedByteBuffer {
    fn extend<I: IntoIterator<Item = Bytes>>(&mut self, iter: I) {
        for chunk in iter {
            self.append(chunk);
        }
    }
}

impl FromIterator<Bytes> for SegmentedByteBuffer {
    fn from_iter<I: IntoIterator<Item = Bytes>>(iter: I) -> Self {
        let mut buffer = Self::new();
        buffer.extend(iter);
        buffer
    }
}

impl<'a> IntoIterator for &'a SegmentedByteBuffer {
    type Item = &'a Bytes;
    type IntoIter = std::collections::vec_deque::Iter<'a, Bytes>;

    fn into_iter(self) -> Self::IntoIter {
        self.chunks.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer_of(chunks: &[&'static str]) -> SegmentedByteBuffer {
        chunks
            .iter()
            .map(|&c| Bytes::from_static(c.as_bytes()))
            .collect()
    }

    #[test]
    fn test_exact_read_across_chunks() {
        let mut buf = buffer_of(&["He", "llo, ", "World"]);
        assert_eq!(buf.len(), 12);
        assert_eq!(buf.read_up_to(8), "Hello, W");
        assert_eq!(buf.len(), 4);
        assert_eq!(buf.chunk_count(), 1);
        // over-request is clamped
        assert_eq!(buf.read_up_to(100), "orld");
        assert_eq!(buf.len(), 0);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_peek_then_partial_read() {
        let mut buf = SegmentedByteBuffer::new();
        buf.append("abc");
        assert_eq!(buf.next_chunk_len(), 3);
        assert_eq!(buf.read_up_to(1), "a");
        assert_eq!(buf.len(), 2);
        assert_eq!(buf.read_all(), "bc");
    }

    #[test]
    fn test_split_leaves_original_chunk_untouched() {
        let original = Bytes::from_static(b"abcdef");
        let mut buf = SegmentedByteBuffer::new();
        buf.append(original.clone());
        let head = buf.read_up_to(2);
        assert_eq!(head, "ab");
        assert_eq!(buf[0], "cdef");
        assert_eq!(original, "abcdef");
    }

    #[test]
    fn test_empty_chunks_ignored() {
        let mut buf = SegmentedByteBuffer::new();
        buf.append(Bytes::new());
        buf.prepend(Vec::<u8>::new());
        assert_eq!(buf.chunk_count(), 0);
        assert_eq!(buf.next_chunk_len(), 0);
    }

    #[test]
    fn test_take_first_chunk() {
        let mut buf = buffer_of(&["one", "two"]);
        assert_eq!(buf.take_first_chunk().unwrap(), "one");
        assert_eq!(buf.len(), 3);
        assert_eq!(buf.take_first_chunk().unwrap(), "two");
        assert!(buf.take_first_chunk().is_none());
    }

    #[test]
    fn test_prepend_pushes_back() {
        let mut buf = buffer_of(&["world"]);
        buf.prepend("hello ");
        assert_eq!(buf.len(), 11);
        assert_eq!(buf.read_all(), "hello world");
    }

    #[test]
    fn test_append_buffer_drains_other() {
        let mut a = buffer_of(&["ab"]);
        let mut b = buffer_of(&["cd", "ef"]);
        a.append_buffer(&mut b);
        assert_eq!(a.len(), 6);
        assert_eq!(a.chunk_count(), 3);
        assert!(b.is_empty());
        assert_eq!(b.chunk_count(), 0);
        assert_eq!(a.read_all(), "abcdef");
    }

    #[test]
    fn test_read_byte() {
        let mut buf = buffer_of(&["x", "y"]);
        assert_eq!(buf.read_byte(), Some(b'x'));
        assert_eq!(buf.read_byte(), Some(b'y'));
        assert_eq!(buf.read_byte(), None);
    }

    #[test]
    fn test_clear() {
        let mut buf = buffer_of(&["a", "b"]);
        buf.clear();
        assert!(buf.is_empty());
        assert_eq!(buf.chunk_count(), 0);
    }

    #[test]
    fn test_line_detection_per_chunk() {
        let buf = buffer_of(&["abc", "\ndef"]);
        assert!(buf.has_complete_line());
        assert!(!buffer_of(&["abc", "def"]).has_complete_line());
    }

    #[test]
    fn test_crlf_split_across_chunks() {
        let mut buf = buffer_of(&["abc\r"]);
        // a bare CR is not a line terminator
        assert!(!buf.has_complete_line());

        buf.append("\ndef");
        assert!(buf.has_complete_line());
        assert_eq!(buf.read_line().unwrap(), "abc\r\n");
        assert_eq!(buf.read_line(), None);
        assert_eq!(buf.read_all(), "def");
    }

    #[test]
    fn test_find_byte_offsets() {
        let buf = buffer_of(&["ab", "cd", "e\n"]);
        assert_eq!(buf.find_byte(b'c'), Some(2));
        assert_eq!(buf.find_byte(b'\n'), Some(5));
        assert_eq!(buf.find_byte(b'z'), None);
    }

    #[test]
    fn test_io_read() {
        let mut buf = buffer_of(&["stream", "ing"]);
        let mut out = String::new();
        buf.read_to_string(&mut out).unwrap();
        assert_eq!(out, "streaming");
    }

    #[test]
    fn test_fill_from_reader() {
        let mut source: &[u8] = b"line one\nline two\n";
        let mut buf = SegmentedByteBuffer::new();
        while buf.fill_from(&mut source, 4).unwrap() > 0 {}
        assert_eq!(buf.chunk_count(), 5);
        assert_eq!(buf.read_line().unwrap(), "line one\n");
        assert_eq!(buf.read_line().unwrap(), "line two\n");
        assert!(buf.is_empty());
    }
}
