//! Outbound chunking.
//!
//! A reply is cut into slices no larger than the negotiated notification
//! size, then closed with a chunk holding only the terminator. The remote
//! client reassembles it with the same logic as [`FrameBuffer`].
//!
//! [`FrameBuffer`]: super::FrameBuffer

use bytes::Bytes;

use super::TERMINATOR;

static TERMINATOR_CHUNK: [u8; 1] = [TERMINATOR];

/// Iterator over the chunks of one outbound message.
///
/// Cloning an unconsumed iterator gives an independent pass over the same
/// message.
#[derive(Debug, Clone)]
pub struct Chunks {
    data: Bytes,
    chunk_size: usize,
    offset: usize,
    whole_sent: bool,
    terminated: bool,
}

/// Split `data` into chunks of at most `chunk_size` bytes plus a terminator.
///
/// A `chunk_size` of zero means no limit was negotiated: the whole payload
/// goes out as one chunk, still followed by the terminator.
pub fn chunks(data: Bytes, chunk_size: usize) -> Chunks {
    Chunks {
        data,
        chunk_size,
        offset: 0,
        whole_sent: false,
        terminated: false,
    }
}

impl Chunks {
    /// Total number of chunks, terminator included.
    pub fn count_total(&self) -> usize {
        let data_chunks = if self.chunk_size == 0 {
            1
        } else {
            self.data.len().div_ceil(self.chunk_size)
        };
        data_chunks + 1
    }
}

impl Iterator for Chunks {
    type Item = Bytes;

    fn next(&mut self) -> Option<Bytes> {
        if self.chunk_size == 0 {
            if !self.whole_sent {
                self.whole_sent = true;
                return Some(self.data.clone());
            }
        } else if self.offset < self.data.len() {
            let end = (self.offset + self.chunk_size).min(self.data.len());
            let chunk = self.data.slice(self.offset..end);
            self.offset = end;
            return Some(chunk);
        }

        if self.terminated {
            return None;
        }
        self.terminated = true;
        Some(Bytes::from_static(&TERMINATOR_CHUNK))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::FrameBuffer;

    fn collect(data: &'static [u8], size: usize) -> Vec<Bytes> {
        chunks(Bytes::from_static(data), size).collect()
    }

    #[test]
    fn test_zero_size_yields_whole_payload_then_terminator() {
        let out = collect(b"a fairly long reply body", 0);
        assert_eq!(out.len(), 2);
        assert_eq!(&out[0][..], b"a fairly long reply body");
        assert_eq!(&out[1][..], &[TERMINATOR]);
    }

    #[test]
    fn test_uneven_split_has_short_final_chunk() {
        let out = collect(b"abcdefg", 3);
        let as_vecs: Vec<Vec<u8>> = out.iter().map(|c| c.to_vec()).collect();
        assert_eq!(
            as_vecs,
            vec![b"abc".to_vec(), b"def".to_vec(), b"g".to_vec(), vec![TERMINATOR]]
        );
    }

    #[test]
    fn test_even_split_has_full_final_chunk() {
        let out = collect(b"abcdef", 3);
        assert_eq!(out.len(), 3);
        assert_eq!(&out[1][..], b"def");
        assert_eq!(&out[2][..], &[TERMINATOR]);
    }

    #[test]
    fn test_empty_payload_is_only_terminator() {
        let out = collect(b"", 20);
        assert_eq!(out.len(), 1);
        assert_eq!(&out[0][..], &[TERMINATOR]);
    }

    #[test]
    fn test_count_total_matches_iteration() {
        for size in 0..12 {
            let it = chunks(Bytes::from_static(b"0123456789"), size);
            assert_eq!(it.count_total(), it.clone().count(), "size {}", size);
        }
    }

    #[test]
    fn test_clone_restarts_from_same_position() {
        let it = chunks(Bytes::from_static(b"hello world"), 4);
        let first: Vec<Bytes> = it.clone().collect();
        let second: Vec<Bytes> = it.collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_chunks_reassemble_for_every_size() {
        let body = br#"{"objects":[{"class":"robot","score":0.93}],"imageURL":"http://tjbot.local:9080/photo.jpg"}"#;

        for size in 1..=body.len() + 1 {
            let mut buffer = FrameBuffer::new();
            let mut frames = Vec::new();
            for chunk in chunks(Bytes::from_static(body), size) {
                assert!(chunk.len() <= size);
                frames.extend(buffer.push(&chunk));
            }
            assert_eq!(frames.len(), 1, "size {}", size);
            assert_eq!(frames[0].payload(), &body[..]);
        }
    }
}
