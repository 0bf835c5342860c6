//! Ingest adapters.
//!
//! A program reaches the executor either as one contiguous buffer
//! (handed straight to [`Interpreter::run`]) or as numbered chunks over
//! a best-effort transport, reassembled here into a contiguous command
//! stream.
//!
//! [`Interpreter::run`]: crate::interpreter::Interpreter::run

mod ring;

pub use ring::SequenceRing;

use crate::interpreter::LaunchRecord;

use tracing::{debug, warn};

/// Chunk header bits `[15:14]` identifying a command frame.
pub const CHUNK_COMMAND_TYPE: u16 = 0b01;

/// Low six header bits identifying sequenced-data commands.
pub const SEQUENCED_DATA_COMMAND: u16 = 7;

/// Region selector carrying out-of-band configuration (at sequence 0).
pub const CONFIG_REGION: u8 = 1;

/// Region selector marking end of program at the carried sequence.
pub const FINAL_SEQUENCE_REGION: u8 = 3;

/// Default reassembly ring capacity, in bytes.
pub const DEFAULT_RING_CAPACITY: usize = 16 * 1024;

/// One chunk of a fragmented program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk<'a> {
    pub region: u8,
    pub seq: u8,
    pub payload: &'a [u8],
}

impl<'a> Chunk<'a> {
    /// Parse a wire frame: payload length byte, 16-bit command header,
    /// region selector, sequence number, payload.
    ///
    /// Frames whose header is not a sequenced-data command are not
    /// chunks at all and yield `None`.
    pub fn parse(frame: &'a [u8]) -> Option<Self> {
        let (&len, rest) = frame.split_first()?;
        if rest.len() < 4 {
            return None;
        }

        let header = u16::from_le_bytes([rest[0], rest[1]]);
        if header >> 14 != CHUNK_COMMAND_TYPE || header & 0x3F != SEQUENCED_DATA_COMMAND {
            return None;
        }

        let payload = rest.get(4..4 + len as usize)?;
        Some(Self {
            region: rest[2],
            seq: rest[3],
            payload,
        })
    }
}

/// Out-of-band configuration delivered in the `(region=1, seq=0)`
/// chunk: `[iptag, future_app_id, generate_report]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestConfig {
    pub iptag: u8,
    pub app_id: u8,
    pub generate_report: bool,
}

/// Reassembles a fragmented program, enforcing strict sequence order.
///
/// Chunks arrive via [`accept`]; anything malformed, out of order or
/// not fitting the ring is dropped and counted. Once the final-sequence
/// marker's predecessors have all arrived, [`take_program`] hands out
/// the contiguous command stream.
///
/// [`accept`]: Self::accept
/// [`take_program`]: Self::take_program
#[derive(Debug, Clone)]
pub struct ChunkAssembler {
    ring: SequenceRing,
    next_seq: u8,
    final_seq: Option<u8>,
    dropped: u32,
    config: Option<IngestConfig>,
    draining: bool,
}

impl Default for ChunkAssembler {
    fn default() -> Self {
        Self::new(DEFAULT_RING_CAPACITY)
    }
}

impl ChunkAssembler {
    pub fn new(ring_capacity: usize) -> Self {
        Self {
            ring: SequenceRing::new(ring_capacity),
            next_seq: 0,
            final_seq: None,
            dropped: 0,
            config: None,
            draining: false,
        }
    }

    /// Feed one raw wire frame.
    pub fn accept(&mut self, frame: &[u8]) {
        match Chunk::parse(frame) {
            Some(chunk) => self.accept_chunk(&chunk),
            None => {
                warn!("discarding frame that is not a sequenced-data command");
                self.dropped += 1;
            }
        }
    }

    /// Feed one parsed chunk.
    pub fn accept_chunk(&mut self, chunk: &Chunk<'_>) {
        // arrivals raised while the ring is being emptied must not
        // re-enter it
        if self.draining {
            self.dropped += 1;
            return;
        }

        match (chunk.region, chunk.seq) {
            (CONFIG_REGION, 0) => match chunk.payload {
                [iptag, app_id, generate_report, ..] => {
                    self.config = Some(IngestConfig {
                        iptag: *iptag,
                        app_id: *app_id,
                        generate_report: *generate_report != 0,
                    });
                    debug!(app_id = *app_id, "received ingest configuration");
                }
                _ => self.dropped += 1,
            },

            (FINAL_SEQUENCE_REGION, seq) => {
                debug!(seq, "received final-sequence marker");
                self.final_seq = Some(seq);
            }

            (_, seq) => {
                if seq != self.next_seq {
                    warn!(seq, expected = self.next_seq, "dropping out-of-order chunk");
                    self.dropped += 1;
                    return;
                }
                if !self.ring.push(chunk.payload) {
                    warn!(seq, "dropping chunk: no space in the sequence ring");
                    self.dropped += 1;
                    return;
                }
                self.next_seq = self.next_seq.wrapping_add(1);
            }
        }
    }

    /// Whether every sequence before the final marker has been
    /// admitted.
    pub fn is_complete(&self) -> bool {
        self.final_seq == Some(self.next_seq)
    }

    /// Chunks dropped so far: malformed, out of order, or over
    /// capacity.
    pub const fn dropped(&self) -> u32 {
        self.dropped
    }

    pub const fn config(&self) -> Option<IngestConfig> {
        self.config
    }

    /// Launch record from the out-of-band configuration, or defaults
    /// when none arrived.
    pub fn launch_record(&self) -> LaunchRecord {
        self.config
            .map(|c| LaunchRecord::new(c.app_id, c.generate_report))
            .unwrap_or_default()
    }

    /// Drain the reassembled program, or `None` while chunks are still
    /// outstanding.
    pub fn take_program(&mut self) -> Option<Vec<u8>> {
        if !self.is_complete() {
            return None;
        }

        self.draining = true;
        let program = self.ring.drain();
        self.draining = false;
        Some(program)
    }
}
