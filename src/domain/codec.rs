//! Wire envelope for transferring a filter between peers.
//!
//! Layout, all integers big-endian:
//!
//! ```text
//! u64 m | u64 k | k x 32-byte chain digests | u64 payload_len | payload
//! ```
//!
//! The payload is the bit array's own binary encoding: a u64 bit count
//! followed by the raw bytes, LSB-first within each byte. Decoding is
//! strict; truncated or internally inconsistent input fails without
//! yielding a partially populated filter.

use bitvec::prelude::*;

use super::dist_bf::{BitArray, DistBloomFilter};
use super::hash_chain::{Digest, HashChain, DIGEST_LEN, MAX_CHAIN_LEN};
use crate::error::DbfError;

const U64_LEN: usize = 8;

/// Serialize a filter into the wire envelope.
pub fn encode(dbf: &DistBloomFilter) -> Vec<u8> {
    let payload = bits_to_bytes(dbf.bits());
    let mut out =
        Vec::with_capacity(3 * U64_LEN + dbf.hash_count() * DIGEST_LEN + payload.len());
    out.extend_from_slice(&(dbf.size_bits() as u64).to_be_bytes());
    out.extend_from_slice(&(dbf.hash_count() as u64).to_be_bytes());
    for entry in dbf.chain().entries() {
        out.extend_from_slice(entry);
    }
    out.extend_from_slice(&(payload.len() as u64).to_be_bytes());
    out.extend_from_slice(&payload);
    out
}

/// Reconstruct a filter from the wire envelope.
///
/// The decoded filter answers `Test(i)` identically to the encoded one
/// for every index below m.
pub fn decode(bytes: &[u8]) -> Result<DistBloomFilter, DbfError> {
    let mut reader = Reader::new(bytes);

    let m = reader.read_u64()? as usize;
    let k = reader.read_u64()? as usize;
    if m == 0 {
        return Err(DbfError::MalformedEnvelope(
            "declared bit-array size is zero".to_string(),
        ));
    }
    if k == 0 || k > MAX_CHAIN_LEN {
        return Err(DbfError::MalformedEnvelope(format!(
            "declared hash count {} is outside [1, {}]",
            k, MAX_CHAIN_LEN
        )));
    }

    let mut digests = Vec::with_capacity(k);
    for _ in 0..k {
        digests.push(reader.read_digest()?);
    }
    let chain = HashChain::from_digests(digests)?;

    let payload_len = reader.read_u64()? as usize;
    let payload = reader.read_bytes(payload_len)?;
    if !reader.at_end() {
        return Err(DbfError::MalformedEnvelope(
            "trailing bytes after bit-array payload".to_string(),
        ));
    }

    let bits = bits_from_bytes(payload)?;
    if bits.len() != m {
        return Err(DbfError::MalformedEnvelope(format!(
            "payload holds {} bits, envelope declares m={}",
            bits.len(),
            m
        )));
    }

    tracing::trace!(m, k, envelope_len = bytes.len(), "decoded filter envelope");
    DistBloomFilter::from_parts(m, k, chain, bits)
}

/// Bit array binary encoding: u64 bit count, then the raw bytes.
fn bits_to_bytes(bits: &BitArray) -> Vec<u8> {
    let raw = bits.as_raw_slice();
    let mut out = Vec::with_capacity(U64_LEN + raw.len());
    out.extend_from_slice(&(bits.len() as u64).to_be_bytes());
    out.extend_from_slice(raw);
    out
}

fn bits_from_bytes(payload: &[u8]) -> Result<BitArray, DbfError> {
    if payload.len() < U64_LEN {
        return Err(DbfError::Truncated {
            needed: U64_LEN,
            got: payload.len(),
        });
    }
    let mut count_bytes = [0u8; U64_LEN];
    count_bytes.copy_from_slice(&payload[..U64_LEN]);
    let bit_count = u64::from_be_bytes(count_bytes) as usize;

    let expected_bytes = bit_count.div_ceil(8);
    let raw = &payload[U64_LEN..];
    if raw.len() != expected_bytes {
        return Err(DbfError::MalformedEnvelope(format!(
            "bit payload holds {} bytes, {} bits need {}",
            raw.len(),
            bit_count,
            expected_bytes
        )));
    }

    let mut bits = BitVec::<u8, Lsb0>::from_vec(raw.to_vec());
    bits.truncate(bit_count);
    Ok(bits)
}

/// Cursor over the envelope with explicit truncation accounting.
struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], DbfError> {
        let end = self.pos.checked_add(len).ok_or(DbfError::Truncated {
            needed: usize::MAX,
            got: self.buf.len(),
        })?;
        if end > self.buf.len() {
            return Err(DbfError::Truncated {
                needed: end,
                got: self.buf.len(),
            });
        }
        let slice = &self.buf[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn read_u64(&mut self) -> Result<u64, DbfError> {
        let mut bytes = [0u8; U64_LEN];
        bytes.copy_from_slice(self.read_bytes(U64_LEN)?);
        Ok(u64::from_be_bytes(bytes))
    }

    fn read_digest(&mut self) -> Result<Digest, DbfError> {
        let mut digest = [0u8; DIGEST_LEN];
        digest.copy_from_slice(self.read_bytes(DIGEST_LEN)?);
        Ok(digest)
    }

    fn at_end(&self) -> bool {
        self.pos == self.buf.len()
    }
}
