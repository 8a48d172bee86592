//! Bit-granular decoding primitives for the XTC compressed coordinate payload.
//!
//! The XTC codec packs integers MSB-first into a byte stream. [`BitCursor`] carries the whole
//! decoder state explicitly: the index of the next unread byte, how many bits of the most recently
//! read byte are still unconsumed, and a shift register holding the last bytes read. A fresh
//! cursor is byte-aligned, so each frame decode starts from a clean state.

use super::error::DecodeError;

/// Upper bound on the bytes one mixed-radix group may occupy.
const MAX_PACKED_BYTES: usize = 32;

/// Snapshot of the bit-cursor carry state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BitCursorState {
    /// Index of the next byte to pull from the buffer.
    pub byte_index: usize,
    /// Bits of `last_byte` that have not been handed out yet (always < 8).
    pub pending_bits: u32,
    /// Shift register of the most recently read bytes.
    pub last_byte: u32,
}

#[derive(Debug, Clone)]
pub struct BitCursor<'a> {
    data: &'a [u8],
    state: BitCursorState,
}

impl<'a> BitCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            state: BitCursorState::default(),
        }
    }

    pub fn state(&self) -> BitCursorState {
        self.state
    }

    #[inline]
    fn next_byte(&mut self) -> Result<u32, DecodeError> {
        let idx = self.state.byte_index;
        let byte = *self.data.get(idx).ok_or(DecodeError::Truncated {
            position: idx,
            needed: 1,
            available: 0,
        })?;
        self.state.byte_index += 1;
        Ok(u32::from(byte))
    }

    /// Returns the next `width` bits (0..=32) as an unsigned integer.
    pub fn decode_bits(&mut self, width: u32) -> Result<u32, DecodeError> {
        if width > 32 {
            return Err(DecodeError::CorruptPayload(format!(
                "cannot decode {} bits into a 32-bit word",
                width
            )));
        }
        let mask = if width == 32 {
            u32::MAX
        } else {
            (1u32 << width) - 1
        };

        let mut last_bits = self.state.pending_bits;
        let mut last_byte = self.state.last_byte;
        let mut remaining = width;
        let mut num = 0u32;

        while remaining >= 8 {
            last_byte = (last_byte << 8) | self.next_byte()?;
            num |= (last_byte >> last_bits) << (remaining - 8);
            remaining -= 8;
        }

        if remaining > 0 {
            if last_bits < remaining {
                last_bits += 8;
                last_byte = (last_byte << 8) | self.next_byte()?;
            }
            last_bits -= remaining;
            num |= (last_byte >> last_bits) & ((1u32 << remaining) - 1);
        }

        self.state.pending_bits = last_bits;
        self.state.last_byte = last_byte;
        Ok(num & mask)
    }

    /// Reads exactly eight bits.
    pub fn decode_byte(&mut self) -> Result<u32, DecodeError> {
        let byte = self.next_byte()?;
        self.state.last_byte = (self.state.last_byte << 8) | byte;
        Ok((self.state.last_byte >> self.state.pending_bits) & 0xff)
    }

    /// Decodes three integers packed as one mixed-radix number of `width` bits.
    ///
    /// The packed number is `(n0 * sizes[1] + n1) * sizes[2] + n2`, stored as little-endian
    /// bytes. Unpacking divides by `sizes[2]` then `sizes[1]`; what is left is `n0`.
    pub fn decode_ints(&mut self, width: u32, sizes: [u32; 3]) -> Result<[i32; 3], DecodeError> {
        let mut bytes = [0u32; MAX_PACKED_BYTES];
        let mut num_bytes = 0usize;
        let mut remaining = width;

        if width as usize > MAX_PACKED_BYTES * 8 {
            return Err(DecodeError::CorruptPayload(format!(
                "packed integer group of {} bits is too wide",
                width
            )));
        }

        while remaining > 8 {
            bytes[num_bytes] = self.decode_byte()?;
            num_bytes += 1;
            remaining -= 8;
        }
        if remaining > 0 {
            bytes[num_bytes] = self.decode_bits(remaining)?;
            num_bytes += 1;
        }

        let mut nums = [0i32; 3];
        for axis in (1..3).rev() {
            let size = u64::from(sizes[axis]);
            if size == 0 {
                return Err(DecodeError::CorruptPayload(
                    "zero radix in mixed-radix group".into(),
                ));
            }
            let mut num = 0u64;
            for byte in bytes[..num_bytes].iter_mut().rev() {
                num = (num << 8) | u64::from(*byte);
                let quotient = num / size;
                *byte = quotient as u32;
                num -= quotient * size;
            }
            nums[axis] = num as i32;
        }
        nums[0] = (bytes[0] | (bytes[1] << 8) | (bytes[2] << 16) | (bytes[3] << 24)) as i32;
        Ok(nums)
    }
}

/// Minimal bit width able to hold every value in `[0, size]`.
pub fn size_of_int(size: u32) -> u32 {
    let mut num = 1u64;
    let mut bits = 0u32;
    while u64::from(size) >= num && bits < 32 {
        bits += 1;
        num <<= 1;
    }
    bits
}

/// Combined bit width of the mixed-radix product of `sizes`.
pub fn size_of_ints(sizes: &[u32]) -> u32 {
    let mut bytes = [0u64; MAX_PACKED_BYTES];
    bytes[0] = 1;
    let mut num_bytes = 1usize;

    for &size in sizes {
        let mut carry = 0u64;
        let mut idx = 0usize;
        while idx < num_bytes {
            carry += bytes[idx] * u64::from(size);
            bytes[idx] = carry & 0xff;
            carry >>= 8;
            idx += 1;
        }
        while carry != 0 && idx < MAX_PACKED_BYTES {
            bytes[idx] = carry & 0xff;
            carry >>= 8;
            idx += 1;
        }
        num_bytes = idx;
    }

    let top = num_bytes - 1;
    let mut num = 1u64;
    let mut bits = 0u32;
    while bytes[top] >= num {
        bits += 1;
        num *= 2;
    }
    bits + (top as u32) * 8
}
