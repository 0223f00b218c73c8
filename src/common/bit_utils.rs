use std::fmt::{self, Display, Formatter};

use num_traits::{PrimInt, Unsigned};

// Bit stream
//------------------------------------------------------------------------------

/// Packed, MSB first bit buffer. `capacity` is the bit budget the stream is
/// being filled towards; it does not bound the allocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitStream {
    data: Vec<u8>,
    // Bit length
    len: usize,
    // Max bit capacity
    capacity: usize,
    // Read position
    cursor: usize,
}

impl BitStream {
    pub fn new(capacity: usize) -> Self {
        Self { data: Vec::with_capacity((capacity + 7) >> 3), len: 0, capacity, cursor: 0 }
    }

    pub fn unbounded() -> Self {
        Self { data: Vec::new(), len: 0, capacity: usize::MAX, cursor: 0 }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn set_capacity(&mut self, capacity: usize) {
        debug_assert!(self.len <= capacity, "Capacity {capacity} below length {}", self.len);
        self.capacity = capacity;
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

impl Display for BitStream {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for i in 0..self.len {
            let bit = (self.data[i >> 3] >> (7 - (i & 7))) & 1;
            f.write_str(if bit == 1 { "1" } else { "0" })?;
        }
        Ok(())
    }
}

// Push bits for bit stream
//------------------------------------------------------------------------------

impl BitStream {
    pub fn push_bits<T>(&mut self, bits: T, size: usize)
    where
        T: PrimInt + Unsigned + Display,
    {
        let max_bits = std::mem::size_of::<T>() * 8;
        debug_assert!(size <= 64, "Cannot push more than 64 bits at once: Size {size}");
        debug_assert!(
            size >= max_bits - bits.leading_zeros() as usize,
            "Bit count shouldn't exceed bit length: Length {size}, Bits {bits}"
        );
        debug_assert!(
            self.len + size <= self.capacity,
            "Insufficient capacity: Capacity {}, Size {}",
            self.capacity,
            self.len + size
        );

        let bits = bits.to_u64().unwrap_or_default();
        let mut remaining = size;
        while remaining > 0 {
            let offset = self.len & 7;
            if offset == 0 {
                self.data.push(0);
            }
            let take = (8 - offset).min(remaining);
            let chunk = ((bits >> (remaining - take)) & ((1 << take) - 1)) as u8;
            self.data[self.len >> 3] |= chunk << (8 - offset - take);
            self.len += take;
            remaining -= take;
        }
    }

    pub fn extend(&mut self, arr: &[u8]) {
        debug_assert!(
            (self.len & 7) == 0,
            "Bit offset must be zero to extend from another array: Bit offset {}",
            self.len & 7
        );
        debug_assert!(
            self.len + (arr.len() << 3) <= self.capacity,
            "Extension shouldn't overflow capacity: Capacity {}, Size {}",
            self.capacity,
            self.len + (arr.len() << 3)
        );
        self.data.extend_from_slice(arr);
        self.len += arr.len() << 3;
    }

    /// Appends another stream bit by bit, preserving its exact length.
    pub fn append(&mut self, other: &BitStream) {
        if self.len & 7 == 0 {
            debug_assert!(self.len + other.len <= self.capacity, "Insufficient capacity");
            self.data.extend_from_slice(&other.data);
            self.len += other.len;
            return;
        }
        for (i, byte) in other.data.iter().enumerate() {
            let size = (other.len - (i << 3)).min(8);
            self.push_bits(byte >> (8 - size), size);
        }
    }
}


// Iterator for bit stream
//------------------------------------------------------------------------------

impl Iterator for BitStream {
    type Item = bool;
    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor == self.len {
            return None;
        }

        let bit = (self.data[self.cursor >> 3] << (self.cursor & 7)) >> 7;
        self.cursor += 1;

        Some(bit != 0)
    }
}
