//! Growable read/write-split byte buffer (§4.4): the staging area the
//! read-loop driver uses between the octet source and the parser.

/// A contiguous octet buffer with a read offset and a committed length.
///
/// Invariant: `pos + len <= cap` always holds. `consume` never shrinks
/// `cap`; only `prepare` ever reallocates, and only when compaction alone
/// cannot make room.
pub struct ParseBuffer {
    storage: Vec<u8>,
    pos: usize,
    len: usize,
}

impl ParseBuffer {
    /// Create an empty buffer with no preallocated capacity.
    pub fn new() -> Self {
        Self {
            storage: Vec::new(),
            pos: 0,
            len: 0,
        }
    }

    /// Create an empty buffer that preallocates `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            storage: vec![0u8; capacity],
            pos: 0,
            len: 0,
        }
    }

    /// The currently valid, unconsumed prefix.
    #[inline]
    pub fn readable(&self) -> &[u8] {
        &self.storage[self.pos..self.pos + self.len]
    }

    /// Number of unconsumed bytes currently staged.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Total backing capacity, including already-consumed bytes.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    /// Ensure at least `n` writable bytes are available after the committed
    /// region, compacting or growing the backing storage as needed, and
    /// return that writable region.
    ///
    /// `cap` bounds the total backing allocation this buffer is allowed to
    /// grow to; if satisfying `n` would exceed it, returns `None` (the
    /// caller surfaces this as `buffer-overflow`).
    pub fn prepare(&mut self, n: usize, cap: usize) -> Option<&mut [u8]> {
        let n = n.max(1);
        if self.storage.len() < self.pos + self.len + n {
            if self.storage.len() >= self.len + n {
                // Compaction alone makes room: slide the valid prefix to 0.
                self.storage.copy_within(self.pos..self.pos + self.len, 0);
                self.pos = 0;
            } else {
                let new_cap = self.len + n;
                if new_cap > cap {
                    return None;
                }
                let mut grown = vec![0u8; new_cap];
                grown[..self.len].copy_from_slice(&self.storage[self.pos..self.pos + self.len]);
                self.storage = grown;
                self.pos = 0;
            }
        }
        let start = self.pos + self.len;
        Some(&mut self.storage[start..start + n])
    }

    /// Advance the committed length by `min(k, cap - pos - len)`.
    pub fn commit(&mut self, k: usize) {
        let room = self.storage.len() - self.pos - self.len;
        self.len += k.min(room);
    }

    /// Advance the read offset by `k`, collapsing to empty once it catches
    /// up with the committed length.
    pub fn consume(&mut self, k: usize) {
        if k < self.len {
            self.pos += k;
            self.len -= k;
        } else {
            self.pos = 0;
            self.len = 0;
        }
    }
}

impl Default for ParseBuffer {
    fn default() -> Self {
        Self::new()
    }
}
