//! Connection-local bump allocation.
//!
//! An [`Arena`] owns one fixed region and hands out [`Handle`]s, offset ranges into that region,
//! by advancing a cursor. Nothing is freed individually: [`Arena::reset`] rewinds the cursor to
//! zero and invalidates every handle issued before it.
//!
//! Growth is cheap for exactly one allocation, the most recent one. [`Arena::extend_or_copy`]
//! grows that allocation in place by moving the cursor, any other handle is grown by copying
//! into a fresh allocation and abandoning the old range.
//!
//! [`ByteBuffer`] builds an append-only byte sequence on top of this.
use std::fmt;

mod buffer;


pub use buffer::ByteBuffer;

/// Error returned by [`Arena`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ArenaError {
    /// The region does not have enough remaining bytes.
    #[error("arena out of space: requested {requested} bytes, {remaining} remaining")]
    OutOfSpace {
        /// Bytes the allocation needed past the current cursor, including alignment padding.
        requested: usize,
        /// Bytes left in the region.
        remaining: usize,
    },
    /// Alignment is zero or not a power of two.
    #[error("invalid alignment {0}, must be a power of two")]
    InvalidAlignment(usize),
    /// Handle was issued before the last [`Arena::reset`].
    #[error("stale arena handle")]
    Stale,
}

/// A range of bytes issued by an [`Arena`].
///
/// Handles are plain values: copying one does not duplicate the memory it denotes. A handle is
/// only valid for the arena epoch it was issued in.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle {
    offset: usize,
    size: usize,
    epoch: u64,
    generation: u64,
}

impl Handle {
    /// Offset of the allocation from the region base.
    #[inline]
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// Size of the allocation in bytes.
    #[inline]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Monotonic allocation number, unique for the lifetime of the arena.
    #[inline]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    #[inline]
    const fn end(&self) -> usize {
        self.offset + self.size
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Handle")
            .field("range", &(self.offset..self.end()))
            .field("epoch", &self.epoch)
            .field("generation", &self.generation)
            .finish()
    }
}

/// Fixed capacity linear allocator.
///
/// `0 <= offset <= capacity` holds at all times, and issued handles never overlap within one
/// epoch.
pub struct Arena {
    region: Box<[u8]>,
    offset: usize,
    epoch: u64,
    /// Generation number the next allocation receives.
    next_generation: u64,
    /// Generation of the allocation that ends at `offset`, if any.
    last: Option<u64>,
}

impl Arena {
    /// Create an arena owning `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            region: vec![0; capacity].into_boxed_slice(),
            offset: 0,
            epoch: 0,
            next_generation: 0,
            last: None,
        }
    }

    /// Total size of the region.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.region.len()
    }

    /// Bytes consumed by the cursor, padding included.
    #[inline]
    pub fn used(&self) -> usize {
        self.offset
    }

    /// Bytes left after the cursor.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.region.len() - self.offset
    }

    /// Number of resets performed so far.
    #[inline]
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Returns `true` if `handle` is the most recent allocation of the current epoch, the only
    /// one that can grow in place.
    #[inline]
    pub fn is_last(&self, handle: &Handle) -> bool {
        handle.epoch == self.epoch && self.last == Some(handle.generation)
    }

    /// Allocate `size` bytes whose offset is a multiple of `align`.
    pub fn allocate(&mut self, size: usize, align: usize) -> Result<Handle, ArenaError> {
        let start = self.aligned_offset(align)?;

        let padding = start - self.offset;
        let remaining = self.remaining();
        match padding.checked_add(size) {
            Some(requested) if requested <= remaining => {}
            requested => {
                return Err(ArenaError::OutOfSpace {
                    requested: requested.unwrap_or(usize::MAX),
                    remaining,
                });
            }
        }

        let generation = self.next_generation;
        self.next_generation += 1;
        self.offset = start + size;
        self.last = Some(generation);

        Ok(Handle {
            offset: start,
            size,
            epoch: self.epoch,
            generation,
        })
    }

    /// Allocate a copy of `bytes`.
    pub fn alloc_copy(&mut self, bytes: &[u8]) -> Result<Handle, ArenaError> {
        let handle = self.allocate(bytes.len(), 1)?;
        self.region[handle.offset..handle.end()].copy_from_slice(bytes);
        Ok(handle)
    }

    /// Resize `handle` to `new_size` bytes.
    ///
    /// If `handle` is the last allocation, it is resized in place and the handle keeps its
    /// generation. Otherwise a new region of `new_size` bytes is allocated with `align` and the
    /// old content is copied over, the old range becomes unreachable until the next reset.
    ///
    /// Shrinking never moves the allocation.
    pub fn extend_or_copy(
        &mut self,
        handle: Handle,
        new_size: usize,
        align: usize,
    ) -> Result<Handle, ArenaError> {
        self.check(&handle)?;

        if self.is_last(&handle) {
            let remaining = self.region.len() - handle.offset;
            if new_size > remaining {
                return Err(ArenaError::OutOfSpace {
                    requested: new_size - handle.size,
                    remaining: self.remaining(),
                });
            }
            self.offset = handle.offset + new_size;
            return Ok(Handle {
                size: new_size,
                ..handle
            });
        }

        if new_size <= handle.size {
            return Ok(Handle {
                size: new_size,
                ..handle
            });
        }

        let new = self.allocate(new_size, align)?;
        self.region
            .copy_within(handle.offset..handle.end(), new.offset);
        Ok(new)
    }

    /// Returns the bytes denoted by `handle`.
    pub fn get(&self, handle: &Handle) -> Result<&[u8], ArenaError> {
        self.check(handle)?;
        Ok(&self.region[handle.offset..handle.end()])
    }

    /// Returns the bytes denoted by `handle` mutably.
    pub fn get_mut(&mut self, handle: &Handle) -> Result<&mut [u8], ArenaError> {
        self.check(handle)?;
        Ok(&mut self.region[handle.offset..handle.end()])
    }

    /// Rewind the cursor to zero, invalidate all handles.
    pub fn reset(&mut self) {
        self.offset = 0;
        self.epoch += 1;
        self.last = None;
    }

    fn check(&self, handle: &Handle) -> Result<(), ArenaError> {
        if handle.epoch != self.epoch {
            return Err(ArenaError::Stale);
        }
        Ok(())
    }

    fn aligned_offset(&self, align: usize) -> Result<usize, ArenaError> {
        if !align.is_power_of_two() {
            return Err(ArenaError::InvalidAlignment(align));
        }
        let mask = align - 1;
        match self.offset.checked_add(mask) {
            Some(end) => Ok(end & !mask),
            None => Err(ArenaError::OutOfSpace {
                requested: usize::MAX,
                remaining: self.remaining(),
            }),
        }
    }
}

impl fmt::Debug for Arena {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Arena")
            .field("capacity", &self.capacity())
            .field("offset", &self.offset)
            .field("epoch", &self.epoch)
            .finish_non_exhaustive()
    }
}
