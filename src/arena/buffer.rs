use super::{Arena, ArenaError, Handle};

/// Append only byte sequence stored in an [`Arena`].
///
/// The buffer does not borrow the arena, every operation takes it explicitly. Growth doubles the
/// capacity through [`Arena::extend_or_copy`], so it happens in place as long as the buffer is
/// the arena's latest allocation and moves otherwise.
///
/// Views returned by [`ByteBuffer::as_slice`] borrow the arena, so they cannot outlive an append
/// or a reset.
#[derive(Debug, Clone, Copy, Default)]
pub struct ByteBuffer {
    handle: Option<Handle>,
    len: usize,
}

impl ByteBuffer {
    /// Create empty buffer without allocating.
    #[inline]
    pub const fn new() -> Self {
        Self { handle: None, len: 0 }
    }

    /// Create empty buffer with `capacity` bytes reserved in `arena`.
    pub fn with_capacity(arena: &mut Arena, capacity: usize) -> Result<Self, ArenaError> {
        if capacity == 0 {
            return Ok(Self::new());
        }
        let handle = arena.allocate(capacity, 1)?;
        Ok(Self {
            handle: Some(handle),
            len: 0,
        })
    }

    /// Number of bytes written.
    #[inline]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if no bytes has been written.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of bytes that can be written before growing.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.handle.map_or(0, |h| h.size())
    }

    /// Append a single byte.
    pub fn push(&mut self, arena: &mut Arena, byte: u8) -> Result<(), ArenaError> {
        self.extend_from_slice(arena, &[byte])
    }

    /// Append `bytes`.
    pub fn extend_from_slice(&mut self, arena: &mut Arena, bytes: &[u8]) -> Result<(), ArenaError> {
        if bytes.is_empty() {
            return Ok(());
        }

        let handle = self.reserve(arena, bytes.len())?;
        let len = self.len;
        arena.get_mut(&handle)?[len..len + bytes.len()].copy_from_slice(bytes);
        self.len += bytes.len();
        Ok(())
    }

    /// Make room for exactly `additional` more bytes, without the doubling of
    /// [`ByteBuffer::extend_from_slice`].
    pub fn reserve_exact(&mut self, arena: &mut Arena, additional: usize) -> Result<(), ArenaError> {
        if additional == 0 {
            return Ok(());
        }
        let required = self.required(arena, additional)?;
        let handle = match self.handle {
            Some(handle) if handle.size() >= required => return Ok(()),
            Some(handle) => arena.extend_or_copy(handle, required, 1)?,
            None => arena.allocate(required, 1)?,
        };
        self.handle = Some(handle);
        Ok(())
    }

    /// Zero copy view of the written bytes.
    pub fn as_slice<'a>(&self, arena: &'a Arena) -> Result<&'a [u8], ArenaError> {
        match &self.handle {
            Some(handle) => Ok(&arena.get(handle)?[..self.len]),
            None => Ok(&[]),
        }
    }

    /// Forget written bytes, keeping the reserved capacity.
    #[inline]
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Make room for `additional` bytes, returns the handle to write through.
    fn reserve(&mut self, arena: &mut Arena, additional: usize) -> Result<Handle, ArenaError> {
        let required = self.required(arena, additional)?;

        let handle = match self.handle {
            Some(handle) if handle.size() >= required => return Ok(handle),
            Some(handle) => {
                let mut new_cap = handle.size().max(1);
                while new_cap < required {
                    new_cap = new_cap.saturating_mul(2);
                }
                match arena.extend_or_copy(handle, new_cap, 1) {
                    Ok(ok) => ok,
                    // doubling overshoots the region, settle for the exact size
                    Err(ArenaError::OutOfSpace { .. }) if new_cap > required => {
                        arena.extend_or_copy(handle, required, 1)?
                    }
                    Err(err) => return Err(err),
                }
            }
            None => {
                let cap = required.checked_next_power_of_two().unwrap_or(required);
                match arena.allocate(cap, 1) {
                    Ok(ok) => ok,
                    Err(ArenaError::OutOfSpace { .. }) if cap > required => {
                        arena.allocate(required, 1)?
                    }
                    Err(err) => return Err(err),
                }
            }
        };

        self.handle = Some(handle);
        Ok(handle)
    }

    fn required(&self, arena: &Arena, additional: usize) -> Result<usize, ArenaError> {
        self.len.checked_add(additional).ok_or(ArenaError::OutOfSpace {
            requested: usize::MAX,
            remaining: arena.remaining(),
        })
    }
}
