//! The code cache: mmap'd regions translated code is written into.
//!
//! Regions are allocated in fixed-size chunks and never freed while
//! the translator lives. When a region fills up, a fresh one is
//! mapped and the old region's write position gets an unconditional
//! jump to the start of the new one, so a unit that straddles the
//! boundary keeps executing seamlessly. Callers reserve space up
//! front; the reserve check includes a hard guard margin so emission
//! inside one unit can never run off the end of a region.

use std::io;
use std::ptr;

use log::debug;

/// `ldr pc, [pc, #-4]`: jump to the address in the next word.
pub const LDR_PC_LITERAL: u32 = 0xe51f_f004;

/// Bytes the region-chaining jump itself occupies.
pub const CHAIN_JUMP_BYTES: usize = 8;

struct Region {
    ptr: *mut u8,
    size: usize,
}

impl Region {
    fn map(size: usize) -> io::Result<Region> {
        // SAFETY: mmap with MAP_ANONYMOUS | MAP_PRIVATE, no file
        // backing.
        let ptr = unsafe {
            libc::mmap(
                ptr::null_mut(),
                size,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_PRIVATE | libc::MAP_ANONYMOUS,
                -1,
                0,
            )
        };
        if ptr == libc::MAP_FAILED {
            return Err(io::Error::last_os_error());
        }
        Ok(Region {
            ptr: ptr as *mut u8,
            size,
        })
    }

    #[inline]
    fn base(&self) -> usize {
        self.ptr as usize
    }

    #[inline]
    fn contains(&self, addr: usize) -> bool {
        addr >= self.base() && addr < self.base() + self.size
    }

    fn protect(&self, prot: libc::c_int) -> io::Result<()> {
        let ret = unsafe { libc::mprotect(self.ptr as *mut libc::c_void, self.size, prot) };
        if ret != 0 {
            Err(io::Error::last_os_error())
        } else {
            Ok(())
        }
    }
}

impl Drop for Region {
    fn drop(&mut self) {
        if !self.ptr.is_null() {
            unsafe {
                libc::munmap(self.ptr as *mut libc::c_void, self.size);
            }
        }
    }
}

/// Growable arena of executable-code regions.
///
/// All addresses handed out and accepted are absolute. Patching may
/// target any live region; emission always goes to the newest one.
pub struct CodeCache {
    regions: Vec<Region>,
    /// Write offset within the newest region.
    cursor: usize,
    region_size: usize,
    guard: usize,
}

// SAFETY: CodeCache owns its mmap'd memory exclusively.
unsafe impl Send for CodeCache {}

impl CodeCache {
    /// Map the first region. `guard` is the margin `reserve` keeps
    /// free beyond the caller's request; it must cover at least the
    /// chaining jump.
    pub fn new(region_size: usize, guard: usize) -> io::Result<Self> {
        assert!(guard >= CHAIN_JUMP_BYTES);
        assert!(region_size > guard);
        let page_size = page_size();
        let region_size = (region_size + page_size - 1) & !(page_size - 1);
        let first = Region::map(region_size)?;
        debug!(
            "code cache: first region at {:#x}, {} bytes",
            first.base(),
            region_size
        );
        Ok(CodeCache {
            regions: vec![first],
            cursor: 0,
            region_size,
            guard,
        })
    }

    fn current(&self) -> &Region {
        // regions is never empty after new()
        &self.regions[self.regions.len() - 1]
    }

    /// Address the next emitted word will land at.
    #[inline]
    pub fn transl_addr(&self) -> usize {
        self.current().base() + self.cursor
    }

    /// Bytes left in the current region, guard included.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.current().size - self.cursor
    }

    /// True if `addr` lies inside any live region. Translated code
    /// must never be fed back through the translator; callers use
    /// this to detect that.
    pub fn contains(&self, addr: usize) -> bool {
        self.regions.iter().any(|r| r.contains(addr))
    }

    /// Ensure at least `min_bytes` plus the guard margin can be
    /// emitted contiguously, chaining into a fresh region if the
    /// current one is too full. Returns the write address.
    pub fn reserve(&mut self, min_bytes: usize) -> io::Result<usize> {
        if self.remaining() < min_bytes + self.guard {
            self.grow()?;
        }
        Ok(self.transl_addr())
    }

    /// Map a new region and chain the old one into it. The guard
    /// margin guarantees the jump fits.
    fn grow(&mut self) -> io::Result<()> {
        let next = Region::map(self.region_size)?;
        let jump_at = self.transl_addr();
        debug!(
            "code cache: region full, chaining {:#x} -> {:#x}",
            jump_at,
            next.base()
        );
        self.emit_u32(LDR_PC_LITERAL);
        self.emit_u32(next.base() as u32);
        self.regions.push(next);
        self.cursor = 0;
        Ok(())
    }

    // -- Emission --

    #[inline]
    pub fn emit_u32(&mut self, val: u32) {
        assert!(self.cursor + 4 <= self.current().size, "code cache overrun");
        let addr = self.transl_addr();
        unsafe { (addr as *mut u32).write_unaligned(val) };
        self.cursor += 4;
    }

    pub fn emit_bytes(&mut self, data: &[u8]) {
        assert!(
            self.cursor + data.len() <= self.current().size,
            "code cache overrun"
        );
        let addr = self.transl_addr();
        unsafe { ptr::copy_nonoverlapping(data.as_ptr(), addr as *mut u8, data.len()) };
        self.cursor += data.len();
    }

    // -- Patching --

    /// Overwrite one word at an absolute address inside the cache.
    /// Used for trampoline backpatching and unit chaining.
    pub fn patch_u32(&mut self, addr: usize, val: u32) {
        assert!(self.contains(addr), "patch outside code cache");
        unsafe { (addr as *mut u32).write_unaligned(val) };
    }

    /// Read one word back from the cache.
    pub fn read_u32(&self, addr: usize) -> u32 {
        assert!(self.contains(addr), "read outside code cache");
        unsafe { (addr as *const u32).read_unaligned() }
    }

    // -- Permission management (W^X) --

    /// Make every region executable and non-writable.
    pub fn set_executable(&self) -> io::Result<()> {
        for r in &self.regions {
            r.protect(libc::PROT_READ | libc::PROT_EXEC)?;
        }
        Ok(())
    }

    /// Make every region writable and non-executable.
    pub fn set_writable(&self) -> io::Result<()> {
        for r in &self.regions {
            r.protect(libc::PROT_READ | libc::PROT_WRITE)?;
        }
        Ok(())
    }
}

fn page_size() -> usize {
    // SAFETY: sysconf is always safe to call.
    unsafe { libc::sysconf(libc::_SC_PAGESIZE) as usize }
}
