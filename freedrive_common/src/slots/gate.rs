//! Single-writer arbitration for Command slots.
//!
//! Both the RT update and the non-RT goal callbacks write Command slots. The
//! gate makes those writes mutually exclusive without ever blocking the RT
//! side: [`WriteGate::try_rt`] is one CAS and gives up immediately, while
//! [`WriteGate::lock_host`] spins and then yields until the gate is free.
//!
//! A [`WriteGuard`] is the only way to obtain write access to a command slot;
//! dropping it releases the gate.

use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};

const FREE: u8 = 0;
const RT: u8 = 1;
const HOST: u8 = 2;

/// Spins before the host side starts yielding its time slice.
const HOST_SPIN_LIMIT: u32 = 64;

/// Current holder of the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum GateOwner {
    /// Nobody holds the gate.
    Free = FREE,
    /// The RT update holds the gate.
    Rt = RT,
    /// A non-RT callback holds the gate.
    Host = HOST,
}

impl GateOwner {
    /// Decode the raw gate state.
    pub const fn from_u8(v: u8) -> Option<Self> {
        match v {
            FREE => Some(Self::Free),
            RT => Some(Self::Rt),
            HOST => Some(Self::Host),
            _ => None,
        }
    }
}

/// Write arbitration between the RT and non-RT domains.
#[derive(Debug, Default)]
pub struct WriteGate {
    state: AtomicU8,
    rt_contended: AtomicU64,
}

impl WriteGate {
    /// Free gate.
    pub const fn new() -> Self {
        Self {
            state: AtomicU8::new(FREE),
            rt_contended: AtomicU64::new(0),
        }
    }

    /// RT acquisition. Never waits; `None` if the host holds the gate.
    #[inline]
    pub fn try_rt(&self) -> Option<WriteGuard<'_>> {
        match self
            .state
            .compare_exchange(FREE, RT, Ordering::Acquire, Ordering::Relaxed)
        {
            Ok(_) => Some(WriteGuard {
                gate: self,
                owner: GateOwner::Rt,
            }),
            Err(_) => {
                self.rt_contended.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Host acquisition. Spins briefly, then yields until the gate is free.
    pub fn lock_host(&self) -> WriteGuard<'_> {
        let mut spins = 0u32;
        loop {
            if self
                .state
                .compare_exchange_weak(FREE, HOST, Ordering::Acquire, Ordering::Relaxed)
                .is_ok()
            {
                return WriteGuard {
                    gate: self,
                    owner: GateOwner::Host,
                };
            }
            if spins < HOST_SPIN_LIMIT {
                spins += 1;
                std::hint::spin_loop();
            } else {
                std::thread::yield_now();
            }
        }
    }

    /// Current holder.
    pub fn owner(&self) -> GateOwner {
        GateOwner::from_u8(self.state.load(Ordering::Relaxed)).unwrap_or(GateOwner::Free)
    }

    /// Number of RT acquisitions that found the gate busy.
    pub fn rt_contended(&self) -> u64 {
        self.rt_contended.load(Ordering::Relaxed)
    }
}

/// Proof of exclusive write access to Command slots.
#[derive(Debug)]
pub struct WriteGuard<'a> {
    gate: &'a WriteGate,
    owner: GateOwner,
}

impl WriteGuard<'_> {
    /// Side holding the gate.
    pub fn owner(&self) -> GateOwner {
        self.owner
    }

    /// Whether this guard was taken on `gate`.
    #[inline]
    pub fn guards(&self, gate: &WriteGate) -> bool {
        std::ptr::eq(self.gate, gate)
    }
}

impl Drop for WriteGuard<'_> {
    fn drop(&mut self) {
        self.gate.state.store(FREE, Ordering::Release);
    }
}
