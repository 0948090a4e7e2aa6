//! Bounded-retry handshake with the hardware over an async-status slot.
//!
//! Issuing a command arms the status slot with the sentinel and writes the
//! trigger slots once. The hardware answers by replacing the sentinel. Each
//! control cycle performs exactly one [`AsyncCommand::poll`], which reads the
//! status slot once; the retry budget is therefore counted in cycles and the
//! controller never sleeps.
//!
//! With `max_retries = N` the status slot is read at most `N + 1` times. Once a
//! terminal result has been produced further polls return it without reading.

use freedrive_common::slots::{ASYNC_WAITING, CommandSlot, WriteGuard};

/// Outcome of a single poll.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AsyncPoll {
    /// Sentinel still present, budget left.
    Pending,
    /// Hardware replaced the sentinel with this value.
    Resolved(f64),
    /// Budget exhausted with the sentinel still present.
    TimedOut,
}

impl AsyncPoll {
    /// No further polling will change the outcome.
    #[inline]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// Polling session for one issued command. `Copy`, no heap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AsyncCommand {
    sentinel: f64,
    attempts: u32,
    max_retries: u32,
    state: AsyncPoll,
}

impl AsyncCommand {
    /// Arm `status` with `sentinel`, then write every `(slot, value)` trigger once.
    pub fn issue(
        guard: &WriteGuard<'_>,
        status: &CommandSlot,
        sentinel: f64,
        triggers: &[(&CommandSlot, f64)],
        max_retries: u32,
    ) -> Self {
        status.write(guard, sentinel);
        for (slot, value) in triggers {
            slot.write(guard, *value);
        }
        Self::armed(sentinel, max_retries)
    }

    /// Session for a command another party already armed.
    pub const fn armed(sentinel: f64, max_retries: u32) -> Self {
        Self {
            sentinel,
            attempts: 0,
            max_retries,
            state: AsyncPoll::Pending,
        }
    }

    /// Session armed with [`ASYNC_WAITING`].
    pub const fn waiting(max_retries: u32) -> Self {
        Self::armed(ASYNC_WAITING, max_retries)
    }

    /// One status read, at most once per control cycle.
    #[inline]
    pub fn poll(&mut self, read: impl FnOnce() -> f64) -> AsyncPoll {
        if self.state.is_terminal() {
            return self.state;
        }
        let value = read();
        if value != self.sentinel {
            self.state = AsyncPoll::Resolved(value);
        } else {
            self.attempts += 1;
            if self.attempts > self.max_retries {
                self.state = AsyncPoll::TimedOut;
            }
        }
        self.state
    }

    /// Pending reads so far.
    #[inline]
    pub const fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Latest result.
    #[inline]
    pub const fn state(&self) -> AsyncPoll {
        self.state
    }
}
