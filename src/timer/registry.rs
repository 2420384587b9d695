//! Compare-slot registry

use crate::{Error, Result};

/// Callback invoked from the TIMER interrupt with the matched channel
pub type CompareCallback = fn(usize);

/// One compare channel's registration
#[derive(Clone, Copy, Debug, Default)]
pub struct CompareSlot {
    reload: u32,
    callback: Option<CompareCallback>,
}

impl CompareSlot {
    /// Unused channel
    pub const EMPTY: Self = Self {
        reload: 0,
        callback: None,
    };

    /// Ticks added to the compare register after each match
    #[must_use]
    pub const fn reload(&self) -> u32 {
        self.reload
    }

    /// Registered callback
    #[must_use]
    pub const fn callback(&self) -> Option<CompareCallback> {
        self.callback
    }

    /// Channel has a callback
    #[must_use]
    pub const fn is_registered(&self) -> bool {
        self.callback.is_some()
    }
}

/// Fixed-size table of compare slots, one per CC register
#[derive(Clone, Debug)]
pub struct SlotRegistry<const N: usize> {
    slots: [CompareSlot; N],
}

impl<const N: usize> SlotRegistry<N> {
    /// Create a registry with every channel unused
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: [CompareSlot::EMPTY; N],
        }
    }

    /// Number of channels
    #[must_use]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Claim a channel with a reload increment and callback
    ///
    /// # Errors
    ///
    /// [`Error::InvalidChannel`] when `channel` is past the table.
    pub fn register(&mut self, channel: usize, reload: u32, callback: CompareCallback) -> Result<()> {
        let slot = self.slot_mut(channel)?;
        slot.reload = reload;
        slot.callback = Some(callback);
        Ok(())
    }

    /// Free a channel
    ///
    /// # Errors
    ///
    /// [`Error::InvalidChannel`] when `channel` is past the table.
    pub fn release(&mut self, channel: usize) -> Result<()> {
        *self.slot_mut(channel)? = CompareSlot::EMPTY;
        Ok(())
    }

    /// Registration of a channel
    ///
    /// # Errors
    ///
    /// [`Error::InvalidChannel`] when `channel` is past the table.
    pub fn get(&self, channel: usize) -> Result<&CompareSlot> {
        self.slots.get(channel).ok_or(Error::InvalidChannel(channel))
    }

    /// Channels in ascending order
    pub fn iter(&self) -> impl Iterator<Item = (usize, &CompareSlot)> {
        self.slots.iter().enumerate()
    }

    fn slot_mut(&mut self, channel: usize) -> Result<&mut CompareSlot> {
        self.slots
            .get_mut(channel)
            .ok_or(Error::InvalidChannel(channel))
    }
}

impl<const N: usize> Default for SlotRegistry<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_: usize) {}

    #[test]
    fn register_and_release() {
        let mut reg = SlotRegistry::<4>::new();
        assert!(reg.register(2, 500, noop).is_ok());
        assert!(reg.get(2).is_ok_and(CompareSlot::is_registered));
        assert_eq!(reg.get(2).map(CompareSlot::reload), Ok(500));

        assert!(reg.release(2).is_ok());
        assert!(reg.get(2).is_ok_and(|slot| !slot.is_registered() && slot.reload() == 0));
    }

    #[test]
    fn out_of_range_channel_is_an_error() {
        let mut reg = SlotRegistry::<4>::new();
        assert_eq!(reg.register(4, 1, noop), Err(Error::InvalidChannel(4)));
        assert_eq!(reg.release(9), Err(Error::InvalidChannel(9)));
        assert!(reg.get(4).is_err());
    }
}
