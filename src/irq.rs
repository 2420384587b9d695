//! Interrupt shim
//!
//! Drivers live in an [`IrqCell`]: a `critical_section::Mutex` around an
//! optional driver. Mainline code and the interrupt handler both reach the
//! driver through [`IrqCell::with`], so a slot-table update can never be
//! observed half-written by the handler.
//!
//! ```text
//! static SERVOS: IrqCell<Scheduler> = IrqCell::new();
//!
//! fn TIMER2() { SERVOS.on_interrupt(0); }      // handler
//! SERVOS.with(|s| s.write(handle, 90));        // mainline
//! ```

use core::cell::RefCell;

use critical_section::Mutex;

/// A driver that services a hardware interrupt
pub trait InterruptHandler {
    /// Which line or sub-unit fired (e.g. servo bank index)
    type Source: Copy;

    /// Service the interrupt
    fn on_interrupt(&mut self, source: Self::Source);
}

/// Critical-section guarded driver slot
pub struct IrqCell<D> {
    inner: Mutex<RefCell<Option<D>>>,
}

impl<D> IrqCell<D> {
    /// Create an empty cell, usable in a `static`
    #[must_use]
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(None)),
        }
    }

    /// Store a driver, returning the one it replaces
    ///
    /// While the cell is in use the new driver is handed straight back.
    pub fn install(&self, driver: D) -> Option<D> {
        critical_section::with(|cs| match self.inner.borrow(cs).try_borrow_mut() {
            Ok(mut slot) => slot.replace(driver),
            Err(_) => Some(driver),
        })
    }

    /// Remove the driver
    pub fn take(&self) -> Option<D> {
        critical_section::with(|cs| {
            self.inner
                .borrow(cs)
                .try_borrow_mut()
                .ok()
                .and_then(|mut slot| slot.take())
        })
    }

    /// Check if a driver is installed
    ///
    /// Also true while the driver is in use further up the stack.
    #[must_use]
    pub fn is_installed(&self) -> bool {
        critical_section::with(|cs| {
            self.inner
                .borrow(cs)
                .try_borrow()
                .map_or(true, |driver| driver.is_some())
        })
    }

    /// Run `f` on the driver inside a critical section
    ///
    /// Returns None when no driver is installed, or when called from code
    /// that already holds the driver (e.g. a compare callback dispatched
    /// by [`on_interrupt`](Self::on_interrupt)).
    pub fn with<R>(&self, f: impl FnOnce(&mut D) -> R) -> Option<R> {
        critical_section::with(|cs| {
            let Ok(mut driver) = self.inner.borrow(cs).try_borrow_mut() else {
                trace!("driver already borrowed");
                return None;
            };
            driver.as_mut().map(f)
        })
    }
}

impl<D: InterruptHandler> IrqCell<D> {
    /// Dispatch an interrupt to the installed driver
    ///
    /// An interrupt that fires before installation is ignored.
    pub fn on_interrupt(&self, source: D::Source) {
        if self.with(|driver| driver.on_interrupt(source)).is_none() {
            trace!("interrupt with no driver installed");
        }
    }
}

impl<D> Default for IrqCell<D> {
    fn default() -> Self {
        Self::new()
    }
}
