//! Countermeasure controller.
//!
//! Each countermeasure has an enable/disable pair and, where applicable, a
//! size or period. The driver enforces the capability gates and the
//! parameter rules it can check locally; everything else is the hardware's
//! call, surfaced through the error field. On secure builds the hardware
//! may refuse to *disable* shuffling, XY-shuffling, the AXI scalar mask or
//! the token; those paths deliberately do not fail (the refusal is logged
//! and the raw flags stay readable through [`Ecc::error_flags`]).

use log::{debug, warn};

use crate::error::{self, Error};
use crate::regs::{self, AxiMaskReg, BlindingReg, EnableReg, ZremaskReg};
use crate::Ecc;

impl Ecc {
    /// Enables scalar blinding with a random multiple of `size_bits` bits.
    /// A size of zero disables blinding instead. Sizes at or above the
    /// current prime size come back as a BLN hardware error.
    pub fn enable_blinding(&self, size_bits: u32) -> Result<(), Error> {
        error::busy_wait(&self.mmio);
        let reg = if size_bits == 0 {
            BlindingReg(0)
        } else {
            BlindingReg(0).with_enable(true).with_size(size_bits)
        };
        self.mmio.set(regs::BLINDING, reg);
        error::busy_wait(&self.mmio);
        error::check(&self.mmio)
    }

    pub fn disable_blinding(&self) -> Result<(), Error> {
        self.enable_blinding(0)
    }

    /// Enables large-number memory shuffling. Fails up front when the
    /// build does not carry the shuffling unit.
    pub fn enable_shuffling(&self) -> Result<(), Error> {
        if !self.caps.shuffle {
            return Err(Error::ShuffleUnsupported);
        }
        error::busy_wait(&self.mmio);
        self.mmio.set(regs::SHUFFLE, EnableReg(0).with_enable(true));
        error::busy_wait(&self.mmio);
        error::check(&self.mmio)
    }

    /// Asks the hardware to stop shuffling. Secure builds may refuse; the
    /// call still succeeds (see the module docs).
    pub fn disable_shuffling(&self) -> Result<(), Error> {
        error::busy_wait(&self.mmio);
        self.mmio.set(regs::SHUFFLE, EnableReg(0));
        error::busy_wait(&self.mmio);
        error::note(&self.mmio);
        Ok(())
    }

    /// Enables periodic Z-remasking every `period` iterations. The
    /// hardware takes the period minus one; a period of zero is rejected
    /// here as a logged no-op.
    pub fn enable_zremask(&self, period: u32) -> Result<(), Error> {
        if period == 0 {
            warn!("ignoring Z-remask request with period 0");
            return Ok(());
        }
        if period - 1 > u16::MAX as u32 {
            return Err(Error::ZremaskPeriod(period));
        }
        error::busy_wait(&self.mmio);
        let reg = ZremaskReg(0).with_enable(true).with_period((period - 1) as u16);
        self.mmio.set(regs::ZREMASK, reg);
        error::busy_wait(&self.mmio);
        error::check(&self.mmio)
    }

    pub fn disable_zremask(&self) -> Result<(), Error> {
        error::busy_wait(&self.mmio);
        self.mmio.set(regs::ZREMASK, ZremaskReg(0));
        error::busy_wait(&self.mmio);
        error::check(&self.mmio)
    }

    /// Enables the XY-coordinate address shuffle between the co-Z phases.
    pub fn enable_xyshuf(&self) -> Result<(), Error> {
        error::busy_wait(&self.mmio);
        self.mmio.set(regs::DBG_CFG_XYSHUF, EnableReg(0).with_enable(true));
        error::busy_wait(&self.mmio);
        error::check(&self.mmio)
    }

    pub fn disable_xyshuf(&self) -> Result<(), Error> {
        error::busy_wait(&self.mmio);
        self.mmio.set(regs::DBG_CFG_XYSHUF, EnableReg(0));
        error::busy_wait(&self.mmio);
        error::note(&self.mmio);
        Ok(())
    }

    /// Enables on-the-fly XOR masking of the scalar as it crosses the bus.
    pub fn enable_aximsk(&self) -> Result<(), Error> {
        error::busy_wait(&self.mmio);
        self.mmio.set(regs::DBG_CFG_AXIMSK, AxiMaskReg(0).with_enable(true));
        error::busy_wait(&self.mmio);
        error::check(&self.mmio)
    }

    pub fn disable_aximsk(&self) -> Result<(), Error> {
        error::busy_wait(&self.mmio);
        self.mmio.set(regs::DBG_CFG_AXIMSK, AxiMaskReg(0));
        error::busy_wait(&self.mmio);
        error::note(&self.mmio);
        Ok(())
    }

    /// Enables result-token whitening of [k]P outputs.
    pub fn enable_token(&self) -> Result<(), Error> {
        error::busy_wait(&self.mmio);
        self.mmio.set(regs::DBG_CFG_TOKEN, EnableReg(0).with_enable(true));
        error::busy_wait(&self.mmio);
        error::check(&self.mmio)
    }

    pub fn disable_token(&self) -> Result<(), Error> {
        error::busy_wait(&self.mmio);
        self.mmio.set(regs::DBG_CFG_TOKEN, EnableReg(0));
        error::busy_wait(&self.mmio);
        error::note(&self.mmio);
        Ok(())
    }

    /// Restricts the scalar to `bits` bits for the next [k]P runs; zero
    /// restores full-width scalars.
    pub fn set_small_scalar_size(&self, bits: u32) -> Result<(), Error> {
        if bits > self.nn() {
            return Err(Error::ScalarSize(bits));
        }
        error::busy_wait(&self.mmio);
        self.mmio.set(regs::SMALL_SCALAR, bits);
        error::busy_wait(&self.mmio);
        error::check(&self.mmio)
    }

    /// Reconfigures the prime size on dynamic-nn builds. On static builds
    /// this is a logged no-op; the IP keeps running at `nn_max`.
    pub(crate) fn set_nn(&self, bits: u32) -> Result<(), Error> {
        if !self.caps.dynamic_nn {
            debug!("static-nn build, keeping nn = {}", self.nn());
            return Ok(());
        }
        if bits < 2 * self.caps.ww() || bits > self.caps.nn_max {
            return Err(Error::PrimeSize(bits));
        }
        error::busy_wait(&self.mmio);
        self.mmio.set(regs::PRIME_SIZE, bits);
        // The IP re-derives its Montgomery constants and limb geometry.
        error::busy_wait(&self.mmio);
        error::check(&self.mmio)
    }

    /// Optional interrupt line. The driver never waits on it; polling
    /// callers can leave it off.
    pub fn enable_irq(&self) -> Result<(), Error> {
        error::busy_wait(&self.mmio);
        self.mmio.set(regs::IRQ, EnableReg(0).with_enable(true));
        error::busy_wait(&self.mmio);
        error::check(&self.mmio)
    }

    pub fn disable_irq(&self) -> Result<(), Error> {
        error::busy_wait(&self.mmio);
        self.mmio.set(regs::IRQ, EnableReg(0));
        error::busy_wait(&self.mmio);
        error::check(&self.mmio)
    }
}
