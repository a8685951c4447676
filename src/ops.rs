//! Command sequencer for the point operations.
//!
//! Every operation follows the same bracket: wait not-busy, stage the
//! operands, strobe the single command bit, wait not-busy, check the error
//! field, collect the result. Operand staging saves and restores the two
//! point-at-infinity flags with an unconditional write pattern, so the
//! MMIO trace of an operation does not depend on the flag state.
//!
//! [k]P adds the result-token protocol on top: a fresh token is requested
//! and read out before the operands go in, and XORed into both result
//! coordinates afterwards. The local token copy is zeroized as soon as it
//! has been consumed.

use zeroize::Zeroizing;

use crate::error::{self, Error};
use crate::regs::{self, CtrlReg, PointNullReg};
use crate::trace::KpTrace;
use crate::xfer::Slot;
use crate::Ecc;

/// Affine coordinates of a result point, each `ceil(nn/8)` bytes,
/// big-endian.
pub type Point = (Vec<u8>, Vec<u8>);

impl Ecc {
    fn saved_null_flags(&self) -> (bool, bool) {
        let st = self.mmio.get(regs::STATUS);
        (st.r0_is_null(), st.r1_is_null())
    }

    /// Writes both flag registers regardless of which operands were
    /// staged; the access count must not depend on the flag values.
    fn restore_null_flags(&self, flags: (bool, bool)) {
        self.mmio.set(regs::R0_NULL, PointNullReg(0).with_null(flags.0));
        self.mmio.set(regs::R1_NULL, PointNullReg(0).with_null(flags.1));
    }

    fn command(&self, ctrl: CtrlReg) -> Result<(), Error> {
        self.mmio.set(regs::CTRL, ctrl);
        error::busy_wait(&self.mmio);
        error::check(&self.mmio)
    }

    /// Reads the is-null flag of working point `idx` (0 or 1).
    pub fn point_iszero(&self, idx: u8) -> Result<bool, Error> {
        error::busy_wait(&self.mmio);
        let st = self.mmio.get(regs::STATUS);
        Ok(match idx {
            0 => st.r0_is_null(),
            _ => st.r1_is_null(),
        })
    }

    /// Marks working point `idx` as the point at infinity.
    pub fn point_zero(&self, idx: u8) -> Result<(), Error> {
        error::busy_wait(&self.mmio);
        let reg = if idx == 0 { regs::R0_NULL } else { regs::R1_NULL };
        self.mmio.set(reg, PointNullReg(0).with_null(true));
        error::check(&self.mmio)
    }

    /// Clears the is-null flag of working point `idx`.
    pub fn point_unzero(&self, idx: u8) -> Result<(), Error> {
        error::busy_wait(&self.mmio);
        let reg = if idx == 0 { regs::R0_NULL } else { regs::R1_NULL };
        self.mmio.set(reg, PointNullReg(0));
        error::check(&self.mmio)
    }

    /// Loads the curve: y² = x³ + ax + b mod p, with order q. On
    /// dynamic-nn builds the prime size follows the bit length of `p`.
    pub fn set_curve(&self, a: &[u8], b: &[u8], p: &[u8], q: &[u8]) -> Result<(), Error> {
        error::busy_wait(&self.mmio);
        self.set_nn(crate::bignum::bit_len(p))?;
        self.write_bignum(p, Slot::P)?;
        self.write_bignum(a, Slot::A)?;
        self.write_bignum(b, Slot::B)?;
        self.write_bignum(q, Slot::Q)?;
        Ok(())
    }

    /// Tests whether `(x, y)` satisfies the curve equation.
    pub fn is_on_curve(&self, x: &[u8], y: &[u8]) -> Result<bool, Error> {
        error::busy_wait(&self.mmio);
        let flags = self.saved_null_flags();
        self.write_bignum(x, Slot::R0x)?;
        self.write_bignum(y, Slot::R0y)?;
        self.restore_null_flags(flags);
        self.command(CtrlReg(0).with_chk(true))?;
        Ok(self.mmio.get(regs::STATUS).yes())
    }

    /// Tests whether the two points are equal.
    pub fn points_are_equal(
        &self,
        x0: &[u8],
        y0: &[u8],
        x1: &[u8],
        y1: &[u8],
    ) -> Result<bool, Error> {
        self.two_point_predicate(x0, y0, x1, y1, CtrlReg(0).with_equ(true))
    }

    /// Tests whether the two points are opposite (P = -Q).
    pub fn points_are_opposite(
        &self,
        x0: &[u8],
        y0: &[u8],
        x1: &[u8],
        y1: &[u8],
    ) -> Result<bool, Error> {
        self.two_point_predicate(x0, y0, x1, y1, CtrlReg(0).with_opp(true))
    }

    fn two_point_predicate(
        &self,
        x0: &[u8],
        y0: &[u8],
        x1: &[u8],
        y1: &[u8],
        ctrl: CtrlReg,
    ) -> Result<bool, Error> {
        error::busy_wait(&self.mmio);
        let flags = self.saved_null_flags();
        self.write_bignum(x0, Slot::R0x)?;
        self.write_bignum(y0, Slot::R0y)?;
        self.write_bignum(x1, Slot::R1x)?;
        self.write_bignum(y1, Slot::R1y)?;
        self.restore_null_flags(flags);
        self.command(ctrl)?;
        Ok(self.mmio.get(regs::STATUS).yes())
    }

    /// Computes -P.
    pub fn neg(&self, x: &[u8], y: &[u8]) -> Result<Point, Error> {
        self.unary_point_op(x, y, CtrlReg(0).with_neg(true))
    }

    /// Computes [2]P.
    pub fn dbl(&self, x: &[u8], y: &[u8]) -> Result<Point, Error> {
        self.unary_point_op(x, y, CtrlReg(0).with_dbl(true))
    }

    fn unary_point_op(&self, x: &[u8], y: &[u8], ctrl: CtrlReg) -> Result<Point, Error> {
        error::busy_wait(&self.mmio);
        let flags = self.saved_null_flags();
        self.write_bignum(x, Slot::R0x)?;
        self.write_bignum(y, Slot::R0y)?;
        self.restore_null_flags(flags);
        self.command(ctrl)?;
        self.read_result()
    }

    /// Computes P + Q.
    pub fn add(
        &self,
        x0: &[u8],
        y0: &[u8],
        x1: &[u8],
        y1: &[u8],
    ) -> Result<Point, Error> {
        error::busy_wait(&self.mmio);
        let flags = self.saved_null_flags();
        self.write_bignum(x0, Slot::R0x)?;
        self.write_bignum(y0, Slot::R0y)?;
        self.write_bignum(x1, Slot::R1x)?;
        self.write_bignum(y1, Slot::R1y)?;
        self.restore_null_flags(flags);
        self.command(CtrlReg(0).with_add(true))?;
        self.read_result()
    }

    /// Computes [k]P.
    ///
    /// `trace` captures the step-by-step execution when the `kp-trace`
    /// feature is compiled in; `zmask` overrides the Z-mask drawn during
    /// setup when `z-mask` is compiled in. Either argument is accepted and
    /// ignored when its feature is absent, so the signature never changes.
    pub fn mul(
        &self,
        x: &[u8],
        y: &[u8],
        k: &[u8],
        trace: Option<&mut KpTrace>,
        zmask: Option<&[u8]>,
    ) -> Result<Point, Error> {
        error::busy_wait(&self.mmio);

        // Fresh token first: ask, wait for generation, pull the copy.
        self.mmio.set(regs::TOKEN, 1);
        error::busy_wait(&self.mmio);
        let token = Zeroizing::new(self.read_bignum(Slot::Token)?);

        let flags = self.saved_null_flags();
        self.write_bignum(k, Slot::Scalar)?;
        self.write_bignum(x, Slot::R1x)?;
        self.write_bignum(y, Slot::R1y)?;
        self.restore_null_flags(flags);

        #[cfg(any(feature = "kp-trace", feature = "z-mask"))]
        let engine = crate::trace::Engine::arm(self, trace, zmask)?;
        #[cfg(not(any(feature = "kp-trace", feature = "z-mask")))]
        let _ = (trace, zmask);

        self.mmio.set(regs::CTRL, CtrlReg(0).with_kp(true));

        #[cfg(any(feature = "kp-trace", feature = "z-mask"))]
        match engine {
            Some(engine) => engine.run()?,
            None => error::busy_wait(&self.mmio),
        }
        #[cfg(not(any(feature = "kp-trace", feature = "z-mask")))]
        error::busy_wait(&self.mmio);

        error::check(&self.mmio)?;

        let (mut rx, mut ry) = self.read_result()?;
        unmask(&mut rx, &token);
        unmask(&mut ry, &token);
        Ok((rx, ry))
    }

    fn read_result(&self) -> Result<Point, Error> {
        let x = self.read_bignum(Slot::R1x)?;
        let y = self.read_bignum(Slot::R1y)?;
        Ok((x, y))
    }
}

/// Straight byte-wise XOR, data independent.
fn unmask(coord: &mut [u8], token: &[u8]) {
    for (b, t) in coord.iter_mut().zip(token.iter()) {
        *b ^= t;
    }
}
