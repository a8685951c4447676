//! Register-window protocol: slot selection and big-number streaming.
//!
//! The IP exposes its large-number memory through one control register and
//! two data registers. A transfer selects the target slot and direction,
//! then pushes or pops the exact word count for the current prime size.
//! The scalar and the token have no slot of their own: they ride on R0.X's
//! physical index, distinguished by the write-scalar and read-token control
//! bits.

use crate::bignum;
use crate::error::{self, Error};
use crate::regs::{self, CtrlReg};
use crate::Ecc;

/// Named big-number slots. `Scalar` and `Token` alias `R0x`'s index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Slot {
    P,
    A,
    B,
    Q,
    R0x,
    R0y,
    R1x,
    R1y,
    Scalar,
    Token,
}

impl Slot {
    fn index(self) -> u16 {
        match self {
            Slot::P => 0,
            Slot::A => 1,
            Slot::B => 2,
            Slot::Q => 3,
            Slot::R0x | Slot::Scalar | Slot::Token => 4,
            Slot::R0y => 5,
            Slot::R1x => 6,
            Slot::R1y => 7,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub(crate) enum Dir {
    Read,
    Write,
}

impl Ecc {
    /// Points the register window at `slot`. BUSY must be clear on entry
    /// and is clear again on return.
    pub(crate) fn select(&self, slot: Slot, dir: Dir) {
        error::busy_wait(&self.mmio);
        let mut ctrl = CtrlReg(0).with_nb_addr(slot.index());
        match dir {
            Dir::Write => ctrl.set_write_nb(true),
            Dir::Read => ctrl.set_read_nb(true),
        }
        if slot == Slot::Scalar && dir == Dir::Write {
            ctrl.set_write_scalar(true);
        }
        if slot == Slot::Token && dir == Dir::Read {
            ctrl.set_read_token(true);
        }
        self.mmio.set(regs::CTRL, ctrl);
        error::busy_wait(&self.mmio);
    }

    fn wire_bytes(&self) -> usize {
        if self.caps.wire64 { 8 } else { 4 }
    }

    /// Streams a big-endian byte array into `slot`. Scalar writes first
    /// block on the masking-randomness handshake, so the scalar never
    /// enters the IP unmasked.
    pub(crate) fn write_bignum(&self, bytes: &[u8], slot: Slot) -> Result<(), Error> {
        let nn_bytes = bignum::nn_bytes(self.nn());
        if bytes.len() > nn_bytes {
            return Err(Error::OperandTooLarge { got: bytes.len(), max: nn_bytes });
        }
        if slot == Slot::Scalar {
            error::wk_random_wait(&self.mmio);
        }
        self.select(slot, Dir::Write);
        for word in bignum::pack(bytes, nn_bytes, self.wire_bytes()) {
            self.mmio.push(regs::WRITE_DATA, word);
        }
        error::busy_wait(&self.mmio);
        error::check(&self.mmio)
    }

    /// Streams `slot` out into a full-width big-endian byte array.
    pub(crate) fn read_bignum(&self, slot: Slot) -> Result<Vec<u8>, Error> {
        let nn_bytes = bignum::nn_bytes(self.nn());
        self.select(slot, Dir::Read);
        let count = bignum::word_count(nn_bytes, self.wire_bytes());
        let mut words = Vec::with_capacity(count);
        for _ in 0..count {
            words.push(self.mmio.pop(regs::READ_DATA));
        }
        error::busy_wait(&self.mmio);
        error::check(&self.mmio)?;
        Ok(bignum::unpack(&words, nn_bytes, self.wire_bytes()))
    }
}
