//! Attack-level presets.
//!
//! Four coherent security postures for side-channel experimentation, each
//! a fixed sequence of attack-config writes, a handful of microcode
//! patches at named landmarks, and the matching AXI/shift-register mask
//! settings:
//!
//! * level 0: naive double-and-add, not constant time;
//! * level 1: constant-time ladder, no masking extras;
//! * level 2: level 1 plus anti-address-bit-DPA (AXI scalar masking);
//! * level 3: level 2 plus kappa/kappa' shift-register masking and
//!   symmetric operand addressing in ZADDU/ZADDC.
//!
//! The whole preset requires the controller halted or idle; the first
//! failing step aborts it. Re-applying a level is idempotent: every write
//! is absolute.

use log::info;

use crate::debug::pc;
use crate::error::{self, Error};
use crate::regs::{self, AtkCfg0Reg, AtkCfg1Reg, AtkCfg2Reg, AxiMaskReg};
use crate::Ecc;

/// One opcode overlay at a named landmark.
struct Patch {
    addr: u16,
    msb: u32,
    lsb: u32,
}

// The shipped (hardened) opcodes at the patchable landmarks, and their
// weakened stand-ins. The weak phi draws load the constant one instead of
// pulling from the TRNG; the weak kappa sample skips the shift-register
// mask; the weak jump takes the data-dependent branch into ZDBL.
const PHI0_DRAW_RND: Patch = Patch { addr: pc::DRAW_PHI0, msb: 0x0000_0021, lsb: 0x1a40_0a00 };
const PHI0_LOAD_ONE: Patch = Patch { addr: pc::DRAW_PHI0, msb: 0x0000_0010, lsb: 0x1a40_0a01 };
const PHI1_DRAW_RND: Patch = Patch { addr: pc::DRAW_PHI1, msb: 0x0000_0021, lsb: 0x1a40_0b00 };
const PHI1_LOAD_ONE: Patch = Patch { addr: pc::DRAW_PHI1, msb: 0x0000_0010, lsb: 0x1a40_0b01 };
const KAPPA_LSB_MASKED: Patch = Patch { addr: pc::KAPPA_LSB, msb: 0x0000_0042, lsb: 0x2c11_0400 };
const KAPPA_LSB_PLAIN: Patch = Patch { addr: pc::KAPPA_LSB, msb: 0x0000_0040, lsb: 0x2c11_0000 };
const ZDBL_JUMP_BALANCED: Patch = Patch { addr: pc::JUMP_ZDBL, msb: 0x0000_0081, lsb: 0x3f00_8000 };
const ZDBL_JUMP_NAIVE: Patch = Patch { addr: pc::JUMP_ZDBL, msb: 0x0000_0080, lsb: 0x3f00_8080 };
const ZADDU_SYM_OPERANDS: Patch = Patch { addr: pc::ZADDU, msb: 0x0000_0105, lsb: 0x4450_0a0a };
const ZADDU_PLAIN_OPERANDS: Patch = Patch { addr: pc::ZADDU, msb: 0x0000_0104, lsb: 0x4450_0a06 };
const ZADDC_SYM_OPERANDS: Patch = Patch { addr: pc::ZADDC, msb: 0x0000_0125, lsb: 0x4468_0b0b };
const ZADDC_PLAIN_OPERANDS: Patch = Patch { addr: pc::ZADDC, msb: 0x0000_0124, lsb: 0x4468_0b07 };

impl Ecc {
    fn apply_patch(&self, patch: &Patch) -> Result<(), Error> {
        let opsz = if self.caps.opcode_word64 { 2 } else { 1 };
        self.patch_one_opcode(patch.addr as u32, patch.msb, patch.lsb, opsz)
    }

    /// Applies one of the four attack levels. The hardware enforces its
    /// own constraints; the driver only sequences the writes and stops at
    /// the first refusal.
    pub fn attack_set_level(&self, level: u8) -> Result<(), Error> {
        self.require_debug()?;
        self.require_halted_or_idle()?;
        info!("applying attack level {level}");
        match level {
            0 => {
                self.mmio.set(
                    regs::DBG_ATK_CFG0,
                    AtkCfg0Reg(0).with_not_always_add(true).with_no_collision_cm(true),
                );
                self.mmio.set(regs::DBG_ATK_CFG1, AtkCfg1Reg(0).with_no_nnrnd_shift(true));
                error::check(&self.mmio)?;
                self.apply_patch(&PHI0_LOAD_ONE)?;
                self.apply_patch(&PHI1_LOAD_ONE)?;
                self.apply_patch(&KAPPA_LSB_PLAIN)?;
                self.apply_patch(&ZDBL_JUMP_NAIVE)?;
                self.mmio.set(regs::DBG_CFG_AXIMSK, AxiMaskReg(0));
                error::check(&self.mmio)
            }
            1 => {
                self.constant_time_base()?;
                self.mmio.set(regs::DBG_CFG_AXIMSK, AxiMaskReg(0));
                error::check(&self.mmio)
            }
            2 => {
                self.constant_time_base()?;
                self.mmio.set(regs::DBG_CFG_AXIMSK, AxiMaskReg(0).with_enable(true));
                error::check(&self.mmio)
            }
            3 => {
                self.constant_time_base()?;
                self.apply_patch(&ZADDU_SYM_OPERANDS)?;
                self.apply_patch(&ZADDC_SYM_OPERANDS)?;
                self.mmio.set(
                    regs::DBG_CFG_AXIMSK,
                    AxiMaskReg(0)
                        .with_enable(true)
                        .with_kappa_msk(true)
                        .with_kappa_p_msk(true),
                );
                error::check(&self.mmio)
            }
            other => Err(Error::AttackLevel(other)),
        }
    }

    /// The shared level-1 baseline: kill switches off, hardened opcodes
    /// back in place, plain operand addressing.
    fn constant_time_base(&self) -> Result<(), Error> {
        self.mmio.set(regs::DBG_ATK_CFG0, AtkCfg0Reg(0));
        self.mmio.set(regs::DBG_ATK_CFG1, AtkCfg1Reg(0));
        error::check(&self.mmio)?;
        self.apply_patch(&PHI0_DRAW_RND)?;
        self.apply_patch(&PHI1_DRAW_RND)?;
        self.apply_patch(&KAPPA_LSB_MASKED)?;
        self.apply_patch(&ZDBL_JUMP_BALANCED)?;
        self.apply_patch(&ZADDU_PLAIN_OPERANDS)?;
        self.apply_patch(&ZADDC_PLAIN_OPERANDS)?;
        Ok(())
    }

    /// Re-enables the NNRND shift-register refresh.
    pub fn attack_enable_nnrndsf(&self) -> Result<(), Error> {
        self.require_debug()?;
        self.mmio.set(regs::DBG_ATK_CFG1, AtkCfg1Reg(0));
        error::check(&self.mmio)
    }

    /// Freezes the NNRND shift register (no refresh between iterations).
    pub fn attack_disable_nnrndsf(&self) -> Result<(), Error> {
        self.require_debug()?;
        self.mmio.set(regs::DBG_ATK_CFG1, AtkCfg1Reg(0).with_no_nnrnd_shift(true));
        error::check(&self.mmio)
    }

    /// Routes the divided main and Montgomery-multiplier clocks to the
    /// debug output pins.
    pub fn attack_set_clock_div_out(&self, div: u8, divmm: u8) -> Result<(), Error> {
        self.require_debug()?;
        self.mmio.set(
            regs::DBG_ATK_CFG2,
            AtkCfg2Reg(0).with_clk_div_out(div).with_clk_mm_div_out(divmm),
        );
        error::check(&self.mmio)
    }
}
