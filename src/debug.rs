//! Debug surface of the IP: halt/step/resume, breakpoints, triggers,
//! microcode patching, direct large-number memory access, TRNG
//! introspection and the clock probes.
//!
//! Everything here requires the debug (unsecure) build; on production
//! silicon the whole bank is fused off and these calls fail with
//! [`Error::DebugOnly`] before touching a register.
//!
//! The controller is a three-state machine: IDLE, RUNNING and
//! DEBUG_HALTED. A command moves IDLE to RUNNING; hitting a breakpoint or
//! exhausting a run-N count moves RUNNING to DEBUG_HALTED; `resume` (or
//! the next command) moves back to RUNNING, and a soft reset forces IDLE
//! from anywhere. Patching and direct memory access are only legal while
//! halted or idle.

use std::thread;
use std::time::Duration;

use log::debug;
use num_enum::{FromPrimitive, IntoPrimitive};

use crate::bignum;
use crate::error::{self, Error};
use crate::regs::{self, BkptReg, HaltReg, StepsReg, TrngCfgReg, TrngCtrlReg};
use crate::Ecc;

/// Main-controller FSM states, as encoded in the debug-status word and in
/// breakpoint state qualifiers. `AnyOrIdle` doubles as the wildcard: a
/// breakpoint qualified with it matches in every state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, FromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum FsmState {
    #[default]
    AnyOrIdle = 0,
    Init = 1,
    MontgomeryInit = 2,
    CheckOnCurve = 3,
    Blinding = 4,
    Setup = 5,
    Loop = 6,
    SubtractP = 7,
    Exit = 8,
}

/// TRNG entropy consumers with per-source diagnostic counters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, IntoPrimitive)]
#[repr(u32)]
pub enum DiagSource {
    /// AXI scalar-masking consumer.
    Axi = 0,
    /// Prime-field arithmetic randomizations.
    Efp = 1,
    /// Curve-level randomizations (blinding, Z-masks).
    Crv = 2,
    /// Address-shuffling permutations.
    Shf = 3,
    /// The raw FIFO itself.
    Raw = 4,
}

/// Snapshot of the per-source diagnostic counters. The IP resets them at
/// the start of each [k]P.
#[derive(Clone, Copy, Debug, Default)]
pub struct TrngDiag {
    pub min: u32,
    pub max: u32,
    pub ok: u32,
    pub starved: u32,
}

/// Per-step exception flags, readable while halted.
#[derive(Clone, Copy, Debug)]
pub struct StepFlags {
    pub r0_is_zero: bool,
    pub r1_is_zero: bool,
    pub kappa: bool,
    pub kappa_p: bool,
    pub zu: bool,
    pub zc: bool,
    /// Scalar bit index of the main loop.
    pub jbit: u16,
}

/// Program-counter landmarks of the bundled microcode image. The trace
/// engine pins breakpoints on these, and the attack presets patch a few
/// of them.
pub mod pc {
    /// Head of the input-point validity checks.
    pub const CHECK_INPUTS: u16 = 0x010;
    /// Draw of the blinding random alpha.
    pub const DRAW_ALPHA: u16 = 0x020;
    /// Draw of the first coordinate-masking random phi0.
    pub const DRAW_PHI0: u16 = 0x028;
    /// Draw of the second coordinate-masking random phi1.
    pub const DRAW_PHI1: u16 = 0x02C;
    /// Draw of the common-Z mask lambda.
    pub const DRAW_LAMBDA: u16 = 0x030;
    /// First opcode after the lambda draw; the Z-mask injection point.
    pub const AFTER_LAMBDA: u16 = 0x031;
    /// Sample of the kappa LSB that steers the first ladder step.
    pub const KAPPA_LSB: u16 = 0x046;
    /// Conditional jump into the doubling routine.
    pub const JUMP_ZDBL: u16 = 0x04C;
    /// Last opcode of the setup phase.
    pub const SETUP_END: u16 = 0x04E;
    /// Entries of the co-Z routines.
    pub const ZADDU: u16 = 0x050;
    pub const ZADDC: u16 = 0x068;
    pub const ZDBL: u16 = 0x080;
    pub const ZNEGC: u16 = 0x096;
    /// Head of the final subtract-P correction.
    pub const SUBTRACT_P: u16 = 0x0A0;
    /// Head of the exit routine (unmasking, result write-back).
    pub const EXIT: u16 = 0x0B0;
    /// Last opcode of the final check-on-curve routine.
    pub const CHECK_CURVE_LAST: u16 = 0x0C8;
}

/// Indices of named variables in the large-number memory, for direct limb
/// access while halted.
pub mod lgnb {
    pub const P: u32 = 0;
    pub const A: u32 = 1;
    pub const B: u32 = 2;
    pub const Q: u32 = 3;
    pub const XR0: u32 = 4;
    pub const YR0: u32 = 5;
    pub const XR1: u32 = 6;
    pub const YR1: u32 = 7;
    /// Common Z coordinate of R0/R1.
    pub const ZR01: u32 = 8;
    pub const ALPHA: u32 = 9;
    pub const PHI0: u32 = 10;
    pub const PHI1: u32 = 11;
    pub const LAMBDA: u32 = 12;
}

/// The clock counters are pre-divided by this power of two.
const CLK_PRECOUNT: u32 = 6;

/// Watchdog bound for the raw-FIFO fill poll.
const RAW_FIFO_WATCHDOG: u32 = 1 << 24;

impl Ecc {
    pub(crate) fn require_debug(&self) -> Result<(), Error> {
        if self.caps.secure {
            return Err(Error::DebugOnly);
        }
        Ok(())
    }

    /// Patching and direct memory access need the controller stopped:
    /// either halted under debug control, or simply idle.
    pub(crate) fn require_halted_or_idle(&self) -> Result<(), Error> {
        let halted = self.mmio.get(regs::DBG_STATUS).halted();
        let busy = self.mmio.get(regs::STATUS).busy();
        if halted || !busy {
            Ok(())
        } else {
            Err(Error::NotHalted)
        }
    }

    /// True while the controller sits at a debug halt.
    pub fn is_halted(&self) -> Result<bool, Error> {
        self.require_debug()?;
        Ok(self.mmio.get(regs::DBG_STATUS).halted())
    }

    /// Current FSM state and program counter.
    pub fn debug_state(&self) -> Result<(FsmState, u16), Error> {
        self.require_debug()?;
        let st = self.mmio.get(regs::DBG_STATUS);
        Ok((FsmState::from(st.state()), st.pc()))
    }

    /// Halts the controller wherever it is. No busy-wait: this is the one
    /// write that is legal mid-computation.
    pub fn halt_now(&self) -> Result<(), Error> {
        self.require_debug()?;
        self.mmio.set(regs::DBG_HALT, HaltReg(0).with_halt(true));
        Ok(())
    }

    /// Resumes from a debug halt. No-op when already running.
    pub fn resume(&self) -> Result<(), Error> {
        self.require_debug()?;
        if self.mmio.get(regs::DBG_STATUS).halted() {
            self.mmio.set(regs::DBG_HALT, HaltReg(0).with_resume(true));
        }
        Ok(())
    }

    /// Runs `n` opcodes from the current halt point, then halts again.
    /// Only legal while halted.
    pub fn run_opcodes(&self, n: u16) -> Result<(), Error> {
        self.require_debug()?;
        if !self.mmio.get(regs::DBG_STATUS).halted() {
            return Err(Error::NotHalted);
        }
        self.mmio.set(regs::DBG_STEPS, StepsReg(0).with_count(n));
        while !self.mmio.get(regs::DBG_STATUS).halted() {
            core::hint::spin_loop();
        }
        Ok(())
    }

    pub fn single_step(&self) -> Result<(), Error> {
        self.run_opcodes(1)
    }

    /// Arms breakpoint slot `id` at `addr`, optionally qualified on a
    /// scalar bit index (0 matches any bit) and an FSM state
    /// ([`FsmState::AnyOrIdle`] matches any state).
    pub fn set_breakpoint(
        &self,
        id: u8,
        addr: u16,
        scalar_bit: u16,
        state: FsmState,
    ) -> Result<(), Error> {
        self.require_debug()?;
        if id > 3 {
            return Err(Error::BreakpointId(id));
        }
        self.check_opcode_addr(addr as u32)?;
        let bk = BkptReg(0)
            .with_enable(true)
            .with_id(id)
            .with_addr(addr)
            .with_nbbit(scalar_bit)
            .with_state(state.into());
        self.mmio.set(regs::DBG_BKPT, bk);
        Ok(())
    }

    pub fn remove_breakpoint(&self, id: u8) -> Result<(), Error> {
        self.require_debug()?;
        if id > 3 {
            return Err(Error::BreakpointId(id));
        }
        self.mmio.set(regs::DBG_BKPT, BkptReg(0).with_id(id));
        Ok(())
    }

    /// Blocks until the controller reaches a debug halt.
    pub(crate) fn wait_halted(&self) {
        while !self.mmio.get(regs::DBG_STATUS).halted() {
            core::hint::spin_loop();
        }
    }

    /// Arms the debug trigger output.
    pub fn arm_trigger(&self) -> Result<(), Error> {
        self.require_debug()?;
        self.mmio.set(regs::DBG_TRIG_ACT, regs::EnableReg(0).with_enable(true));
        Ok(())
    }

    pub fn disarm_trigger(&self) -> Result<(), Error> {
        self.require_debug()?;
        self.mmio.set(regs::DBG_TRIG_ACT, regs::EnableReg(0));
        Ok(())
    }

    /// Trigger rising edge, in main-clock cycles from [k]P start.
    pub fn set_trigger_up(&self, cycles: u32) -> Result<(), Error> {
        self.require_debug()?;
        self.mmio.set(regs::DBG_TRIG_UP, cycles);
        Ok(())
    }

    /// Trigger falling edge, in main-clock cycles from [k]P start.
    pub fn set_trigger_down(&self, cycles: u32) -> Result<(), Error> {
        self.require_debug()?;
        self.mmio.set(regs::DBG_TRIG_DOWN, cycles);
        Ok(())
    }

    fn check_opcode_addr(&self, addr: u32) -> Result<(), Error> {
        let limit = self.caps.opcode_count.next_power_of_two();
        if addr >= limit {
            return Err(Error::OpcodeAddress { addr, limit });
        }
        Ok(())
    }

    /// Overwrites one opcode slot. `opsz` is the opcode word size in
    /// 32-bit halves (1 or 2); for two-half opcodes the low half goes in
    /// first. Requires the controller halted or idle.
    pub fn patch_one_opcode(&self, addr: u32, msb: u32, lsb: u32, opsz: u8) -> Result<(), Error> {
        self.require_debug()?;
        self.require_halted_or_idle()?;
        self.check_opcode_addr(addr)?;
        self.mmio.set(regs::DBG_OP_ADDR, addr);
        self.mmio.set(regs::DBG_OPCODE, lsb);
        if opsz == 2 {
            self.mmio.set(regs::DBG_OPCODE, msb);
        }
        error::check(&self.mmio)
    }

    /// Rewrites the first `nbops` opcode slots from `buf`, starting at
    /// address zero. For `opsz == 2` the buffer is big-endian at the
    /// 32-bit level: the MSB half of each opcode sits at the even index.
    pub fn patch_microcode(&self, buf: &[u32], nbops: u32, opsz: u8) -> Result<(), Error> {
        if buf.len() < nbops as usize * opsz as usize {
            return Err(Error::PatchBuffer);
        }
        for op in 0..nbops as usize {
            let (msb, lsb) = if opsz == 2 {
                (buf[2 * op], buf[2 * op + 1])
            } else {
                (0, buf[op])
            };
            self.patch_one_opcode(op as u32, msb, lsb, opsz)?;
        }
        Ok(())
    }

    fn check_limb_access(&self) -> Result<(), Error> {
        self.require_debug()?;
        self.require_halted_or_idle()?;
        if self.caps.ww() > 32 {
            return Err(Error::LimbWidth);
        }
        Ok(())
    }

    /// Writes limb `j` of large number `i` directly into the big-number
    /// memory.
    pub fn write_limb(&self, i: u32, j: u32, value: u32) -> Result<(), Error> {
        self.check_limb_access()?;
        self.mmio.set(regs::DBG_FP_ADDR, i * self.caps.stride() + j);
        self.mmio.set(regs::DBG_FP_WDATA, value);
        error::check(&self.mmio)
    }

    pub fn read_limb(&self, i: u32, j: u32) -> Result<u32, Error> {
        self.check_limb_access()?;
        self.mmio.set(regs::DBG_FP_ADDR, i * self.caps.stride() + j);
        Ok(self.mmio.get(regs::DBG_FP_RDATA))
    }

    /// Writes every limb of large number `i`, least-significant first.
    pub fn write_largenb(&self, i: u32, limbs: &[u32]) -> Result<(), Error> {
        for (j, &limb) in limbs.iter().enumerate() {
            self.write_limb(i, j as u32, limb)?;
        }
        Ok(())
    }

    /// Reads all limbs of large number `i` at the current prime size.
    pub fn read_largenb(&self, i: u32) -> Result<Vec<u32>, Error> {
        let w = self.caps.limbs(self.nn());
        (0..w).map(|j| self.read_limb(i, j)).collect()
    }

    /// Writes a caller value over large number `i`, converting from the
    /// big-endian byte form to limbs.
    pub(crate) fn write_largenb_bytes(&self, i: u32, bytes: &[u8]) -> Result<(), Error> {
        let nn_bytes = bignum::nn_bytes(self.nn());
        if bytes.len() > nn_bytes {
            return Err(Error::OperandTooLarge { got: bytes.len(), max: nn_bytes });
        }
        let limbs: Vec<u32> =
            bignum::pack(bytes, nn_bytes, 4).into_iter().map(|w| w as u32).collect();
        self.write_largenb(i, &limbs)
    }

    /// Writes one word at a raw address in the large-number memory,
    /// bypassing the `i * stride + j` arithmetic of [`write_limb`].
    ///
    /// [`write_limb`]: Self::write_limb
    pub fn write_word_in_lgnbmem(&self, addr: u32, value: u32) -> Result<(), Error> {
        self.check_limb_access()?;
        self.mmio.set(regs::DBG_FP_ADDR, addr);
        self.mmio.set(regs::DBG_FP_WDATA, value);
        error::check(&self.mmio)
    }

    pub fn read_word_in_lgnbmem(&self, addr: u32) -> Result<u32, Error> {
        self.check_limb_access()?;
        self.mmio.set(regs::DBG_FP_ADDR, addr);
        Ok(self.mmio.get(regs::DBG_FP_RDATA))
    }

    /// The per-step exception flags.
    pub fn step_flags(&self) -> Result<StepFlags, Error> {
        self.require_debug()?;
        let f = self.mmio.get(regs::DBG_EXP_FLAGS);
        Ok(StepFlags {
            r0_is_zero: f.r0_is_zero(),
            r1_is_zero: f.r1_is_zero(),
            kappa: f.kappa(),
            kappa_p: f.kappa_p(),
            zu: f.zu(),
            zc: f.zc(),
            jbit: f.jbit(),
        })
    }

    /// Switches the TRNG post-processing logic on or off.
    pub fn trng_postproc(&self, on: bool) -> Result<(), Error> {
        self.require_debug()?;
        self.mmio
            .set(regs::DBG_TRNG_CTRL, TrngCtrlReg(0).with_postproc_disable(!on));
        error::check(&self.mmio)
    }

    /// Flushes the raw FIFO.
    pub fn trng_reset_fifo(&self) -> Result<(), Error> {
        self.require_debug()?;
        self.mmio.set(regs::DBG_TRNG_CTRL, TrngCtrlReg(0).with_fifo_reset(true));
        error::check(&self.mmio)
    }

    /// Replaces the physical entropy source with the constant `value`
    /// bit. Analysis aid; leaves every downstream consumer deterministic.
    pub fn trng_bypass(&self, on: bool, value: bool) -> Result<(), Error> {
        self.require_debug()?;
        let reg = TrngCtrlReg(0).with_complete_bypass(on).with_bypass_value(value);
        self.mmio.set(regs::DBG_TRNG_CTRL, reg);
        error::check(&self.mmio)
    }

    /// Makes the NNRND draws deterministic (for replaying a [k]P).
    pub fn trng_nnrnd_deterministic(&self, on: bool) -> Result<(), Error> {
        self.require_debug()?;
        self.mmio
            .set(regs::DBG_TRNG_CTRL, TrngCtrlReg(0).with_nnrnd_deterministic(on));
        error::check(&self.mmio)
    }

    /// Configures the raw-source post-processing: von-Neumann debiasing
    /// and the sampling period `ta`.
    pub fn trng_config(&self, von_neumann: bool, ta: u16, idle_starve: bool) -> Result<(), Error> {
        self.require_debug()?;
        let reg = TrngCfgReg(0)
            .with_von_neumann(von_neumann)
            .with_ta(ta)
            .with_idle_starve(idle_starve);
        self.mmio.set(regs::DBG_TRNG_CFG, reg);
        error::check(&self.mmio)
    }

    /// Points the diagnostic counters at one entropy consumer.
    pub fn select_diag_source(&self, source: DiagSource) -> Result<(), Error> {
        self.require_debug()?;
        self.mmio.set(regs::DBG_TRNG_DIAG_SEL, u32::from(source));
        Ok(())
    }

    /// Reads the diagnostic counters for `source`.
    pub fn trng_diag(&self, source: DiagSource) -> Result<TrngDiag, Error> {
        self.select_diag_source(source)?;
        Ok(TrngDiag {
            min: self.mmio.get(regs::DBG_IRN_MIN),
            max: self.mmio.get(regs::DBG_IRN_MAX),
            ok: self.mmio.get(regs::DBG_IRN_OK),
            starved: self.mmio.get(regs::DBG_IRN_STARV),
        })
    }

    /// Reads one bit of the raw FIFO. The TRNG post-processing must be
    /// off, otherwise the FIFO drains underneath the scan.
    pub fn read_one_raw_bit(&self, index: u32) -> Result<bool, Error> {
        self.require_debug()?;
        self.mmio.set(regs::DBG_TRNG_RAW_ADDR, index);
        Ok(self.mmio.get(regs::DBG_TRNG_RAW_DATA) & 1 != 0)
    }

    /// Extracts the whole raw-FIFO content into `buf`, bit `j` landing in
    /// byte `j / 8` at position `j % 8`. Returns the number of bits read.
    pub fn read_raw_fifo(&self, buf: &mut [u8]) -> Result<u32, Error> {
        self.require_debug()?;
        // Freeze the FIFO under the scan.
        self.mmio.set(regs::DBG_TRNG_CTRL, TrngCtrlReg(0).with_raw_read_disable(true));
        buf.fill(0);
        let fill = self.mmio.get(regs::DBG_TRNG_STATUS).raw_count();
        let bits = fill.min(buf.len() as u32 * 8);
        for j in 0..bits {
            self.mmio.set(regs::DBG_TRNG_RAW_ADDR, j);
            if self.mmio.get(regs::DBG_TRNG_RAW_DATA) & 1 != 0 {
                buf[(j / 8) as usize] |= 1 << (j % 8);
            }
        }
        self.mmio.set(regs::DBG_TRNG_CTRL, TrngCtrlReg(0).with_raw_read_disable(false));
        error::check(&self.mmio)?;
        Ok(bits)
    }

    /// Measures how long the raw FIFO takes to fill from empty, in TRNG
    /// clock cycles. Bounded by a watchdog rather than a busy-wait: the
    /// entropy source is the one part of the IP allowed to stall.
    pub fn raw_fifo_fillup_time(&self) -> Result<u32, Error> {
        self.require_debug()?;
        self.trng_postproc(false)?;
        self.trng_reset_fifo()?;
        let mut watchdog = RAW_FIFO_WATCHDOG;
        while !self.mmio.get(regs::DBG_TRNG_STATUS).raw_full() {
            watchdog -= 1;
            if watchdog == 0 {
                self.trng_postproc(true)?;
                return Err(Error::RawFifoTimeout);
            }
            core::hint::spin_loop();
        }
        let duration = self.mmio.get(regs::DBG_RAWFIFO_DUR);
        self.trng_postproc(true)?;
        Ok(duration)
    }

    /// Estimates the two clock frequencies in MHz by sampling the cycle
    /// counters over a `seconds`-long window (10 s at most).
    pub fn clocks_mhz(&self, seconds: u64) -> Result<(f64, f64), Error> {
        self.require_debug()?;
        if seconds == 0 || seconds > 10 {
            return Err(Error::SampleWindow(seconds));
        }
        let clk0 = self.mmio.get(regs::DBG_CLK_CNT);
        let mm0 = self.mmio.get(regs::DBG_CLKMM_CNT);
        thread::sleep(Duration::from_secs(seconds));
        let clk1 = self.mmio.get(regs::DBG_CLK_CNT);
        let mm1 = self.mmio.get(regs::DBG_CLKMM_CNT);
        let scale = (1u64 << CLK_PRECOUNT) as f64 / (seconds as f64 * 1e6);
        Ok((
            clk1.wrapping_sub(clk0) as f64 * scale,
            mm1.wrapping_sub(mm0) as f64 * scale,
        ))
    }

    /// Logs the decoded status words. Diagnostic aid, `debug!` level.
    pub fn dump_status(&self) {
        let st = self.mmio.get(regs::STATUS);
        debug!("status {st:?}, errors {:?}", error::peek(&self.mmio));
        if !self.caps.secure {
            let dbg = self.mmio.get(regs::DBG_STATUS);
            debug!("debug status {dbg:?}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fsm_state_wildcard_decodes_from_zero() {
        assert_eq!(FsmState::from(0u8), FsmState::AnyOrIdle);
        assert_eq!(FsmState::from(5u8), FsmState::Setup);
        // Unassigned encodings fall back to the wildcard.
        assert_eq!(FsmState::from(0xFu8), FsmState::AnyOrIdle);
    }

    #[test]
    fn diag_source_encoding() {
        assert_eq!(u32::from(DiagSource::Axi), 0);
        assert_eq!(u32::from(DiagSource::Raw), 4);
    }
}
