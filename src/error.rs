//! Status polling and the error layer.
//!
//! Every public operation is bracketed by busy-waits on the composite
//! status word, and ends by reading the error field. Hardware errors are
//! acknowledged by writing the set bits back to the error-ACK register;
//! they are never silently cleared and never retried here.

use bitflags::bitflags;
use log::{error, warn};
use thiserror::Error;

use crate::mmio::Mmio;
use crate::regs;

bitflags! {
    /// The 15 positional hardware error flags, at their in-status bit
    /// positions (the error field occupies bits [16..31] of the status
    /// word, and the error-ACK register takes the same positions).
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct HwError: u32 {
        const IN_PT_NOT_ON_CURVE   = 1 << 16;
        const OUT_PT_NOT_ON_CURVE  = 1 << 17;
        const COMP                 = 1 << 18;
        const WREG_FBD             = 1 << 19;
        const RREG_FBD             = 1 << 20;
        const KP_FBD               = 1 << 21;
        const NNDYN                = 1 << 22;
        const POP_FBD              = 1 << 23;
        const RDNB_FBD             = 1 << 24;
        const BLN                  = 1 << 25;
        const UNKNOWN_REG          = 1 << 26;
        const TOKEN                = 1 << 27;
        const SHUFFLE              = 1 << 28;
        const ZREMASK              = 1 << 29;
        const NOT_ENOUGH_RANDOM_WK = 1 << 30;
    }
}

impl HwError {
    /// All error-field positions within the status word.
    pub const FIELD: u32 = 0x7fff << 16;
}

/// Driver-level failure. Hardware-reported conditions carry the raw flag
/// set; everything else is rejected before touching the IP.
#[derive(Error, Debug)]
pub enum Error {
    #[error("device has not been initialized")]
    NotReady,
    #[error("hardware error: {0:?}")]
    Hardware(HwError),
    #[error("operand is {got} bytes but the current prime size allows {max}")]
    OperandTooLarge { got: usize, max: usize },
    #[error("prime size {0} is outside the supported range")]
    PrimeSize(u32),
    #[error("scalar size {0} exceeds the current prime size")]
    ScalarSize(u32),
    #[error("shuffling is not supported by this hardware build")]
    ShuffleUnsupported,
    #[error("Z-remask period {0} does not fit the 16-bit period field")]
    ZremaskPeriod(u32),
    #[error("operation requires the debug build of the IP")]
    DebugOnly,
    #[error("operation requires the IP to be halted or idle")]
    NotHalted,
    #[error("breakpoint id {0} is out of range (4 slots)")]
    BreakpointId(u8),
    #[error("opcode address {addr:#x} is out of range ({limit:#x} slots)")]
    OpcodeAddress { addr: u32, limit: u32 },
    #[error("direct limb access requires a 32-bit limb width")]
    LimbWidth,
    #[error("microcode patch buffer is shorter than the patch it describes")]
    PatchBuffer,
    #[error("timed out waiting on the raw random FIFO")]
    RawFifoTimeout,
    #[error("clock sampling window {0} s is too long (10 s maximum)")]
    SampleWindow(u64),
    #[error("attack level {0} does not exist (levels 0..=3)")]
    AttackLevel(u8),
    #[error("the IP halted at {got:#x} instead of the expected landmark {expected:#x}")]
    UnexpectedHalt { got: u16, expected: u16 },
}

/// What the IP is busy with, decoded from the status word.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BusyReason {
    Kp,
    MontgomeryConstants,
    PointOp,
    ReadWrite,
    Init,
    NnRefresh,
    TokenGen,
}

/// Decodes the busy sub-reason bits. `None` when idle or when the busy
/// bit is set without a qualifier.
pub fn busy_reason(mmio: &Mmio) -> Option<BusyReason> {
    let st = mmio.get(regs::STATUS);
    if st.kp() {
        Some(BusyReason::Kp)
    } else if st.mty() {
        Some(BusyReason::MontgomeryConstants)
    } else if st.pop() {
        Some(BusyReason::PointOp)
    } else if st.r_or_w() {
        Some(BusyReason::ReadWrite)
    } else if st.init() {
        Some(BusyReason::Init)
    } else if st.nndynact() {
        Some(BusyReason::NnRefresh)
    } else if st.token_gen() {
        Some(BusyReason::TokenGen)
    } else {
        None
    }
}

/// Spins until the composite BUSY bit clears.
///
/// This is an unbounded volatile spin, matching the IP's contract that
/// every operation terminates. Integrations that cannot trust the device
/// to make progress should bound their calls one layer up.
pub(crate) fn busy_wait(mmio: &Mmio) {
    while mmio.get(regs::STATUS).busy() {
        core::hint::spin_loop();
    }
}

/// Spins until the IP has finished accumulating the randomness that masks
/// the scalar on its way in. Required before every scalar write.
pub(crate) fn wk_random_wait(mmio: &Mmio) {
    while mmio.get(regs::STATUS).enough_rnd_wk() {
        core::hint::spin_loop();
    }
}

/// Reads the error field; on a non-zero value, logs each named flag,
/// acknowledges all of them atomically, and surfaces a single failure.
pub(crate) fn check(mmio: &Mmio) -> Result<(), Error> {
    let flags = peek(mmio);
    if flags.is_empty() {
        return Ok(());
    }
    for flag in flags.iter() {
        error!("hardware flagged {flag:?}");
    }
    ack(mmio, flags);
    Err(Error::Hardware(flags))
}

/// Variant used on the countermeasure-disable paths, where a secure build
/// may legitimately refuse: the flags are logged and acknowledged but the
/// call does not fail. Callers who want to audit use [`peek`].
pub(crate) fn note(mmio: &Mmio) -> HwError {
    let flags = peek(mmio);
    if !flags.is_empty() {
        warn!("hardware refused reconfiguration: {flags:?}");
        ack(mmio, flags);
    }
    flags
}

/// Reads the raw error field without acknowledging anything.
pub(crate) fn peek(mmio: &Mmio) -> HwError {
    let st = mmio.get(regs::STATUS);
    HwError::from_bits_truncate(u32::from(st) & HwError::FIELD)
}

fn ack(mmio: &Mmio, flags: HwError) {
    mmio.set(regs::ERR_ACK, flags.bits());
}
