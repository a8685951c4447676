//! Stateless top-layer API.
//!
//! Free functions over the process-wide device set up by
//! [`init`](crate::init), mirroring the method surface of [`Ecc`]. Every
//! function resolves the global handle on entry and fails with
//! [`Error::NotReady`] before `init` has completed. Code that owns its
//! handle calls the same operations as methods instead.

use crate::caps::MoreCapabilities;
use crate::debug::{DiagSource, FsmState, TrngDiag};
use crate::device;
use crate::error::{Error, HwError};
use crate::ops::Point;
use crate::trace::KpTrace;
use crate::Capabilities;

// Inspection.

pub fn is_unsecure_build() -> Result<bool, Error> {
    Ok(!device()?.capabilities().secure)
}

pub fn is_secure_build() -> Result<bool, Error> {
    Ok(device()?.capabilities().secure)
}

pub fn get_capabilities() -> Result<Capabilities, Error> {
    Ok(device()?.capabilities())
}

/// Extra capability word; debug builds only.
pub fn get_more_capabilities() -> Result<MoreCapabilities, Error> {
    device()?.more_capabilities()
}

pub fn get_version() -> Result<(u8, u8, u16), Error> {
    Ok(device()?.version())
}

/// Current prime size in bits (always `nn_max` on static-nn builds).
pub fn get_nn() -> Result<u32, Error> {
    Ok(device()?.nn())
}

/// Raw, unacknowledged error field, for audits.
pub fn error_flags() -> Result<HwError, Error> {
    Ok(device()?.error_flags())
}

// Configuration.

pub fn set_curve(a: &[u8], b: &[u8], p: &[u8], q: &[u8]) -> Result<(), Error> {
    device()?.set_curve(a, b, p, q)
}

pub fn enable_blinding(size_bits: u32) -> Result<(), Error> {
    device()?.enable_blinding(size_bits)
}

pub fn disable_blinding() -> Result<(), Error> {
    device()?.disable_blinding()
}

macro_rules! onoff {
    ($what:ident) => {
        paste::paste! {
            #[doc = concat!("Turns the ", stringify!($what), " countermeasure on.")]
            pub fn [<enable_ $what>]() -> Result<(), Error> {
                device()?.[<enable_ $what>]()
            }
            #[doc = concat!("Turns the ", stringify!($what), " countermeasure off.")]
            pub fn [<disable_ $what>]() -> Result<(), Error> {
                device()?.[<disable_ $what>]()
            }
        }
    };
}

onoff!(shuffling);
onoff!(xyshuf);
onoff!(aximsk);
onoff!(token);

pub fn enable_zremask(period: u32) -> Result<(), Error> {
    device()?.enable_zremask(period)
}

pub fn disable_zremask() -> Result<(), Error> {
    device()?.disable_zremask()
}

pub fn set_small_scalar_size(bits: u32) -> Result<(), Error> {
    device()?.set_small_scalar_size(bits)
}

pub fn enable_irq() -> Result<(), Error> {
    device()?.enable_irq()
}

pub fn disable_irq() -> Result<(), Error> {
    device()?.disable_irq()
}

// Point operations.

pub fn is_on_curve(x: &[u8], y: &[u8]) -> Result<bool, Error> {
    device()?.is_on_curve(x, y)
}

/// Point equality test.
pub fn eq(x0: &[u8], y0: &[u8], x1: &[u8], y1: &[u8]) -> Result<bool, Error> {
    device()?.points_are_equal(x0, y0, x1, y1)
}

/// Opposite-point test (P == -Q).
pub fn opp(x0: &[u8], y0: &[u8], x1: &[u8], y1: &[u8]) -> Result<bool, Error> {
    device()?.points_are_opposite(x0, y0, x1, y1)
}

pub fn neg(x: &[u8], y: &[u8]) -> Result<Point, Error> {
    device()?.neg(x, y)
}

pub fn dbl(x: &[u8], y: &[u8]) -> Result<Point, Error> {
    device()?.dbl(x, y)
}

pub fn add(x0: &[u8], y0: &[u8], x1: &[u8], y1: &[u8]) -> Result<Point, Error> {
    device()?.add(x0, y0, x1, y1)
}

/// Scalar multiplication [k]P, with optional execution trace and optional
/// Z-mask override (each only effective when its feature is compiled in).
pub fn mul(
    x: &[u8],
    y: &[u8],
    k: &[u8],
    trace: Option<&mut KpTrace>,
    zmask: Option<&[u8]>,
) -> Result<Point, Error> {
    device()?.mul(x, y, k, trace, zmask)
}

// Point-at-infinity flags.

pub fn point_iszero(idx: u8) -> Result<bool, Error> {
    device()?.point_iszero(idx)
}

pub fn point_zero(idx: u8) -> Result<(), Error> {
    device()?.point_zero(idx)
}

pub fn point_unzero(idx: u8) -> Result<(), Error> {
    device()?.point_unzero(idx)
}

// Debug.

pub fn reset() -> Result<(), Error> {
    device()?.reset()
}

pub fn halt() -> Result<(), Error> {
    device()?.halt_now()
}

pub fn resume() -> Result<(), Error> {
    device()?.resume()
}

/// Arms breakpoint `id` at `addr`, matching any state and any scalar bit.
pub fn set_breakpoint(id: u8, addr: u16) -> Result<(), Error> {
    device()?.set_breakpoint(id, addr, 0, FsmState::AnyOrIdle)
}

/// Fully qualified breakpoint: scalar-bit and FSM-state conditions.
pub fn set_breakpoint_qualified(
    id: u8,
    addr: u16,
    scalar_bit: u16,
    state: FsmState,
) -> Result<(), Error> {
    device()?.set_breakpoint(id, addr, scalar_bit, state)
}

pub fn remove_breakpoint(id: u8) -> Result<(), Error> {
    device()?.remove_breakpoint(id)
}

pub fn run_opcodes(n: u16) -> Result<(), Error> {
    device()?.run_opcodes(n)
}

pub fn single_step() -> Result<(), Error> {
    device()?.single_step()
}

pub fn arm_trigger() -> Result<(), Error> {
    device()?.arm_trigger()
}

pub fn disarm_trigger() -> Result<(), Error> {
    device()?.disarm_trigger()
}

pub fn set_trigger_up(cycles: u32) -> Result<(), Error> {
    device()?.set_trigger_up(cycles)
}

pub fn set_trigger_down(cycles: u32) -> Result<(), Error> {
    device()?.set_trigger_down(cycles)
}

pub fn patch_one_opcode(addr: u32, msb: u32, lsb: u32, opsz: u8) -> Result<(), Error> {
    device()?.patch_one_opcode(addr, msb, lsb, opsz)
}

pub fn patch_microcode(buf: &[u32], nbops: u32, opsz: u8) -> Result<(), Error> {
    device()?.patch_microcode(buf, nbops, opsz)
}

pub fn write_limb(i: u32, j: u32, value: u32) -> Result<(), Error> {
    device()?.write_limb(i, j, value)
}

pub fn read_limb(i: u32, j: u32) -> Result<u32, Error> {
    device()?.read_limb(i, j)
}

pub fn write_largenb(i: u32, limbs: &[u32]) -> Result<(), Error> {
    device()?.write_largenb(i, limbs)
}

pub fn read_largenb(i: u32) -> Result<Vec<u32>, Error> {
    device()?.read_largenb(i)
}

pub fn write_word_in_lgnbmem(addr: u32, value: u32) -> Result<(), Error> {
    device()?.write_word_in_lgnbmem(addr, value)
}

pub fn read_word_in_lgnbmem(addr: u32) -> Result<u32, Error> {
    device()?.read_word_in_lgnbmem(addr)
}

// TRNG.

pub fn trng_postproc(on: bool) -> Result<(), Error> {
    device()?.trng_postproc(on)
}

pub fn trng_reset_fifo() -> Result<(), Error> {
    device()?.trng_reset_fifo()
}

pub fn trng_bypass(on: bool, value: bool) -> Result<(), Error> {
    device()?.trng_bypass(on, value)
}

pub fn trng_nnrnd_deterministic(on: bool) -> Result<(), Error> {
    device()?.trng_nnrnd_deterministic(on)
}

pub fn trng_config(von_neumann: bool, ta: u16, idle_starve: bool) -> Result<(), Error> {
    device()?.trng_config(von_neumann, ta, idle_starve)
}

pub fn select_diag_source(source: DiagSource) -> Result<(), Error> {
    device()?.select_diag_source(source)
}

pub fn trng_diag(source: DiagSource) -> Result<TrngDiag, Error> {
    device()?.trng_diag(source)
}

pub fn read_one_raw_bit(index: u32) -> Result<bool, Error> {
    device()?.read_one_raw_bit(index)
}

pub fn read_raw_fifo(buf: &mut [u8]) -> Result<u32, Error> {
    device()?.read_raw_fifo(buf)
}

pub fn raw_fifo_fillup_time() -> Result<u32, Error> {
    device()?.raw_fifo_fillup_time()
}

pub fn clocks_mhz(seconds: u64) -> Result<(f64, f64), Error> {
    device()?.clocks_mhz(seconds)
}

pub fn dump_status() -> Result<(), Error> {
    device()?.dump_status();
    Ok(())
}

// Attack presets.

pub fn attack_set_level(level: u8) -> Result<(), Error> {
    device()?.attack_set_level(level)
}

pub fn attack_enable_nnrndsf() -> Result<(), Error> {
    device()?.attack_enable_nnrndsf()
}

pub fn attack_disable_nnrndsf() -> Result<(), Error> {
    device()?.attack_disable_nnrndsf()
}

pub fn attack_set_clock_div_out(div: u8, divmm: u8) -> Result<(), Error> {
    device()?.attack_set_clock_div_out(div, divmm)
}
