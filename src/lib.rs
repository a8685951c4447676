//! Host-side driver for a memory-mapped elliptic-curve cryptography
//! accelerator.
//!
//! The IP computes prime-field ECC over short Weierstrass curves
//! (y² = x³ + ax + b mod p) behind a narrow register window: set the curve
//! once, then negate, double, add, test points, and run scalar
//! multiplication [k]P with the hardware's side-channel countermeasures
//! (scalar blinding, memory shuffling, periodic Z-remasking, XY-shuffling,
//! on-the-fly scalar masking, and result-token whitening). Debug builds of
//! the IP additionally expose microcode patching, breakpoints,
//! single-stepping, TRNG introspection and the attack-level presets; all
//! of that surface lives in the [`debug`] and [`attack`] modules.
//!
//! # Device handle
//! [`Ecc`] wraps the MMIO window of one IP instance. The usual setup is the
//! process-wide singleton: call [`init`] once with the mapped base pointer,
//! then use the free functions in [`api`], which resolve the global handle
//! on every call.
//!
//! ```no_run
//! # fn platform_map() -> *mut u8 { core::ptr::null_mut() }
//! use ecc_accel::api;
//!
//! unsafe { ecc_accel::init(platform_map()) }.unwrap();
//! api::set_curve(&A, &B, &P, &Q).unwrap();
//! let on = api::is_on_curve(&GX, &GY).unwrap();
//! # const A: [u8; 0] = []; const B: [u8; 0] = []; const P: [u8; 0] = [];
//! # const Q: [u8; 0] = []; const GX: [u8; 0] = []; const GY: [u8; 0] = [];
//! ```
//!
//! Code that manages its own mapping (or drives several IP instances) can
//! instead keep an [`Ecc`] value and call the same operations as methods.
//!
//! # Concurrency
//! The IP executes one operation at a time and every driver call is
//! bracketed by busy-waits, so the driver is synchronous throughout.
//! Callers must serialize access to one device among themselves; the
//! driver only guarantees that first-time initialization is race-free.

use std::sync::{Mutex, OnceLock};

use log::debug;

pub mod api;
pub mod attack;
pub mod bignum;
pub mod caps;
pub mod cm;
pub mod debug;
pub mod error;
pub mod mmio;
pub mod ops;
pub mod regs;
pub mod trace;
pub mod xfer;

pub use caps::Capabilities;
pub use error::{BusyReason, Error, HwError};
pub use trace::KpTrace;

use mmio::Mmio;

/// Handle to one mapped IP instance.
///
/// Construction probes and caches the static capabilities, soft-resets the
/// IP and brings the TRNG post-processing up on unsecure builds, so a
/// freshly built handle is ready for point operations.
pub struct Ecc {
    pub(crate) mmio: Mmio,
    pub(crate) caps: Capabilities,
}

// The handle holds a raw MMIO pointer. The IP is a single shared resource
// and callers serialize operations on it (see the crate docs); the handle
// itself carries no thread-affine state.
unsafe impl Send for Ecc {}
unsafe impl Sync for Ecc {}

impl Ecc {
    /// Brings up the IP behind `base` and returns a ready handle.
    ///
    /// # Safety
    /// `base` must be the uncached mapping of the IP's register window and
    /// must remain valid for the life of the handle.
    pub unsafe fn new(base: *mut u8) -> Result<Self, Error> {
        let mut mmio = Mmio::new(base);
        // The capability word decodes identically at either wire width, so
        // probe first and only then switch the port to 64-bit accesses.
        let caps = Capabilities::probe(&mmio);
        if caps.wire64 {
            mmio.widen();
        }
        let dev = Self { mmio, caps };
        dev.mmio.set(regs::SOFT_RESET, 0);
        error::busy_wait(&dev.mmio);
        if !caps.secure {
            // Unsecure builds come out of reset with the TRNG
            // post-processing off.
            dev.trng_postproc(true)?;
        }
        error::check(&dev.mmio)?;
        debug!("ECC accelerator up, caps {caps:?}");
        Ok(dev)
    }

    /// The cached static capabilities.
    pub fn capabilities(&self) -> Capabilities {
        self.caps
    }

    /// Current prime size in bits, read back from the IP. Static-nn builds
    /// always report `nn_max`.
    pub fn nn(&self) -> u32 {
        self.mmio.get(regs::PRIME_SIZE_RB)
    }

    /// What the IP is currently busy with, if anything.
    pub fn busy_reason(&self) -> Option<BusyReason> {
        error::busy_reason(&self.mmio)
    }

    /// Raw error field, unacknowledged. For audits of the secure-build
    /// reconfiguration paths, which deliberately do not fail.
    pub fn error_flags(&self) -> HwError {
        error::peek(&self.mmio)
    }

    /// Hardware version triple (major, minor, patch).
    pub fn version(&self) -> (u8, u8, u16) {
        let v = self.mmio.get(regs::HW_VERSION);
        (v.major(), v.minor(), v.patch())
    }

    /// Soft-resets the IP. Forces the controller back to its idle state;
    /// curve and countermeasure configuration must be redone afterwards.
    pub fn reset(&self) -> Result<(), Error> {
        self.mmio.set(regs::SOFT_RESET, 0);
        error::busy_wait(&self.mmio);
        error::check(&self.mmio)
    }
}

static DEVICE: OnceLock<Ecc> = OnceLock::new();

/// One-time process-wide setup: brings up the IP behind `base` and stores
/// the handle for the [`api`] free functions. Idempotent; concurrent first
/// calls are serialized and only one performs the bring-up.
///
/// # Safety
/// Same contract as [`Ecc::new`].
pub unsafe fn init(base: *mut u8) -> Result<(), Error> {
    static GATE: Mutex<()> = Mutex::new(());
    let _gate = GATE.lock().expect("init poisoned");
    if DEVICE.get().is_none() {
        let dev = Ecc::new(base)?;
        let _ = DEVICE.set(dev);
    }
    Ok(())
}

/// The process-wide handle, if [`init`] has completed.
pub(crate) fn device() -> Result<&'static Ecc, Error> {
    DEVICE.get().ok_or(Error::NotReady)
}
