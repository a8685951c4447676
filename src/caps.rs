//! Static capability probe.
//!
//! The capability words never change after reset, so they are read once at
//! bring-up and cached in the device handle. The derived limb geometry is
//! recomputed on demand because `nn` can move on dynamic-nn builds.

use crate::mmio::Mmio;
use crate::regs;

/// Cached one-shot read of the capability registers.
#[derive(Clone, Copy, Debug)]
pub struct Capabilities {
    /// Production (secure) build. The debug bank is fused off.
    pub secure: bool,
    /// The prime size can be reconfigured at run time.
    pub dynamic_nn: bool,
    /// Large-number memory shuffling is available.
    pub shuffle: bool,
    /// 64-bit wire between the host and the IP.
    pub wire64: bool,
    /// Largest supported prime size, in bits.
    pub nn_max: u32,
    /// Number of opcode slots in the microcode memory.
    pub opcode_count: u32,
    /// Opcodes are 64-bit words (32-bit otherwise).
    pub opcode_word64: bool,
    /// Raw TRNG FIFO depth, in bits.
    pub raw_fifo_bits: u32,
    /// Width of the internal-random-number shuffling unit.
    pub irn_shuffle_width: u8,
}

impl Capabilities {
    /// Reads the two capability registers and the three debug-capability
    /// registers. On secure builds the debug bank reads as zero, which is
    /// exactly what the cached values should say.
    pub(crate) fn probe(mmio: &Mmio) -> Self {
        let caps = mmio.get(regs::CAPABILITIES);
        let dbg0 = mmio.get(regs::DBG_CAPABILITIES0);
        let dbg1 = mmio.get(regs::DBG_CAPABILITIES1);
        let dbg2 = mmio.get(regs::DBG_CAPABILITIES2);
        Self {
            secure: !caps.debug_build(),
            dynamic_nn: caps.dynamic_nn(),
            shuffle: caps.shuffle(),
            wire64: caps.wire64(),
            nn_max: caps.nn_max(),
            opcode_count: dbg0.opcode_count() as u32,
            opcode_word64: dbg0.opcode_word64(),
            raw_fifo_bits: dbg1.raw_fifo_bits(),
            irn_shuffle_width: dbg2.irn_shuffle_width(),
        }
    }

    /// Limb width inside the IP, in bits.
    pub fn ww(&self) -> u32 {
        if self.wire64 { 64 } else { 32 }
    }

    /// Number of limbs holding one large number at prime size `nn`.
    pub fn limbs(&self, nn: u32) -> u32 {
        (nn + 4).div_ceil(self.ww())
    }

    /// Memory stride between two large numbers: the next power of two at
    /// or above the limb count for `nn_max`. Used to compute addresses for
    /// direct limb access.
    pub fn stride(&self) -> u32 {
        self.limbs(self.nn_max).next_power_of_two()
    }
}

/// Countermeasure inventory from the second capability word. Only
/// decodable on debug (unsecure) builds.
#[derive(Clone, Copy, Debug)]
pub struct MoreCapabilities {
    pub trng_postproc: bool,
    pub small_scalar: bool,
    pub token: bool,
    pub xyshuf: bool,
    pub aximsk: bool,
    pub zremask: bool,
}

impl crate::Ecc {
    /// Reads the extra capability word. Debug builds only.
    pub fn more_capabilities(&self) -> Result<MoreCapabilities, crate::Error> {
        self.require_debug()?;
        let c = self.mmio.get(regs::CAPABILITIES2);
        Ok(MoreCapabilities {
            trng_postproc: c.trng_postproc(),
            small_scalar: c.small_scalar(),
            token: c.token(),
            xyshuf: c.xyshuf(),
            aximsk: c.aximsk(),
            zremask: c.zremask(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caps(wire64: bool, nn_max: u32) -> Capabilities {
        Capabilities {
            secure: false,
            dynamic_nn: true,
            shuffle: true,
            wire64,
            nn_max,
            opcode_count: 512,
            opcode_word64: false,
            raw_fifo_bits: 4096,
            irn_shuffle_width: 8,
        }
    }

    #[test]
    fn limb_count() {
        // 256-bit prime on a 32-bit wire: ceil(260 / 32) = 9 limbs.
        assert_eq!(caps(false, 256).limbs(256), 9);
        // Same prime on a 64-bit wire: ceil(260 / 64) = 5 limbs.
        assert_eq!(caps(true, 256).limbs(256), 5);
    }

    #[test]
    fn stride_is_a_power_of_two() {
        // 9 limbs round up to a stride of 16.
        assert_eq!(caps(false, 256).stride(), 16);
        // 521-bit maximum: ceil(525 / 32) = 17 limbs, stride 32.
        assert_eq!(caps(false, 521).stride(), 32);
    }
}
