//! Register map of the ECC accelerator.
//!
//! Every register carries a 32-bit payload and sits at an 8-byte stride from
//! the base address. The write bank comes first, the read bank starts at
//! [`READ_BANK`]. Bit layouts are fixed by the hardware; the `bitfield!`
//! schemas below are the single source of truth for field placement.

use core::marker::PhantomData;

use proc_bitfield::bitfield;

/// A typed register descriptor: a byte offset from the MMIO base plus the
/// payload schema. Descriptors are zero-sized at runtime; the [`Mmio`]
/// port consumes them by value.
///
/// [`Mmio`]: crate::mmio::Mmio
pub struct Reg<T> {
    pub(crate) offset: usize,
    marker: PhantomData<T>,
}

impl<T> Reg<T> {
    const fn at(offset: usize) -> Self {
        Self { offset, marker: PhantomData }
    }
}

impl<T> Clone for Reg<T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<T> Copy for Reg<T> {}

macro_rules! derive_tofrom_primitive {
    ($kind:ident, $prim:ident) => {
        impl From<$prim> for $kind {
            fn from(value: $prim) -> Self {
                Self(value)
            }
        }
        impl From<$kind> for $prim {
            fn from(value: $kind) -> Self {
                value.0
            }
        }
    }
}

macro_rules! reg {
    ($name:ident, $offset:expr, $datatype:ident) => {
        pub const $name: Reg<$datatype> = Reg::at($offset);
    };
}

/// First offset of the read bank.
pub const READ_BANK: usize = 0x180;

// Write bank.
reg!(CTRL, 0x000, CtrlReg);
reg!(WRITE_DATA, 0x008, u32);
reg!(R0_NULL, 0x010, PointNullReg);
reg!(R1_NULL, 0x018, PointNullReg);
reg!(PRIME_SIZE, 0x020, u32);
reg!(BLINDING, 0x028, BlindingReg);
reg!(SHUFFLE, 0x030, EnableReg);
reg!(ZREMASK, 0x038, ZremaskReg);
reg!(TOKEN, 0x040, u32);
reg!(SMALL_SCALAR, 0x048, u32);
reg!(SOFT_RESET, 0x050, u32);
reg!(IRQ, 0x058, EnableReg);
reg!(ERR_ACK, 0x060, u32);

// Debug write bank.
reg!(DBG_HALT, 0x068, HaltReg);
reg!(DBG_BKPT, 0x070, BkptReg);
reg!(DBG_STEPS, 0x078, StepsReg);
reg!(DBG_TRIG_ACT, 0x080, EnableReg);
reg!(DBG_TRIG_UP, 0x088, u32);
reg!(DBG_TRIG_DOWN, 0x090, u32);
reg!(DBG_OP_ADDR, 0x098, u32);
reg!(DBG_OPCODE, 0x0A0, u32);
reg!(DBG_TRNG_CTRL, 0x0A8, TrngCtrlReg);
reg!(DBG_TRNG_CFG, 0x0B0, TrngCfgReg);
reg!(DBG_TRNG_RAW_ADDR, 0x0B8, u32);
reg!(DBG_TRNG_DIAG_SEL, 0x0C0, u32);
reg!(DBG_CFG_XYSHUF, 0x0C8, EnableReg);
reg!(DBG_CFG_AXIMSK, 0x0D0, AxiMaskReg);
reg!(DBG_CFG_TOKEN, 0x0D8, EnableReg);
reg!(DBG_FP_ADDR, 0x0E0, u32);
reg!(DBG_FP_WDATA, 0x0E8, u32);
reg!(DBG_ATK_CFG0, 0x0F0, AtkCfg0Reg);
reg!(DBG_ATK_CFG1, 0x0F8, AtkCfg1Reg);
reg!(DBG_ATK_CFG2, 0x100, AtkCfg2Reg);

// Read bank.
reg!(STATUS, 0x180, StatusReg);
reg!(READ_DATA, 0x188, u32);
reg!(CAPABILITIES, 0x190, CapsReg);
reg!(CAPABILITIES2, 0x198, Caps2Reg);
reg!(HW_VERSION, 0x1A0, VersionReg);
reg!(PRIME_SIZE_RB, 0x1A8, u32);
reg!(DBG_CAPABILITIES0, 0x1B0, DbgCaps0Reg);
reg!(DBG_CAPABILITIES1, 0x1B8, DbgCaps1Reg);
reg!(DBG_CAPABILITIES2, 0x1C0, DbgCaps2Reg);
reg!(DBG_STATUS, 0x1C8, DbgStatusReg);
reg!(DBG_TIME, 0x1D0, u32);
reg!(DBG_RAWFIFO_DUR, 0x1D8, u32);
reg!(DBG_EXP_FLAGS, 0x1E0, ExpFlagsReg);
reg!(DBG_TRNG_STATUS, 0x1E8, TrngStatusReg);
reg!(DBG_TRNG_RAW_DATA, 0x1F0, u32);
reg!(DBG_FP_RDATA, 0x1F8, u32);
reg!(DBG_IRN_MIN, 0x200, u32);
reg!(DBG_IRN_MAX, 0x208, u32);
reg!(DBG_IRN_OK, 0x210, u32);
reg!(DBG_IRN_STARV, 0x218, u32);
reg!(DBG_CLK_CNT, 0x220, u32);
reg!(DBG_CLKMM_CNT, 0x228, u32);

bitfield! {
    /// Command register. One action bit per point operation, plus the
    /// large-number window controls (direction bits and slot address).
    #[derive(Copy, Clone, PartialEq, Eq)]
    pub struct CtrlReg(pub u32): Debug {
        pub kp: bool [wo] @ 0,
        pub add: bool [wo] @ 1,
        pub dbl: bool [wo] @ 2,
        pub chk: bool [wo] @ 3,
        pub neg: bool [wo] @ 4,
        pub equ: bool [wo] @ 5,
        pub opp: bool [wo] @ 6,
        pub read_token: bool [wo] @ 12,
        pub write_nb: bool [wo] @ 16,
        pub read_nb: bool [wo] @ 17,
        pub write_scalar: bool [wo] @ 18,
        pub nb_addr: u16 [wo] @ 20..=31,
    }
}
derive_tofrom_primitive!(CtrlReg, u32);

bitfield! {
    /// Composite status word. The error field occupies the upper half; see
    /// [`HwError`](crate::error::HwError) for its positional meanings.
    #[derive(Copy, Clone, PartialEq, Eq)]
    pub struct StatusReg(pub u32): Debug {
        pub busy: bool [ro] @ 0,
        pub kp: bool [ro] @ 4,
        pub mty: bool [ro] @ 5,
        pub pop: bool [ro] @ 6,
        pub r_or_w: bool [ro] @ 7,
        pub init: bool [ro] @ 8,
        pub nndynact: bool [ro] @ 9,
        /// Held by the IP while it is still accumulating the randomness that
        /// masks the scalar on its way in. The scalar must not be written
        /// until this clears.
        pub enough_rnd_wk: bool [ro] @ 10,
        pub yes: bool [ro] @ 11,
        pub r0_is_null: bool [ro] @ 12,
        pub r1_is_null: bool [ro] @ 13,
        pub token_gen: bool [ro] @ 14,
        pub error: u16 [ro] @ 16..=31,
    }
}
derive_tofrom_primitive!(StatusReg, u32);

bitfield! {
    /// R0_NULL / R1_NULL. Writing raises or clears the corresponding
    /// point-at-infinity flag.
    #[derive(Copy, Clone, PartialEq, Eq)]
    pub struct PointNullReg(pub u32): Debug {
        pub null: bool [wo] @ 0,
    }
}
derive_tofrom_primitive!(PointNullReg, u32);

bitfield! {
    /// Generic single-enable register (shuffle, IRQ, trigger, XY-shuffle,
    /// token countermeasure).
    #[derive(Copy, Clone, PartialEq, Eq)]
    pub struct EnableReg(pub u32): Debug {
        pub enable: bool [wo] @ 0,
    }
}
derive_tofrom_primitive!(EnableReg, u32);

bitfield! {
    #[derive(Copy, Clone, PartialEq, Eq)]
    pub struct BlindingReg(pub u32): Debug {
        pub enable: bool [wo] @ 0,
        pub size: u32 [wo] @ 4..=31,
    }
}
derive_tofrom_primitive!(BlindingReg, u32);

bitfield! {
    /// Periodic Z-remasking. The period field holds the requested period
    /// minus one.
    #[derive(Copy, Clone, PartialEq, Eq)]
    pub struct ZremaskReg(pub u32): Debug {
        pub enable: bool [wo] @ 0,
        pub period: u16 [wo] @ 16..=31,
    }
}
derive_tofrom_primitive!(ZremaskReg, u32);

bitfield! {
    /// AXI on-the-fly scalar masking, plus the kappa/kappa' shift-register
    /// masks that ride on the same configuration word.
    #[derive(Copy, Clone, PartialEq, Eq)]
    pub struct AxiMaskReg(pub u32): Debug {
        pub enable: bool [wo] @ 0,
        pub kappa_msk: bool [wo] @ 4,
        pub kappa_p_msk: bool [wo] @ 5,
    }
}
derive_tofrom_primitive!(AxiMaskReg, u32);

bitfield! {
    /// Debug halt/resume strobes.
    #[derive(Copy, Clone, PartialEq, Eq)]
    pub struct HaltReg(pub u32): Debug {
        pub halt: bool [wo] @ 0,
        pub resume: bool [wo] @ 1,
    }
}
derive_tofrom_primitive!(HaltReg, u32);

bitfield! {
    /// Breakpoint slot. `state` qualifies the match; zero means any state.
    /// `nbbit` qualifies on the scalar bit index; zero means any bit.
    #[derive(Copy, Clone, PartialEq, Eq)]
    pub struct BkptReg(pub u32): Debug {
        pub enable: bool [wo] @ 0,
        pub id: u8 [wo] @ 1..=2,
        pub addr: u16 [wo] @ 4..=15,
        pub nbbit: u16 [wo] @ 16..=27,
        pub state: u8 [wo] @ 28..=31,
    }
}
derive_tofrom_primitive!(BkptReg, u32);

bitfield! {
    #[derive(Copy, Clone, PartialEq, Eq)]
    pub struct StepsReg(pub u32): Debug {
        pub count: u16 [wo] @ 0..=15,
    }
}
derive_tofrom_primitive!(StepsReg, u32);

bitfield! {
    #[derive(Copy, Clone, PartialEq, Eq)]
    pub struct DbgStatusReg(pub u32): Debug {
        pub halted: bool [ro] @ 0,
        pub bk_id: u8 [ro] @ 1..=2,
        pub bk_hit: bool [ro] @ 3,
        pub pc: u16 [ro] @ 4..=15,
        pub state: u8 [ro] @ 28..=31,
    }
}
derive_tofrom_primitive!(DbgStatusReg, u32);

bitfield! {
    /// Static capability word. Bit 0 distinguishes the debug (unsecure)
    /// build from the production one.
    #[derive(Copy, Clone, PartialEq, Eq)]
    pub struct CapsReg(pub u32): Debug {
        pub debug_build: bool [ro] @ 0,
        pub shuffle: bool [ro] @ 4,
        pub dynamic_nn: bool [ro] @ 8,
        pub wire64: bool [ro] @ 9,
        pub nn_max: u32 [ro] @ 12..=31,
    }
}
derive_tofrom_primitive!(CapsReg, u32);

bitfield! {
    /// Extra capability word, only decoded on debug builds.
    #[derive(Copy, Clone, PartialEq, Eq)]
    pub struct Caps2Reg(pub u32): Debug {
        pub trng_postproc: bool [ro] @ 0,
        pub small_scalar: bool [ro] @ 1,
        pub token: bool [ro] @ 2,
        pub xyshuf: bool [ro] @ 3,
        pub aximsk: bool [ro] @ 4,
        pub zremask: bool [ro] @ 5,
    }
}
derive_tofrom_primitive!(Caps2Reg, u32);

bitfield! {
    #[derive(Copy, Clone, PartialEq, Eq)]
    pub struct VersionReg(pub u32): Debug {
        pub patch: u16 [ro] @ 0..=15,
        pub minor: u8 [ro] @ 16..=23,
        pub major: u8 [ro] @ 24..=31,
    }
}
derive_tofrom_primitive!(VersionReg, u32);

bitfield! {
    /// Microcode geometry: number of opcode slots and opcode word width.
    #[derive(Copy, Clone, PartialEq, Eq)]
    pub struct DbgCaps0Reg(pub u32): Debug {
        pub opcode_count: u16 [ro] @ 0..=15,
        pub opcode_word64: bool [ro] @ 16,
    }
}
derive_tofrom_primitive!(DbgCaps0Reg, u32);

bitfield! {
    #[derive(Copy, Clone, PartialEq, Eq)]
    pub struct DbgCaps1Reg(pub u32): Debug {
        pub raw_fifo_bits: u32 [ro] @ 0..=25,
    }
}
derive_tofrom_primitive!(DbgCaps1Reg, u32);

bitfield! {
    #[derive(Copy, Clone, PartialEq, Eq)]
    pub struct DbgCaps2Reg(pub u32): Debug {
        pub irn_shuffle_width: u8 [ro] @ 0..=7,
    }
}
derive_tofrom_primitive!(DbgCaps2Reg, u32);

bitfield! {
    /// TRNG control strobes and switches.
    #[derive(Copy, Clone, PartialEq, Eq)]
    pub struct TrngCtrlReg(pub u32): Debug {
        pub postproc_disable: bool [wo] @ 0,
        pub raw_read_disable: bool [wo] @ 1,
        pub fifo_reset: bool [wo] @ 2,
        pub complete_bypass: bool [wo] @ 3,
        pub bypass_value: bool [wo] @ 4,
        pub nnrnd_deterministic: bool [wo] @ 8,
    }
}
derive_tofrom_primitive!(TrngCtrlReg, u32);

bitfield! {
    #[derive(Copy, Clone, PartialEq, Eq)]
    pub struct TrngCfgReg(pub u32): Debug {
        pub von_neumann: bool [wo] @ 0,
        pub ta: u16 [wo] @ 4..=19,
        pub idle_starve: bool [wo] @ 20,
    }
}
derive_tofrom_primitive!(TrngCfgReg, u32);

bitfield! {
    #[derive(Copy, Clone, PartialEq, Eq)]
    pub struct TrngStatusReg(pub u32): Debug {
        pub raw_count: u32 [ro] @ 0..=25,
        pub raw_full: bool [ro] @ 31,
    }
}
derive_tofrom_primitive!(TrngStatusReg, u32);

bitfield! {
    /// Per-step exception flags exposed while halted: the internal
    /// per-bit control values and the scalar bit index of the main loop.
    #[derive(Copy, Clone, PartialEq, Eq)]
    pub struct ExpFlagsReg(pub u32): Debug {
        pub r0_is_zero: bool [ro] @ 0,
        pub r1_is_zero: bool [ro] @ 1,
        pub kappa: bool [ro] @ 2,
        pub kappa_p: bool [ro] @ 3,
        pub zu: bool [ro] @ 4,
        pub zc: bool [ro] @ 5,
        pub jbit: u16 [ro] @ 8..=23,
    }
}
derive_tofrom_primitive!(ExpFlagsReg, u32);

bitfield! {
    /// Attack configuration, word 0: countermeasure kill switches.
    #[derive(Copy, Clone, PartialEq, Eq)]
    pub struct AtkCfg0Reg(pub u32): Debug {
        pub not_always_add: bool [wo] @ 0,
        pub no_collision_cm: bool [wo] @ 1,
    }
}
derive_tofrom_primitive!(AtkCfg0Reg, u32);

bitfield! {
    /// Attack configuration, word 1: NNRND shift-register control.
    #[derive(Copy, Clone, PartialEq, Eq)]
    pub struct AtkCfg1Reg(pub u32): Debug {
        pub no_nnrnd_shift: bool [wo] @ 0,
    }
}
derive_tofrom_primitive!(AtkCfg1Reg, u32);

bitfield! {
    /// Attack configuration, word 2: clock divider outputs.
    #[derive(Copy, Clone, PartialEq, Eq)]
    pub struct AtkCfg2Reg(pub u32): Debug {
        pub clk_div_out: u8 [wo] @ 0..=7,
        pub clk_mm_div_out: u8 [wo] @ 16..=23,
    }
}
derive_tofrom_primitive!(AtkCfg2Reg, u32);
