//! Drives the full register protocol against a software register window.
//!
//! The window is plain memory, so the IP side of every handshake is
//! trivially satisfied (BUSY reads clear, the error field reads zero) and
//! each test asserts the exact register image the driver leaves behind:
//! control-word encodings, countermeasure configurations, breakpoint
//! words, patch sequences. Status-driven behavior is exercised by seeding
//! the read bank before the call.

use std::cell::UnsafeCell;

use ecc_accel::debug::{DiagSource, FsmState};
use ecc_accel::{Ecc, Error, HwError};

// The register map, byte offsets at 8-byte stride.
const CTRL: usize = 0x000;
const WRITE_DATA: usize = 0x008;
const R0_NULL: usize = 0x010;
const R1_NULL: usize = 0x018;
const PRIME_SIZE: usize = 0x020;
const BLINDING: usize = 0x028;
const ZREMASK: usize = 0x038;
const SMALL_SCALAR: usize = 0x048;
const IRQ: usize = 0x058;
const DBG_BKPT: usize = 0x070;
const DBG_STEPS: usize = 0x078;
const DBG_TRIG_ACT: usize = 0x080;
const DBG_TRIG_UP: usize = 0x088;
const DBG_TRIG_DOWN: usize = 0x090;
const DBG_OP_ADDR: usize = 0x098;
const DBG_OPCODE: usize = 0x0A0;
const DBG_TRNG_CTRL: usize = 0x0A8;
const DBG_TRNG_CFG: usize = 0x0B0;
const DBG_TRNG_RAW_ADDR: usize = 0x0B8;
const DBG_TRNG_DIAG_SEL: usize = 0x0C0;
const DBG_CFG_AXIMSK: usize = 0x0D0;
const DBG_FP_ADDR: usize = 0x0E0;
const DBG_FP_WDATA: usize = 0x0E8;
const DBG_ATK_CFG0: usize = 0x0F0;
const DBG_ATK_CFG1: usize = 0x0F8;
const DBG_ATK_CFG2: usize = 0x100;
const DBG_IRN_MIN: usize = 0x200;
const DBG_IRN_MAX: usize = 0x208;
const DBG_IRN_OK: usize = 0x210;
const DBG_IRN_STARV: usize = 0x218;
const STATUS: usize = 0x180;
const READ_DATA: usize = 0x188;
const CAPABILITIES: usize = 0x190;
const HW_VERSION: usize = 0x1A0;
const PRIME_SIZE_RB: usize = 0x1A8;
const DBG_CAPABILITIES0: usize = 0x1B0;
const DBG_STATUS: usize = 0x1C8;
const DBG_TRNG_STATUS: usize = 0x1E8;
const DBG_TRNG_RAW_DATA: usize = 0x1F0;
const ERR_ACK: usize = 0x060;

#[repr(align(8))]
struct Window(UnsafeCell<[u8; 0x400]>);

/// A fake IP: a zeroed register window with seedable read-bank values.
struct Fake {
    win: Box<Window>,
}

impl Fake {
    /// Debug build, dynamic nn, shuffle, 32-bit wire, nn_max = 256,
    /// currently running at nn = 256, 512 opcode slots.
    fn new() -> Self {
        let fake = Self::blank();
        fake.poke(CAPABILITIES, 1 | 1 << 4 | 1 << 8 | 256 << 12);
        fake.poke(PRIME_SIZE_RB, 256);
        fake.poke(DBG_CAPABILITIES0, 512);
        fake
    }

    fn blank() -> Self {
        Self { win: Box::new(Window(UnsafeCell::new([0; 0x400]))) }
    }

    fn base(&self) -> *mut u8 {
        self.win.0.get() as *mut u8
    }

    fn poke(&self, offset: usize, value: u32) {
        unsafe { (self.base().add(offset) as *mut u32).write(value) }
    }

    fn peek(&self, offset: usize) -> u32 {
        unsafe { (self.base().add(offset) as *const u32).read() }
    }

    fn peek64(&self, offset: usize) -> u64 {
        unsafe { (self.base().add(offset) as *const u64).read() }
    }

    fn dev(&self) -> Ecc {
        unsafe { Ecc::new(self.base()) }.expect("bring-up")
    }
}

// NIST P-256.
const P256_P: [u8; 32] = [
    0xff, 0xff, 0xff, 0xff, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
    0xff, 0xff,
];
const P256_A: [u8; 32] = [
    0xff, 0xff, 0xff, 0xff, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
    0xff, 0xfc,
];
const P256_B: [u8; 32] = [
    0x5a, 0xc6, 0x35, 0xd8, 0xaa, 0x3a, 0x93, 0xe7, 0xb3, 0xeb, 0xbd, 0x55, 0x76, 0x98, 0x86,
    0xbc, 0x65, 0x1d, 0x06, 0xb0, 0xcc, 0x53, 0xb0, 0xf6, 0x3b, 0xce, 0x3c, 0x3e, 0x27, 0xd2,
    0x60, 0x4b,
];
const P256_Q: [u8; 32] = [
    0xff, 0xff, 0xff, 0xff, 0x00, 0x00, 0x00, 0x00, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
    0xff, 0xbc, 0xe6, 0xfa, 0xad, 0xa7, 0x17, 0x9e, 0x84, 0xf3, 0xb9, 0xca, 0xc2, 0xfc, 0x63,
    0x25, 0x51,
];
const P256_GX: [u8; 32] = [
    0x6b, 0x17, 0xd1, 0xf2, 0xe1, 0x2c, 0x42, 0x47, 0xf8, 0xbc, 0xe6, 0xe5, 0x63, 0xa4, 0x40,
    0xf2, 0x77, 0x03, 0x7d, 0x81, 0x2d, 0xeb, 0x33, 0xa0, 0xf4, 0xa1, 0x39, 0x45, 0xd8, 0x98,
    0xc2, 0x96,
];
const P256_GY: [u8; 32] = [
    0x4f, 0xe3, 0x42, 0xe2, 0xfe, 0x1a, 0x7f, 0x9b, 0x8e, 0xe7, 0xeb, 0x4a, 0x7c, 0x0f, 0x9e,
    0x16, 0x2b, 0xce, 0x33, 0x57, 0x6b, 0x31, 0x5e, 0xce, 0xcb, 0xb6, 0x40, 0x68, 0x37, 0xbf,
    0x51, 0xf5,
];

#[test]
fn bring_up_decodes_capabilities() {
    let fake = Fake::new();
    let dev = fake.dev();
    let caps = dev.capabilities();
    assert!(!caps.secure);
    assert!(caps.dynamic_nn);
    assert!(caps.shuffle);
    assert!(!caps.wire64);
    assert_eq!(caps.nn_max, 256);
    assert_eq!(caps.opcode_count, 512);
    assert_eq!(dev.nn(), 256);
}

#[test]
fn version_decodes() {
    let fake = Fake::new();
    fake.poke(HW_VERSION, 1 << 24 | 2 << 16 | 3);
    assert_eq!(fake.dev().version(), (1, 2, 3));
}

#[test]
fn set_curve_reconfigures_nn_and_streams_operands() {
    let fake = Fake::new();
    let dev = fake.dev();
    dev.set_curve(&P256_A, &P256_B, &P256_P, &P256_Q).unwrap();
    // The 256-bit prime drives the dynamic-nn reconfiguration.
    assert_eq!(fake.peek(PRIME_SIZE), 256);
    // The window ends up selected on Q for write: write-nb | addr 3.
    assert_eq!(fake.peek(CTRL), 1 << 16 | 3 << 20);
    // Last word pushed is the most-significant word of q.
    assert_eq!(fake.peek(WRITE_DATA), 0xffff_ffff);
}

#[test]
fn static_nn_build_keeps_prime_size() {
    let fake = Fake::new();
    // Same build without the dynamic-nn capability.
    fake.poke(CAPABILITIES, 1 | 1 << 4 | 256 << 12);
    let dev = fake.dev();
    fake.poke(PRIME_SIZE, 0xdead_dead);
    dev.set_curve(&P256_A, &P256_B, &P256_P, &P256_Q).unwrap();
    assert_eq!(fake.peek(PRIME_SIZE), 0xdead_dead);
}

#[test]
fn on_curve_check_reads_the_yes_bit_and_keeps_null_flags() {
    let fake = Fake::new();
    let dev = fake.dev();
    // R0 flagged null beforehand, YES answer seeded.
    fake.poke(STATUS, 1 << 12 | 1 << 11);
    assert!(dev.is_on_curve(&P256_GX, &P256_GY).unwrap());
    // The saved flags were written back unconditionally.
    assert_eq!(fake.peek(R0_NULL), 1);
    assert_eq!(fake.peek(R1_NULL), 0);
    // Last word pushed is the most-significant word of Gy.
    assert_eq!(fake.peek(WRITE_DATA), 0x4fe3_42e2);
}

#[test]
fn mul_reads_back_both_result_coordinates() {
    let fake = Fake::new();
    let dev = fake.dev();
    let k = [1u8; 32];
    let (x, y) = dev.mul(&P256_GX, &P256_GY, &k, None, None).unwrap();
    assert_eq!(x.len(), 32);
    assert_eq!(y.len(), 32);
    // mul ends by reading R1.Y: read-nb | addr 7.
    assert_eq!(fake.peek(CTRL), 1 << 17 | 7 << 20);
}

#[test]
fn token_and_scalar_selects_raise_their_flag_bits() {
    let fake = Fake::new();
    let dev = fake.dev();
    // An oversized scalar aborts mul right after the token was pulled, so
    // the control register still holds the token selection.
    let err = dev.mul(&P256_GX, &P256_GY, &[0u8; 40], None, None).unwrap_err();
    assert!(matches!(err, Error::OperandTooLarge { got: 40, max: 32 }));
    assert_eq!(fake.peek(CTRL), 1 << 17 | 1 << 12 | 4 << 20);
    // An oversized x aborts right after the scalar went in.
    let err = dev.mul(&[0u8; 40], &P256_GY, &[1u8; 32], None, None).unwrap_err();
    assert!(matches!(err, Error::OperandTooLarge { got: 40, max: 32 }));
    assert_eq!(fake.peek(CTRL), 1 << 16 | 1 << 18 | 4 << 20);
}

#[test]
fn mul_unmasks_with_the_token() {
    let fake = Fake::new();
    let dev = fake.dev();
    // Every large-number pop returns the same word, so the token and both
    // coordinates read back identical and the unmasked result is zero.
    fake.poke(READ_DATA, 0xa5a5_a5a5);
    let k = [2u8; 32];
    let (x, y) = dev.mul(&P256_GX, &P256_GY, &k, None, None).unwrap();
    assert_eq!(x, vec![0u8; 32]);
    assert_eq!(y, vec![0u8; 32]);
}

#[test]
fn equality_check_strobes_equ_and_reads_the_yes_bit() {
    let fake = Fake::new();
    let dev = fake.dev();
    // R1 flagged null beforehand, YES answer seeded.
    fake.poke(STATUS, 1 << 13 | 1 << 11);
    assert!(dev.points_are_equal(&P256_GX, &P256_GY, &P256_GX, &P256_GY).unwrap());
    // The command register holds the EQU strobe.
    assert_eq!(fake.peek(CTRL), 1 << 5);
    // Both flags were written back unconditionally.
    assert_eq!(fake.peek(R0_NULL), 0);
    assert_eq!(fake.peek(R1_NULL), 1);
}

#[test]
fn opposition_check_strobes_opp() {
    let fake = Fake::new();
    let dev = fake.dev();
    assert!(!dev.points_are_opposite(&P256_GX, &P256_GY, &P256_GX, &P256_GY).unwrap());
    assert_eq!(fake.peek(CTRL), 1 << 6);
    // All four operands were streamed; last word is the MS word of y1.
    assert_eq!(fake.peek(WRITE_DATA), 0x4fe3_42e2);
}

#[test]
fn blinding_configuration_encodes_enable_and_size() {
    let fake = Fake::new();
    let dev = fake.dev();
    dev.enable_blinding(128).unwrap();
    assert_eq!(fake.peek(BLINDING), 1 | 128 << 4);
    dev.disable_blinding().unwrap();
    assert_eq!(fake.peek(BLINDING), 0);
}

#[test]
fn blinding_rejection_comes_back_as_bln_and_is_acked() {
    let fake = Fake::new();
    let dev = fake.dev();
    // The IP answers an oversized blinding with the BLN flag.
    fake.poke(STATUS, 1 << 25);
    let err = dev.enable_blinding(256).unwrap_err();
    assert!(matches!(err, Error::Hardware(f) if f == HwError::BLN));
    assert_eq!(fake.peek(ERR_ACK), 1 << 25);
}

#[test]
fn zremask_period_is_written_minus_one() {
    let fake = Fake::new();
    let dev = fake.dev();
    dev.enable_zremask(32).unwrap();
    assert_eq!(fake.peek(ZREMASK), 1 | 31 << 16);
    // Period zero is rejected in the driver: no write happens.
    fake.poke(ZREMASK, 0x5555_5555);
    dev.enable_zremask(0).unwrap();
    assert_eq!(fake.peek(ZREMASK), 0x5555_5555);
}

#[test]
fn shuffling_needs_the_capability() {
    let fake = Fake::new();
    fake.poke(CAPABILITIES, 1 | 1 << 8 | 256 << 12);
    let dev = fake.dev();
    assert!(matches!(dev.enable_shuffling(), Err(Error::ShuffleUnsupported)));
}

#[test]
fn small_scalar_bound_is_the_current_nn() {
    let fake = Fake::new();
    let dev = fake.dev();
    dev.set_small_scalar_size(160).unwrap();
    assert_eq!(fake.peek(SMALL_SCALAR), 160);
    assert!(matches!(dev.set_small_scalar_size(300), Err(Error::ScalarSize(300))));
}

#[test]
fn point_null_flags_are_register_writes() {
    let fake = Fake::new();
    let dev = fake.dev();
    dev.point_zero(1).unwrap();
    assert_eq!(fake.peek(R1_NULL), 1);
    dev.point_unzero(1).unwrap();
    assert_eq!(fake.peek(R1_NULL), 0);
    fake.poke(STATUS, 1 << 13);
    assert!(dev.point_iszero(1).unwrap());
    assert!(!dev.point_iszero(0).unwrap());
}

#[test]
fn breakpoint_word_encodes_all_qualifiers() {
    let fake = Fake::new();
    let dev = fake.dev();
    dev.set_breakpoint(2, 0x123, 7, FsmState::Setup).unwrap();
    assert_eq!(fake.peek(DBG_BKPT), 1 | 2 << 1 | 0x123 << 4 | 7 << 16 | 5 << 28);
    dev.remove_breakpoint(2).unwrap();
    assert_eq!(fake.peek(DBG_BKPT), 2 << 1);
    assert!(matches!(dev.set_breakpoint(4, 0, 0, FsmState::AnyOrIdle), Err(Error::BreakpointId(4))));
}

#[test]
fn run_opcodes_needs_a_halted_controller() {
    let fake = Fake::new();
    let dev = fake.dev();
    assert!(matches!(dev.run_opcodes(5), Err(Error::NotHalted)));
    fake.poke(DBG_STATUS, 1);
    dev.run_opcodes(5).unwrap();
    assert_eq!(fake.peek(DBG_STEPS), 5);
}

#[test]
fn opcode_patching_bounds_and_order() {
    let fake = Fake::new();
    let dev = fake.dev();
    dev.patch_one_opcode(0x40, 0xaaaa_aaaa, 0xbbbb_bbbb, 2).unwrap();
    assert_eq!(fake.peek(DBG_OP_ADDR), 0x40);
    // Both halves went through the same register, high half last.
    assert_eq!(fake.peek(DBG_OPCODE), 0xaaaa_aaaa);
    let err = dev.patch_one_opcode(512, 0, 0, 1).unwrap_err();
    assert!(matches!(err, Error::OpcodeAddress { addr: 512, limit: 512 }));
}

#[test]
fn microcode_patch_buffer_is_msb_first() {
    let fake = Fake::new();
    let dev = fake.dev();
    let buf = [0x1111_1111u32, 0x2222_2222, 0x3333_3333, 0x4444_4444];
    dev.patch_microcode(&buf, 2, 2).unwrap();
    // Last slot patched is opcode 1: address 1, MSB half 0x33333333.
    assert_eq!(fake.peek(DBG_OP_ADDR), 1);
    assert_eq!(fake.peek(DBG_OPCODE), 0x3333_3333);
    assert!(matches!(dev.patch_microcode(&buf, 3, 2), Err(Error::PatchBuffer)));
}

#[test]
fn limb_addressing_uses_the_power_of_two_stride() {
    let fake = Fake::new();
    let dev = fake.dev();
    // nn_max 256 over a 32-bit wire: 9 limbs, stride 16.
    dev.write_limb(2, 3, 0xabcd_0123).unwrap();
    assert_eq!(fake.peek(DBG_FP_ADDR), 2 * 16 + 3);
    assert_eq!(fake.peek(DBG_FP_WDATA), 0xabcd_0123);
}

#[test]
fn limb_access_rejects_wide_limbs() {
    let fake = Fake::new();
    fake.poke(CAPABILITIES, 1 | 1 << 4 | 1 << 8 | 1 << 9 | 256 << 12);
    let dev = fake.dev();
    assert!(matches!(dev.write_limb(0, 0, 0), Err(Error::LimbWidth)));
}

#[test]
fn attack_level_two_leaves_the_masking_on() {
    let fake = Fake::new();
    let dev = fake.dev();
    dev.attack_set_level(2).unwrap();
    assert_eq!(fake.peek(DBG_ATK_CFG0), 0);
    assert_eq!(fake.peek(DBG_CFG_AXIMSK), 1);
    assert!(matches!(dev.attack_set_level(4), Err(Error::AttackLevel(4))));
}

#[test]
fn attack_level_three_masks_the_kappa_registers() {
    let fake = Fake::new();
    let dev = fake.dev();
    dev.attack_set_level(3).unwrap();
    assert_eq!(fake.peek(DBG_CFG_AXIMSK), 1 | 1 << 4 | 1 << 5);
    // Idempotent: a second application leaves the same image.
    dev.attack_set_level(3).unwrap();
    assert_eq!(fake.peek(DBG_CFG_AXIMSK), 1 | 1 << 4 | 1 << 5);
}

#[test]
fn attack_level_zero_weakens_the_ladder() {
    let fake = Fake::new();
    let dev = fake.dev();
    dev.attack_set_level(0).unwrap();
    assert_eq!(fake.peek(DBG_ATK_CFG0), 1 | 1 << 1);
    assert_eq!(fake.peek(DBG_CFG_AXIMSK), 0);
}

#[test]
fn raw_fifo_scan_packs_bits_lsb_first() {
    let fake = Fake::new();
    let dev = fake.dev();
    fake.poke(DBG_TRNG_STATUS, 12);
    fake.poke(DBG_TRNG_RAW_DATA, 1);
    let mut buf = [0u8; 4];
    assert_eq!(dev.read_raw_fifo(&mut buf).unwrap(), 12);
    assert_eq!(buf, [0xff, 0x0f, 0, 0]);
}

#[test]
fn irq_line_toggles_through_its_register() {
    let fake = Fake::new();
    let dev = fake.dev();
    dev.enable_irq().unwrap();
    assert_eq!(fake.peek(IRQ), 1);
    dev.disable_irq().unwrap();
    assert_eq!(fake.peek(IRQ), 0);
}

#[test]
fn trigger_window_programs_both_edges() {
    let fake = Fake::new();
    let dev = fake.dev();
    dev.set_trigger_up(1_000).unwrap();
    dev.set_trigger_down(250_000).unwrap();
    dev.arm_trigger().unwrap();
    assert_eq!(fake.peek(DBG_TRIG_UP), 1_000);
    assert_eq!(fake.peek(DBG_TRIG_DOWN), 250_000);
    assert_eq!(fake.peek(DBG_TRIG_ACT), 1);
    dev.disarm_trigger().unwrap();
    assert_eq!(fake.peek(DBG_TRIG_ACT), 0);
}

#[test]
fn nnrnd_shift_register_control() {
    let fake = Fake::new();
    let dev = fake.dev();
    dev.attack_disable_nnrndsf().unwrap();
    assert_eq!(fake.peek(DBG_ATK_CFG1), 1);
    dev.attack_enable_nnrndsf().unwrap();
    assert_eq!(fake.peek(DBG_ATK_CFG1), 0);
}

#[test]
fn clock_divider_outputs_encode_both_fields() {
    let fake = Fake::new();
    let dev = fake.dev();
    dev.attack_set_clock_div_out(8, 32).unwrap();
    assert_eq!(fake.peek(DBG_ATK_CFG2), 8 | 32 << 16);
}

#[test]
fn trng_control_strobes() {
    let fake = Fake::new();
    let dev = fake.dev();
    dev.trng_postproc(false).unwrap();
    assert_eq!(fake.peek(DBG_TRNG_CTRL), 1);
    dev.trng_postproc(true).unwrap();
    assert_eq!(fake.peek(DBG_TRNG_CTRL), 0);
    dev.trng_reset_fifo().unwrap();
    assert_eq!(fake.peek(DBG_TRNG_CTRL), 1 << 2);
    dev.trng_bypass(true, true).unwrap();
    assert_eq!(fake.peek(DBG_TRNG_CTRL), 1 << 3 | 1 << 4);
    dev.trng_nnrnd_deterministic(true).unwrap();
    assert_eq!(fake.peek(DBG_TRNG_CTRL), 1 << 8);
}

#[test]
fn trng_config_packs_debias_and_sampling_period() {
    let fake = Fake::new();
    let dev = fake.dev();
    dev.trng_config(true, 0x123, true).unwrap();
    assert_eq!(fake.peek(DBG_TRNG_CFG), 1 | 0x123 << 4 | 1 << 20);
}

#[test]
fn diag_counters_read_through_the_selected_source() {
    let fake = Fake::new();
    let dev = fake.dev();
    fake.poke(DBG_IRN_MIN, 3);
    fake.poke(DBG_IRN_MAX, 97);
    fake.poke(DBG_IRN_OK, 4_000);
    fake.poke(DBG_IRN_STARV, 7);
    let diag = dev.trng_diag(DiagSource::Crv).unwrap();
    assert_eq!(fake.peek(DBG_TRNG_DIAG_SEL), 2);
    assert_eq!(diag.min, 3);
    assert_eq!(diag.max, 97);
    assert_eq!(diag.ok, 4_000);
    assert_eq!(diag.starved, 7);
}

#[test]
fn raw_bit_read_addresses_the_fifo_first() {
    let fake = Fake::new();
    let dev = fake.dev();
    fake.poke(DBG_TRNG_RAW_DATA, 1);
    assert!(dev.read_one_raw_bit(41).unwrap());
    assert_eq!(fake.peek(DBG_TRNG_RAW_ADDR), 41);
}

#[test]
fn secure_build_fuses_off_the_debug_surface() {
    let fake = Fake::blank();
    fake.poke(CAPABILITIES, 256 << 12);
    fake.poke(PRIME_SIZE_RB, 256);
    let dev = fake.dev();
    assert!(dev.capabilities().secure);
    assert!(matches!(dev.halt_now(), Err(Error::DebugOnly)));
    assert!(matches!(dev.more_capabilities(), Err(Error::DebugOnly)));
    assert!(matches!(dev.attack_set_level(1), Err(Error::DebugOnly)));
}

#[test]
fn wide_wire_register_writes_carry_the_swapped_copy() {
    let fake = Fake::new();
    fake.poke(CAPABILITIES, 1 | 1 << 4 | 1 << 8 | 1 << 9 | 256 << 12);
    let dev = fake.dev();
    dev.enable_blinding(128).unwrap();
    let word = fake.peek64(BLINDING);
    assert_eq!(word >> 32, 1 | 128 << 4);
    assert_eq!(word as u32, (1u32 | 128 << 4).swap_bytes());
}

#[test]
fn wide_wire_moves_eight_operand_bytes_per_push() {
    let fake = Fake::new();
    fake.poke(CAPABILITIES, 1 | 1 << 4 | 1 << 8 | 1 << 9 | 256 << 12);
    let dev = fake.dev();
    dev.is_on_curve(&P256_GX, &P256_GY).unwrap();
    // Last push holds the eight most-significant bytes of Gy.
    assert_eq!(fake.peek64(WRITE_DATA), 0x4fe3_42e2_fe1a_7f9b);
}

#[test]
fn dynamic_nn_follows_the_curve_between_runs() {
    let fake = Fake::new();
    // Allow 384-bit primes on this build.
    fake.poke(CAPABILITIES, 1 | 1 << 4 | 1 << 8 | 384 << 12);
    fake.poke(PRIME_SIZE_RB, 384);
    let dev = fake.dev();
    let p192 = {
        let mut p = vec![0xffu8; 24];
        p[23] = 0xef;
        p
    };
    dev.set_curve(&[0u8; 24], &[3u8; 24], &p192, &p192).unwrap();
    assert_eq!(fake.peek(PRIME_SIZE), 192);
    let p384 = vec![0xffu8; 48];
    dev.set_curve(&[0u8; 48], &[3u8; 48], &p384, &p384).unwrap();
    assert_eq!(fake.peek(PRIME_SIZE), 384);
}
