//! Step-by-step [k]P tracing and Z-mask injection.
//!
//! The engine pins hardware breakpoints on the microcode landmarks of a
//! scalar multiplication (input checks, the initial random draws, the
//! co-Z routine entries, the subtract-P correction, the exit and the final
//! on-curve check). At each stop it captures the exception flags, the
//! freshly drawn randomness and the working-point state into a [`KpTrace`]
//! buffer, then resumes. The engine itself is compiled behind the
//! `kp-trace` feature; lambda injection behind `z-mask`. [`KpTrace`] is
//! always available so that [`Ecc::mul`](crate::Ecc::mul) keeps one
//! signature across feature sets.

use log::warn;

/// Bounded, human-readable capture of one traced [k]P.
///
/// The capacity is fixed at construction. On the first record that does
/// not fit, a warning is logged once, and that record and all later ones
/// are dropped; [`overflowed`](Self::overflowed) reports the truncation.
/// A streaming instance forwards records to the `log` facade instead of
/// storing them and never overflows.
pub struct KpTrace {
    buf: String,
    capacity: usize,
    overflowed: bool,
    stream: bool,
}

impl KpTrace {
    /// A trace buffer holding up to `capacity` bytes of text.
    pub fn with_capacity(capacity: usize) -> Self {
        Self { buf: String::new(), capacity, overflowed: false, stream: false }
    }

    /// A trace sink that streams records to the logger instead of
    /// storing them.
    pub fn streaming() -> Self {
        Self { buf: String::new(), capacity: 0, overflowed: false, stream: true }
    }

    /// The captured text.
    pub fn as_str(&self) -> &str {
        &self.buf
    }

    /// Whether records were dropped for lack of space.
    pub fn overflowed(&self) -> bool {
        self.overflowed
    }

    /// Empties the buffer and re-arms the overflow warning.
    pub fn clear(&mut self) {
        self.buf.clear();
        self.overflowed = false;
    }

    pub(crate) fn push_line(&mut self, line: &str) {
        if self.stream {
            log::debug!(target: "kp-trace", "{line}");
            return;
        }
        if self.overflowed {
            return;
        }
        if self.buf.len() + line.len() + 1 > self.capacity {
            warn!("[k]P trace buffer full, dropping further records");
            self.overflowed = true;
            return;
        }
        self.buf.push_str(line);
        self.buf.push('\n');
    }
}

#[cfg(any(feature = "kp-trace", feature = "z-mask"))]
pub(crate) use engine::Engine;

#[cfg(any(feature = "kp-trace", feature = "z-mask"))]
mod engine {
    use zeroize::Zeroize;

    use super::KpTrace;
    use crate::debug::{lgnb, pc, FsmState};
    use crate::error::{self, Error};
    use crate::regs;
    use crate::Ecc;

    /// Setup-phase landmarks, in program order, with the variable drawn
    /// at each (if any).
    const SETUP_LANDMARKS: &[(u16, &str, Option<u32>)] = &[
        (pc::CHECK_INPUTS, "input checks", None),
        (pc::DRAW_ALPHA, "draw alpha", Some(lgnb::ALPHA)),
        (pc::DRAW_PHI0, "draw phi0", Some(lgnb::PHI0)),
        (pc::DRAW_PHI1, "draw phi1", Some(lgnb::PHI1)),
        (pc::AFTER_LAMBDA, "draw lambda", Some(lgnb::LAMBDA)),
        (pc::SETUP_END, "setup done", None),
    ];

    enum Stop {
        Halted,
        Done,
    }

    /// One armed trace/injection run. Built before the KP command bit is
    /// strobed, driven until the IP goes idle again.
    pub(crate) struct Engine<'a> {
        dev: &'a Ecc,
        log: Option<&'a mut KpTrace>,
        zmask: Option<&'a [u8]>,
    }

    impl<'a> Engine<'a> {
        /// Arms the initial breakpoint. Returns `None` when there is
        /// nothing to do (no trace sink and no mask to inject).
        pub(crate) fn arm(
            dev: &'a Ecc,
            log: Option<&'a mut KpTrace>,
            zmask: Option<&'a [u8]>,
        ) -> Result<Option<Self>, Error> {
            #[cfg(not(feature = "kp-trace"))]
            let log: Option<&'a mut KpTrace> = {
                let _ = log;
                None
            };
            #[cfg(not(feature = "z-mask"))]
            let zmask: Option<&'a [u8]> = {
                let _ = zmask;
                None
            };
            if log.is_none() && zmask.is_none() {
                return Ok(None);
            }
            dev.require_debug()?;
            if log.is_some() {
                dev.set_breakpoint(0, SETUP_LANDMARKS[0].0, 0, FsmState::AnyOrIdle)?;
            } else {
                dev.set_breakpoint(0, pc::AFTER_LAMBDA, 0, FsmState::Setup)?;
            }
            Ok(Some(Self { dev, log, zmask }))
        }

        /// Drives the armed run to completion.
        pub(crate) fn run(mut self) -> Result<(), Error> {
            if self.log.is_some() {
                if self.trace_setup()? && self.trace_loop()? {
                    self.trace_exit()?;
                }
            } else {
                self.inject_only()?;
            }
            error::busy_wait(&self.dev.mmio);
            Ok(())
        }

        fn wait_stop(&self) -> Stop {
            loop {
                if self.dev.mmio.get(regs::DBG_STATUS).halted() {
                    return Stop::Halted;
                }
                if !self.dev.mmio.get(regs::STATUS).busy() {
                    return Stop::Done;
                }
                core::hint::spin_loop();
            }
        }

        fn trace_setup(&mut self) -> Result<bool, Error> {
            for (i, &(addr, name, var)) in SETUP_LANDMARKS.iter().enumerate() {
                if matches!(self.wait_stop(), Stop::Done) {
                    return Ok(false);
                }
                self.capture(name)?;
                if let Some(var) = var {
                    self.dump_largenb(name, var)?;
                }
                if addr == pc::AFTER_LAMBDA {
                    self.maybe_inject()?;
                }
                match SETUP_LANDMARKS.get(i + 1) {
                    Some(&(next, _, _)) => {
                        self.dev.set_breakpoint(0, next, 0, FsmState::AnyOrIdle)?
                    }
                    None => self.arm_loop_breakpoints()?,
                }
                self.dev.resume()?;
            }
            Ok(true)
        }

        fn arm_loop_breakpoints(&self) -> Result<(), Error> {
            self.dev.set_breakpoint(0, pc::ZADDU, 0, FsmState::Loop)?;
            self.dev.set_breakpoint(1, pc::ZADDC, 0, FsmState::Loop)?;
            self.dev.set_breakpoint(2, pc::ZDBL, 0, FsmState::Loop)?;
            self.dev.set_breakpoint(3, pc::ZNEGC, 0, FsmState::Loop)
        }

        fn trace_loop(&mut self) -> Result<bool, Error> {
            loop {
                if matches!(self.wait_stop(), Stop::Done) {
                    return Ok(false);
                }
                let pcv = self.dev.mmio.get(regs::DBG_STATUS).pc();
                let name = match pcv {
                    p if p == pc::ZADDU => "zaddu",
                    p if p == pc::ZADDC => "zaddc",
                    p if p == pc::ZDBL => "zdbl",
                    p if p == pc::ZNEGC => "znegc",
                    _ => "loop",
                };
                self.capture(name)?;
                self.dump_points()?;
                let last_iteration = self.dev.step_flags()?.jbit == 0;
                if last_iteration {
                    // Move the breakpoint window to the tail landmarks.
                    for id in 0..4 {
                        self.dev.remove_breakpoint(id)?;
                    }
                    self.dev.set_breakpoint(0, pc::SUBTRACT_P, 0, FsmState::AnyOrIdle)?;
                    self.dev.set_breakpoint(1, pc::EXIT, 0, FsmState::AnyOrIdle)?;
                    self.dev.set_breakpoint(2, pc::CHECK_CURVE_LAST, 0, FsmState::Exit)?;
                    self.dev.resume()?;
                    return Ok(true);
                }
                self.dev.resume()?;
            }
        }

        fn trace_exit(&mut self) -> Result<(), Error> {
            let tail: &[(u16, &str)] = &[
                (pc::SUBTRACT_P, "subtract p"),
                (pc::EXIT, "exit"),
                (pc::CHECK_CURVE_LAST, "final on-curve check"),
            ];
            for &(addr, name) in tail {
                if matches!(self.wait_stop(), Stop::Done) {
                    return Ok(());
                }
                self.capture(name)?;
                self.dump_points()?;
                if addr == pc::CHECK_CURVE_LAST {
                    for id in 0..3 {
                        self.dev.remove_breakpoint(id)?;
                    }
                }
                self.dev.resume()?;
            }
            Ok(())
        }

        fn inject_only(&mut self) -> Result<(), Error> {
            if matches!(self.wait_stop(), Stop::Done) {
                return Ok(());
            }
            self.maybe_inject()?;
            self.dev.remove_breakpoint(0)?;
            self.dev.resume()
        }

        #[cfg(feature = "z-mask")]
        fn maybe_inject(&mut self) -> Result<(), Error> {
            let Some(mask) = self.zmask else { return Ok(()) };
            let (state, pcv) = self.dev.debug_state()?;
            if state != FsmState::Setup {
                return Err(Error::UnexpectedHalt { got: pcv, expected: pc::AFTER_LAMBDA });
            }
            self.dev.write_largenb_bytes(lgnb::LAMBDA, mask)?;
            self.record(format!("lambda overridden ({} bytes)", mask.len()));
            Ok(())
        }

        #[cfg(not(feature = "z-mask"))]
        fn maybe_inject(&mut self) -> Result<(), Error> {
            let _ = self.zmask;
            Ok(())
        }

        fn capture(&mut self, name: &str) -> Result<(), Error> {
            let st = self.dev.mmio.get(regs::DBG_STATUS);
            let state = FsmState::from(st.state());
            let f = self.dev.step_flags()?;
            self.record(format!(
                "[{state:?}] pc={:#05x} {name} j={} kap={}{} zu={} zc={} r0z={} r1z={}",
                st.pc(),
                f.jbit,
                f.kappa as u8,
                f.kappa_p as u8,
                f.zu as u8,
                f.zc as u8,
                f.r0_is_zero as u8,
                f.r1_is_zero as u8,
            ));
            Ok(())
        }

        fn dump_points(&mut self) -> Result<(), Error> {
            for (name, idx) in [
                ("xr0", lgnb::XR0),
                ("yr0", lgnb::YR0),
                ("xr1", lgnb::XR1),
                ("yr1", lgnb::YR1),
                ("zr01", lgnb::ZR01),
            ] {
                self.dump_largenb(name, idx)?;
            }
            Ok(())
        }

        fn dump_largenb(&mut self, name: &str, idx: u32) -> Result<(), Error> {
            // Limb reads need a 32-bit wire; on wider builds the dump is
            // skipped rather than failing the whole run.
            if self.dev.caps.ww() > 32 {
                return Ok(());
            }
            let mut limbs = self.dev.read_largenb(idx)?;
            let mut line = format!("  {name} = 0x");
            for limb in limbs.iter().rev() {
                line.push_str(&format!("{limb:08x}"));
            }
            self.record(line);
            limbs.zeroize();
            Ok(())
        }

        fn record(&mut self, line: String) {
            if let Some(log) = self.log.as_deref_mut() {
                log.push_line(&line);
            }
        }
    }
}
