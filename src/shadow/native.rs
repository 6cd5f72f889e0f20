//! Native-facing side of the binding.
//!
//! The firmware exposes the shadow through two C entry points: one storing a
//! single `(callback, userdata)` pair and one pushing a JSON update. The
//! [`Native`] trait mirrors that contract so the binding can run on top of the
//! real library (see the `mgos` feature) or on top of a test double.
//!
//! Events travel back through [`trampoline`], a fixed `extern "C"` function
//! whose userdata pointer is the binding's registration slot.

use super::Event;
use super::StateHandler;
use super::error::Error;
use super::payload::decode_state;
use alloc::boxed::Box;
use core::cell::{Cell, RefCell};
use core::ffi::{CStr, c_char, c_int, c_void};
use core::ptr::NonNull;

/// Native return code of a successful update request.
pub const UPDATE_SUCCESS: c_int = 1;

/// Status handed back to the native layer when an event could not be
/// delivered to the registered handler.
pub const DISPATCH_FAILED: c_int = 0;

/// Signature of the callback the native layer invokes on every shadow event.
///
/// `reported` and `desired` are NUL-terminated strings that are either empty
/// or well-formed JSON.
pub type RawStateHandler = unsafe extern "C" fn(
    userdata: *mut c_void,
    event: c_int,
    reported: *const c_char,
    desired: *const c_char,
) -> c_int;

/// The native shadow entry points consumed by [`Shadow`](super::Shadow).
pub trait Native {
    /// Stores `handler` and `userdata` in the native handler slot, replacing
    /// the previous pair.
    ///
    /// The native layer must only ever call `handler` with this exact
    /// `userdata`, and must stop using a pair once it has been replaced.
    fn set_state_handler(&mut self, handler: RawStateHandler, userdata: *mut c_void);

    /// Requests a shadow update.
    ///
    /// `version` is `0` to apply to any version. Returns [`UPDATE_SUCCESS`]
    /// when the request was accepted for sending.
    fn update(&mut self, version: f64, state: &CStr) -> c_int;
}

/// The registration record the native layer points at.
///
/// A handler may replace itself while it runs, so the running dispatch and
/// [`Shadow::set_handler`](super::Shadow::set_handler) can both reach the same
/// slot. It is therefore only accessed through shared references.
pub(crate) struct Slot {
    handler: RefCell<Box<dyn StateHandler>>,
    last_error: Cell<Option<Error>>,
    in_dispatch: Cell<bool>,
    retired: Cell<bool>,
}

impl Slot {
    /// Moves a handler into a new heap slot.
    pub(crate) fn allocate(handler: Box<dyn StateHandler>) -> NonNull<Slot> {
        NonNull::from(Box::leak(Box::new(Self {
            handler: RefCell::new(handler),
            last_error: Cell::new(None),
            in_dispatch: Cell::new(false),
            retired: Cell::new(false),
        })))
    }

    /// Gives up a slot the native layer no longer points at.
    ///
    /// A slot whose handler is running is only marked; the running dispatch
    /// frees it once the handler returns.
    ///
    /// # Safety
    ///
    /// `slot` must come from [`Slot::allocate`], must no longer be registered
    /// and must not have been released before.
    pub(crate) unsafe fn release(slot: NonNull<Slot>) {
        // SAFETY: the slot is alive until this function frees it.
        let running = {
            let this = unsafe { slot.as_ref() };
            this.retired.set(true);
            this.in_dispatch.get()
        };
        if !running {
            // SAFETY: allocated by `allocate`, retired, and no handler runs.
            drop(unsafe { Box::from_raw(slot.as_ptr()) });
        }
    }

    /// Runs one event through `slot`.
    ///
    /// # Safety
    ///
    /// `slot` must come from [`Slot::allocate`] and must not be freed yet.
    pub(crate) unsafe fn dispatch(
        slot: NonNull<Slot>,
        code: c_int,
        reported: &str,
        desired: &str,
    ) -> Result<c_int, Error> {
        // SAFETY: alive per the caller's contract.
        let result = unsafe { slot.as_ref() }.run(code, reported, desired);
        // SAFETY: the reference above is no longer used.
        unsafe { Self::finish(slot) };
        result
    }

    /// # Safety
    ///
    /// As [`Slot::dispatch`]; `reported` and `desired` must each be null or
    /// point to a NUL-terminated string that stays valid for the call.
    unsafe fn dispatch_raw(
        slot: NonNull<Slot>,
        code: c_int,
        reported: *const c_char,
        desired: *const c_char,
    ) -> c_int {
        // SAFETY: forwarded from the caller.
        let (reported, desired) = unsafe { (c_text(reported), c_text(desired)) };
        // SAFETY: alive per the caller's contract.
        let this = unsafe { slot.as_ref() };
        let result = reported.and_then(|rep| this.run(code, rep, desired?));
        if let Err(err) = result {
            #[cfg(feature = "defmt")]
            defmt::error!("shadow event {} not delivered: {}", code, err);
            this.last_error.set(Some(err));
        }
        // SAFETY: `this` is not used past this point.
        unsafe { Self::finish(slot) };
        result.unwrap_or(DISPATCH_FAILED)
    }

    /// Decodes both state sections and runs the handler.
    fn run(&self, code: c_int, reported: &str, desired: &str) -> Result<c_int, Error> {
        let mut handler = self
            .handler
            .try_borrow_mut()
            .map_err(|_| Error::Reentrant)?;
        let event = Event::from_code(code);
        let reported = decode_state(reported)?;
        let desired = decode_state(desired)?;

        self.in_dispatch.set(true);
        let status = handler.on_state(event, reported, desired);
        self.in_dispatch.set(false);
        Ok(status)
    }

    /// Frees a slot that was released while its handler ran.
    ///
    /// # Safety
    ///
    /// `slot` must be alive and no reference into it may be used afterwards.
    unsafe fn finish(slot: NonNull<Slot>) {
        // SAFETY: alive per the caller's contract.
        let release = {
            let this = unsafe { slot.as_ref() };
            this.retired.get() && !this.in_dispatch.get()
        };
        if release {
            // SAFETY: retired, so the native layer and `Shadow` have let go.
            drop(unsafe { Box::from_raw(slot.as_ptr()) });
        }
    }

    pub(crate) fn take_error(&self) -> Option<Error> {
        self.last_error.take()
    }
}

/// Borrows a native string; a null pointer reads as empty.
///
/// # Safety
///
/// `ptr` must be null or point to a NUL-terminated string valid for `'a`.
unsafe fn c_text<'a>(ptr: *const c_char) -> Result<&'a str, Error> {
    if ptr.is_null() {
        return Ok("");
    }
    // SAFETY: non-null and NUL-terminated per the caller's contract.
    unsafe { CStr::from_ptr(ptr) }
        .to_str()
        .map_err(|_| Error::InvalidUtf8)
}

/// The fixed callback registered with the native layer.
///
/// # Safety
///
/// `userdata` must be a slot pointer registered by [`Shadow`](super::Shadow)
/// that had not been replaced when the native layer started this call; the
/// text pointers follow the [`RawStateHandler`] contract.
pub(crate) unsafe extern "C" fn trampoline(
    userdata: *mut c_void,
    event: c_int,
    reported: *const c_char,
    desired: *const c_char,
) -> c_int {
    let Some(slot) = NonNull::new(userdata.cast::<Slot>()) else {
        return DISPATCH_FAILED;
    };
    // SAFETY: a registered slot is only freed once no dispatch runs on it.
    unsafe { Slot::dispatch_raw(slot, event, reported, desired) }
}
