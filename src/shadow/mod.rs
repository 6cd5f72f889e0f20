//! AWS IoT Device Shadow binding.
//!
//! A device shadow is a JSON document held in the cloud that mirrors the
//! `reported` state of a device and the `desired` state a controller wants it
//! to reach. The firmware's native library owns the whole synchronization
//! protocol (MQTT topics, TLS, versioning, deltas); this module only marshals
//! data across its two entry points:
//!
//! - [`Shadow::set_state_handler`] installs a Rust callback that receives
//!   every [`Event`] together with the decoded `reported` and `desired`
//!   sections.
//! - [`Shadow::update`] serializes a state document and hands it to the
//!   native layer. The outcome arrives later as [`Event::UpdateAccepted`] or
//!   [`Event::UpdateRejected`].
//!
//! # Usage
//!
//! ```rust,no_run
//! use core::ffi::{CStr, c_int, c_void};
//! use libshadow::shadow::{Event, Native, RawStateHandler, Shadow};
//! use serde_json::json;
//! # struct Firmware;
//! # impl Native for Firmware {
//! #     fn set_state_handler(&mut self, _h: RawStateHandler, _u: *mut c_void) {}
//! #     fn update(&mut self, _v: f64, _s: &CStr) -> c_int { 1 }
//! # }
//!
//! let mut shadow = Shadow::new(Firmware);
//!
//! shadow.set_state_handler(
//!     |led_pin: &mut u8, event, _reported, desired| {
//!         if event == Event::UpdateDelta {
//!             // drive `led_pin` from `desired["on"]`
//!             let _ = (led_pin, desired);
//!         }
//!         1
//!     },
//!     2u8,
//! );
//!
//! let sent = shadow.update(0, &json!({ "reported": { "on": true } }));
//! ```
//!
//! # Ownership
//!
//! The native layer keeps a raw pointer to the active registration, so a
//! registration lives until it is replaced, or until its handler returns when
//! it is replaced from inside that handler. Dropping a [`Shadow`] leaves the
//! active registration in place for the rest of the process.

use alloc::boxed::Box;
use core::ffi::{CStr, c_int};
use core::fmt;
use core::ptr::NonNull;
use serde::Serialize;
use serde_json::Value;

/// Common error types for shadow operations
pub mod error;

/// Foreign-function seam towards the firmware.
pub mod native;

/// JSON encoding and decoding of state documents.
pub mod payload;

/// Mongoose OS implementation of [`Native`].
#[cfg(feature = "mgos")]
pub mod mgos;


pub use error::Error;
#[cfg(feature = "mgos")]
pub use mgos::Mgos;
pub use native::{DISPATCH_FAILED, Native, RawStateHandler, UPDATE_SUCCESS};
pub use payload::{Desired, MAX_STATE_LEN, Reported, ShadowState};

use native::{Slot, trampoline};
use payload::{as_c_str, encode_state, encode_typed};

/// Events delivered to the state handler.
///
/// Codes the native layer sends beyond the six known ones are passed through
/// as [`Event::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Event {
    /// The device connected to the shadow service.
    Connected,
    /// The current shadow document was retrieved.
    GetAccepted,
    /// Retrieving the shadow document failed.
    GetRejected,
    /// An update was applied.
    UpdateAccepted,
    /// An update was refused, e.g. because of a version mismatch.
    UpdateRejected,
    /// `desired` differs from `reported`.
    UpdateDelta,
    /// A code without a named event.
    Other(c_int),
}

impl Event {
    /// Code of [`Event::Connected`].
    pub const CONNECTED: c_int = 0;
    /// Code of [`Event::GetAccepted`].
    pub const GET_ACCEPTED: c_int = 1;
    /// Code of [`Event::GetRejected`].
    pub const GET_REJECTED: c_int = 2;
    /// Code of [`Event::UpdateAccepted`].
    pub const UPDATE_ACCEPTED: c_int = 3;
    /// Code of [`Event::UpdateRejected`].
    pub const UPDATE_REJECTED: c_int = 4;
    /// Code of [`Event::UpdateDelta`].
    pub const UPDATE_DELTA: c_int = 5;

    /// Every named event, in code order.
    pub const ALL: [Event; 6] = [
        Event::Connected,
        Event::GetAccepted,
        Event::GetRejected,
        Event::UpdateAccepted,
        Event::UpdateRejected,
        Event::UpdateDelta,
    ];

    /// Returns the native code of this event.
    pub const fn code(self) -> c_int {
        match self {
            Event::Connected => Self::CONNECTED,
            Event::GetAccepted => Self::GET_ACCEPTED,
            Event::GetRejected => Self::GET_REJECTED,
            Event::UpdateAccepted => Self::UPDATE_ACCEPTED,
            Event::UpdateRejected => Self::UPDATE_REJECTED,
            Event::UpdateDelta => Self::UPDATE_DELTA,
            Event::Other(code) => code,
        }
    }

    /// Maps a native code to its event.
    pub const fn from_code(code: c_int) -> Self {
        match code {
            Self::CONNECTED => Event::Connected,
            Self::GET_ACCEPTED => Event::GetAccepted,
            Self::GET_REJECTED => Event::GetRejected,
            Self::UPDATE_ACCEPTED => Event::UpdateAccepted,
            Self::UPDATE_REJECTED => Event::UpdateRejected,
            Self::UPDATE_DELTA => Event::UpdateDelta,
            other => Event::Other(other),
        }
    }

    /// Returns the upper-case constant name of this event, `"OTHER"` for
    /// unnamed codes.
    pub const fn name(self) -> &'static str {
        match self {
            Event::Connected => "CONNECTED",
            Event::GetAccepted => "GET_ACCEPTED",
            Event::GetRejected => "GET_REJECTED",
            Event::UpdateAccepted => "UPDATE_ACCEPTED",
            Event::UpdateRejected => "UPDATE_REJECTED",
            Event::UpdateDelta => "UPDATE_DELTA",
            Event::Other(_) => "OTHER",
        }
    }
}

impl From<c_int> for Event {
    fn from(code: c_int) -> Self {
        Event::from_code(code)
    }
}

impl From<Event> for c_int {
    fn from(event: Event) -> Self {
        event.code()
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Other(code) => write!(f, "OTHER({})", code),
            named => f.write_str(named.name()),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Event {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Event::Other(code) => defmt::write!(f, "OTHER({})", code),
            named => defmt::write!(f, "{}", named.name()),
        }
    }
}

/// Receiver of shadow events.
pub trait StateHandler {
    /// Handles one event with its decoded `reported` and `desired` sections.
    ///
    /// The return value is handed to the native layer unchanged.
    fn on_state(&mut self, event: Event, reported: Value, desired: Value) -> c_int;
}

/// A `{callback, userdata}` pair acting as a [`StateHandler`].
///
/// `userdata` is passed to every invocation of `callback` by mutable
/// reference and is otherwise left untouched.
pub struct Registration<F, U> {
    callback: F,
    userdata: U,
}

impl<F, U> Registration<F, U>
where
    F: FnMut(&mut U, Event, Value, Value) -> c_int,
{
    /// Pairs a callback with its userdata.
    pub fn new(callback: F, userdata: U) -> Self {
        Self { callback, userdata }
    }

    /// Returns the userdata.
    pub fn userdata(&self) -> &U {
        &self.userdata
    }
}

impl<F, U> StateHandler for Registration<F, U>
where
    F: FnMut(&mut U, Event, Value, Value) -> c_int,
{
    fn on_state(&mut self, event: Event, reported: Value, desired: Value) -> c_int {
        (self.callback)(&mut self.userdata, event, reported, desired)
    }
}

impl<F, U: fmt::Debug> fmt::Debug for Registration<F, U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("userdata", &self.userdata)
            .finish_non_exhaustive()
    }
}

/// The shadow binding.
///
/// Owns the native backend and the single registration slot. Not `Send`:
/// events must be delivered from the thread that owns the binding.
#[derive(Debug)]
pub struct Shadow<N: Native> {
    native: N,
    slot: Option<NonNull<Slot>>,
}

impl<N: Native> Shadow<N> {
    /// Creates a binding on top of a native backend. No handler is installed.
    pub fn new(native: N) -> Self {
        Self { native, slot: None }
    }

    /// Installs `callback` as the state handler, replacing any previous one.
    ///
    /// The callback receives `(userdata, event, reported, desired)`; a missing
    /// section is delivered as an empty object.
    pub fn set_state_handler<F, U>(&mut self, callback: F, userdata: U)
    where
        F: FnMut(&mut U, Event, Value, Value) -> c_int + 'static,
        U: 'static,
    {
        self.set_handler(Registration::new(callback, userdata));
    }

    /// Installs any [`StateHandler`], replacing the previous one.
    ///
    /// May be called from inside the running handler; the replaced handler
    /// is then dropped once it returns.
    pub fn set_handler<H: StateHandler + 'static>(&mut self, handler: H) {
        let slot = Slot::allocate(Box::new(handler));
        self.native.set_state_handler(trampoline, slot.as_ptr().cast());

        if let Some(previous) = self.slot.replace(slot) {
            // SAFETY: `previous` came from `Slot::allocate` and the native
            // layer has just been pointed at the new slot. When this runs
            // inside the previous handler, the slot outlives that call.
            unsafe { Slot::release(previous) };
        }

        #[cfg(feature = "defmt")]
        defmt::debug!("shadow state handler installed");
    }

    /// Returns whether a state handler is installed.
    pub fn has_handler(&self) -> bool {
        self.slot.is_some()
    }

    /// Requests a shadow update with a dynamic state document.
    ///
    /// `version` is `0` to apply regardless of the current shadow version,
    /// otherwise the update only applies when it matches. The document should
    /// hold `reported` and/or `desired` keys; it is not validated here.
    ///
    /// Returns `true` when the native layer accepted the request for sending.
    /// The cloud's verdict arrives later through the state handler.
    pub fn update(&mut self, version: u64, state: &Value) -> bool {
        match encode_state(state) {
            Ok(text) => self.forward(version, &text),
            Err(_err) => {
                #[cfg(feature = "defmt")]
                defmt::error!("shadow update v{} not encoded: {}", version, _err);
                false
            }
        }
    }

    /// Requests a shadow update with a typed state document.
    ///
    /// Serializes into a fixed buffer of [`MAX_STATE_LEN`] bytes instead of
    /// allocating. Fails with [`Error::BufferOverflow`] when the document does
    /// not fit.
    pub fn update_state<T: Serialize>(
        &mut self,
        version: u64,
        state: &T,
    ) -> Result<bool, Error> {
        let encoded = encode_typed(state)?;
        Ok(self.forward(version, as_c_str(&encoded)?))
    }

    fn forward(&mut self, version: u64, text: &CStr) -> bool {
        let accepted = self.native.update(version as f64, text) == UPDATE_SUCCESS;

        #[cfg(feature = "defmt")]
        {
            if accepted {
                defmt::debug!("shadow update v{} sent", version);
            } else {
                defmt::warn!("shadow update v{} refused by native layer", version);
            }
        }

        accepted
    }

    /// Delivers an event to the installed handler from Rust.
    ///
    /// Behaves like the native callback path: both sections are decoded and
    /// the handler's status is returned. Returns `Ok(None)` and drops the
    /// event when no handler is installed.
    pub fn dispatch(
        &mut self,
        code: c_int,
        reported: &str,
        desired: &str,
    ) -> Result<Option<c_int>, Error> {
        let Some(slot) = self.slot else {
            #[cfg(feature = "defmt")]
            defmt::warn!("shadow event {} dropped: no handler", code);
            return Ok(None);
        };
        // SAFETY: the slot is registered, so it has not been released.
        unsafe { Slot::dispatch(slot, code, reported, desired) }.map(Some)
    }

    /// Takes the error of the last event the native layer failed to deliver.
    pub fn take_dispatch_error(&mut self) -> Option<Error> {
        let slot = self.slot?;
        // SAFETY: the slot is registered, so it has not been released.
        unsafe { slot.as_ref() }.take_error()
    }

    /// Returns a reference to the native backend.
    pub fn native(&self) -> &N {
        &self.native
    }

    /// Returns a mutable reference to the native backend.
    pub fn native_mut(&mut self) -> &mut N {
        &mut self.native
    }
}
