//! Mongoose OS backend.
//!
//! Links against the `mgos_aws_shadow_*_simple` functions of the firmware's
//! AWS library. Only one instance of the native shadow exists per device, so
//! [`Mgos`] is a zero-sized handle.

use super::native::{Native, RawStateHandler};
use core::ffi::{CStr, c_char, c_int, c_void};

unsafe extern "C" {
    fn mgos_aws_shadow_set_state_handler_simple(handler: RawStateHandler, userdata: *mut c_void);
    fn mgos_aws_shadow_update_simple(version: f64, state_json: *const c_char) -> c_int;
}

/// Handle to the firmware's AWS IoT shadow.
#[derive(Debug, Default, Clone, Copy)]
pub struct Mgos;

impl Native for Mgos {
    fn set_state_handler(&mut self, handler: RawStateHandler, userdata: *mut c_void) {
        // SAFETY: the firmware copies the pointer pair and invokes `handler`
        // from its single-threaded event loop.
        unsafe { mgos_aws_shadow_set_state_handler_simple(handler, userdata) }
    }

    fn update(&mut self, version: f64, state: &CStr) -> c_int {
        // SAFETY: `state` is NUL-terminated and outlives the call; the
        // firmware copies the text before returning.
        unsafe { mgos_aws_shadow_update_simple(version, state.as_ptr()) }
    }
}
