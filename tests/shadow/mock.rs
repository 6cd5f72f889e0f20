//! Mock native shadow layer for binding tests

use libshadow::shadow::{Native, RawStateHandler, UPDATE_SUCCESS};
use std::ffi::{CStr, CString, c_int, c_void};

/// Mock firmware holding the single handler slot and recording updates
pub struct MockNative {
    handler: Option<RawStateHandler>,
    userdata: *mut c_void,
    pub registrations: usize,
    pub updates: Vec<(f64, String)>,
    pub update_status: c_int,
}

impl MockNative {
    /// Create a mock whose update entry point reports success
    pub fn new() -> Self {
        Self {
            handler: None,
            userdata: std::ptr::null_mut(),
            registrations: 0,
            updates: Vec::new(),
            update_status: UPDATE_SUCCESS,
        }
    }

    /// Simulate the firmware invoking the registered callback.
    ///
    /// Returns `None` when nothing is registered, like a firmware that drops
    /// events without a handler.
    pub fn fire(&mut self, event: c_int, reported: &str, desired: &str) -> Option<c_int> {
        let handler = self.handler?;
        let reported = CString::new(reported).unwrap();
        let desired = CString::new(desired).unwrap();
        Some(unsafe { handler(self.userdata, event, reported.as_ptr(), desired.as_ptr()) })
    }

    /// The registered `(handler, userdata)` pair, for firing without
    /// borrowing the mock
    pub fn raw_handler(&self) -> Option<(RawStateHandler, *mut c_void)> {
        Some((self.handler?, self.userdata))
    }

    /// Version and JSON text of the last update request
    pub fn last_update(&self) -> Option<&(f64, String)> {
        self.updates.last()
    }
}

impl Native for MockNative {
    fn set_state_handler(&mut self, handler: RawStateHandler, userdata: *mut c_void) {
        self.handler = Some(handler);
        self.userdata = userdata;
        self.registrations += 1;
    }

    fn update(&mut self, version: f64, state: &CStr) -> c_int {
        self.updates
            .push((version, state.to_string_lossy().into_owned()));
        self.update_status
    }
}
