//! # libshadow - AWS IoT Device Shadow binding
//!
//! A small Rust binding that exposes the AWS IoT Device Shadow functions of
//! embedded firmware to application code. The firmware's native library runs
//! the shadow protocol; this crate marshals data in and out of it:
//!
//! - decodes the `reported` and `desired` JSON sections of every shadow event
//!   and delivers them to a Rust callback through a C trampoline
//! - serializes state documents, dynamic or typed, for shadow updates
//!
//! The crate supports `no_std` environments with a global allocator.
//!
//! ## Usage
//!
//! Add this to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! libshadow = { version = "0.1.0", features = ["mgos"] }
//! ```
//!
//! ### Reporting State
//!
//! ```rust,no_run
//! use libshadow::shadow::{Event, Reported, Shadow};
//! # use core::ffi::{CStr, c_int, c_void};
//! # use libshadow::shadow::{Native, RawStateHandler};
//! # struct Firmware;
//! # impl Native for Firmware {
//! #     fn set_state_handler(&mut self, _h: RawStateHandler, _u: *mut c_void) {}
//! #     fn update(&mut self, _v: f64, _s: &CStr) -> c_int { 1 }
//! # }
//! #[derive(serde::Serialize)]
//! struct Led {
//!     on: bool,
//! }
//!
//! let mut shadow = Shadow::new(Firmware);
//! shadow.set_state_handler(
//!     |_: &mut (), event, reported, desired| {
//!         if event == Event::UpdateDelta && desired != reported {
//!             // apply `desired`
//!         }
//!         1
//!     },
//!     (),
//! );
//!
//! // let sent = shadow.update_state(0, &Reported { reported: Led { on: true } })?;
//! ```
//!
//! ## Optional Features
//!
//! - `std`: Enable standard library support (default: disabled)
//! - `mgos`: Link the Mongoose OS `mgos_aws_shadow_*_simple` entry points
//! - `preserve-order`: Keep object key order when encoding dynamic documents
//!   (default: enabled; without it `serde_json` writes keys sorted)
//! - `defmt`: Enable defmt logging support for embedded debugging

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(missing_docs)]
#![warn(missing_debug_implementations)]
#![doc(html_root_url = "https://shishir-dey.github.io/libshadow/")]

extern crate alloc;

/// Shadow binding: event trampoline, state marshaling and the native seam.
///
/// This module contains the [`Shadow`](shadow::Shadow) binding together with
/// the [`Native`](shadow::Native) trait implemented by firmware backends.
pub mod shadow;
