//! Core of the chorded BLE keyboard firmware.
//!
//! Everything here is pure logic over a few collaborator traits, so it
//! runs unchanged on the nRF52840 and on the host under `cargo test`.
//! The embedded binary (`main.rs`, `embedded` feature) binds it to
//! Embassy and the S140 SoftDevice.
//!
//! Entry point is [`Keyboard`]: build it with [`Keyboard::init`], call
//! [`Keyboard::start`] once, then feed every clock tick and link event to
//! [`Keyboard::handle`].

#![cfg_attr(not(test), no_std)]

#[macro_use]
mod fmt;

pub mod config;
pub mod error;
pub mod inactivity;
pub mod indicator;
pub mod keyboard;
pub mod keys;
pub mod link;
pub mod power_logic;

pub use error::{Error, Result};
pub use keyboard::{Event, Flow, Keyboard};
