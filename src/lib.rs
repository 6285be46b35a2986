// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
pub mod capacity;
pub mod common;
pub mod conditions;
pub mod config;
pub mod controller;
pub mod error;
pub mod platform;
pub mod quantity;
pub mod reconciler;
pub mod resources;
pub mod swiftstorage_types;

pub use error::Error;

#[cfg(test)]
mod unit_tests;
