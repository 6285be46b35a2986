// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
pub mod config_map;
pub mod network_policy;
pub mod service;
pub mod stateful_set;
