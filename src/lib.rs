//! Core library for the zsun-riders command line application.
//!
//! The library turns heterogeneous rider JSON from several upstream providers
//! into one canonical shape and keeps a spreadsheet in step with it. The
//! modules are structured to keep responsibilities narrow and composable:
//! value coercion lives in [`zsun::riders::coerce`] and
//! [`zsun::riders::timestamp`], the canonical field table inside
//! [`zsun::riders::model`], record normalization in
//! [`zsun::riders::normalize`], the in-memory store in
//! [`zsun::riders::repository`], the block differ in [`zsun::riders::diff`],
//! IO adapters under [`zsun::riders::io`], and the orchestration under
//! [`zsun::riders::sync`].

pub mod zsun;

pub use zsun::riders::{
    ErrorKind, Result, RiderError, coerce, config, diff, error, io, model, normalize, repository,
    sync, timestamp,
};
