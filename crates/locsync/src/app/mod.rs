//! Application services: scanning, naming, selection, reconcile, export.

pub mod export;
pub mod naming;
pub mod reconcile;
pub mod scan;
pub mod selection;
