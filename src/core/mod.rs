// ─── Forge Utils Core ───
// Building blocks for Minecraft build tooling.
//
// Architecture:
//   core/
//     hash/      — Hash functions, side-car files, persistent hash store
//     archive/   — Reproducible jar merge, split and packing
//     download/  — HTTP and file: downloads with manual redirects
//     files      — Listing and directory helpers
//     task       — Memoized named units of work
//     config     — Shared settings
//     error      — Crate-wide error type

pub mod archive;
pub mod config;
pub mod download;
pub mod error;
pub mod files;
pub mod hash;
pub mod task;
