//! Commit identifier minting.
//!
//! Identifiers are `YYYY-MM-DD_HH-MM-SS`, one-second resolution, minted from
//! the server's UTC wall clock. §9 of the design leaves the one-second
//! collision open; this implementation resolves it by appending a
//! monotonic numeric suffix (`-2`, `-3`, ...) rather than silently
//! overwriting the earlier commit, configurable via
//! [`crate::config::CommitConfig::collision_suffix`].

use crate::clock::now_commit_stamp;

/// Mint a commit identifier for a branch whose existing commit ids are
/// `existing`.
///
/// If `collision_suffix` is `true` and the base stamp for "now" already
/// names an existing commit, a suffix `-2`, `-3`, ... is appended until an
/// unused identifier is found. If `false`, the bare stamp is always
/// returned, reproducing the documented collision behaviour (second
/// overwrites first).
#[must_use]
pub fn mint(existing: &[String], collision_suffix: bool) -> String {
    let base = now_commit_stamp();
    if !collision_suffix || !existing.iter().any(|id| id == &base) {
        return base;
    }
    let mut n: u32 = 2;
    loop {
        let candidate = format!("{base}-{n}");
        if !existing.iter().any(|id| id == &candidate) {
            return candidate;
        }
        n += 1;
    }
}
