use std::process;
use std::time::{SystemTime, UNIX_EPOCH};

/// Derive a seed from the wall clock and the process id, for runs that
/// explicitly opt out of reproducibility. The pid is rotated by 16 bits so
/// that its fast-moving low bits land on the slow-moving high bits of the
/// clock, and two runs started within the same second still diverge.
pub fn entropy_seed() -> u64 {
    let pid = process::id().rotate_left(16);
    let seconds = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0);
    seconds ^ pid as u64
}
