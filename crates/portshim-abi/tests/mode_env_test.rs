//! The mode taken from `PORTSHIM_MODE` reaches the C entry points.
//!
//! Kept as the only test in its binary: the mode is read from the
//! environment once per process.

#![cfg(feature = "strlcpy")]

use std::ptr;

use portshim_abi::errno_abi::{abi_errno, set_abi_errno};
use portshim_abi::string_abi::strlcpy;
use portshim_membrane::config::MODE_ENV;
use portshim_membrane::{HealingAction, SafetyLevel, global_healing_policy, safety_level};

#[test]
fn hardened_environment_repairs_null_source() {
    // SAFETY: no other thread in this binary touches the environment.
    unsafe { std::env::set_var(MODE_ENV, "Hardened") };

    let mut buf = [b'#'; 4];
    set_abi_errno(0);
    let ret = unsafe { strlcpy(buf.as_mut_ptr().cast(), ptr::null(), buf.len()) };
    assert_eq!(ret, 0);
    assert_eq!(buf[0], 0);
    assert_eq!(abi_errno(), 0);
    assert_eq!(
        global_healing_policy().recent_events().last().map(|e| e.action),
        Some(HealingAction::ReturnSafeDefault)
    );

    // Later changes to the variable are not seen.
    // SAFETY: as above.
    unsafe { std::env::set_var(MODE_ENV, "strict") };
    assert_eq!(safety_level(), SafetyLevel::Hardened);
}
