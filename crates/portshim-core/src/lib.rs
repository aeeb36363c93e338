//! # portshim-core
//!
//! Safe Rust implementations of the libc functions portshim provides for
//! platforms that lack them: `strlcpy`, `gettimeofday`, a single-result IPv4
//! `getaddrinfo` with its error strings, and the non-blocking flag arithmetic
//! behind `socket_set_blocking`.
//!
//! Everything here works on slices, plain structs and typed errors. Raw
//! pointers, errno and the actual syscalls live in `portshim-abi`.

#![deny(unsafe_code)]

pub mod errno;
pub mod resolv;
pub mod socket;
pub mod string;
pub mod time;
