//! TCP listener driving the iterative accept loop.

pub mod listener;
