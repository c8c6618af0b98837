//! Bank control: one operation set for every board in the registry.
//!
//! [`controller::BankController`] owns the CPU bus and turns bank, mirroring, WRAM, and
//! IRQ requests into each chip's register protocol: MMC1's serial port, the select/data
//! pairs of MMC3, FME-7 and Action 53, MMC2's per-latch registers, or a discrete latch.

pub mod controller;

#[cfg(test)]
mod tests;
