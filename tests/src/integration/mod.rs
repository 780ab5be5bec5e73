//! End-to-end scenarios.

pub mod harness;

#[cfg(test)]
mod adversarial;
#[cfg(test)]
mod e2e_rounds;
