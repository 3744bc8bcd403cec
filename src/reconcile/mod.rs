pub mod classifier;
pub mod pass;
pub mod remediation;

#[cfg(test)]
pub(crate) mod testing;
