pub mod publisher;
pub mod retention;

#[cfg(test)]
pub(crate) mod fake_gateway;
