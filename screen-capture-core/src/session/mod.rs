pub mod capture;
pub mod driver;
pub mod registry;

#[cfg(test)]
pub(crate) mod test_support;
