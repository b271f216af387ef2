pub mod catalog_repo;
pub mod memory;
pub mod models;
pub mod order_repo;

#[cfg(test)]
mod test_support;
