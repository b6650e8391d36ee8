pub mod client;
pub mod config;
pub mod lifecycle;

#[cfg(test)]
pub mod testing;
