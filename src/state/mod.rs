pub mod data;
pub mod markers;
pub mod reorder;
#[cfg(test)]
pub mod testing;
