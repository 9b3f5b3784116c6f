pub mod blocks;
pub mod cluster;
pub mod funding;
