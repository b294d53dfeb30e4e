pub mod family;
pub mod tree;
pub mod util;
