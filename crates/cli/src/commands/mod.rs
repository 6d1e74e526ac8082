pub mod abi;
pub mod corpus;
pub mod util;
pub mod workspace;

pub use abi::*;
pub use corpus::*;
pub use util::*;
pub use workspace::*;
