mod node_id;
mod snowflake;

pub use node_id::*;
pub use snowflake::*;
