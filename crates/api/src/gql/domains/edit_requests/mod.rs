pub mod resolvers;
pub mod types;

pub use resolvers::{EditRequestMutation, EditRequestQuery};
