// Domain layer - Pure encode types and rules

pub mod arguments;
pub mod model;
pub mod protocol;
