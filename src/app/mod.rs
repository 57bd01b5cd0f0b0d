// Application layer - Use case interactors

pub mod container;
pub mod encode_interactor;

// Re-export interactors
pub use container::AppContainer;
pub use encode_interactor::{EncodeInteractor, SessionReport};
