pub mod import_use_case;
pub mod resolve_use_case;

pub use import_use_case::ImportUseCase;
pub use resolve_use_case::{ResolveAction, ResolveOutcome, ResolveUseCase};
