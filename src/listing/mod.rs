pub mod reconciler;
pub mod types;

pub use reconciler::ListingReconciler;
pub use types::{DisplayListing, DEFAULT_DESCRIPTION};
