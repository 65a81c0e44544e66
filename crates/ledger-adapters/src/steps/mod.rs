pub mod check;
pub mod extract;
pub mod store;
pub mod transform;

pub use check::CheckConnectionStep;
pub use extract::{ExtractCollectionStep, ExtractMultiCompanyStep};
pub use store::StoreStep;
pub use transform::{ConcatColumnsStep, DropColumnsStep, FilterStep, MergeLeftStep};
