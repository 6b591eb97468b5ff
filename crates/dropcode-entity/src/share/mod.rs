//! Share domain entities.

pub mod grant;
pub mod model;
pub mod summary;

pub use grant::RedemptionGrant;
pub use model::{ShareRecord, ShareSettingsUpdate};
pub use summary::ShareSummary;
