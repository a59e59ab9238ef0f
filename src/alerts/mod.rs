pub mod classifier;
pub mod dedup;
pub mod formatter;

pub use classifier::classify;
pub use dedup::DedupStore;
pub use formatter::{format_grouped, render, render_digest, render_portfolio};
