pub mod dashboard;
pub mod monthly_stats;
pub mod observation;
pub mod window;

pub use dashboard::*;
pub use monthly_stats::*;
pub use observation::*;
pub use window::*;
