// Budget trackers: finite control horizons for the loop

pub mod control;
pub mod multi;
pub mod simple;
pub mod traits;

pub use control::ControlBudget;
pub use multi::MultiBudget;
pub use simple::SimpleBudget;
pub use traits::BudgetTracker;
