pub mod card;
pub mod chart;
pub mod dashboard;
pub mod debug;
pub mod process;
pub mod state;
pub mod theme;
