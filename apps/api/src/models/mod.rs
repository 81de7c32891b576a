pub mod analysis;
pub mod feedback;
pub mod history;
