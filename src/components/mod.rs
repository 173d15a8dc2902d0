pub mod crop;
pub mod history;
