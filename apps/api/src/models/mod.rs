pub mod doctor;
pub mod intake;
