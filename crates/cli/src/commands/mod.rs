pub mod bank;
pub mod onboard;
pub mod serve;
pub mod simulate;
pub mod status;
