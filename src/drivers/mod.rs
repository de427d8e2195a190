//! Hardware initialisation, raw GPIO/LEDC helpers, and the task watchdog.

pub mod hw_init;
pub mod watchdog;
