pub mod clock;
pub mod limiter;
pub mod scheduler;
