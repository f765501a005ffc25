pub mod calendar;
pub mod event;
pub mod guild;
