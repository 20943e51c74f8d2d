pub mod alerts;
pub mod monitor;
pub mod notice;
pub mod rankings;
pub mod sound;
pub mod toast;
