pub mod command;
pub mod config;
pub mod domain;
pub mod joystick;
pub mod panel;
pub mod playback;
pub mod request;
pub mod scheduler;
pub mod view;
pub mod watchdog;
pub mod waveform;
