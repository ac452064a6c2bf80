pub mod dto;
pub mod ports;
pub mod prompts;
pub mod report;
pub mod services;
