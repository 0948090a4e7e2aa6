mod common;

mod config_loading;
mod end_to_end;
mod handoff;
mod hardware_lost;
mod lifecycle;
mod properties;
mod scenarios;
