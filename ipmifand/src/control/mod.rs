//! Fan control: mode/speed controllers and the decision engine built on them

mod engine;
mod fan_control;

pub(crate) use engine::DecisionEngine;
pub(crate) use fan_control::FanControl;
