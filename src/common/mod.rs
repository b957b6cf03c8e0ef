//! Small numeric helpers shared by the indicator and risk layers.

pub mod math;
