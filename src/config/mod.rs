//! Configuration loading and management for the daily time-calculation engine.
//!
//! This module provides the day-plan configuration types, the id-keyed
//! [`DayPlanTable`], and loading of plans and engine settings from YAML.
//!
//! # Example
//!
//! ```no_run
//! use workday_engine::config::ConfigLoader;
//!
//! let config = ConfigLoader::load("./config/default").unwrap();
//! println!("Loaded {} day plans", config.plans().len());
//! ```

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{
    BonusCalculation, BonusRule, BreakKind, BreakRule, DayChangeBehavior, DayPlanConfig, DayPlanId,
    DayPlanTable, EngineSettings, HolidayCredit, MAX_ALTERNATE_PLANS, MINUTES_PER_DAY, Minutes,
    NoBookingBehavior, PlanType, RecalculationSettings, RoundingConfig, RoundingRule,
    RoundingSettings, RoundingType, ShiftDetection, TimeWindow, ToleranceConfig,
};
