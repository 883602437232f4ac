pub mod reports;
pub mod scenarios;
pub mod session;
pub mod storage;
pub mod tester;

pub use scenarios::{all_scenario_keys, find_scenario, list_scenarios};
pub use tester::{LogicTester, ScenarioResult};
