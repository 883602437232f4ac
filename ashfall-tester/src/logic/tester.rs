use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Result;
use ashfall_game::ManualClock;
use chrono::{TimeZone, Utc};
use colored::Colorize;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use super::scenarios::{RunSummary, Scenario};
use super::session::Session;
use super::storage::AssetLoader;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario_name: String,
    pub seed: u64,
    pub passed: bool,
    pub iterations_run: usize,
    pub successful_iterations: usize,
    pub failures: Vec<String>,
    pub total_steps: usize,
    pub victories: usize,
    pub deaths: usize,
    #[serde(with = "duration_serde")]
    pub average_duration: Duration,
}

pub struct LogicTester {
    verbose: bool,
    config_path: Option<PathBuf>,
}

impl LogicTester {
    #[must_use]
    pub fn new(verbose: bool, config_path: Option<&Path>) -> Self {
        Self {
            verbose,
            config_path: config_path.map(Path::to_path_buf),
        }
    }

    pub fn run_scenario(
        &self,
        scenario: &Scenario,
        seeds: &[u64],
        iterations: usize,
    ) -> Vec<ScenarioResult> {
        seeds
            .iter()
            .map(|&seed| {
                if self.verbose {
                    println!(
                        "🧪 Testing scenario: {} (seed: {seed})",
                        scenario.key.bright_white()
                    );
                }
                self.run_single_scenario(scenario, seed, iterations)
            })
            .collect()
    }

    fn run_single_scenario(
        &self,
        scenario: &Scenario,
        seed: u64,
        iterations: usize,
    ) -> ScenarioResult {
        let mut result = ScenarioResult {
            scenario_name: scenario.key.to_string(),
            seed,
            passed: true,
            iterations_run: iterations,
            successful_iterations: 0,
            failures: Vec::new(),
            total_steps: 0,
            victories: 0,
            deaths: 0,
            average_duration: Duration::ZERO,
        };
        let mut durations = Vec::with_capacity(iterations);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        for i in 0..iterations {
            let iteration_seed: u64 = rng.r#gen();
            let start_time = Instant::now();
            match self.run_iteration(scenario, iteration_seed, &mut rng) {
                Ok(summary) => {
                    durations.push(start_time.elapsed());
                    result.successful_iterations += 1;
                    result.total_steps += summary.steps;
                    result.victories += summary.victories;
                    result.deaths += usize::from(summary.died);
                    if self.verbose {
                        println!(
                            "  ✅ Iteration {}/{iterations} passed: {} steps, {} fights, {}",
                            i + 1,
                            summary.steps,
                            summary.fights,
                            if summary.died { "died" } else { "survived" }
                        );
                    }
                }
                Err(err) => {
                    let message = format!("Iteration {} (seed {iteration_seed}): {err:#}", i + 1);
                    if self.verbose {
                        println!("  ❌ {}", message.red());
                    }
                    log::warn!("{} failed: {message}", scenario.key);
                    result.failures.push(message);
                }
            }
        }

        result.passed = result.failures.is_empty();
        if !durations.is_empty() {
            result.average_duration = durations.iter().sum::<Duration>()
                / u32::try_from(durations.len()).unwrap_or(u32::MAX);
        }
        result
    }

    fn run_iteration(
        &self,
        scenario: &Scenario,
        seed: u64,
        rng: &mut ChaCha8Rng,
    ) -> Result<RunSummary> {
        let start = Utc
            .timestamp_opt(1_700_000_000, 0)
            .single()
            .unwrap_or_else(Utc::now);
        let clock = ManualClock::new(start);
        let loader = AssetLoader::new(self.config_path.as_deref());
        let mut session = Session::new(loader, &clock, seed)?;
        (scenario.run)(&mut session, rng)
    }
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_millis().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u128::deserialize(deserializer)?;
        Ok(Duration::from_millis(u64::try_from(millis).unwrap_or(0)))
    }
}
