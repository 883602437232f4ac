//! Scenario catalog: scripted play policies run against a fresh session.
use anyhow::{Result, bail, ensure};
use ashfall_game::narrative::AMBUSH_WARNING;
use ashfall_game::{ActionType, ApState, CharacterStatus, Opening, Phase};
use chrono::Duration;
use rand::Rng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;

use super::session::Session;

const FIGHT_STEP_LIMIT: usize = 120;
const EXPLORE_ROUNDS: usize = 12;
const STRAIN_PUSHES: usize = 8;
const RECOVERY_WAIT_LIMIT: usize = 16;

/// What a scenario run produced, for reports and assertions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub steps: usize,
    pub fights: usize,
    pub victories: usize,
    pub died: bool,
    pub zones_visited: Vec<String>,
}

pub type ScenarioFn = fn(&mut Session<'_>, &mut ChaCha8Rng) -> Result<RunSummary>;

#[derive(Clone, Copy)]
pub struct Scenario {
    pub key: &'static str,
    pub description: &'static str,
    pub run: ScenarioFn,
}

const CATALOG: &[Scenario] = &[
    Scenario {
        key: "smoke",
        description: "Start one fight against a random enemy and see it through",
        run: smoke,
    },
    Scenario {
        key: "exploration",
        description: "Explore repeatedly, fighting whatever turns up",
        run: exploration,
    },
    Scenario {
        key: "overexertion",
        description: "Act faster than AP regenerates, then wait the debt off",
        run: overexertion,
    },
    Scenario {
        key: "ambush",
        description: "Open a fight with the hostiles striking first",
        run: ambush,
    },
];

#[must_use]
pub fn list_scenarios() -> Vec<(&'static str, &'static str)> {
    CATALOG
        .iter()
        .map(|scenario| (scenario.key, scenario.description))
        .collect()
}

#[must_use]
pub fn find_scenario(key: &str) -> Option<Scenario> {
    CATALOG.iter().find(|scenario| scenario.key == key).copied()
}

#[must_use]
pub fn all_scenario_keys() -> Vec<String> {
    CATALOG.iter().map(|scenario| scenario.key.to_string()).collect()
}

fn step_pause() -> Duration {
    Duration::seconds(1)
}

fn random_enemy(session: &Session<'_>, rng: &mut ChaCha8Rng) -> Result<String> {
    match session.engine().data().enemies.choose(rng) {
        Some(def) => Ok(def.id.clone()),
        None => bail!("enemy table is empty"),
    }
}

/// Attack the first hostile while AP allows, otherwise wait, until the
/// encounter leaves combat.
fn fight(session: &mut Session<'_>, summary: &mut RunSummary) -> Result<()> {
    summary.fights += 1;
    for _ in 0..FIGHT_STEP_LIMIT {
        let encounter = session.encounter();
        if !encounter.in_combat() {
            let character = session.character()?;
            if character.is_dead() {
                summary.died = true;
            } else {
                ensure!(
                    encounter.enemies.is_empty(),
                    "living character left combat with hostiles standing"
                );
                ensure!(
                    character.status == CharacterStatus::Alive,
                    "victor still flagged {}",
                    character.status.label()
                );
                summary.victories += 1;
            }
            return Ok(());
        }
        let attack_cost = session.engine().config().action_costs.attack;
        if f64::from(session.view()?.ap) >= attack_cost {
            let target = encounter.enemies.first().map(|enemy| enemy.id.clone());
            let before = encounter.enemies.first().map(|enemy| enemy.hp);
            let report = session.act(ActionType::Attack, target.as_deref(), step_pause())?;
            if let (Some(id), Some(before)) = (target, before) {
                let damage = session.engine().config().attack_base_damage;
                let after = report.encounter.enemy(&id).map_or(0, |enemy| enemy.hp);
                ensure!(
                    after == (before - damage).max(0),
                    "{id} went from {before} to {after} hp"
                );
            }
        } else {
            session.act(ActionType::Wait, None, step_pause())?;
        }
    }
    bail!("fight still running after {FIGHT_STEP_LIMIT} steps")
}

fn finish(session: &Session<'_>, mut summary: RunSummary) -> RunSummary {
    summary.steps = session.steps();
    summary
}

fn smoke(session: &mut Session<'_>, rng: &mut ChaCha8Rng) -> Result<RunSummary> {
    let mut summary = RunSummary::default();
    let enemy = random_enemy(session, rng)?;
    let report = session.start(&[enemy.as_str()], Opening::Standard)?;
    ensure!(
        report.encounter.phase == Phase::PlayerTurn,
        "standard opening began in {}",
        report.encounter.phase.label()
    );
    ensure!(report.encounter.round == 1, "fight did not start in round 1");
    fight(session, &mut summary)?;
    ensure!(
        session.encounter().phase == Phase::Complete,
        "fight ended outside Complete"
    );
    Ok(finish(session, summary))
}

fn exploration(session: &mut Session<'_>, rng: &mut ChaCha8Rng) -> Result<RunSummary> {
    let mut summary = RunSummary::default();
    let explore_cost = session.engine().config().action_costs.explore;
    for _ in 0..EXPLORE_ROUNDS {
        if session.character()?.is_dead() {
            summary.died = true;
            break;
        }
        // Uneven pauses so regeneration lands on fractional AP.
        let pause = Duration::milliseconds(rng.gen_range(400..=1_500));
        if f64::from(session.view()?.ap) < explore_cost {
            session.act(ActionType::Wait, None, pause)?;
            continue;
        }
        let report = session.act(ActionType::Explore, None, pause)?;
        if let Some(zone) = &report.encounter.current_zone
            && !summary.zones_visited.contains(zone)
        {
            ensure!(
                session.engine().data().zone(zone).is_some(),
                "explored into unknown zone {zone}"
            );
            summary.zones_visited.push(zone.clone());
        }
        if report.encounter.in_combat() {
            fight(session, &mut summary)?;
        }
    }
    Ok(finish(session, summary))
}

fn overexertion(session: &mut Session<'_>, _rng: &mut ChaCha8Rng) -> Result<RunSummary> {
    let summary = RunSummary::default();
    let interval = Duration::milliseconds(
        i64::try_from(session.engine().config().min_action_interval_ms).unwrap_or(i64::MAX),
    );

    let mut debt = 0.0;
    for _ in 0..STRAIN_PUSHES {
        let report = session.act(ActionType::Defend, None, interval)?;
        ensure!(
            report.character.ap_debt >= debt,
            "debt fell while overspending"
        );
        debt = report.character.ap_debt;
    }
    let view = session.view()?;
    ensure!(
        view.ap_state == ApState::Overextended,
        "expected overextended after pushing, got {:?} with debt {:.2}",
        view.ap_state,
        view.ap_debt
    );

    for _ in 0..RECOVERY_WAIT_LIMIT {
        if debt <= 0.0 {
            break;
        }
        let report = session.act(ActionType::Wait, None, interval)?;
        ensure!(
            report.character.ap_debt <= debt,
            "wait increased debt from {debt:.2} to {:.2}",
            report.character.ap_debt
        );
        debt = report.character.ap_debt;
    }
    ensure!(
        debt <= 0.0,
        "debt {debt:.2} left after {RECOVERY_WAIT_LIMIT} waits"
    );
    ensure!(
        session.view()?.ap_state != ApState::Overextended,
        "still overextended with no debt"
    );
    Ok(finish(session, summary))
}

fn ambush(session: &mut Session<'_>, rng: &mut ChaCha8Rng) -> Result<RunSummary> {
    let mut summary = RunSummary::default();
    let first = random_enemy(session, rng)?;
    let second = random_enemy(session, rng)?;
    let report = session.start(&[first.as_str(), second.as_str()], Opening::Ambush)?;
    ensure!(
        report.events.first().map(|e| e.event.message.as_str()) == Some(AMBUSH_WARNING),
        "ambush did not open with its warning"
    );
    ensure!(
        report.encounter.enemies.len() == 2,
        "ambush spawned {} hostiles",
        report.encounter.enemies.len()
    );
    if report.character.is_dead() {
        summary.died = true;
        return Ok(finish(session, summary));
    }
    ensure!(
        report.encounter.phase == Phase::PlayerTurn && report.encounter.round == 2,
        "ambush should hand round 2 to the player, got {} round {}",
        report.encounter.phase.label(),
        report.encounter.round
    );
    fight(session, &mut summary)?;
    Ok(finish(session, summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::storage::AssetLoader;
    use ashfall_game::ManualClock;
    use chrono::{TimeZone, Utc};
    use rand::SeedableRng;

    fn run(key: &str, seed: u64) -> RunSummary {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2026, 10, 1, 0, 0, 0).unwrap());
        let mut session = Session::new(AssetLoader::default(), &clock, seed).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        (find_scenario(key).unwrap().run)(&mut session, &mut rng).unwrap()
    }

    #[test]
    fn catalog_lists_every_scenario() {
        let keys: Vec<_> = list_scenarios().into_iter().map(|(key, _)| key).collect();
        assert_eq!(keys, vec!["smoke", "exploration", "overexertion", "ambush"]);
        assert!(find_scenario("nope").is_none());
    }

    #[test]
    fn smoke_always_reaches_an_ending() {
        for seed in [1, 7, 1337] {
            let summary = run("smoke", seed);
            assert_eq!(summary.fights, 1);
            assert_eq!(summary.victories + usize::from(summary.died), 1);
        }
    }

    #[test]
    fn overexertion_recovers() {
        let summary = run("overexertion", 42);
        assert!(summary.steps > STRAIN_PUSHES);
    }

    #[test]
    fn exploration_and_ambush_hold_invariants() {
        for seed in [3, 99] {
            run("exploration", seed);
            run("ambush", seed);
        }
    }
}
