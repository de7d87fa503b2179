//! Replay system for recording and playing back games.
//!
//! A replay stores the seed and the stream of player actions issued during a
//! game. Because the simulation is deterministic, replaying the actions
//! against a fresh farm with the same seed and catalogs recreates the game
//! exactly; the final state hash proves it.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::data::{EconomyCatalog, EventCatalog};
use crate::error::{GameError, Result};
use crate::grid::{Liquidation, Placement, Renovation};
use crate::ledger::{InsuranceKind, Tool};
use crate::market::TradeQuote;
use crate::math::Money;
use crate::random::{RandomSource, SeededRandom};
use crate::simulation::{BribeOutcome, Farm};
use crate::turn::TurnReport;

/// A player action, as issued by a presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FarmAction {
    /// Close the current year.
    EndTurn,
    /// Buy and place an asset.
    Place {
        /// Column.
        x: u32,
        /// Row.
        z: u32,
        /// Crop, animal or structure ID.
        asset: String,
    },
    /// Sell a tile's occupant.
    Liquidate {
        /// Column.
        x: u32,
        /// Row.
        z: u32,
    },
    /// Upgrade a structure.
    Renovate {
        /// Column.
        x: u32,
        /// Row.
        z: u32,
    },
    /// Buy instrument units.
    BuyInstrument {
        /// Instrument ID.
        instrument: String,
        /// Units.
        quantity: u32,
    },
    /// Sell instrument units.
    SellInstrument {
        /// Instrument ID.
        instrument: String,
        /// Units.
        quantity: u32,
    },
    /// Buy an insurance plan.
    BuyInsurance(InsuranceKind),
    /// Grow the grid by one.
    ExpandGrid,
    /// Own or drop a tool.
    SetTool {
        /// Which tool.
        tool: Tool,
        /// Whether it is owned.
        active: bool,
    },
    /// Answer a bribe demand.
    ResolveBribe {
        /// Pay instead of refusing.
        accept: bool,
    },
}

/// What a successful action produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// A year closed.
    Turn(Box<TurnReport>),
    /// An asset was placed.
    Placed(Placement),
    /// A tile was sold.
    Liquidated(Liquidation),
    /// A structure was upgraded.
    Renovated(Renovation),
    /// Instrument units changed hands.
    Traded(TradeQuote),
    /// Insurance was bought for this premium.
    Insured(Money),
    /// The grid grew for this price.
    Expanded(Money),
    /// A tool flag changed.
    ToolSet,
    /// A bribe was answered.
    Bribe(BribeOutcome),
}

impl<R: RandomSource> Farm<R> {
    /// Dispatch an action to the matching operation.
    ///
    /// # Errors
    ///
    /// Whatever the underlying operation returns.
    pub fn apply_action(&mut self, action: &FarmAction) -> Result<ActionOutcome> {
        Ok(match action {
            FarmAction::EndTurn => ActionOutcome::Turn(Box::new(self.end_turn()?)),
            FarmAction::Place { x, z, asset } => ActionOutcome::Placed(self.place(*x, *z, asset)?),
            FarmAction::Liquidate { x, z } => ActionOutcome::Liquidated(self.liquidate(*x, *z)?),
            FarmAction::Renovate { x, z } => ActionOutcome::Renovated(self.renovate(*x, *z)?),
            FarmAction::BuyInstrument {
                instrument,
                quantity,
            } => ActionOutcome::Traded(self.buy_instrument(instrument, *quantity)?),
            FarmAction::SellInstrument {
                instrument,
                quantity,
            } => ActionOutcome::Traded(self.sell_instrument(instrument, *quantity)?),
            FarmAction::BuyInsurance(kind) => ActionOutcome::Insured(self.buy_insurance(*kind)?),
            FarmAction::ExpandGrid => ActionOutcome::Expanded(self.expand_grid()?),
            FarmAction::SetTool { tool, active } => {
                self.set_tool(*tool, *active)?;
                ActionOutcome::ToolSet
            }
            FarmAction::ResolveBribe { accept } => {
                ActionOutcome::Bribe(self.resolve_bribe(*accept)?)
            }
        })
    }
}

/// Replay format version for compatibility.
pub const REPLAY_VERSION: u32 = 1;

/// Recorded game: seed plus every action, in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Replay {
    /// Replay format version.
    pub version: u32,
    /// Seed of the game's random source.
    pub seed: u64,
    /// Actions in issue order, including rejected ones.
    pub actions: Vec<FarmAction>,
    /// Year the farm had reached when recording stopped.
    pub final_year: u32,
    /// State hash when recording stopped.
    pub final_hash: u64,
}

impl Replay {
    /// Start recording a game with the given seed.
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self {
            version: REPLAY_VERSION,
            seed,
            actions: Vec::new(),
            final_year: 1,
            final_hash: 0,
        }
    }

    /// Record an action.
    pub fn record(&mut self, action: FarmAction) {
        self.actions.push(action);
    }

    /// Apply an action to a farm and record it, whether it succeeds or not.
    ///
    /// # Errors
    ///
    /// Whatever the action returns.
    pub fn apply_and_record<R: RandomSource>(
        &mut self,
        farm: &mut Farm<R>,
        action: FarmAction,
    ) -> Result<ActionOutcome> {
        let outcome = farm.apply_action(&action);
        self.record(action);
        outcome
    }

    /// Seal the replay with the farm's end state.
    pub fn finalize<R: RandomSource>(&mut self, farm: &Farm<R>) {
        self.final_year = farm.year();
        self.final_hash = farm.state_hash();
    }

    /// Number of recorded actions.
    #[must_use]
    pub fn action_count(&self) -> usize {
        self.actions.len()
    }

    /// Number of recorded year ends.
    #[must_use]
    pub fn turn_count(&self) -> usize {
        self.actions
            .iter()
            .filter(|a| matches!(a, FarmAction::EndTurn))
            .count()
    }

    /// Re-run the game against fresh catalogs.
    ///
    /// Individual action failures are part of the recording and are
    /// ignored; they fail the same way on playback.
    #[must_use]
    pub fn play(&self, catalog: EconomyCatalog, events: EventCatalog) -> Farm {
        let mut farm = Farm::new(catalog, events, SeededRandom::new(self.seed));
        for action in &self.actions {
            if let Err(error) = farm.apply_action(action) {
                debug!(?action, %error, "Replayed action refused");
            }
        }
        farm
    }

    /// Check that playback reproduces the recorded end state.
    #[must_use]
    pub fn verify(&self, catalog: EconomyCatalog, events: EventCatalog) -> bool {
        let farm = self.play(catalog, events);
        farm.year() == self.final_year && farm.state_hash() == self.final_hash
    }

    /// Encode the replay.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| GameError::InvalidState(format!("Failed to serialize replay: {e}")))
    }

    /// Decode a replay, rejecting other format versions.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails or the version differs.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let replay: Self = bincode::deserialize(bytes)
            .map_err(|e| GameError::InvalidState(format!("Failed to deserialize replay: {e}")))?;

        if replay.version != REPLAY_VERSION {
            return Err(GameError::InvalidState(format!(
                "Replay version mismatch: expected {}, got {}",
                REPLAY_VERSION, replay.version
            )));
        }

        Ok(replay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalogs() -> (EconomyCatalog, EventCatalog) {
        (
            EconomyCatalog::builtin().unwrap(),
            EventCatalog::builtin().unwrap(),
        )
    }

    fn recorded_game(seed: u64) -> Replay {
        let (economy, events) = catalogs();
        let mut farm = Farm::new(economy, events, SeededRandom::new(seed));
        let mut replay = Replay::new(seed);

        let script = [
            FarmAction::Place { x: 0, z: 0, asset: "barn".to_string() },
            FarmAction::Place { x: 1, z: 0, asset: "duck".to_string() },
            FarmAction::Place { x: 2, z: 0, asset: "shrimp".to_string() },
            FarmAction::BuyInstrument { instrument: "usd".to_string(), quantity: 1 },
            FarmAction::EndTurn,
            FarmAction::Place { x: 3, z: 0, asset: "paddyRice".to_string() },
            FarmAction::SetTool { tool: Tool::AnimalPlow, active: true },
            FarmAction::EndTurn,
            FarmAction::ResolveBribe { accept: false },
            FarmAction::EndTurn,
        ];
        for action in script {
            let _ = replay.apply_and_record(&mut farm, action);
        }
        replay.finalize(&farm);
        replay
    }

    #[test]
    fn test_apply_action_dispatch() {
        let (economy, events) = catalogs();
        let mut farm = Farm::new(economy, events, SeededRandom::new(1));

        let outcome = farm
            .apply_action(&FarmAction::Place { x: 0, z: 0, asset: "pond".to_string() })
            .unwrap();
        assert!(matches!(outcome, ActionOutcome::Placed(p) if p.cost == Money::from_dollars(200)));

        let outcome = farm.apply_action(&FarmAction::EndTurn).unwrap();
        assert!(matches!(outcome, ActionOutcome::Turn(report) if report.year == 1));

        assert_eq!(
            farm.apply_action(&FarmAction::Liquidate { x: 4, z: 4 }).unwrap_err(),
            GameError::TileEmpty { x: 4, z: 4 }
        );
    }

    #[test]
    fn test_record_counts_rejected_actions() {
        let replay = recorded_game(7);
        assert_eq!(replay.action_count(), 10);
        assert_eq!(replay.turn_count(), 3);
        assert_eq!(replay.final_year, 4);
    }

    #[test]
    fn test_replay_verifies() {
        let replay = recorded_game(12345);
        let (economy, events) = catalogs();
        assert!(replay.verify(economy, events));
    }

    #[test]
    fn test_replay_detects_tampering() {
        let mut replay = recorded_game(12345);
        replay.seed += 1;
        replay.actions.insert(0, FarmAction::ExpandGrid);
        let (economy, events) = catalogs();
        assert!(!replay.verify(economy, events));
    }

    #[test]
    fn test_replay_bytes_round_trip() {
        let replay = recorded_game(99);
        let bytes = replay.to_bytes().unwrap();
        let loaded = Replay::from_bytes(&bytes).unwrap();
        assert_eq!(loaded, replay);
    }

    #[test]
    fn test_replay_version_mismatch() {
        let mut replay = Replay::new(1);
        replay.version = REPLAY_VERSION + 1;
        let bytes = replay.to_bytes().unwrap();
        assert!(matches!(
            Replay::from_bytes(&bytes),
            Err(GameError::InvalidState(_))
        ));
    }
}
