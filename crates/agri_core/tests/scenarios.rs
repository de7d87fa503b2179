//! End-to-end farm scenarios through the public `Farm` API.

use agri_core::prelude::*;
use agri_core::simulation::BribeOutcome;
use agri_test_utils::fixtures::{
    fixed, near, neutral_rng, quiet_farm, scripted_farm, seeded_farm, single_event,
};

#[test]
fn test_quiet_year_pays_tax_then_interest() {
    let mut farm = quiet_farm();
    let report = farm.end_turn().unwrap();

    assert_eq!(report.year, 1);
    assert!(report.event.is_none());
    assert_eq!(report.property_tax, Money::from_dollars(1250));
    assert_eq!(report.interest, Money::from_dollars(700));
    assert_eq!(farm.ledger().cash, Money::from_dollars(9450));
    // No profit, so depreciation without storage is the only change.
    assert!(!report.integrity_bonus);
    assert!(near(farm.ledger().integrity, fixed(90)));
    assert_eq!(farm.grid().occupied_count(), 0);
    assert_eq!(farm.year(), 2);
}

#[test]
fn test_single_rice_tile_earns_forty_and_clears() {
    let mut farm = quiet_farm();
    farm.place(0, 0, "paddyRice").unwrap();
    let report = farm.end_turn().unwrap();

    assert_eq!(report.harvest.crop_income, Money::from_dollars(40));
    assert_eq!(report.harvest.crops_harvested, 1);
    assert!(farm.grid().tile(0, 0).unwrap().is_empty());
    assert_eq!(farm.ledger().cash, Money::from_cents(946_840));
    assert_eq!(report.record.revenue, Money::from_cents(4_000 + 69_840));
    assert_eq!(report.record.expenses, Money::from_dollars(1250));
}

#[test]
fn test_gold_purchase_quotes() {
    let farm = quiet_farm();
    let quote = farm.market().buy("gold", 2, Money::from_dollars(20_000)).unwrap();
    assert_eq!(quote.total, Money::from_dollars(16_000));
    assert!(matches!(
        farm.market().buy("gold", 2, Money::from_dollars(10_000)),
        Err(GameError::InsufficientFunds { .. })
    ));
}

#[test]
fn test_well_refund_depends_on_road() {
    let mut farm = quiet_farm();
    farm.place(0, 0, "well").unwrap();
    assert_eq!(farm.liquidate(0, 0).unwrap().refund, Money::from_dollars(560));

    let mut farm = quiet_farm();
    farm.place(4, 4, "paved_road").unwrap();
    farm.place(0, 0, "well").unwrap();
    assert_eq!(farm.liquidate(0, 0).unwrap().refund, Money::from_dollars(680));
    assert_eq!(farm.ledger().building_value, Money::from_dollars(500));
}

#[test]
fn test_crop_failure_targets_only_its_crop() {
    let blight = || {
        single_event(
            "DISASTER",
            r#"{ "cropFailure": "paddyRice", "insuranceProtected": true }"#,
        )
    };

    let mut farm = scripted_farm(blight(), neutral_rng());
    farm.place(0, 0, "paddyRice").unwrap();
    farm.place(1, 0, "paddyRice").unwrap();
    farm.place(2, 0, "durian").unwrap();
    let report = farm.end_turn().unwrap();
    assert_eq!(report.effects.crops_destroyed, 2);
    assert_eq!(report.harvest.crop_income, Money::from_dollars(900));

    let mut farm = scripted_farm(blight(), neutral_rng());
    farm.buy_insurance(InsuranceKind::Annual).unwrap();
    farm.place(0, 0, "paddyRice").unwrap();
    farm.place(1, 0, "paddyRice").unwrap();
    farm.place(2, 0, "durian").unwrap();
    let report = farm.end_turn().unwrap();
    assert_eq!(report.effects.crops_destroyed, 0);
    assert_eq!(report.effects.crops_protected, vec!["paddyRice".to_string()]);
    assert_eq!(report.harvest.crop_income, Money::from_dollars(980));
    assert_eq!(report.insurance_fee, Money::from_dollars(1000));
}

#[test]
fn test_game_over_is_terminal() {
    let mut farm = scripted_farm(
        single_event("DISASTER", r#"{ "integrity": -100 }"#),
        neutral_rng(),
    );
    farm.end_turn().unwrap();
    assert_eq!(farm.ledger().integrity, Fixed::ZERO);
    let draws = farm.rng().drawn();

    for _ in 0..3 {
        assert_eq!(farm.end_turn().unwrap_err(), GameError::GameOver);
    }
    assert!(farm.is_game_over());
    assert_eq!(farm.rng().drawn(), draws);
    assert_eq!(farm.place(0, 0, "pond").unwrap_err(), GameError::GameOver);
    assert_eq!(farm.history().len(), 1);

    farm.initialize();
    assert!(!farm.is_game_over());
    assert!(farm.history().is_empty());
}

#[test]
fn test_bribe_can_be_paid_or_refused() {
    let corruption = || {
        single_event(
            "CORRUPTION",
            r#"{ "payAmount": 1000, "refuseIntegrityLoss": -15 }"#,
        )
    };

    let mut farm = scripted_farm(corruption(), neutral_rng());
    let report = farm.end_turn().unwrap();
    assert!(report.effects.decision_pending);
    assert_eq!(
        farm.resolve_bribe(true).unwrap(),
        BribeOutcome::Paid(Money::from_dollars(1000))
    );
    assert_eq!(farm.ledger().cash, Money::from_dollars(8450));
    assert_eq!(farm.resolve_bribe(true).unwrap_err(), GameError::NoPendingDecision);

    let mut farm = scripted_farm(corruption(), neutral_rng());
    farm.end_turn().unwrap();
    assert_eq!(
        farm.resolve_bribe(false).unwrap(),
        BribeOutcome::Refused(fixed(-15))
    );
    assert!(near(farm.ledger().integrity, fixed(75)));
}

#[test]
fn test_comm_tower_forecast_is_used_next_year() {
    let mut farm = seeded_farm(31);
    // Tile loss takes occupied tiles in grid order; keep the tower last.
    farm.place(0, 0, "barn").unwrap();
    farm.place(1, 0, "pond").unwrap();
    farm.place(2, 0, "pond").unwrap();
    farm.place(4, 4, "comm_tower").unwrap();

    let mut report = farm.end_turn().unwrap();
    for _ in 0..4 {
        let Some(forecast) = farm.forecast().cloned() else {
            assert!(!farm.has_structure("comm_tower"));
            break;
        };
        assert_eq!(report.forecast.as_ref(), Some(&forecast));

        report = farm.end_turn().unwrap();
        assert_eq!(report.event, forecast.event);
    }
}

#[test]
fn test_expansion_raises_tax() {
    let mut farm = quiet_farm();
    farm.place(4, 4, "barn").unwrap();
    farm.expand_grid().unwrap();
    assert_eq!(farm.grid().size(), 6);
    assert!(!farm.grid().tile(4, 4).unwrap().is_empty());
    assert!(farm.grid().tile(5, 5).unwrap().is_empty());

    let report = farm.end_turn().unwrap();
    assert_eq!(report.property_tax, Money::from_dollars(1800));
    assert_eq!(
        report.record.balance_sheet.assets.land_value,
        Money::from_dollars(36_000)
    );
}

#[test]
fn test_tile_loss_takes_first_column_first() {
    let mut farm = scripted_farm(single_event("DISASTER", r#"{ "tilesLost": 1 }"#), neutral_rng());
    farm.place(1, 0, "pond").unwrap();
    farm.place(0, 1, "fence").unwrap();

    let report = farm.end_turn().unwrap();
    assert_eq!(report.effects.tiles_lost, 1);
    assert!(farm.grid().tile(0, 1).unwrap().is_empty());
    assert!(!farm.grid().tile(1, 0).unwrap().is_empty());
    assert!(!farm.has_structure("fence"));
}

#[test]
fn test_livestock_pays_every_year() {
    let mut farm = quiet_farm();
    farm.place(0, 0, "barn").unwrap();
    farm.place(1, 0, "duck").unwrap();

    for _ in 0..3 {
        let report = farm.end_turn().unwrap();
        assert_eq!(report.harvest.livestock_income, Money::from_dollars(100));
    }
    assert_eq!(farm.grid().livestock_heads(), 1);
    assert_eq!(farm.history().len(), 3);
    assert!(farm.history().iter().all(|r| r.balance_sheet.is_balanced()));
}

#[test]
fn test_builtin_catalogs_run_for_decades() {
    let mut farm = seeded_farm(5);
    farm.place(0, 0, "barn").unwrap();
    farm.place(1, 0, "well").unwrap();
    farm.place(2, 0, "pig").unwrap();

    for _ in 0..40 {
        let size = farm.grid().size();
        for z in 0..size {
            for x in 0..size {
                let _ = farm.place(x, z, "sugarcane");
            }
        }
        if farm.end_turn().is_err() {
            break;
        }
        let ledger = farm.ledger();
        assert!(!ledger.cash.is_negative());
        assert!(ledger.integrity >= Fixed::ZERO && ledger.integrity <= fixed(100));
        assert!(farm.balance_sheet().is_balanced());
    }
}
