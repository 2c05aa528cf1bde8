use naval_duel::{
    Board, BoardError, Cell, Coord, Fleet, Orientation, ShipKind, ShotOutcome, FLEET,
};
use proptest::prelude::*;
use rand::{rngs::SmallRng, SeedableRng};

fn board_with_destroyer() -> Board {
    let mut fleet = Fleet::new();
    fleet
        .place_at(ShipKind::Destroyer, Coord::new(3, 3), Orientation::Horizontal)
        .unwrap();
    fleet
        .place_at(ShipKind::Carrier, Coord::new(0, 9), Orientation::Horizontal)
        .unwrap();
    let mut board = Board::new();
    board.set_fleet(&fleet).unwrap();
    board
}

#[test]
fn test_fire_miss_hit_sunk() -> Result<(), BoardError> {
    let mut board = board_with_destroyer();
    assert_eq!(board.fire(Coord::new(0, 0))?, ShotOutcome::Miss);
    assert_eq!(board.cell(Coord::new(0, 0)), Cell::Miss);

    assert_eq!(board.fire(Coord::new(3, 3))?, ShotOutcome::Hit);
    assert_eq!(board.cell(Coord::new(3, 3)), Cell::Hit);
    let id = ShipKind::Destroyer.slot() as u8;
    assert!(!board.is_sunk(id));

    assert_eq!(
        board.fire(Coord::new(4, 3))?,
        ShotOutcome::Sunk(ShipKind::Destroyer)
    );
    assert!(board.is_sunk(id));
    assert_eq!(board.sunk_kinds(), &[ShipKind::Destroyer]);
    assert!(!board.all_sunk());
    Ok(())
}

#[test]
fn test_repeat_fire_changes_nothing() {
    let mut board = board_with_destroyer();
    board.fire(Coord::new(3, 3)).unwrap();
    let before = board.clone();
    assert_eq!(
        board.fire(Coord::new(3, 3)),
        Err(BoardError::AlreadyTargeted(Coord::new(3, 3)))
    );
    assert_eq!(board, before);
}

#[test]
fn test_fire_out_of_bounds() {
    let mut board = board_with_destroyer();
    assert!(matches!(
        board.fire(Coord::new(10, 0)),
        Err(BoardError::BitBoard(_))
    ));
}

#[test]
fn test_frozen_board_rejects_shots() {
    let mut board = board_with_destroyer();
    board.freeze();
    assert_eq!(board.fire(Coord::new(0, 0)), Err(BoardError::Frozen));
    assert!(board.targeting_view().untargeted().len() == 100);
}

#[test]
fn test_fleet_locked_after_first_shot() {
    let mut board = board_with_destroyer();
    board.fire(Coord::new(0, 0)).unwrap();
    assert_eq!(board.set_fleet(&Fleet::new()), Err(BoardError::Frozen));
}

#[test]
fn test_targeting_view_hides_ships() {
    let mut board = board_with_destroyer();
    board.fire(Coord::new(3, 3)).unwrap();
    let view = board.targeting_view();
    assert_eq!(view.hits.count(), 1);
    assert!(view.misses.is_empty());
    assert_eq!(view.remaining.len(), FLEET.len());
    assert!(board.render(false).contains('X'));
    assert!(!board.render(false).contains('S'));
    assert!(board.render(true).contains('S'));
}

#[test]
fn test_reported_results_on_unknown_fleet() -> Result<(), BoardError> {
    let mut board = Board::new();
    assert!(board.apply_reported(Coord::new(1, 1), ShotOutcome::Hit)?);
    assert!(board.apply_reported(Coord::new(1, 2), ShotOutcome::Sunk(ShipKind::Destroyer))?);
    board.mark_sunk(ShipKind::Destroyer, Some(&[Coord::new(1, 1), Coord::new(1, 2)]));

    let view = board.targeting_view();
    assert!(view.unresolved_hits().is_empty());
    assert_eq!(view.remaining, vec![5, 4, 3, 3]);
    Ok(())
}

#[test]
fn test_reported_result_overrides_local() -> Result<(), BoardError> {
    let mut board = board_with_destroyer();
    // local fleet says miss; the reported hit wins
    let agreed = board.apply_reported(Coord::new(0, 0), ShotOutcome::Hit)?;
    assert!(!agreed);
    assert_eq!(board.cell(Coord::new(0, 0)), Cell::Hit);
    Ok(())
}

#[test]
fn test_all_sunk_after_every_cell() {
    let mut rng = SmallRng::seed_from_u64(11);
    let fleet = naval_duel::shuffle(&mut rng, &naval_duel::EngineConfig::default());
    let mut board = Board::new();
    board.set_fleet(&fleet).unwrap();
    let cells: Vec<Coord> = board.ships().iter().flat_map(|s| s.cells().to_vec()).collect();
    assert_eq!(cells.len(), naval_duel::TOTAL_SHIP_CELLS);
    for (i, c) in cells.iter().enumerate() {
        assert!(!board.all_sunk(), "fleet sunk early at shot {}", i);
        assert!(board.fire(*c).unwrap().is_hit());
    }
    assert!(board.all_sunk());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn sunk_exactly_on_last_hit(seed in any::<u64>()) {
        let mut rng = SmallRng::seed_from_u64(seed);
        let fleet = naval_duel::shuffle(&mut rng, &naval_duel::EngineConfig::default());
        let mut board = Board::new();
        board.set_fleet(&fleet).unwrap();
        for ship in fleet.ships() {
            let cells = ship.cells();
            for (i, &c) in cells.iter().enumerate() {
                prop_assert!(!board.is_sunk(ship.id()));
                let outcome = board.fire(c).unwrap();
                if i + 1 == cells.len() {
                    prop_assert_eq!(outcome, ShotOutcome::Sunk(ship.kind()));
                } else {
                    prop_assert_eq!(outcome, ShotOutcome::Hit);
                }
            }
            prop_assert!(board.is_sunk(ship.id()));
        }
    }

    #[test]
    fn repeat_shot_is_noop(seed in any::<u64>(), x in 0u8..10, y in 0u8..10) {
        let mut rng = SmallRng::seed_from_u64(seed);
        let fleet = naval_duel::shuffle(&mut rng, &naval_duel::EngineConfig::default());
        let mut board = Board::new();
        board.set_fleet(&fleet).unwrap();
        board.fire(Coord::new(x, y)).unwrap();
        let after = board.clone();
        prop_assert!(board.fire(Coord::new(x, y)).is_err());
        prop_assert_eq!(board, after);
    }
}
