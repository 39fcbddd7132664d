#[cfg(test)]
mod tests {
    use arena_core::constants::*;
    use arena_core::enums::{DroneType, FlankVariant, MobState};
    use arena_core::types::{Position, Velocity};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use crate::brain::{AdvancedPhase, Behavior, Brain, FlankManeuver, PatrolLeg};
    use crate::fsm::{cover_point, evaluate, new_patrol_leg, swoop_path, DroneContext};
    use crate::profiles::{get_profile, roll_personality};

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(7)
    }

    fn brain_in(behavior: Behavior) -> Brain {
        let mut brain = Brain::new(PatrolLeg {
            heading: 0.0,
            remaining: 300.0,
            decide_at: 100.0,
        });
        brain.behavior = behavior;
        brain
    }

    fn ctx(drone_type: DroneType, health: f64, target: Option<Position>, now: f64) -> DroneContext {
        DroneContext {
            drone_type,
            position: Position::new(0.0, 0.0),
            velocity: Velocity::default(),
            health,
            max_health: get_profile(drone_type).max_health,
            intelligence: 0.5,
            target,
            home: Some(Position::new(0.0, 0.0)),
            nearest_ally: None,
            now,
            dt: DT,
        }
    }

    // ---- Health thresholds ----

    #[test]
    fn test_l1_never_retreats_or_regroups() {
        let mut rng = rng();
        let mut brain = brain_in(Behavior::Chase);
        let target = Some(Position::new(100.0, 0.0));
        for i in 0..300 {
            let c = ctx(DroneType::L1, 1.0, target, i as f64 * DT);
            evaluate(&mut brain, &c, &mut rng);
            assert!(
                !matches!(brain.state(), MobState::Retreat | MobState::Regroup),
                "drone_l1 entered {:?}",
                brain.state()
            );
        }
    }

    #[test]
    fn test_crossing_retreat_threshold_forces_retreat() {
        let mut rng = rng();
        let mut brain = brain_in(Behavior::Attack);
        let target = Position::new(100.0, 0.0);
        // 60 max health, 0.2 threshold.
        let c = ctx(DroneType::L2, 10.0, Some(target), 1.0);
        let update = evaluate(&mut brain, &c, &mut rng);
        assert_eq!(brain.state(), MobState::Retreat);
        assert!(update.state_changed);
        assert!(update.fire.is_none());
        // Moving directly away from the threat.
        assert!(update.velocity.x < 0.0);
        assert!(update.velocity.y.abs() < 1e-9);
    }

    #[test]
    fn test_regroup_threshold_forces_regroup() {
        let mut rng = rng();
        let mut brain = brain_in(Behavior::Chase);
        let c = ctx(DroneType::L2, 20.0, Some(Position::new(300.0, 0.0)), 2.0);
        evaluate(&mut brain, &c, &mut rng);
        assert_eq!(brain.state(), MobState::Regroup);
    }

    #[test]
    fn test_regroup_below_retreat_not_reforced_without_crossing() {
        let mut rng = rng();
        let mut brain = brain_in(Behavior::Regroup { until: 10.0 });
        brain.prev_health_ratio = 0.1;
        let c = ctx(DroneType::L2, 6.0, Some(Position::new(100.0, 0.0)), 1.0);
        evaluate(&mut brain, &c, &mut rng);
        assert_eq!(brain.state(), MobState::Regroup);
    }

    #[test]
    fn test_new_crossing_interrupts_regroup() {
        let mut rng = rng();
        let mut brain = brain_in(Behavior::Regroup { until: 10.0 });
        brain.prev_health_ratio = 0.3;
        let c = ctx(DroneType::L2, 6.0, Some(Position::new(100.0, 0.0)), 1.0);
        evaluate(&mut brain, &c, &mut rng);
        assert_eq!(brain.state(), MobState::Retreat);
    }

    // ---- Transitions ----

    #[test]
    fn test_patrol_with_target_switches_to_chase() {
        let mut rng = rng();
        let mut brain = brain_in(Behavior::Idle { until: 50.0 });
        let c = ctx(DroneType::L1, 30.0, Some(Position::new(250.0, 0.0)), 0.0);
        let update = evaluate(&mut brain, &c, &mut rng);
        assert_eq!(brain.state(), MobState::Chase);
        assert!(update.velocity.x > 0.0);
    }

    #[test]
    fn test_chase_loses_distant_target() {
        let mut rng = rng();
        let mut brain = brain_in(Behavior::Chase);
        let far = 300.0 * LOSE_TARGET_RANGE_FACTOR + 1.0;
        let c = ctx(DroneType::L1, 30.0, Some(Position::new(far, 0.0)), 0.0);
        let update = evaluate(&mut brain, &c, &mut rng);
        assert_eq!(brain.state(), MobState::Patrol);
        assert!(update.clear_target);
    }

    #[test]
    fn test_chase_enters_attack_in_range() {
        let mut rng = rng();
        let mut brain = brain_in(Behavior::Chase);
        let c = ctx(DroneType::L1, 30.0, Some(Position::new(150.0, 0.0)), 0.0);
        evaluate(&mut brain, &c, &mut rng);
        assert_eq!(brain.state(), MobState::Attack);
    }

    #[test]
    fn test_attack_respects_cooldown() {
        let mut rng = rng();
        let mut brain = brain_in(Behavior::Attack);
        let target = Some(Position::new(0.0, 100.0));

        let first = evaluate(&mut brain, &ctx(DroneType::L1, 30.0, target, 1.0), &mut rng);
        let angle = first.fire.unwrap();
        assert!((angle - std::f64::consts::FRAC_PI_2).abs() < 1e-9);

        let early = evaluate(&mut brain, &ctx(DroneType::L1, 30.0, target, 2.0), &mut rng);
        assert!(early.fire.is_none());

        let later = evaluate(&mut brain, &ctx(DroneType::L1, 30.0, target, 2.5), &mut rng);
        assert!(later.fire.is_some());
    }

    #[test]
    fn test_retreat_escape_enters_regroup_then_patrol() {
        let mut rng = rng();
        let mut brain = brain_in(Behavior::Retreat);
        brain.prev_health_ratio = 0.1;
        let far = Some(Position::new(400.0 * RETREAT_ESCAPE_RANGE_FACTOR + 10.0, 0.0));
        evaluate(&mut brain, &ctx(DroneType::L2, 6.0, far, 1.0), &mut rng);
        assert_eq!(brain.state(), MobState::Regroup);

        let c = ctx(DroneType::L2, 6.0, None, 1.5);
        let update = evaluate(&mut brain, &c, &mut rng);
        assert_eq!(brain.state(), MobState::Regroup);
        assert!(update.heal > 0.0);

        let done = ctx(DroneType::L2, 6.0, None, 1.0 + REGROUP_DURATION_SECS);
        evaluate(&mut brain, &done, &mut rng);
        assert_eq!(brain.state(), MobState::Patrol);
    }

    #[test]
    fn test_retreat_speed_is_boosted_for_l3() {
        let mut rng = rng();
        let mut brain = brain_in(Behavior::Attack);
        let c = ctx(DroneType::L3, 10.0, Some(Position::new(100.0, 0.0)), 1.0);
        let update = evaluate(&mut brain, &c, &mut rng);
        let profile = get_profile(DroneType::L3);
        assert!((update.velocity.speed() - profile.speed * 1.6).abs() < 1e-9);
    }

    // ---- Flank ----

    #[test]
    fn test_flank_variant_follows_intelligence() {
        let target = Some(Position::new(150.0, 0.0));
        let mut seen = [false, false];
        for (i, intelligence) in [0.3, 0.9].into_iter().enumerate() {
            for seed in 0..200 {
                let mut rng = ChaCha8Rng::seed_from_u64(seed);
                let mut brain = brain_in(Behavior::Attack);
                let mut c = ctx(DroneType::L3, 120.0, target, 1.0);
                c.intelligence = intelligence;
                evaluate(&mut brain, &c, &mut rng);
                if let Behavior::Flank { maneuver, .. } = &brain.behavior {
                    let expected = if intelligence >= ADVANCED_FLANK_INTELLIGENCE {
                        FlankVariant::Advanced
                    } else {
                        FlankVariant::Basic
                    };
                    assert_eq!(maneuver.variant(), expected);
                    seen[i] = true;
                }
            }
        }
        assert!(seen[0] && seen[1]);
    }

    #[test]
    fn test_l1_and_l2_never_flank() {
        for drone_type in [DroneType::L1, DroneType::L2] {
            let mut rng = rng();
            let mut brain = brain_in(Behavior::Attack);
            let max = get_profile(drone_type).max_health;
            for i in 0..200 {
                let c = ctx(drone_type, max, Some(Position::new(100.0, 0.0)), i as f64 * 2.0);
                evaluate(&mut brain, &c, &mut rng);
                assert_ne!(brain.state(), MobState::Flank);
            }
        }
    }

    #[test]
    fn test_flank_times_out_to_attack() {
        let mut rng = rng();
        let mut brain = brain_in(Behavior::Flank {
            started_at: 0.0,
            maneuver: FlankManeuver::Basic {
                side: 1.0,
                until: 100.0,
            },
        });
        let c = ctx(DroneType::L3, 120.0, Some(Position::new(100.0, 0.0)), FLANK_TIMEOUT_SECS);
        evaluate(&mut brain, &c, &mut rng);
        assert_eq!(brain.state(), MobState::Attack);
    }

    #[test]
    fn test_basic_flank_moves_perpendicular() {
        let mut rng = rng();
        let mut brain = brain_in(Behavior::Flank {
            started_at: 0.0,
            maneuver: FlankManeuver::Basic {
                side: 1.0,
                until: 2.0,
            },
        });
        let c = ctx(DroneType::L3, 120.0, Some(Position::new(100.0, 0.0)), 1.0);
        let update = evaluate(&mut brain, &c, &mut rng);
        assert_eq!(brain.state(), MobState::Flank);
        assert!(update.velocity.x.abs() < 1e-9);
        assert!(update.velocity.y > 0.0);
    }

    #[test]
    fn test_advanced_flank_assessment_to_cover() {
        let mut rng = rng();
        let mut brain = brain_in(Behavior::Flank {
            started_at: 0.0,
            maneuver: FlankManeuver::Advanced(AdvancedPhase::Assessment { until: 0.6 }),
        });
        let mut c = ctx(DroneType::L3, 120.0, Some(Position::new(100.0, 0.0)), 0.7);
        c.nearest_ally = Some(Position::new(0.0, 200.0));
        evaluate(&mut brain, &c, &mut rng);
        match &brain.behavior {
            Behavior::Flank {
                maneuver: FlankManeuver::Advanced(AdvancedPhase::Cover { point, .. }),
                ..
            } => {
                assert_eq!(*point, cover_point(Position::new(0.0, 200.0), Position::new(100.0, 0.0)));
            }
            other => panic!("expected cover phase, got {other:?}"),
        }
    }

    #[test]
    fn test_advanced_flank_without_ally_swoops() {
        let mut rng = rng();
        let mut brain = brain_in(Behavior::Flank {
            started_at: 0.0,
            maneuver: FlankManeuver::Advanced(AdvancedPhase::Assessment { until: 0.6 }),
        });
        let c = ctx(DroneType::L3, 120.0, Some(Position::new(100.0, 0.0)), 0.7);
        evaluate(&mut brain, &c, &mut rng);
        assert!(matches!(
            brain.behavior,
            Behavior::Flank {
                maneuver: FlankManeuver::Advanced(AdvancedPhase::Swooping { .. }),
                ..
            }
        ));
    }

    #[test]
    fn test_completed_swoop_returns_to_attack() {
        let mut rng = rng();
        let mut brain = brain_in(Behavior::Flank {
            started_at: 0.0,
            maneuver: FlankManeuver::Advanced(AdvancedPhase::Swooping {
                path: vec![Position::new(0.0, 0.0)],
                next: 0,
            }),
        });
        let c = ctx(DroneType::L3, 120.0, Some(Position::new(100.0, 0.0)), 1.0);
        evaluate(&mut brain, &c, &mut rng);
        assert_eq!(brain.state(), MobState::Attack);
    }

    #[test]
    fn test_flank_losing_target_patrols() {
        let mut rng = rng();
        let mut brain = brain_in(Behavior::Flank {
            started_at: 0.0,
            maneuver: FlankManeuver::Basic {
                side: -1.0,
                until: 2.0,
            },
        });
        let update = evaluate(&mut brain, &ctx(DroneType::L3, 120.0, None, 1.0), &mut rng);
        assert_eq!(brain.state(), MobState::Patrol);
        assert!(update.clear_target);
    }

    #[test]
    fn test_swoop_path_on_arc() {
        let mut rng = rng();
        let target = Position::new(50.0, 50.0);
        let path = swoop_path(Position::new(250.0, 50.0), target, 260.0, &mut rng);
        assert_eq!(path.len(), SWOOP_WAYPOINTS);
        for p in &path {
            assert!((p.distance_to(&target) - 260.0 * SWOOP_RADIUS_FACTOR).abs() < 1e-6);
        }
    }

    #[test]
    fn test_cover_point_behind_ally() {
        let p = cover_point(Position::new(100.0, 0.0), Position::new(0.0, 0.0));
        assert!((p.x - (100.0 + FLANK_COVER_OFFSET)).abs() < 1e-9);
    }

    // ---- Patrol / profiles ----

    #[test]
    fn test_patrol_leg_leashed_to_home() {
        let mut rng = rng();
        let home = Position::new(0.0, 0.0);
        let leg = new_patrol_leg(Position::new(PATROL_LEASH + 50.0, 0.0), Some(home), 0.0, &mut rng);
        assert!((leg.heading.abs() - std::f64::consts::PI).abs() < 1e-9);
        assert!((PATROL_LEG_MIN..=PATROL_LEG_MAX).contains(&leg.remaining));
        assert!(leg.decide_at >= PATROL_DECISION_MIN_SECS);
    }

    #[test]
    fn test_patrol_eventually_idles() {
        let mut rng = rng();
        let mut brain = brain_in(Behavior::Patrol(PatrolLeg {
            heading: 0.0,
            remaining: 0.0,
            decide_at: 0.0,
        }));
        let mut idled = false;
        for i in 0..2000 {
            let c = ctx(DroneType::L1, 30.0, None, i as f64 * DT * 10.0);
            evaluate(&mut brain, &c, &mut rng);
            if brain.state() == MobState::Idle {
                idled = true;
                break;
            }
        }
        assert!(idled);
    }

    #[test]
    fn test_personality_within_tier_range() {
        let mut rng = rng();
        for t in DroneType::ALL {
            let (lo, hi) = get_profile(t).personality_range;
            let p = roll_personality(t, &mut rng);
            for v in [p.courage, p.aggression, p.caution, p.intelligence, p.teamwork] {
                assert!((lo..=hi).contains(&v));
            }
        }
    }

    #[test]
    fn test_only_l3_boosts() {
        assert!(get_profile(DroneType::L1).boost_multiplier.is_none());
        assert!(get_profile(DroneType::L2).boost_multiplier.is_none());
        assert!(get_profile(DroneType::L3).boost_multiplier.unwrap() > 1.0);
    }
}
