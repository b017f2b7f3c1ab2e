//! End-to-end tests for the engine over mock providers

#[cfg(test)]
mod tests {
    use crate::{EngineConfig, EngineError, Reconciler, SeasonAggregator};
    use paddock_domain::{
        FinishStatus, LapRecord, Provenance, RoundDescriptor, RoundResult, SessionKind, SourceTag,
    };
    use paddock_sources::{MockHistorical, MockPrimary, MockSchedule, SourceError};
    use std::sync::Arc;

    struct Fixture {
        primary: MockPrimary,
        secondary: MockHistorical,
        schedule: MockSchedule,
    }

    impl Fixture {
        fn new(season: i32, rounds: u32) -> Self {
            let schedule = MockSchedule::new();
            let mut descriptors: Vec<RoundDescriptor> = (1..=rounds)
                .map(|r| RoundDescriptor::new(r, format!("Grand Prix {}", r)))
                .collect();
            descriptors.push(RoundDescriptor::new(0, "Pre-Season Testing"));
            schedule.add_season(season, descriptors);

            Self {
                primary: MockPrimary::new(),
                secondary: MockHistorical::new(),
                schedule,
            }
        }

        fn aggregator(&self) -> SeasonAggregator {
            SeasonAggregator::new(
                Arc::new(self.primary.clone()),
                Arc::new(self.secondary.clone()),
                Arc::new(self.schedule.clone()),
                EngineConfig::default(),
            )
        }

        fn reconciler(&self) -> Reconciler {
            Reconciler::new(Arc::new(self.primary.clone()), Arc::new(self.secondary.clone()))
        }
    }

    fn primary_row(code: &str, pos: u32, points: f64, team: &str) -> RoundResult {
        RoundResult::new(code, Provenance::Primary)
            .with_position(pos)
            .with_points(points)
            .with_team(team, Some("3671C6"))
            .with_status(FinishStatus::Finished)
    }

    #[tokio::test]
    async fn test_scenario_primary_points_with_grid() {
        let fx = Fixture::new(2023, 1);
        fx.primary.add_results(
            2023,
            1,
            SessionKind::Race,
            vec![
                primary_row("VER", 1, 25.0, "Red Bull Racing").with_grid(1),
                primary_row("HAM", 2, 18.0, "Mercedes").with_grid(3),
            ],
        );

        let payload = fx.aggregator().build_season(2023).await.unwrap();
        let ver = &payload.drivers["VER"];
        assert_eq!(ver.poles, 1);
        assert_eq!(ver.pole_rounds, vec![1]);
        assert_eq!(ver.wins, 1);
        assert_eq!(ver.podiums, 1);
        assert_eq!(ver.total_points, 25.0);
        assert_eq!(ver.grid_position, Some(1));
        assert_eq!(payload.drivers["HAM"].total_points, 18.0);
        assert_eq!(payload.races[0].source, SourceTag::Primary);
        assert_eq!(payload.races[0].winner.as_ref().unwrap().code, "VER");
    }

    #[tokio::test]
    async fn test_scenario_derived_from_primary_positions() {
        let fx = Fixture::new(2023, 1);
        fx.primary.add_results(
            2023,
            1,
            SessionKind::Race,
            vec![
                primary_row("HAM", 2, 0.0, "Mercedes"),
                primary_row("VER", 1, 0.0, "Red Bull Racing"),
            ],
        );

        let reconciled = fx.reconciler().reconcile(2023, 1).await.unwrap();
        assert_eq!(reconciled.source, SourceTag::Derived);
        assert_eq!(reconciled.rows[0].driver_code, "VER");
        assert_eq!(reconciled.rows[0].points(), 25.0);
        assert_eq!(reconciled.rows[1].points(), 18.0);
        assert_eq!(reconciled.rows[0].team_name.as_deref(), Some("Red Bull Racing"));

        let payload = fx.aggregator().build_season(2023).await.unwrap();
        assert_eq!(payload.drivers["VER"].total_points, 25.0);
        assert_eq!(payload.drivers["HAM"].total_points, 18.0);
        assert_eq!(payload.races[0].source, SourceTag::Derived);
    }

    #[tokio::test]
    async fn test_laps_take_priority_over_positions_in_derivation() {
        let fx = Fixture::new(2022, 1);
        fx.primary.add_results(
            2022,
            1,
            SessionKind::Race,
            vec![primary_row("LEC", 1, 0.0, "Ferrari"), primary_row("SAI", 2, 0.0, "Ferrari")],
        );
        fx.primary.add_laps(
            2022,
            1,
            vec![
                LapRecord { driver_code: "LEC".into(), driver_number: Some(16), lap_number: 57, position: Some(2) },
                LapRecord { driver_code: "SAI".into(), driver_number: Some(55), lap_number: 57, position: Some(1) },
            ],
        );

        let reconciled = fx.reconciler().reconcile(2022, 1).await.unwrap();
        assert_eq!(reconciled.rows[0].driver_code, "SAI");
        assert_eq!(reconciled.rows[0].status, Some(FinishStatus::Finished));
    }

    #[tokio::test]
    async fn test_scenario_inaugural_sprint_without_points() {
        let fx = Fixture::new(2021, 1);
        fx.primary.add_results(
            2021,
            1,
            SessionKind::Race,
            vec![primary_row("VER", 1, 25.0, "Red Bull"), primary_row("LEC", 4, 12.0, "Ferrari")],
        );
        fx.primary.add_results(
            2021,
            1,
            SessionKind::Sprint,
            vec![
                RoundResult::new("LEC", Provenance::Primary).with_position(1),
                RoundResult::new("VER", Provenance::Primary).with_position(2),
            ],
        );

        let payload = fx.aggregator().build_season(2021).await.unwrap();
        let lec = &payload.drivers["LEC"];
        assert_eq!(lec.total_points, 15.0);
        assert_eq!(lec.wins, 0);
        assert_eq!(lec.podiums, 0);
        assert_eq!(payload.drivers["VER"].total_points, 27.0);
        assert!(payload.sprint_rounds.contains(&1));

        let red_bull = &payload.constructors["Red Bull Racing"];
        assert_eq!(red_bull.total_points, 27.0);
        assert_eq!(red_bull.championship_position, Some(1));
    }

    #[tokio::test]
    async fn test_extended_sprint_schedule_after_2021() {
        let fx = Fixture::new(2023, 1);
        fx.primary.add_results(2023, 1, SessionKind::Race, vec![primary_row("NOR", 1, 25.0, "McLaren")]);
        fx.secondary.add_sprint(
            2023,
            1,
            vec![
                RoundResult::new("NOR", Provenance::Secondary).with_position(1),
                RoundResult::new("PIA", Provenance::Secondary).with_position(8),
            ],
        );

        let payload = fx.aggregator().build_season(2023).await.unwrap();
        assert_eq!(payload.drivers["NOR"].total_points, 33.0);
        assert_eq!(payload.drivers["PIA"].total_points, 1.0);
    }

    #[tokio::test]
    async fn test_pole_from_qualifying_when_grid_missing() {
        let fx = Fixture::new(2020, 1);
        fx.secondary.add_race(
            2020,
            1,
            vec![
                RoundResult::new("BOT", Provenance::Secondary).with_position(1).with_points(25.0),
                RoundResult::new("HAM", Provenance::Secondary).with_position(4).with_points(13.0),
            ],
        );
        fx.secondary.add_qualifying(
            2020,
            1,
            vec![
                RoundResult::new("BOT", Provenance::Secondary).with_position(1),
                RoundResult::new("HAM", Provenance::Secondary).with_position(2),
            ],
        );

        let payload = fx.aggregator().build_season(2020).await.unwrap();
        assert_eq!(payload.drivers["BOT"].poles, 1);
        assert_eq!(payload.drivers["HAM"].grid_position, Some(2));
        assert_eq!(payload.races[0].source, SourceTag::Secondary);
    }

    #[tokio::test]
    async fn test_pole_from_sprint_shootout_without_any_grid() {
        let fx = Fixture::new(2023, 1);
        fx.primary.add_results(2023, 1, SessionKind::Race, vec![primary_row("PER", 1, 25.0, "Red Bull Racing")]);
        fx.primary.add_results(
            2023,
            1,
            SessionKind::SprintShootout,
            vec![RoundResult::new("PER", Provenance::Primary).with_position(1)],
        );

        let payload = fx.aggregator().build_season(2023).await.unwrap();
        assert_eq!(payload.drivers["PER"].poles, 1);
        assert_eq!(payload.constructors["Red Bull Racing"].poles, 1);
    }

    #[tokio::test]
    async fn test_failed_round_is_skipped() {
        let fx = Fixture::new(2019, 2);
        fx.primary.add_error(2019, 1, SessionKind::Race, SourceError::Communication("timeout".into()));
        fx.primary.add_results(2019, 2, SessionKind::Race, vec![primary_row("HAM", 1, 26.0, "Mercedes")]);

        let payload = fx.aggregator().build_season(2019).await.unwrap();
        assert_eq!(payload.races.len(), 1);
        assert_eq!(payload.races[0].round, 2);
        assert_eq!(payload.drivers["HAM"].total_points, 26.0);
    }

    #[tokio::test]
    async fn test_sprint_of_skipped_round_is_ignored() {
        let fx = Fixture::new(2023, 2);
        fx.primary.add_results(2023, 1, SessionKind::Race, vec![primary_row("VER", 1, 25.0, "Red Bull Racing")]);
        fx.primary.add_error(2023, 2, SessionKind::Race, SourceError::Communication("timeout".into()));
        fx.primary.add_results(
            2023,
            2,
            SessionKind::Sprint,
            vec![RoundResult::new("LEC", Provenance::Primary)
                .with_position(1)
                .with_points(8.0)
                .with_team("Ferrari", None)],
        );

        let payload = fx.aggregator().build_season(2023).await.unwrap();
        assert_eq!(payload.races.len(), 1);
        assert!(payload.sprint_rounds.is_empty());
        assert!(!payload.drivers.contains_key("LEC"));
        assert!(!payload.constructors.contains_key("Ferrari"));
    }

    #[tokio::test]
    async fn test_primary_positions_take_secondary_points() {
        let fx = Fixture::new(2018, 1);
        fx.primary.add_results(
            2018,
            1,
            SessionKind::Race,
            vec![
                RoundResult::new("VET", Provenance::Primary)
                    .with_position(1)
                    .with_team("Ferrari", None)
                    .with_grid(3),
                RoundResult::new("HAM", Provenance::Primary)
                    .with_position(2)
                    .with_team("Mercedes", None)
                    .with_grid(1),
            ],
        );
        fx.secondary.add_race(
            2018,
            1,
            vec![
                RoundResult::new("VET", Provenance::Secondary)
                    .with_position(1)
                    .with_status(FinishStatus::Finished),
                RoundResult::new("HAM", Provenance::Secondary)
                    .with_position(2)
                    .with_status(FinishStatus::Finished),
            ],
        );

        let reconciled = fx.reconciler().reconcile(2018, 1).await.unwrap();
        assert_eq!(reconciled.source, SourceTag::PrimaryWithSecondaryPoints);
        assert_eq!(reconciled.rows[0].status, Some(FinishStatus::Finished));

        let payload = fx.aggregator().build_season(2018).await.unwrap();
        assert_eq!(payload.races[0].source, SourceTag::PrimaryWithSecondaryPoints);
        assert_eq!(payload.races[0].winner.as_ref().unwrap().code, "VET");
        assert_eq!(payload.drivers["VET"].wins, 1);
        assert_eq!(payload.drivers["HAM"].poles, 1);
        assert_eq!(payload.drivers["VET"].total_points, 0.0);
    }

    #[tokio::test]
    async fn test_pole_from_qualifying_winner_missing_from_race() {
        let fx = Fixture::new(2021, 1);
        fx.primary.add_results(
            2021,
            1,
            SessionKind::Race,
            vec![primary_row("VER", 1, 25.0, "Red Bull Racing"), primary_row("HAM", 2, 18.0, "Mercedes")],
        );
        fx.secondary.add_qualifying(
            2021,
            1,
            vec![RoundResult::new("LEC", Provenance::Secondary)
                .with_position(1)
                .with_team("Ferrari", None)],
        );

        let payload = fx.aggregator().build_season(2021).await.unwrap();
        assert_eq!(payload.drivers["LEC"].poles, 1);
        assert_eq!(payload.drivers["VER"].poles, 0);
        assert_eq!(payload.constructors["Ferrari"].poles, 1);
    }

    #[tokio::test]
    async fn test_schedule_failure_is_fatal() {
        let fx = Fixture::new(2019, 1);
        fx.schedule.add_error(2019, SourceError::Communication("down".into()));

        let err = fx.aggregator().build_season(2019).await.unwrap_err();
        assert!(matches!(err, EngineError::ScheduleUnavailable { season: 2019, .. }));
    }

    #[tokio::test]
    async fn test_empty_season() {
        let fx = Fixture::new(2030, 3);
        let err = fx.aggregator().build_season(2030).await.unwrap_err();
        assert_eq!(err, EngineError::EmptySeason(2030));
    }

    #[tokio::test]
    async fn test_builds_are_idempotent() {
        let fx = Fixture::new(2022, 2);
        for round in 1..=2 {
            fx.primary.add_results(
                2022,
                round,
                SessionKind::Race,
                vec![
                    primary_row("VER", 1, 25.0, "Red Bull Racing").with_grid(round),
                    primary_row("LEC", 2, 18.0, "Ferrari").with_grid(3 - round),
                    primary_row("SAI", 3, 15.0, "Ferrari"),
                ],
            );
        }

        let aggregator = fx.aggregator();
        let first = aggregator.build_season(2022).await.unwrap();
        let second = aggregator.build_season(2022).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );

        let ferrari = &first.constructors["Ferrari"];
        assert_eq!(ferrari.total_points, 66.0);
        assert_eq!(ferrari.podiums, 4);
        assert_eq!(ferrari.poles, 1);
        assert_eq!(ferrari.championship_position, Some(2));
        assert_eq!(first.drivers["LEC"].avg_finish, Some(2.0));
    }
}
