//! Points schedules

/// Classic top-10 grand prix schedule, indexed by position - 1
pub const RACE_POINTS: [f64; 10] = [25.0, 18.0, 15.0, 12.0, 10.0, 8.0, 6.0, 4.0, 2.0, 1.0];

/// Last season that used the three-place sprint schedule
pub const INAUGURAL_SPRINT_LAST_SEASON: i32 = 2021;

const INAUGURAL_SPRINT_POINTS: [f64; 3] = [3.0, 2.0, 1.0];
const EXTENDED_SPRINT_POINTS: [f64; 8] = [8.0, 7.0, 6.0, 5.0, 4.0, 3.0, 2.0, 1.0];

/// Points for a grand prix finishing position
///
/// # Examples
///
/// ```
/// use paddock_domain::race_points;
///
/// assert_eq!(race_points(1), 25.0);
/// assert_eq!(race_points(10), 1.0);
/// assert_eq!(race_points(11), 0.0);
/// ```
pub fn race_points(position: u32) -> f64 {
    lookup(&RACE_POINTS, position)
}

/// Sprint points schedule in force for a season
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SprintFormat {
    /// 3-2-1 for the top three
    Inaugural,
    /// 8 down to 1 for the top eight
    Extended,
}

impl SprintFormat {
    /// Pick the schedule for a season given the last inaugural-format season
    pub fn for_season(season: i32, inaugural_last_season: i32) -> Self {
        if season <= inaugural_last_season {
            SprintFormat::Inaugural
        } else {
            SprintFormat::Extended
        }
    }

    /// Points for a sprint finishing position
    pub fn points(&self, position: u32) -> f64 {
        match self {
            SprintFormat::Inaugural => lookup(&INAUGURAL_SPRINT_POINTS, position),
            SprintFormat::Extended => lookup(&EXTENDED_SPRINT_POINTS, position),
        }
    }
}

fn lookup(table: &[f64], position: u32) -> f64 {
    if position == 0 {
        return 0.0;
    }
    table.get(position as usize - 1).copied().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_sprint_format_threshold() {
        assert_eq!(SprintFormat::for_season(2021, 2021), SprintFormat::Inaugural);
        assert_eq!(SprintFormat::for_season(2022, 2021), SprintFormat::Extended);
        assert_eq!(SprintFormat::Inaugural.points(1), 3.0);
        assert_eq!(SprintFormat::Inaugural.points(4), 0.0);
        assert_eq!(SprintFormat::Extended.points(8), 1.0);
    }

    #[test]
    fn test_position_zero_scores_nothing() {
        assert_eq!(race_points(0), 0.0);
        assert_eq!(SprintFormat::Extended.points(0), 0.0);
    }

    proptest! {
        #[test]
        fn race_points_non_increasing(pos in 1u32..40) {
            prop_assert!(race_points(pos) >= race_points(pos + 1));
        }

        #[test]
        fn sprint_points_non_increasing(pos in 1u32..40, season in 2021i32..2030) {
            let format = SprintFormat::for_season(season, INAUGURAL_SPRINT_LAST_SEASON);
            prop_assert!(format.points(pos) >= format.points(pos + 1));
        }
    }
}
