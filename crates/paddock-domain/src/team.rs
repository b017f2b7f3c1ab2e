//! Team naming and color helpers

/// Color used for constructors with no known livery color
pub const DEFAULT_TEAM_COLOR: &str = "#888888";

/// Normalize a raw color to upper-case `RRGGBB`
///
/// Accepts an optional leading `#`. Anything that is not exactly six hex
/// digits is rejected.
///
/// # Examples
///
/// ```
/// use paddock_domain::team::normalize_team_color;
///
/// assert_eq!(normalize_team_color("#3671c6"), Some("3671C6".to_string()));
/// assert_eq!(normalize_team_color("nan"), None);
/// ```
pub fn normalize_team_color(raw: &str) -> Option<String> {
    let hex = raw.trim().trim_start_matches('#');
    if hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()) {
        Some(hex.to_ascii_uppercase())
    } else {
        None
    }
}

/// Render a normalized color for display (`#RRGGBB`)
pub fn display_color(normalized: &str) -> String {
    format!("#{}", normalized)
}

/// Merge team names that refer to the same entrant across short-lived renames
pub fn normalize_team_name(name: &str) -> String {
    let name = name.trim();
    match name {
        "Red Bull" => "Red Bull Racing".to_string(),
        _ => name.to_string(),
    }
}

/// Country of origin for known constructors
pub fn team_origin(team: &str) -> Option<&'static str> {
    let origin = match team {
        "Ferrari" => "Italy",
        "Red Bull Racing" => "Austria",
        "Mercedes" => "Germany",
        "McLaren" => "United Kingdom",
        "Alpine" => "France",
        "Aston Martin" => "United Kingdom",
        "Williams" => "United Kingdom",
        "AlphaTauri" => "Italy",
        "Alfa Romeo" => "Switzerland",
        "Haas F1 Team" => "United States",
        "Racing Point" => "United Kingdom",
        "Renault" => "France",
        "Toro Rosso" => "Italy",
        "Force India" => "India",
        "Sauber" | "Kick Sauber" => "Switzerland",
        "RB" => "Italy",
        _ => return None,
    };
    Some(origin)
}
