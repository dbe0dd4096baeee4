use crate::dao::models::DEFAULT_EMOJI;

/// Display glyph per "City Name", one entry per major league club.
pub const TEAM_EMOJIS: [(&str, &str); 30] = [
    // American League East
    ("Boston Red Sox", "🧦"),
    ("New York Yankees", "🎩"),
    ("Tampa Bay Rays", "⚡"),
    ("Toronto Blue Jays", "🔵"),
    ("Baltimore Orioles", "🐦"),
    // American League Central
    ("Chicago White Sox", "🤍"),
    ("Cleveland Guardians", "🛡️"),
    ("Detroit Tigers", "🐅"),
    ("Kansas City Royals", "👑"),
    ("Minnesota Twins", "👯"),
    // American League West
    ("Houston Astros", "🚀"),
    ("Los Angeles Angels", "😇"),
    ("Oakland Athletics", "🟢"),
    ("Seattle Mariners", "⚓"),
    ("Texas Rangers", "🤠"),
    // National League East
    ("Atlanta Braves", "🪓"),
    ("Miami Marlins", "🐠"),
    ("New York Mets", "🗽"),
    ("Philadelphia Phillies", "🔔"),
    ("Washington Nationals", "🏛️"),
    // National League Central
    ("Chicago Cubs", "🐻"),
    ("Cincinnati Reds", "🔴"),
    ("Milwaukee Brewers", "🍺"),
    ("Pittsburgh Pirates", "🏴‍☠️"),
    ("St. Louis Cardinals", "🐦"),
    // National League West
    ("Arizona Diamondbacks", "🐍"),
    ("Colorado Rockies", "🗻"),
    ("Los Angeles Dodgers", "💙"),
    ("San Diego Padres", "🏛️"),
    ("San Francisco Giants", "🗻"),
];

/// Glyph for a club, or [`DEFAULT_EMOJI`] when it is not in the table.
pub fn team_emoji(city: &str, name: &str) -> &'static str {
    let key = format!("{city} {name}");
    TEAM_EMOJIS
        .iter()
        .find(|(team, _)| *team == key)
        .map(|(_, emoji)| *emoji)
        .unwrap_or(DEFAULT_EMOJI)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_club_gets_its_glyph() {
        assert_eq!(team_emoji("Boston", "Red Sox"), "🧦");
        assert_eq!(team_emoji("St. Louis", "Cardinals"), "🐦");
    }

    #[test]
    fn unknown_club_falls_back() {
        assert_eq!(team_emoji("Springfield", "Isotopes"), DEFAULT_EMOJI);
        // Split names from single-word full names never match.
        assert_eq!(team_emoji("Unknown City", "Boston"), DEFAULT_EMOJI);
    }
}
