// Team display colors. Matching is by substring so sponsor-laden official
// names ("Oracle Red Bull Racing") still resolve; the first table entry
// that matches wins, anything else falls back to neutral gray.

pub const FALLBACK_COLOR: &str = "#808080";

const TEAM_COLORS: &[(&str, &str)] = &[
    ("Red Bull Racing", "#1E41FF"),
    ("Ferrari", "#DC143C"),
    ("Mercedes", "#00D2BE"),
    ("McLaren", "#FF8700"),
    ("Aston Martin", "#00665E"),
    ("Alpine", "#0090FF"),
    ("Williams", "#005AFF"),
    ("AlphaTauri", "#2B4562"),
    ("Alfa Romeo", "#900000"),
    ("Haas", "#FFFFFF"),
];

pub fn team_color(team_name: &str) -> &'static str {
    for (team, color) in TEAM_COLORS {
        if team_name.contains(team) {
            return color;
        }
    }
    FALLBACK_COLOR
}
