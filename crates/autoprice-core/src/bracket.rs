use serde::Serialize;

/// Marketing power brackets (hp) accepted by bracketed search filters, in
/// ascending order.
pub const POWER_BRACKETS: [u32; 14] = [
    60, 70, 80, 90, 100, 110, 120, 140, 160, 180, 200, 250, 300, 400,
];

/// Closed `[lower, upper]` power range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PowerBracket {
    pub lower: u32,
    pub upper: u32,
}

/// Resolves `power` to the bracket a source filter expects.
///
/// The first bracket `>= power` becomes `upper` and its predecessor `lower`.
/// Inputs at or below the first bracket get `[60, 60]`; inputs above the last
/// collapse to `[400, 400]`. Total for every input.
#[must_use]
pub fn resolve_power_bracket(power: u32) -> PowerBracket {
    let largest = POWER_BRACKETS[POWER_BRACKETS.len() - 1];
    match POWER_BRACKETS.iter().position(|&b| b >= power) {
        Some(idx) => PowerBracket {
            lower: POWER_BRACKETS[idx.saturating_sub(1)],
            upper: POWER_BRACKETS[idx],
        },
        None => PowerBracket {
            lower: largest,
            upper: largest,
        },
    }
}
