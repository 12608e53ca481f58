// Trigger override tokens: `$+` keeps the trigger character, `$-` drops it

pub const KEEP_TRIGGER: &str = "$+";
pub const DROP_TRIGGER: &str = "$-";

/// Strip both override tokens and decide whether the trigger is re-emitted
///
/// Only the token that contradicts the global setting has any effect.
pub fn resolve_trigger_override(body: &str, keep_by_default: bool) -> (String, bool) {
    let keep = if keep_by_default {
        !body.contains(DROP_TRIGGER)
    } else {
        body.contains(KEEP_TRIGGER)
    };

    let stripped = body.replace(KEEP_TRIGGER, "").replace(DROP_TRIGGER, "");
    (stripped, keep)
}
