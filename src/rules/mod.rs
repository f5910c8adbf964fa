//! Pure game rules
//!
//! Nothing in here holds state; the session feeds these its current view of
//! the table and applies the results.

mod modifier;
mod night;
mod roles;
mod tally;
mod win;

pub use modifier::{roll_modifier, MODIFIER_CHANCE};
pub use night::{inspect, resolve_night, NightOutcome};
pub use roles::{assign_roles, MOLE_THRESHOLD};
pub use tally::{tally, TallyOutcome};
pub use win::{evaluate, Verdict};
